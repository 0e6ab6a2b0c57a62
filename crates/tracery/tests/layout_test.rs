//! Layout invariants over whole diagrams.

use proptest::prelude::*;

use tracery::{
    control_flow::ControlFlow,
    diagram::{Diagram, EdgeKind, NodeId, NodeKind, keys},
    draw::MonospaceMetrics,
    geometry::{Direction, Point, Rectangle},
    render::{DiagramRenderer, ElementId, LifelineRenderer},
};

/// A client calling into a server that calls itself twice, nested.
struct NestedChain {
    diagram: Diagram,
    client: NodeId,
    server: NodeId,
    calls: [NodeId; 4],
}

fn nested_chain() -> NestedChain {
    let mut diagram = Diagram::new();
    let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
    diagram
        .node_properties_mut(client)
        .unwrap()
        .set(keys::NAME, "client");
    diagram
        .node_properties_mut(server)
        .unwrap()
        .set(keys::NAME, "server:Service");

    let entry = diagram.add_child(client, NodeKind::Call).unwrap();
    let first = diagram.add_child(server, NodeKind::Call).unwrap();
    let second = diagram.add_child(server, NodeKind::Call).unwrap();
    let third = diagram.add_child(server, NodeKind::Call).unwrap();

    let call = diagram.connect(EdgeKind::Call, entry, first).unwrap();
    diagram
        .edge_properties_mut(call)
        .unwrap()
        .set(keys::MIDDLE_LABEL, "handle()");
    diagram.connect(EdgeKind::Call, first, second).unwrap();
    diagram.connect(EdgeKind::Call, second, third).unwrap();
    diagram.connect(EdgeKind::Return, first, entry).unwrap();

    NestedChain {
        diagram,
        client,
        server,
        calls: [entry, first, second, third],
    }
}

#[test]
fn test_bounds_are_idempotent() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);

    for node in chain.diagram.all_nodes() {
        let first = renderer.node_bounds(node).unwrap();
        let second = renderer.node_bounds(node).unwrap();
        assert_eq!(first, second, "bounds of {node} changed between queries");
    }
    assert_eq!(renderer.layout().unwrap(), renderer.layout().unwrap());
}

#[test]
fn test_callers_enclose_callees_vertically() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);
    let layout = renderer.layout().unwrap();

    let [entry, first, second, third] = chain.calls;
    for (outer, inner) in [
        (entry, first),
        (entry, second),
        (entry, third),
        (first, second),
        (first, third),
        (second, third),
    ] {
        let outer = layout.node(outer).unwrap();
        let inner = layout.node(inner).unwrap();
        assert!(outer.y() <= inner.y() && inner.max_y() <= outer.max_y());
    }
}

#[test]
fn test_nesting_offset() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);
    let flow = ControlFlow::build(&chain.diagram).unwrap();

    let center = LifelineRenderer::top_rectangle(&renderer, chain.server)
        .unwrap()
        .center()
        .x();
    for call in &chain.calls[1..] {
        let depth = flow.nesting_depth(*call).unwrap() as i32;
        assert_eq!(
            renderer.node_bounds(*call).unwrap().x(),
            center - 8 + depth * 8
        );
    }
    assert_eq!(flow.nesting_depth(chain.calls[3]).unwrap(), 3);
}

#[test]
fn test_leaf_call_default_height() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);
    assert_eq!(renderer.node_bounds(chain.calls[3]).unwrap().height(), 30);
}

#[test]
fn test_storage_computes_once_per_session() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);
    let call = chain.calls[3];

    {
        let _session = renderer.session();
        let before = renderer.storage().computations();
        renderer.node_bounds(call).unwrap();
        renderer.node_bounds(call).unwrap();
        assert_eq!(renderer.storage().computations(), before + 1);
    }

    let before = renderer.storage().computations();
    renderer.node_bounds(call).unwrap();
    assert_eq!(renderer.storage().computations(), before + 1);
}

#[test]
fn test_sibling_ordering() {
    let mut diagram = Diagram::new();
    let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
    let caller = diagram.add_child(client, NodeKind::Call).unwrap();
    let callees: Vec<NodeId> = (0..3)
        .map(|_| diagram.add_child(server, NodeKind::Call).unwrap())
        .collect();
    for callee in &callees {
        diagram.connect(EdgeKind::Call, caller, *callee).unwrap();
    }
    // Give the middle callee a nested call so the siblings differ in height.
    let nested = diagram.add_child(server, NodeKind::Call).unwrap();
    diagram.connect(EdgeKind::Call, callees[1], nested).unwrap();

    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(&diagram, &metrics).layout().unwrap();
    for pair in callees.windows(2) {
        let previous = layout.node(pair[0]).unwrap();
        let next = layout.node(pair[1]).unwrap();
        assert!(next.y() >= previous.max_y() + 20);
    }
}

#[test]
fn test_thousands_of_siblings() {
    let mut diagram = Diagram::new();
    let client = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let server = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
    let caller = diagram.add_child(client, NodeKind::Call).unwrap();
    let callees: Vec<NodeId> = (0..5000)
        .map(|_| diagram.add_child(server, NodeKind::Call).unwrap())
        .collect();
    for callee in &callees {
        diagram.connect(EdgeKind::Call, caller, *callee).unwrap();
    }

    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(&diagram, &metrics).layout().unwrap();

    assert!(layout.skipped().is_empty());
    let first = layout.node(callees[0]).unwrap();
    let last = layout.node(callees[4999]).unwrap();
    // Every sibling is 30 tall and followed by a gap of 20.
    assert_eq!(last.y(), first.y() + 4999 * 50);
    assert_eq!(layout.node(caller).unwrap().max_y(), last.max_y() + 20);
}

#[test]
fn test_runaway_nesting_is_skipped_not_fatal() {
    let mut diagram = Diagram::new();
    let object = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let mut caller = diagram.add_child(object, NodeKind::Call).unwrap();
    for _ in 0..2000 {
        let callee = diagram.add_child(object, NodeKind::Call).unwrap();
        diagram.connect(EdgeKind::Call, caller, callee).unwrap();
        caller = callee;
    }
    let note = diagram.add_root_node(NodeKind::Note, Point::new(300, 0));

    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(&diagram, &metrics).layout().unwrap();

    assert!(layout.skipped().contains(&ElementId::Node(caller)));
    assert_eq!(
        layout.node(note).unwrap(),
        Rectangle::new(300, 0, 60, 40)
    );
}

#[test]
fn test_call_connection_points() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);

    for call in chain.calls {
        let bounds = renderer.node_bounds(call).unwrap();
        assert_eq!(
            renderer.connection_point(call, Direction::EAST).unwrap(),
            Point::new(bounds.max_x(), bounds.y())
        );
        for direction in [
            Direction::WEST,
            Direction::NORTH,
            Direction::SOUTH,
            Direction::new(1.0, 1.0),
        ] {
            assert_eq!(
                renderer.connection_point(call, direction).unwrap(),
                bounds.origin()
            );
        }
    }
}

#[test]
fn test_lifelines_extend_below_their_calls() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(&chain.diagram, &metrics)
        .layout()
        .unwrap();

    let server = layout.node(chain.server).unwrap();
    for call in &chain.calls[1..] {
        assert!(layout.node(*call).unwrap().max_y() < server.max_y());
    }
    assert!(layout.node(chain.client).unwrap().max_y() > layout.node(chain.calls[0]).unwrap().max_y());
    assert!(layout.skipped().is_empty());
}

#[test]
fn test_element_at() {
    let chain = nested_chain();
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&chain.diagram, &metrics);

    let deepest = renderer.node_bounds(chain.calls[3]).unwrap();
    assert_eq!(
        renderer.element_at(deepest.center()).unwrap(),
        Some(ElementId::Node(chain.calls[3]))
    );

    let top = LifelineRenderer::top_rectangle(&renderer, chain.client).unwrap();
    assert_eq!(
        renderer.element_at(top.center()).unwrap(),
        Some(ElementId::Node(chain.client))
    );

    let (call_edge, _) = chain.diagram.edges().next().unwrap();
    let midpoint = {
        let bounds = renderer.node_bounds(chain.calls[1]).unwrap();
        Point::new(150, bounds.y())
    };
    assert_eq!(
        renderer.element_at(midpoint).unwrap(),
        Some(ElementId::Edge(call_edge))
    );

    assert_eq!(renderer.element_at(Point::new(-500, -500)).unwrap(), None);
    assert!(!renderer.storage().is_active());
}

#[test]
fn test_constructed_lifeline_geometry() {
    let mut diagram = Diagram::new();
    let factory = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let product = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(200, 0));
    let create = diagram.add_child(factory, NodeKind::Call).unwrap();
    let init = diagram.add_child(product, NodeKind::Call).unwrap();
    let later = diagram.add_child(product, NodeKind::Call).unwrap();
    diagram.connect(EdgeKind::Constructor, create, init).unwrap();
    diagram.connect(EdgeKind::Call, create, later).unwrap();

    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&diagram, &metrics);
    let layout = renderer.layout().unwrap();

    let create_bounds = layout.node(create).unwrap();
    let top = LifelineRenderer::top_rectangle(&renderer, product).unwrap();
    let init_bounds = layout.node(init).unwrap();
    let later_bounds = layout.node(later).unwrap();

    assert_eq!(top.y(), create_bounds.y() + 20);
    assert_eq!(init_bounds.y(), top.max_y() + 5);
    assert_eq!(later_bounds.y(), init_bounds.max_y() + 20);
    assert!(create_bounds.max_y() >= later_bounds.max_y() + 20);
    assert_eq!(layout.node(product).unwrap().y(), top.y());
}

#[test]
fn test_cyclic_calls_are_skipped_not_fatal() {
    let mut diagram = Diagram::new();
    let object = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let a = diagram.add_child(object, NodeKind::Call).unwrap();
    let b = diagram.add_child(object, NodeKind::Call).unwrap();
    diagram.connect(EdgeKind::Call, a, b).unwrap();
    diagram.connect(EdgeKind::Call, b, a).unwrap();
    let note = diagram.add_root_node(NodeKind::Note, Point::new(300, 0));

    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(&diagram, &metrics).layout().unwrap();

    assert!(layout.skipped().contains(&ElementId::Node(a)));
    assert!(layout.skipped().contains(&ElementId::Node(b)));
    assert_eq!(
        layout.node(note).unwrap(),
        Rectangle::new(300, 0, 60, 40)
    );
}

// =============================================================================
// Generated call trees
// =============================================================================

/// Lifeline count and, per call, the index of its caller among the earlier
/// calls and the index of its lifeline.
fn call_tree_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..4, prop::collection::vec((any::<usize>(), any::<usize>()), 0..12))
}

fn build_call_tree(lifelines: usize, calls: &[(usize, usize)]) -> (Diagram, Vec<NodeId>, Vec<NodeId>) {
    let mut diagram = Diagram::new();
    let objects: Vec<NodeId> = (0..lifelines)
        .map(|i| diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(i as i32 * 150, 0)))
        .collect();
    let mut nodes = vec![diagram.add_child(objects[0], NodeKind::Call).unwrap()];
    for (caller, lifeline) in calls {
        let caller = nodes[caller % nodes.len()];
        let call = diagram
            .add_child(objects[lifeline % lifelines], NodeKind::Call)
            .unwrap();
        diagram.connect(EdgeKind::Call, caller, call).unwrap();
        nodes.push(call);
    }
    (diagram, objects, nodes)
}

fn check_call_tree_invariants(
    lifelines: usize,
    calls: Vec<(usize, usize)>,
) -> Result<(), TestCaseError> {
    let (diagram, objects, nodes) = build_call_tree(lifelines, &calls);
    let metrics = MonospaceMetrics::default();
    let renderer = DiagramRenderer::new(&diagram, &metrics);
    let layout = renderer.layout().unwrap();
    let flow = ControlFlow::build(&diagram).unwrap();

    prop_assert!(layout.skipped().is_empty());
    for call in &nodes {
        let bounds = layout.node(*call).unwrap();
        prop_assert!(bounds.height() >= 30);

        let callees = flow.callees_of(*call).unwrap();
        for callee in callees {
            let inner = layout.node(*callee).unwrap();
            prop_assert!(bounds.y() < inner.y());
            prop_assert!(inner.max_y() < bounds.max_y());
        }
        for pair in callees.windows(2) {
            let previous = layout.node(pair[0]).unwrap();
            let next = layout.node(pair[1]).unwrap();
            prop_assert_eq!(next.y(), previous.max_y() + 20);
        }

        let lifeline = diagram.node(*call).unwrap().parent().unwrap();
        let center = LifelineRenderer::top_rectangle(&renderer, lifeline)
            .unwrap()
            .center()
            .x();
        let depth = flow.nesting_depth(*call).unwrap() as i32;
        prop_assert_eq!(bounds.x(), center - 8 + depth * 8);
    }
    for object in objects {
        let lifeline = layout.node(object).unwrap();
        for child in diagram.node(object).unwrap().children() {
            prop_assert!(layout.node(*child).unwrap().max_y() < lifeline.max_y());
        }
    }
    Ok(())
}

fn check_layout_matches_fresh_renderer(
    lifelines: usize,
    calls: Vec<(usize, usize)>,
) -> Result<(), TestCaseError> {
    let (diagram, _, _) = build_call_tree(lifelines, &calls);
    let metrics = MonospaceMetrics::default();

    let cached = DiagramRenderer::new(&diagram, &metrics).layout().unwrap();
    let renderer = DiagramRenderer::new(&diagram, &metrics);
    for (node, bounds) in cached.nodes() {
        prop_assert_eq!(renderer.node_bounds(node).unwrap(), bounds);
    }
    Ok(())
}

proptest! {
    #[test]
    fn prop_call_tree_invariants((lifelines, calls) in call_tree_strategy()) {
        check_call_tree_invariants(lifelines, calls)?;
    }

    #[test]
    fn prop_session_and_uncached_layout_agree((lifelines, calls) in call_tree_strategy()) {
        check_layout_matches_fresh_renderer(lifelines, calls)?;
    }
}
