//! Saving and loading a diagram must not move anything.

use tempfile::tempdir;

use tracery::{
    DiagramEngine,
    config::{AppConfig, StyleConfig, TextConfig},
    diagram::{Diagram, EdgeKind, NodeKind, keys},
    draw::MonospaceMetrics,
    geometry::{Point, Rectangle},
    persistence,
    render::DiagramRenderer,
};

/// Three levels of nested self-calls under a cross-lifeline call, plus a
/// constructor, returns, a note and an open activation.
fn sample() -> Diagram {
    let mut diagram = Diagram::new();
    let user = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(0, 0));
    let shop = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(180, 0));
    let cart = diagram.add_root_node(NodeKind::ImplicitParameter, Point::new(420, 0));
    diagram.node_properties_mut(user).unwrap().set(keys::NAME, ":User");
    diagram.node_properties_mut(shop).unwrap().set(keys::NAME, "shop:Shop");
    diagram.node_properties_mut(cart).unwrap().set(keys::NAME, "cart:ShoppingCart");

    let checkout = diagram.add_child(user, NodeKind::Call).unwrap();
    let validate = diagram.add_child(shop, NodeKind::Call).unwrap();
    let level_two = diagram.add_child(shop, NodeKind::Call).unwrap();
    let level_three = diagram.add_child(shop, NodeKind::Call).unwrap();
    let new_cart = diagram.add_child(cart, NodeKind::Call).unwrap();
    diagram
        .node_properties_mut(new_cart)
        .unwrap()
        .set(keys::OPEN_BOTTOM, true);

    let call = diagram.connect(EdgeKind::Call, checkout, validate).unwrap();
    diagram
        .edge_properties_mut(call)
        .unwrap()
        .set(keys::MIDDLE_LABEL, "checkout()");
    diagram.connect(EdgeKind::Call, validate, level_two).unwrap();
    diagram.connect(EdgeKind::Call, level_two, level_three).unwrap();
    let create = diagram.connect(EdgeKind::Constructor, checkout, new_cart).unwrap();
    diagram
        .edge_properties_mut(create)
        .unwrap()
        .set(keys::MIDDLE_LABEL, "«create»");
    diagram.connect(EdgeKind::Return, validate, checkout).unwrap();

    let note = diagram.add_root_node(NodeKind::Note, Point::new(600, 80));
    diagram
        .node_properties_mut(note)
        .unwrap()
        .set(keys::NAME, "cart is created lazily");
    let anchor = diagram.add_root_node(NodeKind::Point, Point::new(560, 200));
    diagram.connect(EdgeKind::Note, note, anchor).unwrap();
    diagram
}

fn node_rectangles(diagram: &Diagram) -> Vec<Rectangle> {
    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(diagram, &metrics).layout().unwrap();
    assert!(layout.skipped().is_empty());
    layout.nodes().map(|(_, bounds)| bounds).collect()
}

fn edge_rectangles(diagram: &Diagram) -> Vec<Rectangle> {
    let metrics = MonospaceMetrics::default();
    let layout = DiagramRenderer::new(diagram, &metrics).layout().unwrap();
    layout.edges().map(|(_, bounds)| bounds).collect()
}

#[test]
fn test_round_trip_through_file_keeps_bounds() {
    let original = sample();
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("checkout.json");

    persistence::save(&original, &path).expect("Failed to save diagram");
    let loaded = persistence::read(&path).expect("Failed to read diagram");

    assert_eq!(node_rectangles(&loaded), node_rectangles(&original));
    assert_eq!(edge_rectangles(&loaded), edge_rectangles(&original));
}

#[test]
fn test_round_trip_keeps_svg() {
    let engine = DiagramEngine::new(AppConfig::new(
        TextConfig::monospace(),
        StyleConfig::new(Some("white")),
    ));
    let original = sample();
    let loaded = persistence::decode(&persistence::to_string(&original)).unwrap();

    assert_eq!(
        engine.render_svg(&loaded).unwrap(),
        engine.render_svg(&original).unwrap()
    );
}

#[test]
fn test_round_trip_after_edits() {
    let mut diagram = sample();
    let lifeline = diagram.root_nodes()[1];
    let extra = diagram.insert_child(lifeline, 0, NodeKind::Call).unwrap();
    let first_call = diagram.node(diagram.root_nodes()[0]).unwrap().children()[0];
    diagram.connect(EdgeKind::Call, first_call, extra).unwrap();
    diagram.set_position(diagram.root_nodes()[2], Point::new(500, 0)).unwrap();

    let loaded = persistence::decode(&persistence::to_string(&diagram)).unwrap();
    assert_eq!(node_rectangles(&loaded), node_rectangles(&diagram));
    assert_eq!(edge_rectangles(&loaded), edge_rectangles(&diagram));
}

#[test]
fn test_engine_load_reports_source() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"diagram\": \"SequenceDiagram\", \"nodes\": [ }").unwrap();

    let err = DiagramEngine::default().load(&path).unwrap_err();
    match err {
        tracery::TraceryError::Persistence { src, .. } => assert!(src.contains("nodes")),
        other => panic!("unexpected error: {other:?}"),
    }
}
