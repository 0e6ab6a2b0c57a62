//! Node renderers, one per node kind.

mod call;
mod lifeline;
mod note;
mod point;

pub use call::CallNodeRenderer;
pub use lifeline::LifelineRenderer;
pub use note::NoteNodeRenderer;
pub use point::PointNodeRenderer;
