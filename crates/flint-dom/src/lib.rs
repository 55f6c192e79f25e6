//! DOM tree data structures: nodes, box geometry, styles, dirty state, and
//! point hit-testing.

mod document;
mod geometry;
pub mod hit;
mod style;
mod tree;

pub use document::Document;
pub use geometry::EdgeSizes;
pub use geometry::RenderBox;
pub use style::ColorRgba;
pub use style::Display;
pub use style::Position;
pub use style::Style;
pub use style::StyleElement;
pub use tree::Attribute;
pub use tree::Descendants;
pub use tree::DomTree;
pub use tree::NodeId;
