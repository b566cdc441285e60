pub mod kind;
pub mod node;
pub mod range;

pub use kind::NodeKind;
pub use node::{CodeNode, NodeId, NodeSummary};
pub use range::{Position, Range};
