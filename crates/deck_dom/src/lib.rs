//! Deck DOM: host document model and lifecycle of injected components.
mod document;
mod lifecycle;

pub use document::{HostDocument, HostNode, MutationRecord};
pub use ego_tree::NodeId;
pub use lifecycle::{DomError, InjectedComponent, LifecycleManager, MountId, INJECTION_MARKER};
