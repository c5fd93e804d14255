use std::collections::{HashMap, HashSet};

use deck_logging::{deck_debug, deck_info, deck_warn};
use ego_tree::NodeId;
use thiserror::Error;
use uuid::Uuid;

use crate::document::{HostDocument, HostNode, MutationRecord};

/// Attribute carrying the mount id on every injection point.
pub const INJECTION_MARKER: &str = "data-btd-uuid";

pub type MountId = Uuid;

/// A UI component rendered into an injection point.
pub trait InjectedComponent: Send {
    /// Releases the component's resources. Called at most once.
    fn unmount(&mut self);
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("another observer is already attached to the document")]
    AlreadyObserving,
    #[error("mount parent is not part of the document")]
    MissingParent,
}

struct Binding {
    node: NodeId,
    component: Box<dyn InjectedComponent>,
}

/// Owns every mounted component and unmounts each one when the host page
/// removes its injection point.
///
/// The manager is explicitly started against a document and explicitly
/// stopped; no observer is attached while it is stopped.
#[derive(Default)]
pub struct LifecycleManager {
    bindings: HashMap<MountId, Binding>,
    running: bool,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the observer. Components whose injection point left the
    /// document while no observer was attached are unmounted first.
    pub fn start(&mut self, doc: &mut HostDocument) -> Result<(), DomError> {
        if self.running || !doc.observe() {
            return Err(DomError::AlreadyObserving);
        }
        self.running = true;
        let released = self.release_detached(doc);
        deck_info!(
            "Lifecycle observer started; released {} detached component(s)",
            released
        );
        Ok(())
    }

    /// Detaches the observer. Pending records are discarded and bound
    /// components stay mounted until the next `start` reconciles them or
    /// the caller unmounts them.
    pub fn stop(&mut self, doc: &mut HostDocument) {
        if !self.running {
            return;
        }
        doc.disconnect();
        self.running = false;
        deck_info!(
            "Lifecycle observer stopped with {} component(s) still bound",
            self.bindings.len()
        );
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Creates a marked injection point under `parent` and binds `component` to it.
    pub fn mount(
        &mut self,
        doc: &mut HostDocument,
        parent: NodeId,
        component: Box<dyn InjectedComponent>,
    ) -> Result<MountId, DomError> {
        if !doc.is_connected(parent) {
            return Err(DomError::MissingParent);
        }
        let id = Uuid::new_v4();
        let marker = id.to_string();
        let node = doc
            .append(parent, HostNode::element("div", &[(INJECTION_MARKER, &marker)]))
            .ok_or(DomError::MissingParent)?;
        self.bindings.insert(id, Binding { node, component });
        deck_debug!("Mounted component {}", id);
        Ok(id)
    }

    pub fn is_bound(&self, id: MountId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn injection_point(&self, id: MountId) -> Option<NodeId> {
        self.bindings.get(&id).map(|b| b.node)
    }

    pub fn bound_count(&self) -> usize {
        self.bindings.len()
    }

    /// Takes the document's queued records and processes them as one batch.
    pub fn flush(&mut self, doc: &mut HostDocument) -> usize {
        if !self.running {
            return 0;
        }
        let records = doc.take_records();
        self.process_batch(doc, &records)
    }

    /// Unmounts every component whose injection point was removed in the
    /// batch. Returns how many components were unmounted.
    pub fn process_batch(&mut self, doc: &HostDocument, records: &[MutationRecord]) -> usize {
        let mut seen = HashSet::new();
        let mut unmounted = 0;
        for removed in records.iter().flat_map(|r| r.removed.iter().copied()) {
            let marked = doc
                .closest_with_attr(removed, INJECTION_MARKER)
                .into_iter()
                .chain(doc.descendants_with_attr(removed, INJECTION_MARKER));
            for node in marked {
                let Some(id) = marker_id(doc, node) else {
                    continue;
                };
                if !seen.insert(id) {
                    continue;
                }
                if self.unmount(id) {
                    unmounted += 1;
                }
            }
        }
        unmounted
    }

    /// Unmounts every component whose injection point is no longer
    /// connected to the document.
    pub fn release_detached(&mut self, doc: &HostDocument) -> usize {
        let detached: Vec<MountId> = self
            .bindings
            .iter()
            .filter(|(_, binding)| !doc.is_connected(binding.node))
            .map(|(&id, _)| id)
            .collect();
        detached.into_iter().filter(|&id| self.unmount(id)).count()
    }

    /// Unmounts every bound component, connected or not.
    pub fn unmount_all(&mut self) -> usize {
        let ids: Vec<MountId> = self.bindings.keys().copied().collect();
        ids.into_iter().filter(|&id| self.unmount(id)).count()
    }

    /// Unmounts one component. Returns false if `id` is not bound.
    pub fn unmount(&mut self, id: MountId) -> bool {
        match self.bindings.remove(&id) {
            Some(mut binding) => {
                binding.component.unmount();
                deck_debug!("Unmounted component {}", id);
                true
            }
            None => {
                deck_debug!("Marker {} has no bound component", id);
                false
            }
        }
    }
}

fn marker_id(doc: &HostDocument, node: NodeId) -> Option<MountId> {
    let raw = doc.attr(node, INJECTION_MARKER)?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            deck_warn!("Ignoring injection marker with malformed id {:?}", raw);
            None
        }
    }
}
