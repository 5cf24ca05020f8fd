use crate::store::{BookmarkStore, StoreError};
use crate::tree::NodeId;

use super::destination::NoOpReason;
use super::types::Destination;

/// Why a drop did not reach the bookmark store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No drag is active (stale or foreign drop).
    NoActiveDrag,
    /// An inner handler already consumed this drop event.
    AlreadyHandled,
    NoOp(NoOpReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Dispatched {
        node: NodeId,
        destination: Destination,
    },
    Ignored(IgnoreReason),
    /// The store refused the move; the tree stays as it was. Not retried.
    Failed(StoreError),
}

impl DropOutcome {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Send exactly one move request. No local tree mutation: the view keeps showing the old
/// snapshot until the store's change notification arrives.
pub(super) fn dispatch_move(
    store: &mut dyn BookmarkStore,
    node: &NodeId,
    destination: Destination,
) -> DropOutcome {
    match store.move_node(node, &destination) {
        Ok(()) => {
            log::debug!(
                "move dispatched: {node} -> {}[{}]",
                destination.parent_id,
                destination.index
            );
            DropOutcome::Dispatched {
                node: node.clone(),
                destination,
            }
        }
        Err(err) => {
            log::warn!("move of {node} rejected: {err}");
            DropOutcome::Failed(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BookmarkTree;

    #[derive(Default)]
    struct RecordingStore {
        calls: Vec<(NodeId, Destination)>,
        fail: bool,
    }

    impl BookmarkStore for RecordingStore {
        fn move_node(
            &mut self,
            node: &NodeId,
            destination: &Destination,
        ) -> Result<(), StoreError> {
            self.calls.push((node.clone(), destination.clone()));
            if self.fail {
                return Err(StoreError::Unavailable("offline".to_owned()));
            }
            Ok(())
        }

        fn snapshot(&self) -> BookmarkTree {
            BookmarkTree::default()
        }

        fn subscribe(&mut self, _listener: Box<dyn FnMut()>) {}
    }

    fn dest() -> Destination {
        Destination {
            parent_id: "1".into(),
            index: 2,
        }
    }

    #[test]
    fn one_request_per_dispatch() {
        let mut store = RecordingStore::default();
        let outcome = dispatch_move(&mut store, &"a".into(), dest());
        assert!(outcome.is_dispatched());
        assert_eq!(store.calls, vec![(NodeId::new("a"), dest())]);
    }

    #[test]
    fn failure_is_reported_and_not_retried() {
        let mut store = RecordingStore {
            fail: true,
            ..Default::default()
        };
        let outcome = dispatch_move(&mut store, &"a".into(), dest());
        assert_eq!(
            outcome,
            DropOutcome::Failed(StoreError::Unavailable("offline".to_owned()))
        );
        assert_eq!(store.calls.len(), 1);
    }
}
