//! The bookmark store: the authoritative owner of the tree.
//!
//! [`BookmarkStore`] is the seam to a real backend. [`MemoryBookmarkStore`] is an in-process
//! implementation with the same move semantics, used by hosts without a backend and by tests.

use itertools::Itertools as _;

use crate::reorder::Destination;
use crate::tree::{BookmarkTree, Node, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    UnknownNode(NodeId),
    UnknownParent(NodeId),
    NotAFolder(NodeId),
    WouldCreateCycle { node: NodeId, parent: NodeId },
    /// The backend could not be reached or refused the request.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "unknown node: {id}"),
            Self::UnknownParent(id) => write!(f, "unknown parent: {id}"),
            Self::NotAFolder(id) => write!(f, "not a folder: {id}"),
            Self::WouldCreateCycle { node, parent } => {
                write!(f, "moving {node} into {parent} would create a cycle")
            }
            Self::Unavailable(reason) => write!(f, "bookmark store unavailable: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The subset of the bookmark backend the reorder engine talks to.
pub trait BookmarkStore {
    /// Request a move. `destination.index` may exceed the parent's child count and is clamped.
    ///
    /// # Errors
    /// The node or parent is unknown, the parent is not a folder, the move would put a folder
    /// inside itself, or the backend is unavailable. Nothing moves on error.
    fn move_node(&mut self, node: &NodeId, destination: &Destination) -> Result<(), StoreError>;

    /// A fresh copy of the whole tree.
    fn snapshot(&self) -> BookmarkTree;

    /// Register a payload-free "tree changed" listener.
    fn subscribe(&mut self, listener: Box<dyn FnMut()>);
}

type ChangeListener = Box<dyn FnMut()>;

/// In-memory bookmark store.
///
/// Move semantics: the node is detached first; if it moves to a later position within the same
/// parent the index shifts down by one; the index is then clamped to the child count.
#[derive(Default)]
pub struct MemoryBookmarkStore {
    roots: Vec<Node>,
    revision: u64,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for MemoryBookmarkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBookmarkStore")
            .field("roots", &self.roots)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl MemoryBookmarkStore {
    pub fn new(roots: impl Into<Vec<Node>>) -> Self {
        Self {
            roots: roots.into(),
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn notify(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        for listener in &mut self.listeners {
            listener();
        }
    }
}

fn find<'a>(nodes: &'a [Node], id: &NodeId) -> Option<&'a Node> {
    nodes.iter().find_map(|node| {
        if node.id == *id {
            Some(node)
        } else {
            find(&node.children, id)
        }
    })
}

/// Parent id (`None` at the top level) and sibling index of `id`.
fn locate(nodes: &[Node], parent: Option<&NodeId>, id: &NodeId) -> Option<(Option<NodeId>, usize)> {
    if let Some((ix, _)) = nodes.iter().find_position(|node| node.id == *id) {
        return Some((parent.cloned(), ix));
    }
    nodes
        .iter()
        .find_map(|node| locate(&node.children, Some(&node.id), id))
}

fn find_mut<'a>(nodes: &'a mut [Node], id: &NodeId) -> Option<&'a mut Node> {
    for node in nodes {
        if node.id == *id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn detach(nodes: &mut Vec<Node>, id: &NodeId) -> Option<Node> {
    let found = nodes
        .iter()
        .find_position(|node| node.id == *id)
        .map(|(ix, _)| ix);
    if let Some(ix) = found {
        return Some(nodes.remove(ix));
    }
    nodes
        .iter_mut()
        .find_map(|node| detach(&mut node.children, id))
}

impl BookmarkStore for MemoryBookmarkStore {
    fn move_node(&mut self, node: &NodeId, destination: &Destination) -> Result<(), StoreError> {
        let parent = &destination.parent_id;
        let Some(moving) = find(&self.roots, node) else {
            return Err(StoreError::UnknownNode(node.clone()));
        };
        let Some(parent_node) = find(&self.roots, parent) else {
            return Err(StoreError::UnknownParent(parent.clone()));
        };
        if !parent_node.is_folder() {
            return Err(StoreError::NotAFolder(parent.clone()));
        }
        if moving.id == *parent || find(&moving.children, parent).is_some() {
            return Err(StoreError::WouldCreateCycle {
                node: node.clone(),
                parent: parent.clone(),
            });
        }

        let mut index = destination.index;
        let later_in_same_parent = locate(&self.roots, None, node)
            .is_some_and(|(from_parent, from_index)| {
                from_parent.as_ref() == Some(parent) && from_index < index
            });
        if later_in_same_parent {
            index -= 1;
        }

        let Some(moved) = detach(&mut self.roots, node) else {
            return Err(StoreError::UnknownNode(node.clone()));
        };
        let Some(parent_node) = find_mut(&mut self.roots, parent) else {
            return Err(StoreError::UnknownParent(parent.clone()));
        };
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, moved);

        log::debug!("store: moved {node} to {parent}[{index}]");
        self.notify();
        Ok(())
    }

    fn snapshot(&self) -> BookmarkTree {
        BookmarkTree::new(self.roots.clone())
    }

    fn subscribe(&mut self, listener: Box<dyn FnMut()>) {
        self.listeners.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn store() -> MemoryBookmarkStore {
        MemoryBookmarkStore::new(vec![
            Node::folder("1", "Bar").children([
                Node::link("a", "A", "https://a"),
                Node::link("b", "B", "https://b"),
                Node::link("c", "C", "https://c"),
                Node::folder("f", "F"),
            ]),
            Node::folder("2", "Other"),
        ])
    }

    fn child_ids(store: &MemoryBookmarkStore, parent: &str) -> Vec<String> {
        store
            .snapshot()
            .children_of(Some(&parent.into()))
            .unwrap_or_default()
            .iter()
            .map(|n| n.id.to_string())
            .collect()
    }

    fn dest(parent: &str, index: usize) -> Destination {
        Destination {
            parent_id: parent.into(),
            index,
        }
    }

    #[test]
    fn index_past_end_is_clamped() {
        let mut s = store();
        s.move_node(&"a".into(), &dest("2", 99)).unwrap();
        assert_eq!(child_ids(&s, "2"), ["a"]);
        s.move_node(&"b".into(), &dest("1", usize::MAX)).unwrap();
        assert_eq!(child_ids(&s, "1"), ["c", "f", "b"]);
    }

    #[test]
    fn moving_later_in_same_parent_accounts_for_removal() {
        let mut s = store();
        // "after c" for a: c sits at 2, so the requested index is 3.
        s.move_node(&"a".into(), &dest("1", 3)).unwrap();
        assert_eq!(child_ids(&s, "1"), ["b", "c", "a", "f"]);

        // "before a" for c: a sits at 2.
        s.move_node(&"c".into(), &dest("1", 2)).unwrap();
        assert_eq!(child_ids(&s, "1"), ["b", "c", "a", "f"]);
    }

    #[test]
    fn moving_earlier_in_same_parent() {
        let mut s = store();
        s.move_node(&"c".into(), &dest("1", 0)).unwrap();
        assert_eq!(child_ids(&s, "1"), ["c", "a", "b", "f"]);
    }

    #[test]
    fn nested_moves_find_source_and_parent_in_place() {
        let mut s = MemoryBookmarkStore::new(vec![Node::folder("1", "Bar").children([
            Node::folder("f", "F").children([
                Node::link("x", "X", "https://x"),
                Node::folder("g", "G").children([
                    Node::link("y", "Y", "https://y"),
                    Node::link("z", "Z", "https://z"),
                ]),
            ]),
        ])]);

        // Later within a nested parent still shifts by one.
        s.move_node(&"y".into(), &dest("g", 2)).unwrap();
        assert_eq!(child_ids(&s, "g"), ["z", "y"]);

        s.move_node(&"z".into(), &dest("1", 0)).unwrap();
        assert_eq!(child_ids(&s, "1"), ["z", "f"]);
        assert_eq!(child_ids(&s, "g"), ["y"]);

        assert_eq!(
            s.move_node(&"f".into(), &dest("g", 0)),
            Err(StoreError::WouldCreateCycle {
                node: "f".into(),
                parent: "g".into(),
            })
        );
        assert_eq!(
            s.move_node(&"g".into(), &dest("g", 0)),
            Err(StoreError::WouldCreateCycle {
                node: "g".into(),
                parent: "g".into(),
            })
        );
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn rejects_invalid_moves_without_notifying() {
        let fired = Rc::new(Cell::new(0));
        let mut s = store();
        let counter = Rc::clone(&fired);
        s.subscribe(Box::new(move || counter.set(counter.get() + 1)));

        assert_eq!(
            s.move_node(&"zz".into(), &dest("1", 0)),
            Err(StoreError::UnknownNode("zz".into()))
        );
        assert_eq!(
            s.move_node(&"a".into(), &dest("zz", 0)),
            Err(StoreError::UnknownParent("zz".into()))
        );
        assert_eq!(
            s.move_node(&"a".into(), &dest("b", 0)),
            Err(StoreError::NotAFolder("b".into()))
        );
        assert!(matches!(
            s.move_node(&"1".into(), &dest("f", 0)),
            Err(StoreError::WouldCreateCycle { .. })
        ));
        assert_eq!(fired.get(), 0);
        assert_eq!(s.revision(), 0);

        s.move_node(&"a".into(), &dest("f", 0)).unwrap();
        assert_eq!(fired.get(), 1);
        assert_eq!(s.revision(), 1);
    }

    #[test]
    fn error_messages_name_the_node() {
        let err = StoreError::WouldCreateCycle {
            node: "f".into(),
            parent: "g".into(),
        };
        assert_eq!(err.to_string(), "moving f into g would create a cycle");
    }
}
