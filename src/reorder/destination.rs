use crate::tree::{BookmarkTree, Node, NodeId};

use super::types::{Destination, Zone};

/// Why a drop resolved to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoOpReason {
    /// The node was dropped onto itself.
    SelfDrop,
    /// The destination parent is the dragged folder or one of its descendants.
    IntoDescendant,
    /// `Inside` on a bookmark, which cannot hold children.
    InsideLeaf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Move(Destination),
    NoOp(NoOpReason),
}

impl Resolution {
    pub fn destination(&self) -> Option<&Destination> {
        match self {
            Self::Move(destination) => Some(destination),
            Self::NoOp(_) => None,
        }
    }
}

/// The hovered node and where it sits.
#[derive(Clone, Copy, Debug)]
pub struct TargetSlot<'a> {
    pub node: &'a Node,
    /// `None` for a top-level node; `default_root` is used instead.
    pub parent_id: Option<&'a NodeId>,
    pub index: usize,
}

/// Turn a `(source, target, zone)` triple into a destination.
///
/// The index is not checked against the parent's child count; the bookmark store clamps it.
pub fn resolve(
    source: &NodeId,
    target: TargetSlot<'_>,
    zone: Zone,
    default_root: &NodeId,
) -> Resolution {
    if *source == target.node.id {
        return Resolution::NoOp(NoOpReason::SelfDrop);
    }

    let parent_id = target.parent_id.unwrap_or(default_root).clone();
    match zone {
        Zone::Before => Resolution::Move(Destination {
            parent_id,
            index: target.index,
        }),
        Zone::After => Resolution::Move(Destination {
            parent_id,
            index: target.index.saturating_add(1),
        }),
        Zone::Inside => {
            if !target.node.is_folder() {
                return Resolution::NoOp(NoOpReason::InsideLeaf);
            }
            Resolution::Move(Destination {
                parent_id: target.node.id.clone(),
                index: 0,
            })
        }
    }
}

/// Drop destinations that would make `source` an ancestor of itself.
pub fn reject_descendant_drop(
    resolution: Resolution,
    source: &NodeId,
    tree: &BookmarkTree,
) -> Resolution {
    match resolution {
        Resolution::Move(destination)
            if tree.is_same_or_descendant(source, &destination.parent_id) =>
        {
            Resolution::NoOp(NoOpReason::IntoDescendant)
        }
        other => other,
    }
}
