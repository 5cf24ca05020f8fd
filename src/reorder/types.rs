use egui::Rect;

use crate::tree::{Node, NodeId};

/// Identifies a floating folder popover.
pub type FloatingId = u64;

/// Where a drop lands relative to the hovered element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Zone {
    Before,
    Inside,
    After,
}

/// The UI region a draggable or droppable element belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SurfaceKind {
    /// Horizontal top bar of buttons.
    Bar,
    /// Nested tree view with inline-expandable folders.
    Tree,
    /// Rows of a floating folder popover.
    Popover,
}

impl SurfaceKind {
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            Self::Bar => Axis::Horizontal,
            Self::Tree | Self::Popover => Axis::Vertical,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// A droppable surface: its kind, the root container id its top-level nodes belong to, and the
/// popover that hosts it (if any).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropSurface {
    pub kind: SurfaceKind,
    pub root_id: NodeId,
    pub floating: Option<FloatingId>,
}

impl DropSurface {
    pub fn bar(root_id: impl Into<NodeId>) -> Self {
        Self {
            kind: SurfaceKind::Bar,
            root_id: root_id.into(),
            floating: None,
        }
    }

    pub fn tree(root_id: impl Into<NodeId>) -> Self {
        Self {
            kind: SurfaceKind::Tree,
            root_id: root_id.into(),
            floating: None,
        }
    }

    pub fn popover(root_id: impl Into<NodeId>, floating: FloatingId) -> Self {
        Self {
            kind: SurfaceKind::Popover,
            root_id: root_id.into(),
            floating: Some(floating),
        }
    }
}

/// The node being dragged, captured at drag start.
#[derive(Clone, Debug, PartialEq)]
pub struct DraggedItem {
    pub node: Node,
    pub parent_id: NodeId,
    pub index: usize,
    pub is_from_floating_view: bool,
    /// The popover the drag started in, when `is_from_floating_view` is set.
    pub floating: Option<FloatingId>,
}

/// The element currently under the pointer during a drag.
#[derive(Clone, Debug, PartialEq)]
pub struct DragOverItem {
    pub node: Node,
    pub parent_id: NodeId,
    pub index: usize,
    pub zone: Zone,
    pub pointer_ratio: f32,
    /// The rendered element, so the same node shown on two surfaces stays distinct.
    pub element: egui::Id,
}

impl DragOverItem {
    /// Same element and same zone: a rewrite would only change the ratio.
    pub(super) fn same_target(&self, other: &Self) -> bool {
        self.element == other.element
            && self.node.id == other.node.id
            && self.parent_id == other.parent_id
            && self.index == other.index
            && self.zone == other.zone
    }
}

/// A resolved drop location: position `index` among the current children of `parent_id`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Destination {
    pub parent_id: NodeId,
    pub index: usize,
}

/// An element a pointer event was delivered to.
#[derive(Clone, Debug)]
pub struct DropTarget {
    pub node: Node,
    /// `None` for a top-level node of its surface; resolved against the surface root.
    pub parent_id: Option<NodeId>,
    pub index: usize,
    pub rect: Rect,
    /// Folder children are currently rendered inline below it (tree view only).
    pub expanded: bool,
    pub element: egui::Id,
}

/// Serial number the host assigns to each pointer drop event. Nested handlers receiving the
/// same event see the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DropEventId(pub u64);
