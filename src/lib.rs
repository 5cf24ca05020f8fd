#![forbid(unsafe_code)]

//! Drag-and-drop reordering for hierarchical bookmark sidebars.
//!
//! - [`tree`]: read-only snapshots of the bookmark hierarchy.
//! - [`store`]: the authoritative bookmark store seam, plus an in-memory implementation.
//! - [`reorder`]: zone classification, destination resolution, the shared drag session and the
//!   auto-hide suspension signal, tied together by [`ReorderEngine`].

pub mod reorder;
pub mod store;
pub mod tree;

pub use reorder::{
    Destination, DropOutcome, DropSurface, DropTarget, ReorderEngine, ReorderOptions, SurfaceKind,
    Zone,
};
pub use store::{BookmarkStore, MemoryBookmarkStore, StoreError};
pub use tree::{BookmarkTree, Node, NodeId, TreeModel};
