use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use egui::{Id, Pos2};

use crate::store::BookmarkStore;
use crate::tree::{BookmarkTree, NodeId, TreeModel};

mod debug;
mod destination;
mod dispatch;
mod geometry;
mod options;
mod session;
mod suspension;
mod types;
mod zone;


pub use destination::{NoOpReason, Resolution, TargetSlot, reject_descendant_drop, resolve};
pub use dispatch::{DropOutcome, IgnoreReason};
pub use options::{BarLeafZones, ReorderOptions};
pub use session::{
    DragSessionStore, KeepOpenToken, SessionSnapshot, SharedDragSession, SubscriptionId,
};
pub use suspension::SuspensionState;
pub use types::{
    Axis, Destination, DragOverItem, DraggedItem, DropEventId, DropSurface, DropTarget, FloatingId,
    SurfaceKind, Zone,
};
pub use zone::{
    Classification, ElementContainment, ZoneInput, accepts_inside, classify, is_real_leave,
};

/// Drag-and-drop reordering for a bookmark hierarchy shown across several surfaces (top bar,
/// tree view, floating folder popovers).
///
/// Hosts forward the pointer lifecycle (`drag_start`, `drag_over`, `drag_leave`, `drop`,
/// `drag_end`) from every draggable element. The engine classifies the hovered zone, resolves the
/// destination, and sends a single move request to the [`BookmarkStore`]. The visible tree only
/// changes once the store reports a change and the snapshot is re-fetched.
///
/// The panel auto-hide timer should poll [`Self::is_suspended`], and popovers
/// [`Self::keeps_open`].
pub struct ReorderEngine<S> {
    pub options: ReorderOptions,

    store: S,
    model: TreeModel,
    session: SharedDragSession,
    tree_dirty: Rc<Cell<bool>>,

    debug_log: VecDeque<String>,
    debug_event: u64,
}

impl<S: BookmarkStore> ReorderEngine<S> {
    pub fn new(store: S) -> Self {
        Self::new_with_options(store, ReorderOptions::default())
    }

    pub fn new_with_options(store: S, options: ReorderOptions) -> Self {
        let session = DragSessionStore::shared(options.suspension_grace);
        Self::new_with_session(store, options, session)
    }

    /// Build an engine over an existing session store, e.g. one shared with another engine that
    /// serves a different region of the same page.
    pub fn new_with_session(
        mut store: S,
        options: ReorderOptions,
        session: SharedDragSession,
    ) -> Self {
        let tree_dirty = Rc::new(Cell::new(false));
        let flag = Rc::clone(&tree_dirty);
        store.subscribe(Box::new(move || flag.set(true)));
        let model = TreeModel::new(store.snapshot());

        Self {
            options,
            store,
            model,
            session,
            tree_dirty,
            debug_log: VecDeque::new(),
            debug_event: 0,
        }
    }

    pub fn tree(&self) -> &BookmarkTree {
        self.model.snapshot()
    }

    pub fn tree_revision(&self) -> u64 {
        self.model.revision()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The session store, for views that subscribe to hover/drag changes.
    pub fn session(&self) -> SharedDragSession {
        Rc::clone(&self.session)
    }

    /// Surface for the bookmarks bar, rooted at [`ReorderOptions::bar_root_id`].
    pub fn bar_surface(&self) -> DropSurface {
        DropSurface::bar(self.options.bar_root_id.clone())
    }

    /// Surface for the tree view of the "other bookmarks" region.
    pub fn tree_surface(&self) -> DropSurface {
        DropSurface::tree(self.options.other_root_id.clone())
    }

    /// Surface for the rows of popover `floating`, which lists the children of `folder`.
    pub fn popover_surface(&self, folder: &NodeId, floating: FloatingId) -> DropSurface {
        DropSurface::popover(folder.clone(), floating)
    }

    /// Start dragging `node`. Returns `false` if the node is unknown or a drag is already active.
    pub fn drag_start(&mut self, node: &NodeId, surface: &DropSurface) -> bool {
        self.debug_event = self.debug_event.wrapping_add(1);

        let tree = self.model.snapshot();
        let (Some(found), Some(location)) = (tree.get(node), tree.location(node)) else {
            log::debug!("drag start on unknown node {node}");
            return false;
        };

        let item = DraggedItem {
            node: found.clone(),
            parent_id: location.parent_id.unwrap_or_else(|| surface.root_id.clone()),
            index: location.index,
            is_from_floating_view: surface.floating.is_some(),
            floating: surface.floating,
        };

        let started = self.session.borrow_mut().begin_drag(item);
        if started {
            self.debug_log_event(format!(
                "drag_start node={node} surface={:?} floating={:?}",
                surface.kind, surface.floating
            ));
        }
        started
    }

    /// Pointer moved over `target`. Returns the zone under the pointer, or `None` without an
    /// active drag.
    pub fn drag_over(
        &mut self,
        target: &DropTarget,
        surface: &DropSurface,
        pointer: Pos2,
    ) -> Option<Zone> {
        if !self.session.borrow().is_dragging() {
            return None;
        }

        let classification = self.classify_target(target, surface, pointer);
        let item = DragOverItem {
            node: target.node.clone(),
            parent_id: target
                .parent_id
                .clone()
                .unwrap_or_else(|| surface.root_id.clone()),
            index: target.index,
            zone: classification.zone,
            pointer_ratio: classification.ratio,
            element: target.element,
        };

        if self.session.borrow_mut().set_hover_target(Some(item)) {
            self.debug_event = self.debug_event.wrapping_add(1);
            self.debug_log_event(format!(
                "drag_over node={} zone={:?} ratio={:.2}",
                target.node.id, classification.zone, classification.ratio
            ));
        }
        Some(classification.zone)
    }

    /// Pointer left `target`'s element, now over `related` (if anything).
    ///
    /// Returns `true` if the hover slot was cleared.
    pub fn drag_leave(
        &mut self,
        target: &DropTarget,
        related: Option<Id>,
        containment: &dyn ElementContainment,
    ) -> bool {
        if !is_real_leave(target.element, related, containment) {
            return false;
        }
        self.session.borrow_mut().clear_hover_for(&target.node.id)
    }

    /// A drop landed on `target`. Only the first handler for a given `event` acts on it; nested
    /// handlers should call this innermost-first.
    pub fn drop(
        &mut self,
        event: DropEventId,
        target: &DropTarget,
        surface: &DropSurface,
        pointer: Pos2,
        now: Instant,
    ) -> DropOutcome {
        self.debug_event = self.debug_event.wrapping_add(1);

        if !self.session.borrow_mut().take_drop_event(event) {
            self.debug_log_event(format!("drop ignored event={event:?} (already handled)"));
            return DropOutcome::Ignored(IgnoreReason::AlreadyHandled);
        }
        let source = self.session.borrow().dragged().map(|d| d.node.id.clone());
        let Some(source) = source else {
            self.debug_log_event(format!("drop ignored event={event:?} (no active drag)"));
            return DropOutcome::Ignored(IgnoreReason::NoActiveDrag);
        };

        let zone = self.classify_target(target, surface, pointer).zone;
        let slot = TargetSlot {
            node: &target.node,
            parent_id: target.parent_id.as_ref(),
            index: target.index,
        };
        let mut resolution = resolve(&source, slot, zone, &surface.root_id);
        if self.options.reject_descendant_drops {
            resolution = reject_descendant_drop(resolution, &source, self.model.snapshot());
        }

        let outcome = match resolution {
            Resolution::Move(destination) => {
                dispatch::dispatch_move(&mut self.store, &source, destination)
            }
            Resolution::NoOp(reason) => {
                log::debug!("drop of {source} on {} ignored: {reason:?}", target.node.id);
                DropOutcome::Ignored(IgnoreReason::NoOp(reason))
            }
        };

        self.debug_log_event(format!(
            "drop event={event:?} source={source} target={} zone={zone:?} outcome={outcome:?}",
            target.node.id
        ));
        self.session.borrow_mut().end_drag_owned(&source, now);
        outcome
    }

    /// The drag gesture on `node` finished, with or without a drop. Only the owner of the active
    /// drag clears it; anything else is a stale event and is ignored.
    pub fn drag_end(&mut self, node: &NodeId, now: Instant) -> bool {
        let ended = self.session.borrow_mut().end_drag_owned(node, now);
        if ended {
            self.debug_event = self.debug_event.wrapping_add(1);
            self.debug_log_event(format!("drag_end node={node}"));
        }
        ended
    }

    /// A popover entered or left its own edit mode.
    pub fn set_edit_mode(&mut self, floating: FloatingId, editing: bool) {
        if self.session.borrow_mut().set_edit_mode(floating, editing) {
            self.debug_event = self.debug_event.wrapping_add(1);
            self.debug_log_event(format!("edit_mode floating={floating} editing={editing}"));
        }
    }

    /// `true` while a drag or popover edit mode is active, or within the grace window after a drag.
    pub fn is_suspended(&self, now: Instant) -> bool {
        self.session.borrow().is_suspended(now)
    }

    pub fn suspension_state(&self, now: Instant) -> SuspensionState {
        self.session.borrow().suspension_state(now)
    }

    /// Whether popover `floating` must stay open regardless of pointer position.
    pub fn keeps_open(&self, floating: FloatingId) -> bool {
        self.session.borrow().keeps_open(floating)
    }

    /// Re-fetch the whole tree from the store.
    pub fn on_tree_changed(&mut self) {
        self.debug_event = self.debug_event.wrapping_add(1);
        self.tree_dirty.set(false);
        self.model.replace(self.store.snapshot());
        self.debug_log_event(format!("tree refreshed revision={}", self.model.revision()));
        self.debug_check_integrity();
    }

    /// Housekeeping for the host's frame/timer callback: refreshes the tree after a store change
    /// notification and retires an elapsed grace window.
    ///
    /// Returns `true` if the tree snapshot was replaced.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.session.borrow_mut().expire_suspension(now) {
            self.debug_event = self.debug_event.wrapping_add(1);
            self.debug_log_event("suspension grace elapsed");
        }
        if self.tree_dirty.get() {
            self.on_tree_changed();
            return true;
        }
        false
    }

    fn classify_target(
        &self,
        target: &DropTarget,
        surface: &DropSurface,
        pointer: Pos2,
    ) -> Classification {
        classify(
            ZoneInput {
                pointer,
                rect: target.rect,
                surface: surface.kind,
                is_folder: target.node.is_folder(),
                expanded: target.expanded,
            },
            &self.options,
        )
    }
}

impl<S> std::fmt::Debug for ReorderEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderEngine")
            .field("options", &self.options)
            .field("tree_revision", &self.model.revision())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
