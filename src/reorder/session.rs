use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::tree::NodeId;

use super::suspension::{SuspensionSignal, SuspensionState};
use super::types::{DragOverItem, DraggedItem, DropEventId, FloatingId};

/// Read-only view handed to subscribers.
#[derive(Clone, Copy, Debug)]
pub struct SessionSnapshot<'a> {
    pub dragged: Option<&'a DraggedItem>,
    pub drag_over: Option<&'a DragOverItem>,
}

/// Handle returned by [`DragSessionStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Issued while a drag that started in a floating popover is in progress. The popover holding a
/// matching token must stay open even when the pointer leaves its bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeepOpenToken {
    pub floating: FloatingId,
    pub session: u64,
}

type Listener = Box<dyn FnMut(&SessionSnapshot<'_>)>;

/// Store shared by every view that renders a draggable or droppable element.
pub type SharedDragSession = Rc<RefCell<DragSessionStore>>;

/// The single drag slot and single hover slot, plus the suspension signal they drive.
///
/// Listeners are called synchronously after each state change and must not call back into the
/// store (it is already borrowed when shared through [`SharedDragSession`]).
pub struct DragSessionStore {
    next_session_id: u64,
    session_id: Option<u64>,
    dragged: Option<DraggedItem>,
    drag_over: Option<DragOverItem>,
    last_drop_event: Option<DropEventId>,
    suspension: SuspensionSignal,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for DragSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragSessionStore")
            .field("session_id", &self.session_id)
            .field("dragged", &self.dragged)
            .field("drag_over", &self.drag_over)
            .field("last_drop_event", &self.last_drop_event)
            .field("suspension", &self.suspension)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DragSessionStore {
    pub fn new(suspension_grace: Duration) -> Self {
        Self {
            next_session_id: 1,
            session_id: None,
            dragged: None,
            drag_over: None,
            last_drop_event: None,
            suspension: SuspensionSignal::new(suspension_grace),
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn shared(suspension_grace: Duration) -> SharedDragSession {
        Rc::new(RefCell::new(Self::new(suspension_grace)))
    }

    pub fn dragged(&self) -> Option<&DraggedItem> {
        self.dragged.as_ref()
    }

    pub fn drag_over(&self) -> Option<&DragOverItem> {
        self.drag_over.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }

    /// Id of the active drag session, if any.
    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    /// Install `item` as the active drag. A no-op returning `false` if a drag is already active.
    pub fn begin_drag(&mut self, item: DraggedItem) -> bool {
        if let Some(active) = &self.dragged {
            log::debug!(
                "drag start ignored: {} already dragging (requested {})",
                active.node.id,
                item.node.id
            );
            return false;
        }

        let id = self.next_session_id.max(1);
        self.next_session_id = id.saturating_add(1);
        log::debug!(
            "session START id={id} node={} parent={} index={} floating={:?}",
            item.node.id,
            item.parent_id,
            item.index,
            item.floating
        );

        self.session_id = Some(id);
        self.dragged = Some(item);
        self.drag_over = None;
        // Drop event ids are only unique within one drag.
        self.last_drop_event = None;
        self.suspension.drag_started();
        self.notify();
        true
    }

    /// Replace the hover slot. Returns `false` (and notifies nobody) when the new value targets
    /// the same element and zone as the current one.
    pub fn set_hover_target(&mut self, item: Option<DragOverItem>) -> bool {
        let unchanged = match (&self.drag_over, &item) {
            (None, None) => true,
            (Some(current), Some(new)) => current.same_target(new),
            _ => false,
        };
        if unchanged {
            return false;
        }

        if let Some(new) = &item {
            log::trace!(
                "hover {} zone={:?} ratio={:.2}",
                new.node.id,
                new.zone,
                new.pointer_ratio
            );
        }
        self.drag_over = item;
        self.notify();
        true
    }

    /// Clear the hover slot only if it currently points at `node`.
    pub fn clear_hover_for(&mut self, node: &NodeId) -> bool {
        if self.drag_over.as_ref().is_some_and(|over| over.node.id == *node) {
            return self.set_hover_target(None);
        }
        false
    }

    /// Clear both slots. Safe to call with no active drag.
    pub fn end_drag(&mut self, now: Instant) {
        if self.dragged.is_none() && self.drag_over.is_none() {
            return;
        }
        if let Some(id) = self.session_id.take() {
            log::debug!("session END id={id}");
        }
        self.dragged = None;
        self.drag_over = None;
        self.suspension.drag_ended(now);
        self.notify();
    }

    /// Clear the session only if `owner` is the node being dragged.
    ///
    /// A late `dragend` from an element whose drag was already replaced must not tear down the
    /// newer session.
    pub fn end_drag_owned(&mut self, owner: &NodeId, now: Instant) -> bool {
        match &self.dragged {
            Some(dragged) if dragged.node.id == *owner => {
                self.end_drag(now);
                true
            }
            Some(dragged) => {
                log::debug!(
                    "stale drag end from {owner} ignored (active {})",
                    dragged.node.id
                );
                false
            }
            None => false,
        }
    }

    /// First caller for a given drop event wins; every later caller for the same event gets
    /// `false`. The latch resets when the next drag begins.
    pub fn take_drop_event(&mut self, event: DropEventId) -> bool {
        if self.last_drop_event == Some(event) {
            log::trace!("drop event {event:?} already handled");
            return false;
        }
        self.last_drop_event = Some(event);
        true
    }

    pub fn keep_open_token(&self) -> Option<KeepOpenToken> {
        let dragged = self.dragged.as_ref()?;
        if !dragged.is_from_floating_view {
            return None;
        }
        Some(KeepOpenToken {
            floating: dragged.floating?,
            session: self.session_id?,
        })
    }

    /// Whether the popover `floating` must ignore pointer-leave and stay open.
    pub fn keeps_open(&self, floating: FloatingId) -> bool {
        self.keep_open_token()
            .is_some_and(|token| token.floating == floating)
            || self.suspension.is_editing(floating)
    }

    /// Enter or leave a popover's own edit mode. Returns `true` if anything changed.
    pub fn set_edit_mode(&mut self, floating: FloatingId, editing: bool) -> bool {
        let changed = self.suspension.set_edit_mode(floating, editing);
        if changed {
            log::debug!("popover {floating} edit mode={editing}");
        }
        changed
    }

    pub fn suspension_state(&self, now: Instant) -> SuspensionState {
        self.suspension.state(now)
    }

    pub fn is_suspended(&self, now: Instant) -> bool {
        self.suspension.is_suspended(now)
    }

    pub fn suspension_deadline(&self) -> Option<Instant> {
        self.suspension.grace_deadline()
    }

    /// Drop an elapsed grace deadline. Returns `true` on the Grace → Idle edge.
    pub fn expire_suspension(&mut self, now: Instant) -> bool {
        let expired = self.suspension.expire(now);
        if expired && !self.suspension.is_suspended(now) {
            log::trace!("suspension released");
        }
        expired
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&SessionSnapshot<'_>) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let snapshot = SessionSnapshot {
            dragged: self.dragged.as_ref(),
            drag_over: self.drag_over.as_ref(),
        };
        for (_, listener) in &mut self.listeners {
            listener(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reorder::types::Zone;
    use crate::tree::Node;
    use std::cell::Cell;

    const GRACE: Duration = Duration::from_millis(300);

    fn dragged(id: &str, floating: Option<FloatingId>) -> DraggedItem {
        DraggedItem {
            node: Node::link(id, id, "https://x"),
            parent_id: "1".into(),
            index: 0,
            is_from_floating_view: floating.is_some(),
            floating,
        }
    }

    fn over(id: &str, zone: Zone, ratio: f32) -> DragOverItem {
        DragOverItem {
            node: Node::folder(id, id),
            parent_id: "1".into(),
            index: 1,
            zone,
            pointer_ratio: ratio,
            element: egui::Id::new(("row", id)),
        }
    }

    #[test]
    fn second_begin_drag_keeps_first_item() {
        let mut store = DragSessionStore::new(GRACE);
        assert!(store.begin_drag(dragged("a", None)));
        assert!(!store.begin_drag(dragged("b", None)));
        assert_eq!(store.dragged().map(|d| d.node.id.as_str()), Some("a"));
    }

    #[test]
    fn end_drag_is_idempotent() {
        let now = Instant::now();
        let mut store = DragSessionStore::new(GRACE);
        store.end_drag(now);
        assert!(!store.is_dragging());
        assert!(!store.is_suspended(now));

        store.begin_drag(dragged("a", None));
        store.set_hover_target(Some(over("f", Zone::Inside, 0.5)));
        store.end_drag(now);
        store.end_drag(now);
        assert!(store.dragged().is_none());
        assert!(store.drag_over().is_none());
        assert_eq!(store.session_id(), None);
    }

    #[test]
    fn only_owner_may_end_drag() {
        let now = Instant::now();
        let mut store = DragSessionStore::new(GRACE);
        store.begin_drag(dragged("a", None));
        assert!(!store.end_drag_owned(&"b".into(), now));
        assert!(store.is_dragging());
        assert!(store.end_drag_owned(&"a".into(), now));
        assert!(!store.end_drag_owned(&"a".into(), now));
    }

    #[test]
    fn redundant_hover_writes_do_not_notify() {
        let calls = Rc::new(Cell::new(0));
        let mut store = DragSessionStore::new(GRACE);
        let counter = Rc::clone(&calls);
        store.subscribe(move |_| counter.set(counter.get() + 1));

        store.begin_drag(dragged("a", None));
        assert_eq!(calls.get(), 1);

        assert!(store.set_hover_target(Some(over("f", Zone::Before, 0.1))));
        assert!(!store.set_hover_target(Some(over("f", Zone::Before, 0.2))));
        assert_eq!(calls.get(), 2);

        assert!(store.set_hover_target(Some(over("f", Zone::Inside, 0.5))));
        assert_eq!(calls.get(), 3);
        assert_eq!(store.drag_over().map(|o| o.zone), Some(Zone::Inside));

        assert!(store.set_hover_target(None));
        assert!(!store.set_hover_target(None));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn same_node_on_another_element_is_a_new_hover() {
        let mut store = DragSessionStore::new(GRACE);
        store.begin_drag(dragged("a", None));
        assert!(store.set_hover_target(Some(over("f", Zone::Before, 0.1))));

        let mut in_popover = over("f", Zone::Before, 0.3);
        in_popover.element = egui::Id::new(("popover-row", "f"));
        assert!(store.set_hover_target(Some(in_popover)));
        assert_eq!(store.drag_over().map(|o| o.pointer_ratio), Some(0.3));
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let calls = Rc::new(Cell::new(0));
        let mut store = DragSessionStore::new(GRACE);
        let counter = Rc::clone(&calls);
        let id = store.subscribe(move |_| counter.set(counter.get() + 1));
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.begin_drag(dragged("a", None));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn clear_hover_only_for_matching_node() {
        let mut store = DragSessionStore::new(GRACE);
        store.begin_drag(dragged("a", None));
        store.set_hover_target(Some(over("f", Zone::After, 0.9)));
        assert!(!store.clear_hover_for(&"g".into()));
        assert!(store.drag_over().is_some());
        assert!(store.clear_hover_for(&"f".into()));
        assert!(store.drag_over().is_none());
    }

    #[test]
    fn drop_event_is_taken_once() {
        let mut store = DragSessionStore::new(GRACE);
        assert!(store.take_drop_event(DropEventId(4)));
        assert!(!store.take_drop_event(DropEventId(4)));
        assert!(store.take_drop_event(DropEventId(5)));
    }

    #[test]
    fn drop_event_latch_resets_for_each_drag() {
        let now = Instant::now();
        let mut store = DragSessionStore::new(GRACE);
        store.begin_drag(dragged("a", None));
        assert!(store.take_drop_event(DropEventId(1)));
        store.end_drag(now);
        assert!(!store.take_drop_event(DropEventId(1)));

        store.begin_drag(dragged("b", None));
        assert!(store.take_drop_event(DropEventId(1)));
        assert!(!store.take_drop_event(DropEventId(1)));
    }

    #[test]
    fn keep_open_token_follows_floating_drag() {
        let now = Instant::now();
        let mut store = DragSessionStore::new(GRACE);
        store.begin_drag(dragged("a", None));
        assert_eq!(store.keep_open_token(), None);
        store.end_drag(now);

        store.begin_drag(dragged("b", Some(9)));
        let token = store.keep_open_token().expect("floating drag issues a token");
        assert_eq!(token.floating, 9);
        assert_eq!(Some(token.session), store.session_id());
        assert!(store.keeps_open(9));
        assert!(!store.keeps_open(3));

        store.end_drag(now);
        assert!(!store.keeps_open(9));
        assert!(store.is_suspended(now));
    }

    #[test]
    fn edit_mode_keeps_its_popover_open() {
        let now = Instant::now();
        let mut store = DragSessionStore::new(GRACE);
        assert!(store.set_edit_mode(2, true));
        assert!(store.keeps_open(2));
        assert!(store.is_suspended(now));
        assert!(store.set_edit_mode(2, false));
        assert!(!store.is_suspended(now));
    }
}
