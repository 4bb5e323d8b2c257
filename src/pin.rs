use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use emath::Pos2;
use serde::{Deserialize, Serialize};

use crate::{
    events::{Event, HandlerId},
    state::WireState,
    theme::WireTheme,
    RwLock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinId(pub usize);

impl Display for PinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pin {}", self.0)
    }
}

/// Which way a signal flows through the pin, seen from its circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Consumes a signal: the target end of a wire.
    Inside,
    /// Drives a signal: the source end of a wire.
    Outside,
}

impl PinDirection {
    pub fn is_source(self) -> bool {
        matches!(self, Self::Outside)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Deleted,
    Moved,
    StateChanged,
    ThemeChanged,
}

/// A terminal on a circuit.
///
/// Pins are shared between every wire attached to them. Wires only read from
/// pins and react to their notifications; they never mutate them.
///
/// Notifications are broadcast synchronously after the new value is stored,
/// with no pin lock held, so handlers may freely read the pin back.
pub struct Pin {
    id: PinId,
    dir: PinDirection,
    pos: RwLock<Pos2>,
    state: RwLock<WireState>,
    theme: RwLock<Arc<WireTheme>>,
    deleted: AtomicBool,

    deleted_event: Event<PinId>,
    moved_event: Event<Pos2>,
    state_event: Event<WireState>,
    theme_event: Event<Arc<WireTheme>>,
}

impl Pin {
    pub fn new(id: PinId, dir: PinDirection, pos: Pos2, theme: Arc<WireTheme>) -> Arc<Self> {
        Arc::new(Self {
            id,
            dir,
            pos: RwLock::new(pos),
            state: RwLock::new(WireState::None),
            theme: RwLock::new(theme),
            deleted: AtomicBool::new(false),

            deleted_event: Event::new(),
            moved_event: Event::new(),
            state_event: Event::new(),
            theme_event: Event::new(),
        })
    }

    pub fn id(&self) -> PinId {
        self.id
    }

    pub fn direction(&self) -> PinDirection {
        self.dir
    }

    pub fn is_source(&self) -> bool {
        self.dir.is_source()
    }

    pub fn position(&self) -> Pos2 {
        *self.pos.read()
    }

    pub fn state(&self) -> WireState {
        *self.state.read()
    }

    pub fn theme(&self) -> Arc<WireTheme> {
        self.theme.read().clone()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    pub fn set_position(&self, pos: Pos2) {
        if self.store_position(pos) {
            self.moved_event.emit(&pos);
        }
    }

    /// Moves several pins at once. Every position is stored before the first
    /// moved notification goes out, so a wire between two of these pins sees
    /// both of its ends moved.
    pub fn set_positions(moves: &[(Arc<Pin>, Pos2)]) {
        let moved: Vec<_> = moves
            .iter()
            .filter(|(pin, pos)| pin.store_position(*pos))
            .collect();

        for (pin, pos) in moved {
            pin.moved_event.emit(pos);
        }
    }

    fn store_position(&self, pos: Pos2) -> bool {
        if self.is_deleted() {
            return false;
        }
        let mut current = self.pos.write();
        if *current == pos {
            return false;
        }
        *current = pos;
        true
    }

    pub fn set_state(&self, state: WireState) {
        if self.is_deleted() {
            return;
        }
        {
            let mut current = self.state.write();
            if *current == state {
                return;
            }
            *current = state;
        }
        self.state_event.emit(&state);
    }

    pub fn set_theme(&self, theme: Arc<WireTheme>) {
        if self.is_deleted() {
            return;
        }
        {
            let mut current = self.theme.write();
            if Arc::ptr_eq(&*current, &theme) || **current == *theme {
                return;
            }
            *current = theme.clone();
        }
        self.theme_event.emit(&theme);
    }

    /// Broadcasts the deleted notification. Only the first call does anything.
    pub fn delete(&self) {
        if self.deleted.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!("deleting {}", self.id);
        self.deleted_event.emit(&self.id);
    }

    pub fn on_deleted(
        self: &Arc<Self>,
        handler: impl Fn(&PinId) + Send + Sync + 'static,
    ) -> PinSubscription {
        let id = self.deleted_event.subscribe(handler);
        self.subscription(PinEvent::Deleted, id)
    }

    pub fn on_moved(
        self: &Arc<Self>,
        handler: impl Fn(&Pos2) + Send + Sync + 'static,
    ) -> PinSubscription {
        let id = self.moved_event.subscribe(handler);
        self.subscription(PinEvent::Moved, id)
    }

    pub fn on_state_changed(
        self: &Arc<Self>,
        handler: impl Fn(&WireState) + Send + Sync + 'static,
    ) -> PinSubscription {
        let id = self.state_event.subscribe(handler);
        self.subscription(PinEvent::StateChanged, id)
    }

    pub fn on_theme_changed(
        self: &Arc<Self>,
        handler: impl Fn(&Arc<WireTheme>) + Send + Sync + 'static,
    ) -> PinSubscription {
        let id = self.theme_event.subscribe(handler);
        self.subscription(PinEvent::ThemeChanged, id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.deleted_event.len()
            + self.moved_event.len()
            + self.state_event.len()
            + self.theme_event.len()
    }

    fn subscription(self: &Arc<Self>, event: PinEvent, handler: HandlerId) -> PinSubscription {
        PinSubscription {
            pin: Arc::downgrade(self),
            event,
            handler,
        }
    }

    fn unsubscribe(&self, event: PinEvent, handler: HandlerId) -> bool {
        match event {
            PinEvent::Deleted => self.deleted_event.unsubscribe(handler),
            PinEvent::Moved => self.moved_event.unsubscribe(handler),
            PinEvent::StateChanged => self.state_event.unsubscribe(handler),
            PinEvent::ThemeChanged => self.theme_event.unsubscribe(handler),
        }
    }
}

impl std::fmt::Debug for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pin")
            .field("id", &self.id)
            .field("dir", &self.dir)
            .field("pos", &self.position())
            .field("state", &self.state())
            .field("deleted", &self.is_deleted())
            .finish()
    }
}

/// Handle to a registered pin handler. Dropping it does not unsubscribe;
/// call [`PinSubscription::release`].
#[derive(Debug)]
pub struct PinSubscription {
    pin: Weak<Pin>,
    event: PinEvent,
    handler: HandlerId,
}

impl PinSubscription {
    pub fn event(&self) -> PinEvent {
        self.event
    }

    /// Returns false if the handler was already gone.
    pub fn release(self) -> bool {
        match self.pin.upgrade() {
            Some(pin) => pin.unsubscribe(self.event, self.handler),
            None => false,
        }
    }
}
