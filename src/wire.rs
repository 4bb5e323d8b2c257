use std::{
    fmt::Display,
    sync::{Arc, Weak},
};

use eframe::epaint::Color32;
use emath::Pos2;
use serde::{Deserialize, Serialize};

use crate::{
    error::WireError,
    events::{Event, HandlerId},
    ext::Pos2Ext,
    hitshape::HitShape,
    pin::{Pin, PinId, PinSubscription},
    render::PathRenderer,
    state::WireState,
    style::WireStyle,
    theme::WireTheme,
    RwLock,
};

/// Consecutive anchors closer than this (squared) are coalesced.
pub const MIN_POINT_DISTANCE_SQ: f32 = 0.01;

/// A pin counts as moved once it is further than this from its anchor.
pub const MOVE_THRESHOLD: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WireId(pub usize);

impl Display for WireId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireLifecycle {
    /// Being drawn by the user, not yet attached to its end pin.
    Drawing,
    Connected,
    /// Terminal.
    Deleted,
}

pub type WireRef = Arc<RwLock<Wire>>;

/// A connection between a source and a target pin along a user-editable path.
///
/// Anchors always run from the source to the target once connected. The first
/// and last anchors follow the pins as they move; interior anchors only change
/// through the editing methods.
///
/// Pin notifications lock the wire for writing, so don't move, restyle or
/// delete a connected pin while holding a lock on one of its wires.
pub struct Wire {
    id: WireId,
    this: Weak<RwLock<Wire>>,
    bus: bool,
    life: WireLifecycle,

    source: Option<Weak<Pin>>,
    target: Option<Weak<Pin>>,
    anchors: Vec<Pos2>,

    theme: Arc<WireTheme>,
    state: WireState,
    highlighted: bool,

    style: Arc<WireStyle>,
    renderer: Box<dyn PathRenderer>,
    hit_shape: Box<dyn HitShape>,

    subscriptions: Vec<PinSubscription>,
    deleted_event: Event<WireId>,
}

impl Wire {
    pub fn new(
        id: WireId,
        bus: bool,
        theme: Arc<WireTheme>,
        style: Arc<WireStyle>,
        renderer: Box<dyn PathRenderer>,
        hit_shape: Box<dyn HitShape>,
    ) -> WireRef {
        Arc::new_cyclic(|this| {
            let mut wire = Wire {
                id,
                this: this.clone(),
                bus,
                life: WireLifecycle::Drawing,

                source: None,
                target: None,
                anchors: vec![],

                theme,
                state: WireState::None,
                highlighted: false,

                style,
                renderer,
                hit_shape,

                subscriptions: vec![],
                deleted_event: Event::new(),
            };
            wire.hit_shape.set_enabled(false);
            wire.update_thickness();
            wire.apply_visuals();
            RwLock::new(wire)
        })
    }

    pub fn id(&self) -> WireId {
        self.id
    }

    pub fn is_bus(&self) -> bool {
        self.bus
    }

    pub fn lifecycle(&self) -> WireLifecycle {
        self.life
    }

    pub fn is_connected(&self) -> bool {
        self.life == WireLifecycle::Connected
    }

    pub fn is_deleted(&self) -> bool {
        self.life == WireLifecycle::Deleted
    }

    pub fn anchor_points(&self) -> &[Pos2] {
        &self.anchors
    }

    pub fn source_pin(&self) -> Option<Arc<Pin>> {
        self.source.as_ref()?.upgrade()
    }

    pub fn target_pin(&self) -> Option<Arc<Pin>> {
        self.target.as_ref()?.upgrade()
    }

    pub fn theme(&self) -> &Arc<WireTheme> {
        &self.theme
    }

    pub fn state(&self) -> WireState {
        self.state
    }

    pub fn colour(&self) -> Color32 {
        self.theme.colour(self.state)
    }

    pub fn depth(&self) -> f32 {
        self.style.depth(self.bus, self.state, self.theme.priority)
    }

    pub fn thickness(&self) -> f32 {
        self.style.thickness(self.bus, self.highlighted)
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn renderer(&self) -> &dyn PathRenderer {
        self.renderer.as_ref()
    }

    pub fn hit_shape(&self) -> &dyn HitShape {
        self.hit_shape.as_ref()
    }

    /// Registers a handler for the one-time deleted notification.
    ///
    /// The handler runs while the wire is locked; it gets the id and must
    /// not lock the wire again.
    pub fn on_deleted(&self, handler: impl Fn(&WireId) + Send + Sync + 'static) -> HandlerId {
        self.deleted_event.subscribe(handler)
    }

    pub fn remove_deleted_handler(&self, id: HandlerId) -> bool {
        self.deleted_event.unsubscribe(id)
    }

    /// Returns false if `p` was too close to the last anchor. A connected
    /// wire ends on its target pin and can't be extended.
    pub fn add_anchor_point(&mut self, p: Pos2) -> bool {
        if !self.check_alive("add_anchor_point") || !self.check_drawing("add_anchor_point") {
            return false;
        }
        if self
            .anchors
            .last()
            .is_some_and(|last| last.within_sq(p, MIN_POINT_DISTANCE_SQ))
        {
            return false;
        }
        self.anchors.push(p);
        self.refresh_path();
        true
    }

    /// Pops the last anchor while drawing. The originating anchor is never
    /// removed.
    pub fn remove_last_anchor_point(&mut self) -> bool {
        if !self.check_alive("remove_last_anchor_point")
            || !self.check_drawing("remove_last_anchor_point")
        {
            return false;
        }
        if self.anchors.len() <= self.min_anchor_count() {
            return false;
        }
        self.anchors.pop();
        self.refresh_path();
        true
    }

    /// Replaces every anchor. With `update_graphics` false the renderer and
    /// hit shape keep the old path until [`Wire::refresh_path`].
    ///
    /// On a connected wire the first and last points are put back on the
    /// pins.
    pub fn set_anchor_points(
        &mut self,
        points: impl Into<Vec<Pos2>>,
        update_graphics: bool,
    ) -> Result<(), WireError> {
        if !self.check_alive("set_anchor_points") {
            return Err(WireError::Deleted);
        }
        let points = points.into();
        if self.is_connected() && points.len() < 2 {
            return Err(WireError::NotEnoughPoints(points.len()));
        }
        self.anchors = points;
        self.pin_endpoints();
        if update_graphics {
            self.refresh_path();
        }
        Ok(())
    }

    /// Previews the path extended to `target` without storing it.
    pub fn draw_to_point(&mut self, target: Pos2) {
        if !self.check_alive("draw_to_point") {
            return;
        }
        if !self.check_drawing("draw_to_point") {
            return;
        }
        if self
            .anchors
            .last()
            .is_some_and(|last| last.within_sq(target, MIN_POINT_DISTANCE_SQ))
        {
            return;
        }

        let mut preview = Vec::with_capacity(self.anchors.len() + 1);
        preview.extend_from_slice(&self.anchors);
        preview.push(target);
        self.renderer.set_anchor_points(
            &preview,
            self.style.curve_amount,
            self.style.curve_resolution,
        );
    }

    /// Pushes the stored anchors to the renderer and, once connected, the
    /// hit shape.
    pub fn refresh_path(&mut self) {
        if self.is_deleted() {
            return;
        }
        self.renderer.set_anchor_points(
            &self.anchors,
            self.style.curve_amount,
            self.style.curve_resolution,
        );
        if self.is_connected() {
            self.hit_shape.set_points(&self.anchors);
        }
    }

    /// Binds the wire to its two pins. `from` is the pin the path was drawn
    /// from; if it turns out to be the target the anchors are reversed.
    pub fn connect(&mut self, from: &Arc<Pin>, to: &Arc<Pin>) -> Result<(), WireError> {
        match self.life {
            WireLifecycle::Deleted => return Err(WireError::Deleted),
            WireLifecycle::Connected => return Err(WireError::AlreadyConnected),
            WireLifecycle::Drawing => {}
        }
        if Arc::ptr_eq(from, to) {
            return Err(WireError::SamePin(from.id()));
        }
        for pin in [from, to] {
            if pin.is_deleted() {
                return Err(WireError::PinDeleted(pin.id()));
            }
        }
        if from.direction() == to.direction() {
            return Err(WireError::SameRole(from.direction()));
        }

        let (source, target) = if from.is_source() {
            (from, to)
        } else {
            (to, from)
        };

        if self.anchors.is_empty() {
            self.anchors.push(from.position());
        }
        if self.anchors.len() < 2 {
            self.anchors.push(to.position());
        }
        if !from.is_source() {
            self.anchors.reverse();
        }

        let mut subscriptions = Vec::with_capacity(7);
        for pin in [source, target] {
            subscriptions.push(pin.on_deleted(self.callback::<PinId>(|wire| wire.delete())));
            subscriptions.push(pin.on_moved(self.callback::<Pos2>(|wire| wire.resync_endpoints())));
            subscriptions.push(
                pin.on_theme_changed(self.callback::<Arc<WireTheme>>(|wire| wire.refresh_visuals())),
            );
        }
        subscriptions.push(
            source.on_state_changed(self.callback::<WireState>(|wire| wire.refresh_visuals())),
        );
        self.subscriptions.extend(subscriptions);

        self.source = Some(Arc::downgrade(source));
        self.target = Some(Arc::downgrade(target));
        self.life = WireLifecycle::Connected;
        self.pin_endpoints();

        self.hit_shape
            .set_edge_radius(self.style.base_thickness(self.bus) * 0.5);
        self.hit_shape.set_enabled(true);
        self.refresh_path();
        self.refresh_visuals();

        tracing::debug!(
            wire = self.id.0,
            source = source.id().0,
            target = target.id().0,
            "wire connected"
        );
        Ok(())
    }

    /// Moves the ends of the path to the current pin positions.
    ///
    /// If both pins moved the whole path is shifted by the source's offset,
    /// otherwise only the anchor of the pin that moved follows it.
    pub fn resync_endpoints(&mut self) {
        if !self.is_connected() || self.anchors.len() < 2 {
            return;
        }
        let source = unwrap_option_or_return!(self.source_pin());
        let target = unwrap_option_or_return!(self.target_pin());

        let last = self.anchors.len() - 1;
        let delta_source = source.position() - self.anchors[0];
        let delta_target = target.position() - self.anchors[last];

        let source_moved = delta_source.length() > MOVE_THRESHOLD;
        let target_moved = delta_target.length() > MOVE_THRESHOLD;

        match (source_moved, target_moved) {
            (true, true) => {
                for point in self.anchors.iter_mut() {
                    *point += delta_source;
                }
            }
            (true, false) => self.anchors[0] += delta_source,
            (false, true) => self.anchors[last] += delta_target,
            (false, false) => return,
        }
        self.refresh_path();
    }

    /// Re-reads theme and state from the source pin and updates colour and
    /// depth.
    pub fn refresh_visuals(&mut self) {
        if !self.is_connected() {
            return;
        }
        let source = unwrap_option_or_return!(self.source_pin());
        self.theme = source.theme();
        self.state = source.state();
        self.apply_visuals();
    }

    pub fn set_highlighted(&mut self, highlighted: bool) {
        if !self.check_alive("set_highlighted") || self.highlighted == highlighted {
            return;
        }
        self.highlighted = highlighted;
        self.update_thickness();
    }

    pub fn closest_point(&self, p: Pos2) -> Pos2 {
        self.renderer.closest_point_on_path(p)
    }

    pub fn hit_test(&self, p: Pos2) -> bool {
        self.is_connected() && self.hit_shape.contains(p)
    }

    /// Index of the anchor closest to `p` within `radius`.
    pub fn nearest_anchor_point(&self, p: Pos2, radius: f32) -> Option<usize> {
        self.anchors
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.distance_sq(p)))
            .filter(|(_, d)| *d <= radius * radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Drags one anchor. Endpoints of a connected wire belong to the pins and
    /// can't be moved.
    pub fn move_anchor_point(&mut self, index: usize, pos: Pos2) -> bool {
        if !self.check_alive("move_anchor_point") || !self.is_editable(index) {
            return false;
        }
        self.anchors[index] = pos;
        self.refresh_path();
        true
    }

    /// Inserts an anchor before `index`. On a connected wire the new anchor
    /// must land between the two endpoints.
    pub fn insert_anchor_point(&mut self, index: usize, pos: Pos2) -> bool {
        if !self.check_alive("insert_anchor_point") {
            return false;
        }
        let valid = if self.is_connected() {
            index >= 1 && index < self.anchors.len()
        } else {
            index <= self.anchors.len()
        };
        if !valid {
            return false;
        }

        let too_close = |i: Option<usize>| {
            i.and_then(|i| self.anchors.get(i))
                .is_some_and(|a| a.within_sq(pos, MIN_POINT_DISTANCE_SQ))
        };
        if too_close(index.checked_sub(1)) || too_close(Some(index)) {
            return false;
        }

        self.anchors.insert(index, pos);
        self.refresh_path();
        true
    }

    pub fn remove_anchor_point(&mut self, index: usize) -> bool {
        if !self.check_alive("remove_anchor_point")
            || !self.is_editable(index)
            || self.anchors.len() <= self.min_anchor_count()
        {
            return false;
        }
        self.anchors.remove(index);
        self.refresh_path();
        true
    }

    /// Tears the wire down. Only the first call does anything: it fires the
    /// deleted notification, then releases every pin subscription and the
    /// renderer and hit shape.
    pub fn delete(&mut self) {
        if self.is_deleted() {
            return;
        }
        self.life = WireLifecycle::Deleted;
        tracing::debug!(wire = self.id.0, "deleting wire");

        self.deleted_event.emit(&self.id);
        self.deleted_event.clear();

        for sub in self.subscriptions.drain(..) {
            sub.release();
        }

        self.hit_shape.set_enabled(false);
        self.hit_shape.release();
        self.renderer.release();
    }

    fn callback<T>(&self, action: fn(&mut Wire)) -> impl Fn(&T) + Send + Sync + 'static {
        let this = self.this.clone();
        move |_: &T| {
            if let Some(wire) = this.upgrade() {
                action(&mut wire.write());
            }
        }
    }

    /// Moves the first and last anchors onto the live pin positions.
    fn pin_endpoints(&mut self) {
        let (Some(source), Some(target)) = (self.source_pin(), self.target_pin()) else {
            return;
        };
        if let Some(first) = self.anchors.first_mut() {
            *first = source.position();
        }
        if let Some(last) = self.anchors.last_mut() {
            *last = target.position();
        }
    }

    fn min_anchor_count(&self) -> usize {
        if self.is_connected() {
            2
        } else {
            1
        }
    }

    fn is_editable(&self, index: usize) -> bool {
        if index >= self.anchors.len() {
            return false;
        }
        !self.is_connected() || (index != 0 && index != self.anchors.len() - 1)
    }

    fn check_alive(&self, op: &str) -> bool {
        if self.is_deleted() {
            tracing::warn!(wire = self.id.0, "{op} called on a deleted wire");
            return false;
        }
        true
    }

    fn check_drawing(&self, op: &str) -> bool {
        if self.is_connected() {
            tracing::warn!(wire = self.id.0, "{op} called on a connected wire");
            return false;
        }
        true
    }

    fn update_thickness(&mut self) {
        let thickness = self.thickness();
        self.renderer.set_thickness(thickness);
    }

    fn apply_visuals(&mut self) {
        let colour = self.colour();
        let depth = self.depth();
        self.renderer
            .set_colour(colour, self.style.colour_fade_duration);
        self.renderer.set_depth(depth);
    }
}

impl Drop for Wire {
    fn drop(&mut self) {
        self.delete();
    }
}

impl std::fmt::Debug for Wire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wire")
            .field("id", &self.id)
            .field("bus", &self.bus)
            .field("life", &self.life)
            .field("anchors", &self.anchors)
            .field("theme", &self.theme.name)
            .field("state", &self.state)
            .finish()
    }
}
