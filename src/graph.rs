use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use emath::{pos2, Pos2};

use crate::{
    backend::{CurveBackend, WireBackend},
    containers::FixedVec,
    error::{ErrorList, OptionReport, ResultReport, WireError},
    io::{WireData, WireGraphData},
    pin::{Pin, PinDirection, PinId},
    style::WireStyle,
    theme::ThemePalette,
    wire::{Wire, WireId, WireRef},
    RwLock,
};

#[derive(Default)]
struct WireStore {
    wires: FixedVec<WireRef>,
    /// Pin each unconnected wire was started from.
    drawing_from: HashMap<WireId, PinId>,
}

impl WireStore {
    fn remove(&mut self, id: WireId) {
        self.wires.remove(id.0);
        self.drawing_from.remove(&id);
    }
}

/// Owns the pins and wires of one circuit.
///
/// Wires remove themselves from the graph when they are deleted, whatever
/// triggered the deletion.
pub struct WireGraph {
    style: Arc<WireStyle>,
    palette: ThemePalette,
    backend: Box<dyn WireBackend>,
    pins: FixedVec<Arc<Pin>>,
    store: Arc<RwLock<WireStore>>,
}

impl WireGraph {
    pub fn new(style: WireStyle, palette: ThemePalette) -> Self {
        Self::with_backend(style, palette, CurveBackend)
    }

    pub fn with_backend(
        style: WireStyle,
        palette: ThemePalette,
        backend: impl WireBackend + 'static,
    ) -> Self {
        Self {
            style: Arc::new(style),
            palette,
            backend: Box::new(backend),
            pins: FixedVec::default(),
            store: Default::default(),
        }
    }

    pub fn style(&self) -> &Arc<WireStyle> {
        &self.style
    }

    pub fn palette(&self) -> &ThemePalette {
        &self.palette
    }

    pub fn add_pin(&mut self, dir: PinDirection, pos: Pos2, theme: &str) -> Arc<Pin> {
        let id = PinId(self.pins.first_free_pos());
        let pin = Pin::new(id, dir, pos, self.palette.get_or_default(theme));
        self.pins.set(pin.clone(), id.0);
        pin
    }

    pub fn pin(&self, id: PinId) -> Option<Arc<Pin>> {
        self.pins.get_clone(id.0)
    }

    pub fn pins(&self) -> impl Iterator<Item = &Arc<Pin>> {
        self.pins.iter()
    }

    /// Deletes the pin, and with it every wire attached to it. Wires still
    /// being drawn from it are cancelled, since the id may be handed out again.
    pub fn remove_pin(&mut self, id: PinId) -> Option<Arc<Pin>> {
        let pin = self.pins.remove(id.0)?;

        let drawing: Vec<WireId> = self
            .store
            .read()
            .drawing_from
            .iter()
            .filter(|(_, start)| **start == id)
            .map(|(wire, _)| *wire)
            .collect();
        for wire in drawing {
            self.cancel_wire(wire);
        }

        pin.delete();
        Some(pin)
    }

    /// Starts drawing a wire from `start`. The pin's position becomes the
    /// first anchor.
    pub fn begin_wire(&mut self, start: PinId, bus: bool) -> Result<WireRef, WireError> {
        let pin = self.pin(start).ok_or(WireError::UnknownPin(start))?;

        let id = WireId(self.store.read().wires.first_free_pos());
        let wire = self.create_wire(id, bus, &pin);
        wire.write().add_anchor_point(pin.position());

        let mut store = self.store.write();
        store.wires.set(wire.clone(), id.0);
        store.drawing_from.insert(id, start);
        Ok(wire)
    }

    /// Ends the wire on `end`. On failure the wire stays unconnected so the
    /// user can pick another pin.
    pub fn finish_wire(&mut self, wire: WireId, end: PinId) -> Result<(), WireError> {
        let (wire_ref, start) = {
            let store = self.store.read();
            let wire_ref = store.wires.get_clone(wire.0).ok_or(WireError::UnknownWire(wire))?;
            let start = store.drawing_from.get(&wire).copied();
            (wire_ref, start)
        };
        let start = start.ok_or(WireError::AlreadyConnected)?;
        let from = self.pin(start).ok_or(WireError::UnknownPin(start))?;
        let to = self.pin(end).ok_or(WireError::UnknownPin(end))?;

        {
            let mut w = wire_ref.write();
            let added = w.add_anchor_point(to.position());
            if let Err(e) = w.connect(&from, &to) {
                if added {
                    w.remove_last_anchor_point();
                }
                return Err(e);
            }
        }

        self.store.write().drawing_from.remove(&wire);
        Ok(())
    }

    pub fn cancel_wire(&mut self, wire: WireId) -> bool {
        let drawing = self.store.read().drawing_from.contains_key(&wire);
        drawing && self.delete_wire(wire)
    }

    pub fn delete_wire(&mut self, id: WireId) -> bool {
        match self.wire(id) {
            Some(wire) => {
                wire.write().delete();
                true
            }
            None => false,
        }
    }

    pub fn wire(&self, id: WireId) -> Option<WireRef> {
        self.store.read().wires.get_clone(id.0)
    }

    pub fn wires(&self) -> Vec<WireRef> {
        self.snapshot()
    }

    pub fn wire_ids(&self) -> Vec<WireId> {
        self.store
            .read()
            .wires
            .iter_indexed()
            .map(|(i, _)| WireId(i))
            .collect()
    }

    pub fn wire_count(&self) -> usize {
        self.store.read().wires.len()
    }

    /// Topmost connected wire under `p`.
    pub fn wire_at(&self, p: Pos2) -> Option<WireId> {
        self.snapshot()
            .into_iter()
            .filter_map(|wire| {
                let wire = wire.read();
                wire.hit_test(p).then(|| (wire.depth(), wire.id()))
            })
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, id)| id)
    }

    /// Deletes every wire. Pins stay.
    pub fn clear_wires(&mut self) {
        for wire in self.snapshot() {
            wire.write().delete();
        }
        let mut store = self.store.write();
        store.wires.clear();
        store.drawing_from.clear();
    }

    /// Scene teardown: every wire, then every pin.
    pub fn clear(&mut self) {
        self.clear_wires();
        let pins: Vec<_> = self.pins.iter().cloned().collect();
        self.pins.clear();
        for pin in pins {
            pin.delete();
        }
    }

    /// Connected wires only; wires still being drawn are not saved.
    pub fn save(&self) -> WireGraphData {
        let (slots, saved): (usize, Vec<(usize, WireRef)>) = {
            let store = self.store.read();
            let saved = store
                .wires
                .iter_indexed()
                .map(|(i, wire)| (i, wire.clone()))
                .collect();
            (store.wires.slots(), saved)
        };

        let mut wires = vec![None; slots];
        for (i, wire) in saved {
            let wire = wire.read();
            if !wire.is_connected() {
                continue;
            }
            let (Some(source), Some(target)) = (wire.source_pin(), wire.target_pin()) else {
                continue;
            };
            wires[i] = Some(WireData {
                source: source.id(),
                target: target.id(),
                bus: wire.is_bus(),
                points: wire.anchor_points().iter().map(|p| (p.x, p.y)).collect(),
            });
        }
        while wires.last().is_some_and(|w| w.is_none()) {
            wires.pop();
        }
        WireGraphData { wires }
    }

    /// Replaces every wire with the saved ones. Wires that can't be restored
    /// are reported and skipped.
    pub fn load(&mut self, data: &WireGraphData, errors: &mut ErrorList) {
        self.clear_wires();
        let mut errors = errors.enter_context(|| "loading wires");

        for (i, data) in data.wires.iter().enumerate() {
            let data = unwrap_option_or_continue!(data);
            let mut errors = errors.enter_context(|| format!("loading wire {i}"));

            let source = self
                .pin(data.source)
                .report_none(&mut errors, || WireError::UnknownPin(data.source));
            let target = self
                .pin(data.target)
                .report_none(&mut errors, || WireError::UnknownPin(data.target));
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };

            let id = WireId(i);
            let wire = self.create_wire(id, data.bus, &source);
            let points: Vec<Pos2> = data.points.iter().map(|(x, y)| pos2(*x, *y)).collect();

            let connected = {
                let mut w = wire.write();
                w.set_anchor_points(points, false)
                    .and_then(|_| w.connect(&source, &target))
                    .report_error(&mut errors)
                    .is_some()
            };

            if connected {
                self.store.write().wires.set(wire, id.0);
            }
        }
        tracing::debug!(wires = self.wire_count(), "wires loaded");
    }

    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::to_string(&self.save())
    }

    pub fn load_ron(&mut self, text: &str, errors: &mut ErrorList) -> Result<(), ron::error::SpannedError> {
        let data: WireGraphData = ron::from_str(text)?;
        self.load(&data, errors);
        Ok(())
    }

    fn create_wire(&self, id: WireId, bus: bool, pin: &Pin) -> WireRef {
        let wire = Wire::new(
            id,
            bus,
            pin.theme(),
            self.style.clone(),
            self.backend.create_renderer(),
            self.backend.create_hit_shape(),
        );

        let store: Weak<RwLock<WireStore>> = Arc::downgrade(&self.store);
        wire.read().on_deleted(move |id| {
            if let Some(store) = store.upgrade() {
                store.write().remove(*id);
            }
        });
        wire
    }

    fn snapshot(&self) -> Vec<WireRef> {
        self.store.read().wires.iter().cloned().collect()
    }
}

impl Drop for WireGraph {
    fn drop(&mut self) {
        self.clear_wires();
    }
}

#[cfg(test)]
mod test {
    use emath::pos2;

    use super::WireGraph;
    use crate::{
        error::{ErrorList, WireError},
        io::{WireData, WireGraphData},
        pin::{PinDirection, PinId},
        state::WireState,
        style::WireStyle,
        theme::ThemePalette,
        wire::WireLifecycle,
    };

    fn graph() -> WireGraph {
        WireGraph::new(WireStyle::default(), ThemePalette::new())
    }

    #[test]
    fn drawing_from_the_target_end() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let inp = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");

        let wire = graph.begin_wire(inp.id(), false).unwrap();
        let id = wire.read().id();
        wire.write().add_anchor_point(pos2(2.0, 1.0));
        wire.write().draw_to_point(pos2(0.5, 0.0));

        graph.finish_wire(id, out.id()).unwrap();

        let w = wire.read();
        assert_eq!(w.lifecycle(), WireLifecycle::Connected);
        assert_eq!(w.anchor_points(), &[pos2(0.0, 0.0), pos2(2.0, 1.0), pos2(4.0, 0.0)]);
        assert_eq!(w.source_pin().map(|p| p.id()), Some(out.id()));
        drop(w);

        assert_eq!(graph.finish_wire(id, out.id()), Err(WireError::AlreadyConnected));
    }

    #[test]
    fn failed_finish_keeps_drawing() {
        let mut graph = graph();
        let a = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let b = graph.add_pin(PinDirection::Outside, pos2(4.0, 0.0), "default");
        let c = graph.add_pin(PinDirection::Inside, pos2(0.0, 4.0), "default");

        let wire = graph.begin_wire(a.id(), false).unwrap();
        let id = wire.read().id();

        assert_eq!(
            graph.finish_wire(id, b.id()),
            Err(WireError::SameRole(PinDirection::Outside))
        );
        assert_eq!(wire.read().anchor_points(), &[pos2(0.0, 0.0)]);
        assert_eq!(graph.finish_wire(id, PinId(99)), Err(WireError::UnknownPin(PinId(99))));

        graph.finish_wire(id, c.id()).unwrap();
        assert!(wire.read().is_connected());
    }

    #[test]
    fn removing_a_pin_removes_its_wires() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let in_a = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");
        let in_b = graph.add_pin(PinDirection::Inside, pos2(4.0, 4.0), "default");

        for end in [&in_a, &in_b] {
            let wire = graph.begin_wire(out.id(), false).unwrap();
            let id = wire.read().id();
            graph.finish_wire(id, end.id()).unwrap();
        }
        assert_eq!(graph.wire_count(), 2);
        assert_eq!(graph.wires().len(), 2);

        graph.remove_pin(in_a.id());
        assert_eq!(graph.wire_count(), 1);
        assert_eq!(in_a.subscriber_count(), 0);

        graph.remove_pin(out.id());
        assert_eq!(graph.wire_count(), 0);
        assert_eq!(out.subscriber_count(), 0);
        assert_eq!(in_b.subscriber_count(), 0);
    }

    #[test]
    fn delete_and_cancel() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let inp = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");

        let drawing = graph.begin_wire(out.id(), true).unwrap();
        let drawing_id = drawing.read().id();
        assert!(graph.cancel_wire(drawing_id));
        assert!(drawing.read().is_deleted());
        assert_eq!(graph.wire_count(), 0);

        let wire = graph.begin_wire(out.id(), false).unwrap();
        let id = wire.read().id();
        graph.finish_wire(id, inp.id()).unwrap();

        assert!(!graph.cancel_wire(id));
        assert!(graph.delete_wire(id));
        assert!(!graph.delete_wire(id));
        assert_eq!(graph.wire_count(), 0);
        assert_eq!(out.subscriber_count(), 0);
    }

    #[test]
    fn wire_at_prefers_the_topmost_wire() {
        let mut graph = graph();
        let a_out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let a_in = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");
        let b_out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.05), "default");
        let b_in = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.05), "default");

        let mut ids = vec![];
        for (from, to) in [(&a_out, &a_in), (&b_out, &b_in)] {
            let wire = graph.begin_wire(from.id(), false).unwrap();
            let id = wire.read().id();
            graph.finish_wire(id, to.id()).unwrap();
            ids.push(id);
        }

        assert_eq!(graph.wire_at(pos2(2.0, 3.0)), None);

        b_out.set_state(WireState::True);
        assert_eq!(graph.wire_at(pos2(2.0, 0.02)), Some(ids[1]));

        b_out.set_state(WireState::False);
        a_out.set_state(WireState::True);
        assert_eq!(graph.wire_at(pos2(2.0, 0.02)), Some(ids[0]));
    }

    #[test]
    fn save_and_load_through_ron() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let inp = graph.add_pin(PinDirection::Inside, pos2(4.0, 2.0), "default");

        let wire = graph.begin_wire(inp.id(), true).unwrap();
        let id = wire.read().id();
        wire.write().add_anchor_point(pos2(2.0, 2.0));
        graph.finish_wire(id, out.id()).unwrap();
        let anchors = wire.read().anchor_points().to_vec();

        // unfinished wires are not saved
        graph.begin_wire(out.id(), false).unwrap();

        let text = graph.to_ron().unwrap();

        let mut loaded = WireGraph::new(WireStyle::default(), ThemePalette::new());
        loaded.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        loaded.add_pin(PinDirection::Inside, pos2(4.0, 2.0), "default");

        let mut errors = ErrorList::new();
        loaded.load_ron(&text, &mut errors).unwrap();
        assert!(errors.is_empty(), "{errors}");

        assert_eq!(loaded.wire_count(), 1);
        let restored = loaded.wire(id).unwrap();
        let restored = restored.read();
        assert!(restored.is_connected());
        assert!(restored.is_bus());
        assert_eq!(restored.anchor_points(), anchors.as_slice());
    }

    #[test]
    fn load_reports_missing_pins() {
        let mut graph = graph();
        graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        graph.add_pin(PinDirection::Inside, pos2(1.0, 0.0), "default");

        let data = WireGraphData {
            wires: vec![
                Some(WireData {
                    source: PinId(0),
                    target: PinId(7),
                    bus: false,
                    points: vec![(0.0, 0.0), (1.0, 0.0)],
                }),
                None,
                Some(WireData {
                    source: PinId(0),
                    target: PinId(1),
                    bus: false,
                    points: vec![(0.0, 0.0), (1.0, 0.0)],
                }),
            ],
        };

        let mut errors = ErrorList::new();
        graph.load(&data, &mut errors);

        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().contains("loading wire 0"));
        assert_eq!(graph.wire_ids(), vec![crate::wire::WireId(2)]);
    }

    #[test]
    fn removing_the_start_pin_cancels_drawing() {
        let mut graph = graph();
        let start = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let end = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");

        let wire = graph.begin_wire(start.id(), false).unwrap();
        let id = wire.read().id();

        graph.remove_pin(start.id());
        assert!(wire.read().is_deleted());
        assert_eq!(graph.wire_count(), 0);

        let reused = graph.add_pin(PinDirection::Outside, pos2(50.0, 50.0), "default");
        assert_eq!(reused.id(), start.id());
        assert_eq!(graph.finish_wire(id, end.id()), Err(WireError::UnknownWire(id)));
        assert_eq!(reused.subscriber_count(), 0);
    }

    #[test]
    fn start_pin_moving_while_drawing() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let inp = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");

        let wire = graph.begin_wire(out.id(), false).unwrap();
        let id = wire.read().id();
        out.set_position(pos2(0.0, 3.0));
        graph.finish_wire(id, inp.id()).unwrap();

        assert_eq!(wire.read().anchor_points(), &[pos2(0.0, 3.0), pos2(4.0, 0.0)]);
        assert_eq!(graph.wire_at(pos2(2.0, 1.5)), Some(id));
    }

    #[test]
    fn loaded_wires_attach_to_moved_pins() {
        let mut graph = graph();
        graph.add_pin(PinDirection::Outside, pos2(10.0, 0.0), "default");
        graph.add_pin(PinDirection::Inside, pos2(14.0, 5.0), "default");

        let data = WireGraphData {
            wires: vec![Some(WireData {
                source: PinId(0),
                target: PinId(1),
                bus: false,
                points: vec![(0.0, 0.0), (4.0, 0.0)],
            })],
        };
        let mut errors = ErrorList::new();
        graph.load(&data, &mut errors);
        assert!(errors.is_empty(), "{errors}");

        let wire = graph.wire(crate::wire::WireId(0)).unwrap();
        assert_eq!(wire.read().anchor_points(), &[pos2(10.0, 0.0), pos2(14.0, 5.0)]);
        assert_eq!(graph.wire_at(pos2(10.0, 0.0)), Some(crate::wire::WireId(0)));
        assert_eq!(graph.wire_at(pos2(2.0, 0.0)), None);
    }

    #[test]
    fn dropping_the_graph_releases_pins() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        let inp = graph.add_pin(PinDirection::Inside, pos2(4.0, 0.0), "default");
        let wire = graph.begin_wire(out.id(), false).unwrap();
        let id = wire.read().id();
        graph.finish_wire(id, inp.id()).unwrap();
        assert!(out.subscriber_count() > 0);

        drop(graph);
        assert!(wire.read().is_deleted());
        assert_eq!(out.subscriber_count(), 0);
        assert_eq!(inp.subscriber_count(), 0);
    }

    #[test]
    fn clear_deletes_pins_too() {
        let mut graph = graph();
        let out = graph.add_pin(PinDirection::Outside, pos2(0.0, 0.0), "default");
        graph.clear();
        assert!(out.is_deleted());
        assert_eq!(graph.pins().count(), 0);
    }
}
