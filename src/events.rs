use std::collections::VecDeque;

use bevy::prelude::*;

const MAX_EVENTS: usize = 500;

#[derive(Clone, Debug)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
    /// Monotonic sequence number; consumers keep the last one they handled.
    pub seq: u64,
    pub source: Option<Entity>,
}

/// Gameplay events emitted during a frame (pickups, stomps, deaths, ...).
/// Audio and logging read from here instead of being called by the rules.
#[derive(Resource, Default)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    next_seq: u64,
    last_overflow_log_frame: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value, source: Option<Entity>) {
        self.next_seq = self.next_seq.saturating_add(1);
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
            seq: self.next_seq,
            source,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[Keyrunner events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    /// Events with a sequence number greater than `cursor`.
    pub fn since(&self, cursor: u64) -> impl Iterator<Item = &GameEvent> {
        self.recent.iter().filter(move |ev| ev.seq > cursor)
    }

    pub fn latest_seq(&self) -> u64 {
        self.next_seq
    }

    pub fn count(&self, name: &str) -> usize {
        self.recent.iter().filter(|ev| ev.name == name).count()
    }
}

pub struct GameEventsPlugin;

impl Plugin for GameEventsPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GameEventBus::default())
            .add_systems(PreUpdate, tick_event_frame);
    }
}

fn tick_event_frame(mut bus: ResMut<GameEventBus>) {
    bus.frame = bus.frame.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = GameEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit("test", serde_json::json!({ "i": i }), None);
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert!(bus.dropped_events >= 25);
    }

    #[test]
    fn since_skips_events_already_seen() {
        let mut bus = GameEventBus::default();
        bus.emit("coin_collected", serde_json::json!({}), None);
        let cursor = bus.latest_seq();
        bus.emit("key_collected", serde_json::json!({}), None);
        let names: Vec<&str> = bus.since(cursor).map(|ev| ev.name.as_str()).collect();
        assert_eq!(names, vec!["key_collected"]);
        assert_eq!(bus.count("coin_collected"), 1);
    }
}
