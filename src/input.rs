use bevy::prelude::*;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameAction {
    Left,
    Right,
    Jump,
    Pause,
}

/// Per-frame input snapshot. Edge-triggered actions (jump, pause) are
/// derived by comparing this frame's held set with the previous frame's.
#[derive(Resource, Default, Clone)]
pub struct VirtualInput {
    pub active: HashSet<GameAction>,
    pub just_pressed: HashSet<GameAction>,
    previous: HashSet<GameAction>,
}

impl VirtualInput {
    pub fn pressed(&self, action: GameAction) -> bool {
        self.active.contains(&action)
    }

    pub fn just_pressed(&self, action: GameAction) -> bool {
        self.just_pressed.contains(&action)
    }

    /// Replace the held set with `current` and recompute edges.
    pub fn apply_snapshot(&mut self, current: HashSet<GameAction>) {
        self.previous = std::mem::take(&mut self.active);
        self.just_pressed = current.difference(&self.previous).copied().collect();
        self.active = current;
    }
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(VirtualInput::default()).add_systems(
            PreUpdate,
            keyboard_to_virtual.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

const BINDINGS: &[(GameAction, &[KeyCode])] = &[
    (GameAction::Left, &[KeyCode::ArrowLeft, KeyCode::KeyA]),
    (GameAction::Right, &[KeyCode::ArrowRight, KeyCode::KeyD]),
    (
        GameAction::Jump,
        &[KeyCode::ArrowUp, KeyCode::KeyW, KeyCode::Space],
    ),
    (GameAction::Pause, &[KeyCode::Escape]),
];

/// Translate keyboard state to action names
fn keyboard_to_virtual(keyboard: Res<ButtonInput<KeyCode>>, mut vinput: ResMut<VirtualInput>) {
    let held: HashSet<GameAction> = BINDINGS
        .iter()
        .filter(|(_, keys)| keys.iter().any(|k| keyboard.pressed(*k)))
        .map(|(action, _)| *action)
        .collect();
    vinput.apply_snapshot(held);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_fire_once_per_press() {
        let mut input = VirtualInput::default();
        input.apply_snapshot(HashSet::from([GameAction::Jump]));
        assert!(input.just_pressed(GameAction::Jump));

        input.apply_snapshot(HashSet::from([GameAction::Jump]));
        assert!(input.pressed(GameAction::Jump));
        assert!(!input.just_pressed(GameAction::Jump));

        input.apply_snapshot(HashSet::new());
        input.apply_snapshot(HashSet::from([GameAction::Jump, GameAction::Left]));
        assert!(input.just_pressed(GameAction::Jump));
        assert!(input.just_pressed(GameAction::Left));
    }

    #[test]
    fn keyboard_bindings_map_to_actions() {
        let mut app = App::new();
        app.insert_resource(ButtonInput::<KeyCode>::default())
            .add_plugins(InputPlugin);
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::Space);
        app.update();
        let input = app.world().resource::<VirtualInput>();
        assert!(input.just_pressed(GameAction::Jump));
        assert!(!input.pressed(GameAction::Left));

        app.update();
        let input = app.world().resource::<VirtualInput>();
        assert!(input.pressed(GameAction::Jump));
        assert!(!input.just_pressed(GameAction::Jump));
    }
}
