use bevy::prelude::*;

use crate::animation::AnimationController;
use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::{GameplaySet, PlaySession};
use crate::input::{GameAction, VirtualInput};

pub struct HeroPlugin;

impl Plugin for HeroPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, hero_control.in_set(GameplaySet::Control))
            .add_systems(Update, hero_animation.in_set(GameplaySet::Animation));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Stop,
    Right,
}

impl MoveDirection {
    pub fn sign(self) -> f32 {
        match self {
            MoveDirection::Left => -1.0,
            MoveDirection::Stop => 0.0,
            MoveDirection::Right => 1.0,
        }
    }

    /// Left takes priority when both directions are held.
    pub fn from_input(left: bool, right: bool) -> Self {
        if left {
            MoveDirection::Left
        } else if right {
            MoveDirection::Right
        } else {
            MoveDirection::Stop
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BounceStrength {
    /// After stomping a spider
    Light,
    /// After hurting the boss, high enough to clear its hitbox
    Strong,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeroAnimation {
    Stop,
    Run,
    Jump,
    Fall,
}

impl HeroAnimation {
    pub fn clip(self) -> &'static str {
        match self {
            HeroAnimation::Stop => "stop",
            HeroAnimation::Run => "run",
            HeroAnimation::Jump => "jump",
            HeroAnimation::Fall => "fall",
        }
    }
}

/// Horizontal velocity is `direction * speed`; facing only follows a
/// nonzero direction.
pub fn move_hero(direction: MoveDirection, speed: f32, velocity: &mut Velocity, facing: &mut Facing) {
    velocity.x = direction.sign() * speed;
    match direction {
        MoveDirection::Left => *facing = Facing::Left,
        MoveDirection::Right => *facing = Facing::Right,
        MoveDirection::Stop => {}
    }
}

/// Returns whether the jump was applied. Airborne jumps are rejected.
pub fn jump(velocity: &mut Velocity, grounded: bool, jump_speed: f32) -> bool {
    if grounded {
        velocity.y = -jump_speed;
    }
    grounded
}

pub fn bounce(velocity: &mut Velocity, strength: BounceStrength, config: &GameConfig) {
    velocity.y = match strength {
        BounceStrength::Light => -config.bounce_speed,
        BounceStrength::Strong => -config.strong_bounce_speed,
    };
}

pub fn select_animation(vx: f32, vy: f32, grounded: bool) -> HeroAnimation {
    if vy < 0.0 {
        HeroAnimation::Jump
    } else if !grounded {
        HeroAnimation::Fall
    } else if vx != 0.0 {
        HeroAnimation::Run
    } else {
        HeroAnimation::Stop
    }
}

pub fn hero_bundle(x: f32, y: f32, config: &GameConfig) -> impl Bundle {
    (
        Hero,
        GamePosition { x, y },
        Velocity::default(),
        GameConfig::collider(config.hero_size),
        Facing::Right,
        Alive(true),
        Contacts::default(),
        Body::dynamic(SolidMask::Platforms),
        AnimationController::new("hero", HeroAnimation::Stop.clip()),
        LevelEntity,
    )
}

fn hero_control(
    input: Res<VirtualInput>,
    config: Res<GameConfig>,
    mut bus: ResMut<GameEventBus>,
    session: Option<Res<PlaySession>>,
    mut heroes: Query<(Entity, &mut Velocity, &mut Facing, &Contacts, &Alive), With<Hero>>,
) {
    if session.is_some_and(|s| s.paused) {
        return;
    }
    for (entity, mut velocity, mut facing, contacts, alive) in heroes.iter_mut() {
        if !alive.0 {
            continue;
        }
        let direction = MoveDirection::from_input(
            input.pressed(GameAction::Left),
            input.pressed(GameAction::Right),
        );
        move_hero(direction, config.hero_speed, &mut velocity, &mut facing);

        if input.just_pressed(GameAction::Jump)
            && jump(&mut velocity, contacts.grounded(), config.jump_speed)
        {
            bus.emit("hero_jump", serde_json::json!({}), Some(entity));
        }
    }
}

fn hero_animation(mut heroes: Query<(&Velocity, &Contacts, &mut AnimationController), With<Hero>>) {
    for (velocity, contacts, mut anim) in heroes.iter_mut() {
        let selected = select_animation(velocity.x, velocity.y, contacts.grounded());
        anim.play(selected.clip());
    }
}
