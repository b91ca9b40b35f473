use bevy::prelude::*;

use crate::animation::AnimationController;
use crate::components::*;
use crate::events::GameEventBus;
use crate::game_runtime::GameplaySet;
use crate::hero::BounceStrength;

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, enemy_patrol.in_set(GameplaySet::Behavior))
            .add_systems(Update, remove_finished_enemies.in_set(GameplaySet::Animation));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemySpecies {
    Spider,
    SpiderBoss,
}

/// Per-species policy for the shared enemy behaviour
#[derive(Clone, Copy, Debug)]
pub struct EnemyProfile {
    pub speed: f32,
    pub health: u32,
    pub bounce: BounceStrength,
    pub size: [f32; 2],
    pub graph: &'static str,
}

impl EnemySpecies {
    pub fn profile(self, config: &GameConfig) -> EnemyProfile {
        match self {
            EnemySpecies::Spider => EnemyProfile {
                speed: config.spider_speed,
                health: 1,
                bounce: BounceStrength::Light,
                size: config.spider_size,
                graph: "spider",
            },
            EnemySpecies::SpiderBoss => EnemyProfile {
                speed: config.boss_speed,
                health: config.boss_health.max(1),
                bounce: BounceStrength::Strong,
                size: config.boss_size,
                graph: "spider_boss",
            },
        }
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct Enemy {
    pub species: EnemySpecies,
    /// Patrol speed magnitude
    pub speed: f32,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health(pub u32);

/// Playing the death clip; removed from the world when it completes.
#[derive(Component)]
pub struct Dying;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StompOutcome {
    Damaged { remaining: u32 },
    Killed,
}

pub fn enemy_bundle(species: EnemySpecies, x: f32, y: f32, config: &GameConfig) -> impl Bundle {
    let profile = species.profile(config);
    (
        Enemy {
            species,
            speed: profile.speed,
        },
        Health(profile.health),
        GamePosition { x, y },
        // Every enemy starts out heading right.
        Velocity {
            x: profile.speed,
            y: 0.0,
        },
        GameConfig::collider(profile.size),
        Alive(true),
        Contacts::default(),
        Body::dynamic(SolidMask::PlatformsAndEnemyWalls),
        AnimationController::new(profile.graph, "crawl"),
        LevelEntity,
    )
}

/// Turn around on contact. The right side is checked first.
pub fn patrol_velocity(vx: f32, speed: f32, contacts: &Contacts) -> f32 {
    if contacts.touching.right || contacts.blocked.right {
        -speed
    } else if contacts.touching.left || contacts.blocked.left {
        speed
    } else {
        vx
    }
}

/// One hit from a falling hero.
pub fn take_stomp(health: &mut Health) -> StompOutcome {
    health.0 = health.0.saturating_sub(1);
    if health.0 == 0 {
        StompOutcome::Killed
    } else {
        StompOutcome::Damaged {
            remaining: health.0,
        }
    }
}

/// Stops all physics interaction at once and starts the death clip.
/// The entity stays in the world until the clip completes.
pub fn die(
    commands: &mut Commands,
    entity: Entity,
    alive: &mut Alive,
    body: &mut Body,
    velocity: &mut Velocity,
    anim: &mut AnimationController,
) {
    alive.0 = false;
    body.enabled = false;
    *velocity = Velocity::default();
    anim.play("die");
    commands.entity(entity).insert(Dying);
}

fn enemy_patrol(mut enemies: Query<(&Enemy, &Alive, &Contacts, &mut Velocity)>) {
    for (enemy, alive, contacts, mut velocity) in enemies.iter_mut() {
        if !alive.0 {
            continue;
        }
        velocity.x = patrol_velocity(velocity.x, enemy.speed, contacts);
    }
}

fn remove_finished_enemies(
    mut commands: Commands,
    bus: Res<GameEventBus>,
    mut cursor: Local<u64>,
    dying: Query<(), (With<Enemy>, With<Dying>)>,
) {
    for ev in bus.since(*cursor) {
        if ev.name != "anim_complete" {
            continue;
        }
        if ev.data.get("state").and_then(|v| v.as_str()) != Some("die") {
            continue;
        }
        if let Some(entity) = ev.source.filter(|e| dying.contains(*e)) {
            commands.entity(entity).despawn();
        }
    }
    *cursor = bus.latest_seq();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationPlugin;

    fn contacts(touching: Sides, blocked: Sides) -> Contacts {
        Contacts { touching, blocked }
    }

    #[test]
    fn patrol_turns_at_walls_and_world_edges() {
        let right = Sides {
            right: true,
            ..default()
        };
        let left = Sides {
            left: true,
            ..default()
        };
        let none = Sides::default();
        assert_eq!(patrol_velocity(0.0, 100.0, &contacts(right, none)), -100.0);
        assert_eq!(patrol_velocity(0.0, 100.0, &contacts(none, right)), -100.0);
        assert_eq!(patrol_velocity(0.0, 200.0, &contacts(left, none)), 200.0);
        assert_eq!(patrol_velocity(0.0, 200.0, &contacts(none, left)), 200.0);
        assert_eq!(patrol_velocity(-100.0, 100.0, &contacts(none, none)), -100.0);
    }

    #[test]
    fn boss_dies_exactly_on_fifth_stomp() {
        let config = GameConfig::default();
        let mut health = Health(EnemySpecies::SpiderBoss.profile(&config).health);
        for remaining in (1..5).rev() {
            assert_eq!(take_stomp(&mut health), StompOutcome::Damaged { remaining });
        }
        assert_eq!(take_stomp(&mut health), StompOutcome::Killed);
        assert_eq!(health, Health(0));
    }

    #[test]
    fn spider_dies_on_first_stomp() {
        let config = GameConfig::default();
        let profile = EnemySpecies::Spider.profile(&config);
        assert_eq!(profile.speed, 100.0);
        assert_eq!(profile.bounce, BounceStrength::Light);
        let mut health = Health(profile.health);
        assert_eq!(take_stomp(&mut health), StompOutcome::Killed);
    }

    #[test]
    fn dying_enemy_is_removed_after_death_clip() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(GameEventBus::default())
            .add_plugins(AnimationPlugin)
            .add_systems(Update, remove_finished_enemies);
        let config = GameConfig::default();
        let spider = app
            .world_mut()
            .spawn(enemy_bundle(EnemySpecies::Spider, 300.0, 500.0, &config))
            .id();
        app.world_mut()
            .entity_mut(spider)
            .insert((Dying, AnimationController::new("spider", "die")));

        app.update();
        assert!(app.world().entities().contains(spider));

        // Force the clip to its last frame so the next tick completes it.
        {
            let mut anim = app
                .world_mut()
                .get_mut::<AnimationController>(spider)
                .expect("anim");
            anim.frame = 11;
            anim.timer = 1.0;
        }
        app.update();
        app.update();
        assert!(!app.world().entities().contains(spider));
    }
}
