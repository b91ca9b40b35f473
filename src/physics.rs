use bevy::prelude::*;

use crate::components::*;
use crate::game_runtime::GameplaySet;
use crate::physics_core::{self, Aabb, MotionParams, WorldBounds};

/// Longest step a single frame may integrate; a stalled frame must not let
/// a falling body skip through a platform.
pub const MAX_FRAME_DELTA: f32 = 1.0 / 30.0;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, step_bodies.in_set(GameplaySet::Physics));
    }
}

fn step_bodies(
    time: Res<Time>,
    config: Res<GameConfig>,
    solids: Query<(&Solid, &GamePosition, &Collider)>,
    mut bodies: Query<
        (&Body, &mut GamePosition, &mut Velocity, &Collider, &mut Contacts),
        Without<Solid>,
    >,
) {
    let dt = time.delta_secs().min(MAX_FRAME_DELTA);
    let bounds = WorldBounds {
        width: config.world_width,
        height: config.world_height,
    };

    let mut platforms = Vec::new();
    let mut all = Vec::new();
    for (solid, pos, collider) in solids.iter() {
        let aabb = Aabb::from_center(pos.x, pos.y, collider.width, collider.height);
        if SolidMask::Platforms.includes(*solid) {
            platforms.push(aabb);
        }
        all.push(aabb);
    }

    for (body, mut pos, mut vel, collider, mut contacts) in bodies.iter_mut() {
        if !body.enabled {
            *contacts = Contacts::default();
            continue;
        }
        if !body.moves {
            continue;
        }
        if body.allow_gravity {
            physics_core::apply_gravity(&mut vel.y, config.gravity, dt);
        }
        let against: &[Aabb] = match body.solids {
            SolidMask::None => &[],
            SolidMask::Platforms => &platforms,
            SolidMask::PlatformsAndEnemyWalls => &all,
        };
        let out = physics_core::resolve_motion(
            against,
            bounds,
            MotionParams {
                dt,
                x: pos.x,
                y: pos.y,
                vx: vel.x,
                vy: vel.y,
                width: collider.width,
                height: collider.height,
                collide_world_bounds: body.collide_world_bounds,
            },
        );
        pos.x = out.x;
        pos.y = out.y;
        vel.x = out.vx;
        vel.y = out.vy;
        contacts.touching = out.touching;
        contacts.blocked = out.blocked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enemy::{enemy_bundle, EnemySpecies};
    use crate::hero::hero_bundle;
    use bevy::ecs::system::RunSystemOnce;
    use std::time::Duration;

    fn physics_world() -> World {
        let mut world = World::new();
        world.insert_resource(Time::<()>::default());
        world.insert_resource(GameConfig::default());
        world
    }

    fn spawn_solid(world: &mut World, solid: Solid, aabb: Aabb) {
        let (x, y) = aabb.center();
        world.spawn((
            solid,
            GamePosition { x, y },
            Collider {
                width: aabb.width(),
                height: aabb.height(),
            },
        ));
    }

    fn step(world: &mut World, frames: usize) {
        for _ in 0..frames {
            world
                .resource_mut::<Time>()
                .advance_by(Duration::from_secs_f32(1.0 / 60.0));
            world.run_system_once(step_bodies).expect("step bodies");
        }
    }

    #[test]
    fn hero_walks_through_enemy_walls() {
        let mut world = physics_world();
        let config = GameConfig::default();
        spawn_solid(&mut world, Solid::Platform, Aabb::from_top_left(0.0, 546.0, 960.0, 54.0));
        spawn_solid(&mut world, Solid::EnemyWall, Aabb::from_top_left(120.0, 504.0, 2.0, 42.0));
        let hero = world.spawn(hero_bundle(100.0, 525.0, &config)).id();
        world.get_mut::<Velocity>(hero).expect("velocity").x = 200.0;

        step(&mut world, 60);

        let pos = *world.get::<GamePosition>(hero).expect("pos");
        let contacts = *world.get::<Contacts>(hero).expect("contacts");
        assert!((pos.y - 525.0).abs() < 0.001);
        assert!(contacts.grounded());
        assert!(pos.x > 200.0);
    }

    #[test]
    fn enemy_walls_stop_spiders() {
        let mut world = physics_world();
        let config = GameConfig::default();
        spawn_solid(&mut world, Solid::Platform, Aabb::from_top_left(0.0, 546.0, 960.0, 54.0));
        spawn_solid(&mut world, Solid::EnemyWall, Aabb::from_top_left(300.0, 504.0, 2.0, 42.0));
        let spider = world
            .spawn(enemy_bundle(EnemySpecies::Spider, 270.0, 530.0, &config))
            .id();

        let mut touched_right = false;
        for _ in 0..30 {
            step(&mut world, 1);
            touched_right |= world.get::<Contacts>(spider).is_some_and(|c| c.touching.right);
        }

        let pos = *world.get::<GamePosition>(spider).expect("pos");
        assert!(touched_right);
        assert!((pos.x - 279.0).abs() < 0.001);
    }

    #[test]
    fn frozen_and_disabled_bodies_keep_their_position() {
        let mut world = physics_world();
        let config = GameConfig::default();
        let hero = world.spawn(hero_bundle(100.0, 100.0, &config)).id();
        let mut body = Body::dynamic(SolidMask::Platforms);
        body.moves = false;
        world.entity_mut(hero).insert(body);

        let spider = world
            .spawn(enemy_bundle(EnemySpecies::Spider, 500.0, 100.0, &config))
            .id();
        world.get_mut::<Body>(spider).expect("body").enabled = false;

        step(&mut world, 10);

        assert_eq!(
            world.get::<GamePosition>(hero).copied(),
            Some(GamePosition { x: 100.0, y: 100.0 })
        );
        assert_eq!(
            world.get::<GamePosition>(spider).copied(),
            Some(GamePosition { x: 500.0, y: 100.0 })
        );
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut world = physics_world();
        let config = GameConfig::default();
        let hero = world.spawn(hero_bundle(100.0, 100.0, &config)).id();
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(0.5));
        world.run_system_once(step_bodies).expect("step bodies");
        let vy = world.get::<Velocity>(hero).map(|v| v.y).expect("velocity");
        assert!((vy - config.gravity * MAX_FRAME_DELTA).abs() < 0.01);
    }
}
