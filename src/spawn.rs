use bevy::prelude::*;

use crate::animation::AnimationController;
use crate::components::*;
use crate::enemy::{enemy_bundle, EnemySpecies};
use crate::hero::hero_bundle;
use crate::level::{platform_size, LevelDescriptor, LevelError};
use crate::physics_core::Aabb;
use crate::render::world_to_render;
use crate::tween::{key_bob, RenderOffset, TweenSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpawnKind {
    Platform { image: String },
    EnemyWall { side: WallSide },
    Hero,
    Enemy(EnemySpecies),
    Coin,
    Door,
    Key,
}

/// One entity to create, with its world-space footprint already resolved
/// from the descriptor's anchor convention.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRecord {
    pub kind: SpawnKind,
    pub aabb: Aabb,
}

impl SpawnRecord {
    fn new(kind: SpawnKind, aabb: Aabb) -> Self {
        Self { kind, aabb }
    }
}

/// Resolves a descriptor into spawn order: every platform followed by its
/// two enemy walls, then the hero and enemies, then coins, door and key.
/// Walls have to exist before any enemy can touch them.
pub fn plan_level(level: &LevelDescriptor, config: &GameConfig) -> Result<Vec<SpawnRecord>, LevelError> {
    let mut plan = Vec::new();
    let [wall_w, wall_h] = config.enemy_wall_size;

    for platform in &level.platforms {
        let (width, height) = platform_size(&platform.image)?;
        plan.push(SpawnRecord::new(
            SpawnKind::Platform {
                image: platform.image.clone(),
            },
            Aabb::from_top_left(platform.x, platform.y, width, height),
        ));
        // Walls stand on the platform's top edge, just outside each end.
        plan.push(SpawnRecord::new(
            SpawnKind::EnemyWall {
                side: WallSide::Left,
            },
            Aabb::from_top_left(platform.x - wall_w, platform.y - wall_h, wall_w, wall_h),
        ));
        plan.push(SpawnRecord::new(
            SpawnKind::EnemyWall {
                side: WallSide::Right,
            },
            Aabb::from_top_left(platform.x + width, platform.y - wall_h, wall_w, wall_h),
        ));
    }

    let [hero_w, hero_h] = config.hero_size;
    plan.push(SpawnRecord::new(
        SpawnKind::Hero,
        Aabb::from_center(level.hero.x, level.hero.y, hero_w, hero_h),
    ));
    for (species, points) in [
        (EnemySpecies::Spider, &level.spiders),
        (EnemySpecies::SpiderBoss, &level.spider_boss),
    ] {
        let [w, h] = species.profile(config).size;
        for point in points {
            plan.push(SpawnRecord::new(
                SpawnKind::Enemy(species),
                Aabb::from_center(point.x, point.y, w, h),
            ));
        }
    }

    let [coin_w, coin_h] = config.coin_size;
    for coin in &level.coins {
        plan.push(SpawnRecord::new(
            SpawnKind::Coin,
            Aabb::from_center(coin.x, coin.y, coin_w, coin_h),
        ));
    }
    let [door_w, door_h] = config.door_size;
    plan.push(SpawnRecord::new(
        SpawnKind::Door,
        Aabb::from_center(level.door.x, level.door.y - door_h / 2.0, door_w, door_h),
    ));
    let [key_w, key_h] = config.key_size;
    plan.push(SpawnRecord::new(
        SpawnKind::Key,
        Aabb::from_center(level.key.x, level.key.y, key_w, key_h),
    ));

    Ok(plan)
}

fn sprite_style(kind: &SpawnKind) -> Option<(Color, f32)> {
    match kind {
        SpawnKind::Platform { image } if image == "ground" => Some((Color::srgb(0.45, 0.3, 0.18), 1.0)),
        SpawnKind::Platform { .. } => Some((Color::srgb(0.3, 0.65, 0.25), 1.0)),
        SpawnKind::EnemyWall { .. } => None,
        SpawnKind::Door => Some((Color::srgb(0.55, 0.35, 0.2), 2.0)),
        SpawnKind::Key => Some((Color::srgb(1.0, 0.85, 0.1), 2.0)),
        SpawnKind::Coin => Some((Color::srgb(1.0, 0.75, 0.0), 3.0)),
        SpawnKind::Enemy(EnemySpecies::Spider) => Some((Color::srgb(0.55, 0.1, 0.1), 4.0)),
        SpawnKind::Enemy(EnemySpecies::SpiderBoss) => Some((Color::srgb(0.45, 0.1, 0.55), 4.0)),
        SpawnKind::Hero => Some((Color::srgb(0.2, 0.4, 0.9), 5.0)),
    }
}

/// Creates every entity in `plan`, tagged `LevelEntity`.
pub fn spawn_level(commands: &mut Commands, plan: &[SpawnRecord], config: &GameConfig, headless: bool) {
    for record in plan {
        let (x, y) = record.aabb.center();
        let collider = Collider {
            width: record.aabb.width(),
            height: record.aabb.height(),
        };
        let mut entity = match &record.kind {
            SpawnKind::Platform { .. } => commands.spawn((
                Solid::Platform,
                GamePosition { x, y },
                collider,
                LevelEntity,
            )),
            SpawnKind::EnemyWall { .. } => commands.spawn((
                Solid::EnemyWall,
                GamePosition { x, y },
                collider,
                LevelEntity,
            )),
            SpawnKind::Hero => commands.spawn(hero_bundle(x, y, config)),
            SpawnKind::Enemy(species) => commands.spawn(enemy_bundle(*species, x, y, config)),
            SpawnKind::Coin => commands.spawn((
                Coin,
                GamePosition { x, y },
                collider,
                Alive(true),
                Body::sensor(),
                AnimationController::new("coin", "rotate"),
                LevelEntity,
            )),
            SpawnKind::Door => commands.spawn((
                Door,
                GamePosition { x, y },
                collider,
                Body::sensor(),
                LevelEntity,
            )),
            SpawnKind::Key => {
                let bob = key_bob();
                commands.spawn((
                    Key,
                    GamePosition { x, y },
                    collider,
                    Alive(true),
                    Body::sensor(),
                    RenderOffset { x: 0.0, y: bob.from },
                    TweenSet(vec![bob]),
                    LevelEntity,
                ))
            }
        };

        if headless {
            continue;
        }
        if let Some((color, z)) = sprite_style(&record.kind) {
            entity.insert((
                Sprite::from_color(color, Vec2::new(collider.width, collider.height)),
                Transform::from_translation(world_to_render(x, y, z, config)),
            ));
        }
    }
}
