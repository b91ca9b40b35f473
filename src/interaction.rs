use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::animation::AnimationController;
use crate::components::*;
use crate::enemy::{self, Enemy, Health, StompOutcome};
use crate::events::GameEventBus;
use crate::game_runtime::{FlowRequest, GameplaySet, PlaySession, RestartReason};
use crate::hero::{self, BounceStrength};
use crate::physics_core::Aabb;

pub struct InteractionPlugin;

impl Plugin for InteractionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                hero_vs_coins,
                hero_vs_enemies,
                hero_vs_key,
                hero_vs_door,
                hero_fell_out,
            )
                .chain()
                .in_set(GameplaySet::Interaction),
        );
    }
}

#[derive(SystemParam)]
struct InteractionIo<'w, 's> {
    commands: Commands<'w, 's>,
    events: ResMut<'w, GameEventBus>,
    session: ResMut<'w, PlaySession>,
    config: Res<'w, GameConfig>,
}

type HeroItem<'a> = (
    Entity,
    &'a GamePosition,
    &'a Collider,
    &'a mut Velocity,
    &'a Contacts,
    &'a Body,
    &'a mut Alive,
);

type HeroQuery<'w, 's> = Query<'w, 's, HeroItem<'static>, With<Hero>>;

type EnemyItem<'a> = (
    Entity,
    &'a Enemy,
    &'a GamePosition,
    &'a Collider,
    &'a mut Health,
    &'a mut Alive,
    &'a mut Body,
    &'a mut Velocity,
    &'a mut AnimationController,
);

type PickupItem<'a> = (Entity, &'a GamePosition, &'a Collider, &'a mut Alive);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyContact {
    Stomp {
        bounce: BounceStrength,
        outcome: StompOutcome,
    },
    HeroHit,
}

/// Positive vertical velocity means the hero is coming down.
pub fn is_falling(hero_vy: f32) -> bool {
    hero_vy > 0.0
}

/// Outcome of the hero touching a live enemy. Stomps cost the enemy one
/// health point; any other contact costs the hero the level.
pub fn resolve_enemy_contact(hero_vy: f32, bounce: BounceStrength, health: &mut Health) -> EnemyContact {
    if is_falling(hero_vy) {
        EnemyContact::Stomp {
            bounce,
            outcome: enemy::take_stomp(health),
        }
    } else {
        EnemyContact::HeroHit
    }
}

/// The door only opens for a grounded hero carrying the key.
pub fn door_opens(has_key: bool, grounded: bool, overlapping: bool) -> bool {
    has_key && grounded && overlapping
}

fn aabb_of(pos: &GamePosition, collider: &Collider) -> Aabb {
    Aabb::from_center(pos.x, pos.y, collider.width, collider.height)
}

/// Footprint of the single live, collidable hero.
fn hero_aabb(pos: &GamePosition, collider: &Collider, body: &Body, alive: &Alive) -> Option<Aabb> {
    (alive.0 && body.enabled).then(|| aabb_of(pos, collider))
}

fn hero_vs_coins(
    mut io: InteractionIo,
    heroes: Query<(&GamePosition, &Collider, &Body, &Alive), With<Hero>>,
    mut coins: Query<PickupItem, (With<Coin>, Without<Hero>)>,
) {
    if io.session.pending.is_some() {
        return;
    }
    let Some(hero_box) = heroes
        .iter()
        .find_map(|(pos, collider, body, alive)| hero_aabb(pos, collider, body, alive))
    else {
        return;
    };
    for (entity, pos, collider, mut alive) in coins.iter_mut() {
        if !alive.0 || !hero_box.overlaps(&aabb_of(pos, collider)) {
            continue;
        }
        alive.0 = false;
        io.commands.entity(entity).despawn();
        io.session.coins = io.session.coins.saturating_add(1);
        let coins_total = io.session.coins;
        io.events.emit(
            "coin_collected",
            serde_json::json!({ "coins": coins_total }),
            Some(entity),
        );
    }
}

fn hero_vs_enemies(
    mut io: InteractionIo,
    mut heroes: HeroQuery,
    mut enemies: Query<EnemyItem, Without<Hero>>,
) {
    if io.session.pending.is_some() {
        return;
    }
    let Some((hero_entity, hero_pos, hero_collider, mut hero_vel, _, hero_body, mut hero_alive)) =
        heroes.iter_mut().next()
    else {
        return;
    };
    let Some(hero_box) = hero_aabb(hero_pos, hero_collider, hero_body, &hero_alive) else {
        return;
    };

    for (entity, enemy, pos, collider, mut health, mut alive, mut body, mut vel, mut anim) in
        enemies.iter_mut()
    {
        if !alive.0 || !body.enabled || !hero_box.overlaps(&aabb_of(pos, collider)) {
            continue;
        }
        let bounce = enemy.species.profile(&io.config).bounce;
        match resolve_enemy_contact(hero_vel.y, bounce, &mut health) {
            EnemyContact::Stomp { bounce, outcome } => {
                hero::bounce(&mut hero_vel, bounce, &io.config);
                io.events.emit(
                    "enemy_stomped",
                    serde_json::json!({ "species": format!("{:?}", enemy.species), "health": health.0 }),
                    Some(entity),
                );
                if outcome == StompOutcome::Killed {
                    enemy::die(
                        &mut io.commands,
                        entity,
                        &mut alive,
                        &mut body,
                        &mut vel,
                        &mut anim,
                    );
                    io.events.emit(
                        "enemy_killed",
                        serde_json::json!({ "species": format!("{:?}", enemy.species) }),
                        Some(entity),
                    );
                }
            }
            EnemyContact::HeroHit => {
                hero_alive.0 = false;
                io.events.emit(
                    "hero_hit",
                    serde_json::json!({ "species": format!("{:?}", enemy.species) }),
                    Some(hero_entity),
                );
                io.session
                    .request(FlowRequest::Restart(RestartReason::EnemyContact));
                return;
            }
        }
    }
}

fn hero_vs_key(
    mut io: InteractionIo,
    heroes: Query<(&GamePosition, &Collider, &Body, &Alive), With<Hero>>,
    mut keys: Query<PickupItem, (With<Key>, Without<Hero>)>,
) {
    if io.session.pending.is_some() {
        return;
    }
    let Some(hero_box) = heroes
        .iter()
        .find_map(|(pos, collider, body, alive)| hero_aabb(pos, collider, body, alive))
    else {
        return;
    };
    for (entity, pos, collider, mut alive) in keys.iter_mut() {
        if !alive.0 || !hero_box.overlaps(&aabb_of(pos, collider)) {
            continue;
        }
        alive.0 = false;
        io.commands.entity(entity).despawn();
        io.session.has_key = true;
        io.events
            .emit("key_collected", serde_json::json!({}), Some(entity));
    }
}

fn hero_vs_door(
    mut io: InteractionIo,
    heroes: Query<(&GamePosition, &Collider, &Body, &Alive, &Contacts), With<Hero>>,
    doors: Query<(Entity, &GamePosition, &Collider), (With<Door>, Without<Hero>)>,
) {
    if io.session.pending.is_some() {
        return;
    }
    let Some((hero_box, grounded)) = heroes.iter().find_map(|(pos, collider, body, alive, contacts)| {
        hero_aabb(pos, collider, body, alive).map(|aabb| (aabb, contacts.grounded()))
    }) else {
        return;
    };
    for (entity, pos, collider) in doors.iter() {
        let overlapping = hero_box.overlaps(&aabb_of(pos, collider));
        if door_opens(io.session.has_key, grounded, overlapping) {
            let level = io.session.level;
            io.events.emit(
                "door_entered",
                serde_json::json!({ "level": level }),
                Some(entity),
            );
            io.session.request(FlowRequest::Advance);
            return;
        }
    }
}

/// Only the world's lower bound counts; landing on a platform never does.
fn hero_fell_out(mut io: InteractionIo, mut heroes: HeroQuery) {
    if io.session.pending.is_some() {
        return;
    }
    for (entity, _, _, _, contacts, _, mut alive) in heroes.iter_mut() {
        if alive.0 && contacts.blocked.down {
            alive.0 = false;
            let level = io.session.level;
            io.events
                .emit("hero_fell", serde_json::json!({ "level": level }), Some(entity));
            io.session
                .request(FlowRequest::Restart(RestartReason::FellOut));
            return;
        }
    }
}
