use bevy::prelude::*;

/// Marks the hero entity
#[derive(Component)]
pub struct Hero;

/// Centre position in world units (y grows downward)
#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub struct GamePosition {
    pub x: f32,
    pub y: f32,
}

/// Velocity in world units per second (positive y is downward)
#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned collision footprint, centred on `GamePosition`
#[derive(Component, Clone, Copy, Debug)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

/// Whether the entity is still part of play
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alive(pub bool);

impl Default for Alive {
    fn default() -> Self {
        Self(true)
    }
}

/// Horizontal sprite orientation
#[derive(Component, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Sides {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Contact flags reported by the physics step for the current frame.
/// `touching` comes from solid bodies, `blocked` from the world bounds.
#[derive(Component, Clone, Copy, Default, Debug)]
pub struct Contacts {
    pub touching: Sides,
    pub blocked: Sides,
}

impl Contacts {
    /// Resting on a supporting body directly below.
    pub fn grounded(&self) -> bool {
        self.touching.down
    }
}

/// Which static solids a body is separated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolidMask {
    None,
    Platforms,
    PlatformsAndEnemyWalls,
}

impl SolidMask {
    pub fn includes(self, solid: Solid) -> bool {
        match self {
            SolidMask::None => false,
            SolidMask::Platforms => solid == Solid::Platform,
            SolidMask::PlatformsAndEnemyWalls => true,
        }
    }
}

/// Physics body settings
#[derive(Component, Clone, Copy, Debug)]
pub struct Body {
    /// Disabled bodies neither move nor overlap anything.
    pub enabled: bool,
    /// When false the body keeps its position (pause freezes the hero this way).
    pub moves: bool,
    pub allow_gravity: bool,
    pub collide_world_bounds: bool,
    pub solids: SolidMask,
}

impl Body {
    pub fn dynamic(solids: SolidMask) -> Self {
        Self {
            enabled: true,
            moves: true,
            allow_gravity: true,
            collide_world_bounds: true,
            solids,
        }
    }

    /// Gravity-free body used for overlap-only entities (coins, key, door).
    pub fn sensor() -> Self {
        Self {
            enabled: true,
            moves: false,
            allow_gravity: false,
            collide_world_bounds: false,
            solids: SolidMask::None,
        }
    }
}

/// Immovable static geometry
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Solid {
    Platform,
    /// Invisible geometry that only turns enemies around.
    EnemyWall,
}

#[derive(Component)]
pub struct Coin;

#[derive(Component)]
pub struct Key;

#[derive(Component)]
pub struct Door;

/// Everything spawned by the level loader; torn down on restart/advance/exit.
#[derive(Component)]
pub struct LevelEntity;

/// True when running without a window (tests, `--headless`)
#[derive(Resource, Clone, Copy, Default)]
pub struct HeadlessMode(pub bool);

/// Gameplay constants (a resource so `game.json` can tune them)
#[derive(Resource, Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub gravity: f32,
    pub hero_speed: f32,
    pub jump_speed: f32,
    pub bounce_speed: f32,
    pub strong_bounce_speed: f32,
    pub spider_speed: f32,
    pub boss_speed: f32,
    pub boss_health: u32,
    pub world_width: f32,
    pub world_height: f32,
    pub hero_size: [f32; 2],
    pub spider_size: [f32; 2],
    pub boss_size: [f32; 2],
    pub coin_size: [f32; 2],
    pub door_size: [f32; 2],
    pub key_size: [f32; 2],
    pub enemy_wall_size: [f32; 2],
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity: 1200.0,
            hero_speed: 200.0,
            jump_speed: 550.0,
            bounce_speed: 200.0,
            strong_bounce_speed: 500.0,
            spider_speed: 100.0,
            boss_speed: 200.0,
            boss_health: 5,
            world_width: 960.0,
            world_height: 600.0,
            hero_size: [36.0, 42.0],
            spider_size: [42.0, 32.0],
            boss_size: [42.0, 32.0],
            coin_size: [22.0, 22.0],
            door_size: [42.0, 66.0],
            key_size: [24.0, 24.0],
            enemy_wall_size: [2.0, 42.0],
        }
    }
}

impl GameConfig {
    pub fn collider(size: [f32; 2]) -> Collider {
        Collider {
            width: size[0],
            height: size[1],
        }
    }
}
