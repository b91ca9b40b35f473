mod animation;
mod audio;
mod components;
mod enemy;
mod events;
mod game_runtime;
mod hero;
mod input;
mod interaction;
mod level;
mod physics;
mod physics_core;
mod render;
mod spawn;
mod tween;
mod ui;

use std::collections::HashMap;
use std::path::Path;

use bevy::prelude::*;
use components::{GameConfig, HeadlessMode};
use level::LevelSet;

#[derive(serde::Deserialize, Default)]
struct StartupConfig {
    window_title: Option<String>,
    window_width: Option<f32>,
    window_height: Option<f32>,
    background_color: Option<[f32; 3]>,
    texture_filter: Option<String>,
    assets_dir: Option<String>,
    levels_dir: Option<String>,
    /// Overrides for the gameplay constants; missing fields keep defaults.
    physics: Option<GameConfig>,
    /// Channel name (`master`, `sfx`, `music`) to volume.
    volumes: Option<HashMap<String, f32>>,
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn load_startup_config() -> StartupConfig {
    let path = env_override("KEYRUNNER_GAME_CONFIG").unwrap_or_else(|| "game.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Keyrunner] Loaded startup config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Keyrunner] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

/// Levels from `levels_dir` when given, otherwise the ones built into the
/// binary. A broken directory falls back to the built-in set.
fn load_levels(levels_dir: Option<String>) -> LevelSet {
    let loaded = match levels_dir {
        Some(dir) => LevelSet::from_dir(Path::new(&dir)).or_else(|err| {
            eprintln!("[Keyrunner level] {err}; using built-in levels");
            LevelSet::embedded()
        }),
        None => LevelSet::embedded(),
    };
    match loaded {
        Ok(levels) => {
            println!(
                "[Keyrunner level] Loaded {} levels from {}",
                levels.levels.len(),
                levels.source
            );
            levels
        }
        Err(err) => {
            eprintln!("[Keyrunner level] Built-in levels are broken: {err}");
            LevelSet::default()
        }
    }
}

/// Registers every gameplay plugin. Window-only plugins are skipped when
/// `headless`; everything else runs the same with or without a window.
pub fn add_game_plugins(app: &mut App, headless: bool) {
    app.insert_resource(HeadlessMode(headless))
        .add_plugins(events::GameEventsPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(game_runtime::GameRuntimePlugin)
        .add_plugins(hero::HeroPlugin)
        .add_plugins(enemy::EnemyPlugin)
        .add_plugins(physics::PhysicsPlugin)
        .add_plugins(interaction::InteractionPlugin)
        .add_plugins(animation::AnimationPlugin)
        .add_plugins(tween::TweenPlugin)
        .add_plugins(audio::AudioPlugin)
        .add_plugins(ui::UiPlugin);
    if !headless {
        app.add_plugins(render::RenderPlugin);
    }
}

fn main() {
    let headless = std::env::args().any(|a| a == "--headless");
    let startup_config = load_startup_config();
    let mut app = App::new();

    if headless {
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::state::app::StatesPlugin);
        println!("[Keyrunner] Starting in HEADLESS mode");
    } else {
        // Env vars override game.json values
        let assets_dir = env_override("KEYRUNNER_ASSETS_DIR")
            .or(startup_config.assets_dir)
            .unwrap_or_else(|| "assets".to_string());
        if assets_dir != "assets" {
            println!("[Keyrunner] Using game assets dir: {}", assets_dir);
        }
        let nearest_filter = env_override("KEYRUNNER_TEXTURE_FILTER")
            .or(startup_config.texture_filter)
            .is_some_and(|v| v.eq_ignore_ascii_case("nearest"));

        let window_title = startup_config
            .window_title
            .unwrap_or_else(|| "Keyrunner".to_string());
        let window_width = startup_config.window_width.unwrap_or(960.0);
        let window_height = startup_config.window_height.unwrap_or(600.0);

        let mut plugins = DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: window_title,
                    resolution: (window_width, window_height).into(),
                    present_mode: bevy::window::PresentMode::AutoVsync,
                    ..default()
                }),
                ..default()
            })
            .set(bevy::asset::AssetPlugin {
                file_path: assets_dir,
                ..default()
            });

        if nearest_filter {
            plugins = plugins.set(bevy::render::texture::ImagePlugin::default_nearest());
            println!("[Keyrunner] Texture filter: nearest (pixel-art mode)");
        }

        app.add_plugins(plugins);
        let bg = startup_config.background_color.unwrap_or([0.36, 0.62, 0.85]);
        app.insert_resource(ClearColor(Color::srgb(bg[0], bg[1], bg[2])));
        println!("[Keyrunner] Starting in WINDOWED mode");
    }

    let levels = load_levels(env_override("KEYRUNNER_LEVELS_DIR").or(startup_config.levels_dir));
    app.insert_resource(startup_config.physics.unwrap_or_default())
        .insert_resource(levels);
    add_game_plugins(&mut app, headless);

    if let Some(volumes) = startup_config.volumes {
        let mut audio = app.world_mut().resource_mut::<audio::AudioManager>();
        for (channel, value) in volumes {
            if let Err(err) = audio.set_volume(&channel, value, 0) {
                eprintln!("[Keyrunner audio] {err}");
            }
        }
    }

    app.run();
}
