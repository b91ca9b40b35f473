use std::collections::HashMap;

use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::HeadlessMode;
use crate::events::GameEventBus;

fn default_volume() -> f32 {
    1.0
}

fn default_looping() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SfxDefinition {
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub pitch_variance: f32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct MusicDefinition {
    pub path: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default = "default_looping")]
    pub looping: bool,
}

/// Work for the playback system; drained every frame.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackCommand {
    Sfx { path: String, volume: f32, speed: f32 },
    Music { path: String, volume: f32, looping: bool },
    MusicVolume(f32),
}

#[derive(Resource)]
pub struct AudioManager {
    pub sfx: HashMap<String, SfxDefinition>,
    pub music: HashMap<String, MusicDefinition>,
    /// Gameplay event name -> sfx name
    pub triggers: HashMap<String, String>,
    pub current_music: Option<String>,
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub music_volume: f32,
    /// Silences music only; survives track changes and state transitions.
    pub music_muted: bool,
    pending: Vec<PlaybackCommand>,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self {
            sfx: HashMap::new(),
            music: HashMap::new(),
            triggers: HashMap::new(),
            current_music: None,
            master_volume: 1.0,
            sfx_volume: 1.0,
            music_volume: 1.0,
            music_muted: false,
            pending: Vec::new(),
        }
    }
}

impl AudioManager {
    pub fn with_game_defaults() -> Self {
        let sfx = |path: &str, pitch_variance: f32| SfxDefinition {
            path: path.to_string(),
            volume: 1.0,
            pitch_variance,
        };
        let track = |path: &str, looping: bool| MusicDefinition {
            path: path.to_string(),
            volume: 1.0,
            looping,
        };
        let mut audio = Self::default();
        audio.sfx = HashMap::from([
            ("jump".to_string(), sfx("audio/jump.wav", 0.08)),
            ("coin".to_string(), sfx("audio/coin.wav", 0.0)),
            ("stomp".to_string(), sfx("audio/stomp.wav", 0.1)),
            ("key".to_string(), sfx("audio/key.wav", 0.0)),
            ("door".to_string(), sfx("audio/door.wav", 0.0)),
        ]);
        audio.music = HashMap::from([
            ("menu".to_string(), track("audio/menu.ogg", true)),
            ("level".to_string(), track("audio/level.ogg", true)),
            ("about".to_string(), track("audio/about.ogg", true)),
            ("finish".to_string(), track("audio/about.ogg", false)),
        ]);
        audio.triggers = [
            ("hero_jump", "jump"),
            ("coin_collected", "coin"),
            ("enemy_stomped", "stomp"),
            ("hero_hit", "stomp"),
            ("key_collected", "key"),
            ("door_entered", "door"),
        ]
        .into_iter()
        .map(|(event, sfx)| (event.to_string(), sfx.to_string()))
        .collect();
        audio
    }

    pub fn set_volume(&mut self, channel: &str, value: f32, frame: u64) -> Result<(), String> {
        let v = value.clamp(0.0, 2.0);
        match channel {
            "master" => self.master_volume = v,
            "sfx" => self.sfx_volume = v,
            "music" => self.music_volume = v,
            _ => return Err(format!("Unknown volume channel: {channel}")),
        }
        self.pending.push(PlaybackCommand::MusicVolume(self.current_music_volume()));
        debug!("[Keyrunner audio] frame {frame}: {channel} volume {v}");
        Ok(())
    }

    pub fn toggle_music_mute(&mut self, frame: u64) -> bool {
        self.music_muted = !self.music_muted;
        self.pending.push(PlaybackCommand::MusicVolume(self.current_music_volume()));
        debug!(
            "[Keyrunner audio] frame {frame}: music {}",
            if self.music_muted { "muted" } else { "unmuted" }
        );
        self.music_muted
    }

    pub fn play_sfx(
        &mut self,
        name: &str,
        frame: u64,
        volume_scale: Option<f32>,
        source_event: Option<&str>,
    ) -> Result<(), String> {
        let Some(def) = self.sfx.get(name) else {
            return Err(format!("Unknown sfx: {name}"));
        };
        let volume =
            def.volume * self.sfx_volume * self.master_volume * volume_scale.unwrap_or(1.0);
        let pitch = if def.pitch_variance > 0.0 {
            1.0 + (rand::random::<f32>() * 2.0 - 1.0) * def.pitch_variance
        } else {
            1.0
        };
        self.pending.push(PlaybackCommand::Sfx {
            path: def.path.clone(),
            volume,
            speed: pitch,
        });
        debug!(
            "[Keyrunner audio] frame {frame}: sfx {name} (volume {volume:.2}, pitch {pitch:.2}, from {})",
            source_event.unwrap_or("direct")
        );
        Ok(())
    }

    /// Replace whatever track is playing with `name`.
    pub fn play_music(&mut self, name: &str, frame: u64) -> Result<(), String> {
        let Some(def) = self.music.get(name) else {
            return Err(format!("Unknown music track: {name}"));
        };
        let path = def.path.clone();
        let looping = def.looping;
        self.current_music = Some(name.to_string());
        let volume = self.current_music_volume();
        self.pending.push(PlaybackCommand::Music {
            path,
            volume,
            looping,
        });
        debug!("[Keyrunner audio] frame {frame}: music {name} (volume {volume:.2})");
        Ok(())
    }

    /// Effective volume of the current track, zero while muted.
    pub fn current_music_volume(&self) -> f32 {
        if self.music_muted {
            return 0.0;
        }
        let track = self
            .current_music
            .as_ref()
            .and_then(|name| self.music.get(name))
            .map_or(1.0, |def| def.volume);
        track * self.music_volume * self.master_volume
    }

    pub fn take_pending(&mut self) -> Vec<PlaybackCommand> {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Resource, Default)]
struct AudioEventCursor {
    last_seq: u64,
}

/// Marks the entity playing the current music track
#[derive(Component)]
pub struct MusicTrack;

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(AudioManager::with_game_defaults())
            .insert_resource(AudioEventCursor::default())
            .add_systems(
                PostUpdate,
                (auto_audio_from_events, play_pending_audio).chain(),
            );
    }
}

fn auto_audio_from_events(
    mut audio: ResMut<AudioManager>,
    bus: Res<GameEventBus>,
    mut cursor: ResMut<AudioEventCursor>,
) {
    for ev in bus.since(cursor.last_seq) {
        if let Some(mapped) = audio.triggers.get(&ev.name).cloned() {
            if let Err(err) = audio.play_sfx(&mapped, ev.frame, None, Some(ev.name.as_str())) {
                warn!("[Keyrunner audio] {err}");
            }
        }
    }
    cursor.last_seq = bus.latest_seq();
}

fn play_pending_audio(
    mut commands: Commands,
    mut audio: ResMut<AudioManager>,
    headless: Option<Res<HeadlessMode>>,
    asset_server: Option<Res<AssetServer>>,
    music_tracks: Query<Entity, With<MusicTrack>>,
    mut music_sinks: Query<&mut AudioSink, With<MusicTrack>>,
) {
    let pending = audio.take_pending();
    if headless.is_some_and(|h| h.0) {
        return;
    }
    let Some(asset_server) = asset_server else {
        return;
    };
    for command in pending {
        match command {
            PlaybackCommand::Sfx {
                path,
                volume,
                speed,
            } => {
                commands.spawn((
                    AudioPlayer::new(asset_server.load(path)),
                    PlaybackSettings::DESPAWN
                        .with_volume(Volume::new(volume))
                        .with_speed(speed),
                ));
            }
            PlaybackCommand::Music {
                path,
                volume,
                looping,
            } => {
                for entity in music_tracks.iter() {
                    commands.entity(entity).despawn();
                }
                let settings = if looping {
                    PlaybackSettings::LOOP
                } else {
                    PlaybackSettings::DESPAWN
                };
                commands.spawn((
                    AudioPlayer::new(asset_server.load(path)),
                    settings.with_volume(Volume::new(volume)),
                    MusicTrack,
                ));
            }
            PlaybackCommand::MusicVolume(volume) => {
                for sink in music_sinks.iter_mut() {
                    sink.set_volume(volume);
                }
            }
        }
    }
}
