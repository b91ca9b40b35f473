use std::collections::HashMap;

use bevy::prelude::*;

use crate::events::GameEventBus;

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct AnimationClipDef {
    /// Sprite-sheet frame indices, played in order.
    pub frames: Vec<usize>,
    pub fps: f32,
    #[serde(default)]
    pub looping: bool,
}

impl AnimationClipDef {
    fn new(frames: &[usize], fps: f32, looping: bool) -> Self {
        Self {
            frames: frames.to_vec(),
            fps,
            looping,
        }
    }
}

#[derive(Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct AnimationGraphDef {
    pub states: HashMap<String, AnimationClipDef>,
}

#[derive(Resource, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct AnimationLibrary {
    pub graphs: HashMap<String, AnimationGraphDef>,
}

impl AnimationLibrary {
    pub fn clip(&self, graph: &str, state: &str) -> Option<&AnimationClipDef> {
        self.graphs.get(graph).and_then(|g| g.states.get(state))
    }
}

/// Playback state of one sprite's animation graph
#[derive(Component, Clone, Debug)]
pub struct AnimationController {
    pub graph: String,
    pub state: String,
    pub frame: usize,
    pub timer: f32,
    pub playing: bool,
}

impl AnimationController {
    pub fn new(graph: &str, state: &str) -> Self {
        Self {
            graph: graph.to_string(),
            state: state.to_string(),
            frame: 0,
            timer: 0.0,
            playing: true,
        }
    }

    /// Switch clips. Re-selecting the clip that is already playing is a
    /// no-op so looping clips are not restarted every frame.
    pub fn play(&mut self, state: &str) -> bool {
        if self.state == state {
            return false;
        }
        self.state = state.to_string();
        self.frame = 0;
        self.timer = 0.0;
        self.playing = true;
        true
    }

    /// A non-looping `state` has played through its last frame.
    pub fn finished(&self, state: &str) -> bool {
        self.state == state && !self.playing
    }
}

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(default_animation_library())
            .add_systems(Update, advance_animation_frames);
    }
}

pub fn default_animation_library() -> AnimationLibrary {
    let crawler = || AnimationGraphDef {
        states: HashMap::from([
            (
                "crawl".to_string(),
                AnimationClipDef::new(&[0, 1, 2], 8.0, true),
            ),
            (
                "die".to_string(),
                AnimationClipDef::new(&[0, 4, 0, 4, 0, 4, 3, 3, 3, 3, 3, 3], 12.0, false),
            ),
        ]),
    };

    let mut graphs = HashMap::new();
    graphs.insert(
        "hero".to_string(),
        AnimationGraphDef {
            states: HashMap::from([
                ("stop".to_string(), AnimationClipDef::new(&[0], 1.0, true)),
                ("run".to_string(), AnimationClipDef::new(&[1, 2], 8.0, true)),
                ("jump".to_string(), AnimationClipDef::new(&[3], 1.0, true)),
                ("fall".to_string(), AnimationClipDef::new(&[4], 1.0, true)),
            ]),
        },
    );
    graphs.insert("spider".to_string(), crawler());
    graphs.insert("spider_boss".to_string(), crawler());
    graphs.insert(
        "coin".to_string(),
        AnimationGraphDef {
            states: HashMap::from([(
                "rotate".to_string(),
                AnimationClipDef::new(&[0, 1, 2, 1], 6.0, true),
            )]),
        },
    );
    AnimationLibrary { graphs }
}

fn advance_animation_frames(
    time: Res<Time>,
    library: Res<AnimationLibrary>,
    mut bus: ResMut<GameEventBus>,
    mut query: Query<(Entity, &mut AnimationController)>,
) {
    let dt = time.delta_secs();
    for (entity, mut anim) in query.iter_mut() {
        if !anim.playing {
            continue;
        }
        let Some(clip) = library.clip(&anim.graph, &anim.state) else {
            continue;
        };
        let frame_count = clip.frames.len().max(1);
        if frame_count == 1 && clip.looping {
            continue;
        }
        let fps = clip.fps.max(0.001);

        anim.timer += dt;
        let frame_time = 1.0 / fps;
        while anim.timer >= frame_time {
            anim.timer -= frame_time;
            if clip.looping {
                anim.frame = (anim.frame + 1) % frame_count;
            } else if anim.frame + 1 < frame_count {
                anim.frame += 1;
            } else {
                anim.playing = false;
                anim.frame = frame_count - 1;
                bus.emit(
                    "anim_complete",
                    serde_json::json!({
                        "graph": anim.graph,
                        "state": anim.state,
                    }),
                    Some(entity),
                );
                break;
            }
        }
    }
}

/// Sprite-sheet index for the controller's current frame.
pub fn resolve_clip_frame(clip: &AnimationClipDef, frame: usize) -> usize {
    if clip.frames.is_empty() {
        0
    } else {
        clip.frames[frame % clip.frames.len()]
    }
}
