use bevy::color::Alpha;
use bevy::prelude::*;

use crate::animation::{resolve_clip_frame, AnimationController, AnimationLibrary};
use crate::components::*;
use crate::tween::RenderOffset;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera).add_systems(
            PostUpdate,
            (
                sync_game_position_to_transform,
                sync_facing_to_sprite,
                apply_frame_cues,
            )
                .before(bevy::transform::TransformSystem::TransformPropagate),
        );
    }
}

#[derive(Component)]
pub struct MainCamera;

/// World space is y-down with the origin at the top-left corner; bevy is
/// y-up with the origin at the centre of the screen.
pub fn world_to_render(x: f32, y: f32, z: f32, config: &GameConfig) -> Vec3 {
    Vec3::new(
        x - config.world_width / 2.0,
        config.world_height / 2.0 - y,
        z,
    )
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((MainCamera, Camera2d, Transform::from_xyz(0.0, 0.0, 100.0)));
}

fn sync_game_position_to_transform(
    config: Res<GameConfig>,
    mut query: Query<(&GamePosition, Option<&RenderOffset>, &mut Transform), With<Sprite>>,
) {
    for (pos, offset, mut transform) in query.iter_mut() {
        let (dx, dy) = offset.map_or((0.0, 0.0), |o| (o.x, o.y));
        let z = transform.translation.z;
        transform.translation = world_to_render(pos.x + dx, pos.y + dy, z, &config);
    }
}

fn sync_facing_to_sprite(mut query: Query<(&Facing, &mut Sprite), Changed<Facing>>) {
    for (facing, mut sprite) in query.iter_mut() {
        sprite.flip_x = *facing == Facing::Left;
    }
}

/// How a plain-colour sprite stands in for a sheet frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameCue {
    pub alpha: f32,
    pub width_scale: f32,
    pub height_scale: f32,
}

impl Default for FrameCue {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }
}

pub fn frame_cue(graph: &str, sheet_frame: usize) -> FrameCue {
    match (graph, sheet_frame) {
        // Coin spin: edge-on at frame 2.
        ("coin", 1) => FrameCue {
            width_scale: 0.6,
            ..default()
        },
        ("coin", 2) => FrameCue {
            width_scale: 0.2,
            ..default()
        },
        // Death flicker, then a squashed corpse.
        ("spider" | "spider_boss", 4) => FrameCue {
            alpha: 0.3,
            ..default()
        },
        ("spider" | "spider_boss", 3) => FrameCue {
            height_scale: 0.5,
            ..default()
        },
        ("hero", 3) => FrameCue {
            height_scale: 1.1,
            width_scale: 0.9,
            ..default()
        },
        ("hero", 4) => FrameCue {
            height_scale: 0.95,
            width_scale: 1.05,
            ..default()
        },
        _ => FrameCue::default(),
    }
}

fn apply_frame_cues(
    library: Res<AnimationLibrary>,
    mut query: Query<(&AnimationController, &Collider, &mut Sprite), Changed<AnimationController>>,
) {
    for (controller, collider, mut sprite) in query.iter_mut() {
        let Some(clip) = library.clip(&controller.graph, &controller.state) else {
            continue;
        };
        let cue = frame_cue(&controller.graph, resolve_clip_frame(clip, controller.frame));
        sprite.custom_size = Some(Vec2::new(
            collider.width * cue.width_scale,
            collider.height * cue.height_scale,
        ));
        sprite.color.set_alpha(cue.alpha);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::default_animation_library;

    #[test]
    fn world_corners_map_to_screen_corners() {
        let config = GameConfig::default();
        assert_eq!(world_to_render(0.0, 0.0, 1.0, &config), Vec3::new(-480.0, 300.0, 1.0));
        assert_eq!(world_to_render(960.0, 600.0, 0.0, &config), Vec3::new(480.0, -300.0, 0.0));
        assert_eq!(world_to_render(480.0, 300.0, 5.0, &config), Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn death_clip_flickers_then_squashes() {
        let library = default_animation_library();
        let die = library.clip("spider", "die").expect("die clip");
        let alphas: Vec<f32> = (0..4)
            .map(|f| frame_cue("spider", resolve_clip_frame(die, f)).alpha)
            .collect();
        assert_eq!(alphas, vec![1.0, 0.3, 1.0, 0.3]);
        let last = frame_cue("spider", resolve_clip_frame(die, die.frames.len() - 1));
        assert_eq!(last.height_scale, 0.5);
        assert_eq!(frame_cue("platform", 0), FrameCue::default());
    }

    #[test]
    fn key_offset_moves_drawn_position_only() {
        let mut world = World::new();
        world.insert_resource(GameConfig::default());
        let key = world
            .spawn((
                Key,
                GamePosition { x: 84.0, y: 390.0 },
                RenderOffset { x: 0.0, y: -3.0 },
                Sprite::default(),
                Transform::from_xyz(0.0, 0.0, 2.0),
            ))
            .id();
        let mut schedule = Schedule::default();
        schedule.add_systems(sync_game_position_to_transform);
        schedule.run(&mut world);

        let translation = world.get::<Transform>(key).expect("transform").translation;
        assert_eq!(translation, Vec3::new(84.0 - 480.0, 300.0 - 387.0, 2.0));
        assert_eq!(
            world.get::<GamePosition>(key).copied(),
            Some(GamePosition { x: 84.0, y: 390.0 })
        );
    }
}
