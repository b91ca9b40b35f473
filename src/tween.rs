use bevy::prelude::*;

pub struct TweenPlugin;

impl Plugin for TweenPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, tick_tweens);
    }
}

/// Cosmetic displacement added to the rendered transform only.
/// Gameplay (physics, overlaps) never reads it.
#[derive(Component, Clone, Copy, Default, Debug, PartialEq)]
pub struct RenderOffset {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EasingFunction {
    Linear,
    SineInOut,
}

impl EasingFunction {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::SineInOut => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
        }
    }
}

/// Drives the vertical `RenderOffset` of its entity.
#[derive(Clone, Debug)]
pub struct TweenInstance {
    pub from: f32,
    pub to: f32,
    pub duration: f32,
    pub elapsed: f32,
    pub easing: EasingFunction,
    /// Play back to `from` after reaching `to`.
    pub yoyo: bool,
    pub looping: bool,
}

impl TweenInstance {
    pub fn new(from: f32, to: f32, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.001),
            elapsed: 0.0,
            easing: EasingFunction::Linear,
            yoyo: false,
            looping: false,
        }
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    pub fn yoyo_forever(mut self) -> Self {
        self.yoyo = true;
        self.looping = true;
        self
    }

    fn cycle_length(&self) -> f32 {
        if self.yoyo {
            self.duration * 2.0
        } else {
            self.duration
        }
    }

    /// Value at the current elapsed time.
    pub fn value(&self) -> f32 {
        let cycle = self.cycle_length();
        let local = if self.looping {
            self.elapsed % cycle
        } else {
            self.elapsed.min(cycle)
        };
        let t = if self.yoyo && local > self.duration {
            1.0 - (local - self.duration) / self.duration
        } else {
            local / self.duration
        };
        self.from + (self.to - self.from) * self.easing.apply(t)
    }

    pub fn finished(&self) -> bool {
        !self.looping && self.elapsed >= self.cycle_length()
    }
}

#[derive(Component, Clone, Default)]
pub struct TweenSet(pub Vec<TweenInstance>);

/// Key bob: starts 3 units up and drifts 6 units down and back every 1.6 s.
pub fn key_bob() -> TweenInstance {
    TweenInstance::new(-3.0, 3.0, 0.8)
        .with_easing(EasingFunction::SineInOut)
        .yoyo_forever()
}

fn tick_tweens(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut TweenSet, &mut RenderOffset)>,
) {
    let dt = time.delta_secs();
    for (entity, mut tween_set, mut offset) in query.iter_mut() {
        for tween in tween_set.0.iter_mut() {
            tween.elapsed += dt;
            offset.y = tween.value();
        }
        tween_set.0.retain(|t| !t.finished());
        if tween_set.0.is_empty() {
            commands.entity(entity).remove::<TweenSet>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use std::time::Duration;

    #[test]
    fn key_bob_swings_between_extremes_and_repeats() {
        let bob = key_bob();
        assert!((bob.value() + 3.0).abs() < 0.001);

        let mut at_peak = bob.clone();
        at_peak.elapsed = 0.8;
        assert!((at_peak.value() - 3.0).abs() < 0.001);

        let mut back = bob.clone();
        back.elapsed = 1.6;
        assert!((back.value() + 3.0).abs() < 0.01);

        let mut later = bob.clone();
        later.elapsed = 1.6 * 10.0 + 0.4;
        assert!(later.value().abs() < 0.01);
        assert!(!later.finished());
    }

    #[test]
    fn sine_in_out_is_symmetric() {
        let ease = EasingFunction::SineInOut;
        assert_eq!(ease.apply(0.0), 0.0);
        assert!((ease.apply(0.5) - 0.5).abs() < 0.0001);
        assert!((ease.apply(1.0) - 1.0).abs() < 0.0001);
        assert!((ease.apply(0.25) + ease.apply(0.75) - 1.0).abs() < 0.0001);
    }

    #[test]
    fn finished_tween_is_removed() {
        let mut world = World::new();
        world.insert_resource(Time::<()>::default());
        let entity = world
            .spawn((
                RenderOffset::default(),
                TweenSet(vec![TweenInstance::new(0.0, 10.0, 0.5)]),
            ))
            .id();
        world
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(0.6));
        world.run_system_once(tick_tweens).expect("tick tweens");

        assert_eq!(world.get::<RenderOffset>(entity).map(|o| o.y), Some(10.0));
        assert!(world.get::<TweenSet>(entity).is_none());
    }
}
