use bevy::prelude::*;

use crate::components::*;
use crate::events::GameEventBus;
use crate::input::{GameAction, VirtualInput};
use crate::level::{LevelError, LevelSet};
use crate::spawn::{plan_level, spawn_level};

/// Number of level slots, including the end-of-game sentinel.
pub const LEVEL_COUNT: usize = 6;
/// Entering Play with this index goes straight to Finish.
pub const FINISH_LEVEL: usize = 5;

#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum GameFlowState {
    #[default]
    Menu,
    Play,
    About,
    Finish,
}

/// Per-frame gameplay order while in Play.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    Control,
    Physics,
    Behavior,
    Interaction,
    Animation,
    Flow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartReason {
    EnemyContact,
    FellOut,
    PlayerRequest,
}

impl RestartReason {
    fn label(self) -> &'static str {
        match self {
            RestartReason::EnemyContact => "enemy contact",
            RestartReason::FellOut => "fell out of the world",
            RestartReason::PlayerRequest => "restart from pause menu",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowRequest {
    Restart(RestartReason),
    Advance,
    ToMenu,
}

/// Level index handed to Play on entry
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct PlayRequest {
    pub level: usize,
}

/// State owned by one play attempt. Inserted on entering Play, removed on
/// leaving it.
#[derive(Resource, Clone, Debug)]
pub struct PlaySession {
    pub level: usize,
    pub coins: u32,
    pub has_key: bool,
    pub paused: bool,
    /// Level-flow outcome requested this frame, applied by the Flow set.
    pub pending: Option<FlowRequest>,
}

impl PlaySession {
    pub fn new(level: usize) -> Self {
        Self {
            level,
            coins: 0,
            has_key: false,
            paused: false,
            pending: None,
        }
    }

    /// First request in a frame wins; later ones are dropped.
    pub fn request(&mut self, request: FlowRequest) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(request);
        true
    }
}

/// Level index to load for a requested index, or `None` for the sentinel.
pub fn resolve_entry(level: usize) -> Option<usize> {
    let level = level % LEVEL_COUNT;
    (level != FINISH_LEVEL).then_some(level)
}

pub struct GameRuntimePlugin;

impl Plugin for GameRuntimePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameFlowState>()
            .enable_state_scoped_entities::<GameFlowState>()
            .insert_resource(PlayRequest::default())
            .configure_sets(
                Update,
                (
                    GameplaySet::Control,
                    GameplaySet::Physics,
                    GameplaySet::Behavior,
                    GameplaySet::Interaction,
                    GameplaySet::Animation,
                    GameplaySet::Flow,
                )
                    .chain()
                    .run_if(in_state(GameFlowState::Play))
                    .run_if(resource_exists::<PlaySession>),
            )
            .add_systems(OnEnter(GameFlowState::Play), enter_play)
            .add_systems(OnExit(GameFlowState::Play), leave_play)
            .add_systems(Update, toggle_pause.in_set(GameplaySet::Control))
            .add_systems(Update, apply_level_flow.in_set(GameplaySet::Flow))
            .add_systems(Update, log_state_changes);
    }
}

fn start_level(
    commands: &mut Commands,
    levels: &LevelSet,
    config: &GameConfig,
    headless: bool,
    level: usize,
) -> Result<usize, LevelError> {
    let descriptor = levels.get(level)?;
    let plan = plan_level(descriptor, config)?;
    spawn_level(commands, &plan, config, headless);
    Ok(plan.len())
}

/// Where to go when a level cannot be started.
fn fallback_state(err: &LevelError) -> GameFlowState {
    match err {
        LevelError::MissingLevel(_) => GameFlowState::Finish,
        _ => GameFlowState::Menu,
    }
}

fn enter_play(
    mut commands: Commands,
    request: Res<PlayRequest>,
    levels: Res<LevelSet>,
    config: Res<GameConfig>,
    headless: Res<HeadlessMode>,
    mut events: ResMut<GameEventBus>,
    mut next_state: ResMut<NextState<GameFlowState>>,
) {
    let Some(level) = resolve_entry(request.level) else {
        info!("[Keyrunner] Level {} is past the last level; finishing", request.level);
        next_state.set(GameFlowState::Finish);
        return;
    };
    match start_level(&mut commands, &levels, &config, headless.0, level) {
        Ok(entities) => {
            info!("[Keyrunner level] Started level {level} ({entities} entities)");
            commands.insert_resource(PlaySession::new(level));
            events.emit("level_started", serde_json::json!({ "level": level }), None);
        }
        Err(err) => {
            warn!("[Keyrunner level] Cannot start level {level}: {err}");
            next_state.set(fallback_state(&err));
        }
    }
}

fn leave_play(
    mut commands: Commands,
    level_entities: Query<Entity, With<LevelEntity>>,
) {
    for entity in level_entities.iter() {
        commands.entity(entity).despawn_recursive();
    }
    commands.remove_resource::<PlaySession>();
}

/// Pause only freezes the hero; enemies and the rules keep running.
fn toggle_pause(
    input: Res<VirtualInput>,
    mut session: ResMut<PlaySession>,
    mut events: ResMut<GameEventBus>,
    mut hero_bodies: Query<&mut Body, With<Hero>>,
) {
    if !input.just_pressed(GameAction::Pause) || session.paused {
        return;
    }
    session.paused = true;
    for mut body in hero_bodies.iter_mut() {
        body.moves = false;
    }
    events.emit("game_paused", serde_json::json!({ "level": session.level }), None);
}

pub fn resume_play(session: &mut PlaySession, hero_bodies: &mut Query<&mut Body, With<Hero>>) {
    session.paused = false;
    for mut body in hero_bodies.iter_mut() {
        body.moves = true;
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_level_flow(
    mut commands: Commands,
    mut session: ResMut<PlaySession>,
    levels: Res<LevelSet>,
    config: Res<GameConfig>,
    headless: Res<HeadlessMode>,
    mut events: ResMut<GameEventBus>,
    mut next_state: ResMut<NextState<GameFlowState>>,
    level_entities: Query<Entity, With<LevelEntity>>,
) {
    let Some(request) = session.pending.take() else {
        return;
    };
    let next_level = match request {
        FlowRequest::ToMenu => {
            info!("[Keyrunner] Leaving level {} for the menu", session.level);
            next_state.set(GameFlowState::Menu);
            return;
        }
        FlowRequest::Restart(reason) => {
            info!("[Keyrunner level] Restarting level {} ({})", session.level, reason.label());
            events.emit(
                "level_restarted",
                serde_json::json!({ "level": session.level, "reason": reason.label() }),
                None,
            );
            session.level
        }
        FlowRequest::Advance => {
            info!("[Keyrunner level] Level {} cleared", session.level);
            session.level + 1
        }
    };

    for entity in level_entities.iter() {
        commands.entity(entity).despawn_recursive();
    }

    let Some(level) = resolve_entry(next_level) else {
        info!("[Keyrunner] All levels cleared");
        next_state.set(GameFlowState::Finish);
        return;
    };
    match start_level(&mut commands, &levels, &config, headless.0, level) {
        Ok(entities) => {
            *session = PlaySession::new(level);
            info!("[Keyrunner level] Started level {level} ({entities} entities)");
            events.emit("level_started", serde_json::json!({ "level": level }), None);
        }
        Err(err) => {
            warn!("[Keyrunner level] Cannot start level {level}: {err}");
            next_state.set(fallback_state(&err));
        }
    }
}

fn log_state_changes(state: Res<State<GameFlowState>>) {
    if state.is_changed() {
        info!("[Keyrunner] State: {:?}", state.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;
    use std::collections::HashSet;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(bevy::state::app::StatesPlugin)
            .insert_resource(GameConfig::default())
            .insert_resource(LevelSet::embedded().expect("embedded levels"));
        crate::add_game_plugins(&mut app, true);
        app
    }

    fn enter_level(app: &mut App, level: usize) {
        app.world_mut().resource_mut::<PlayRequest>().level = level;
        app.world_mut()
            .resource_mut::<NextState<GameFlowState>>()
            .set(GameFlowState::Play);
        app.update();
        app.update();
    }

    fn state(app: &App) -> GameFlowState {
        *app.world().resource::<State<GameFlowState>>().get()
    }

    fn hero_count(app: &mut App) -> usize {
        app.world_mut()
            .query_filtered::<(), With<Hero>>()
            .iter(app.world())
            .count()
    }

    #[test]
    fn entry_index_resolution() {
        assert_eq!(resolve_entry(0), Some(0));
        assert_eq!(resolve_entry(4), Some(4));
        assert_eq!(resolve_entry(FINISH_LEVEL), None);
        assert_eq!(resolve_entry(6), Some(0));
    }

    #[test]
    fn first_request_wins() {
        let mut session = PlaySession::new(1);
        assert!(session.request(FlowRequest::Restart(RestartReason::FellOut)));
        assert!(!session.request(FlowRequest::Advance));
        assert_eq!(
            session.pending,
            Some(FlowRequest::Restart(RestartReason::FellOut))
        );
    }

    #[test]
    fn app_starts_in_menu() {
        let mut app = test_app();
        app.update();
        assert_eq!(state(&app), GameFlowState::Menu);
        assert!(app.world().get_resource::<PlaySession>().is_none());
    }

    #[test]
    fn entering_play_spawns_the_requested_level() {
        let mut app = test_app();
        enter_level(&mut app, 1);
        assert_eq!(state(&app), GameFlowState::Play);
        let session = app.world().resource::<PlaySession>();
        assert_eq!(session.level, 1);
        assert_eq!(session.coins, 0);
        assert!(!session.has_key);
        assert_eq!(hero_count(&mut app), 1);
    }

    #[test]
    fn sentinel_level_goes_straight_to_finish() {
        let mut app = test_app();
        enter_level(&mut app, FINISH_LEVEL);
        app.update();
        assert_eq!(state(&app), GameFlowState::Finish);
        assert_eq!(hero_count(&mut app), 0);
        assert!(app.world().get_resource::<PlaySession>().is_none());
    }

    #[test]
    fn door_on_last_level_finishes_without_loading() {
        let mut app = test_app();
        enter_level(&mut app, 4);
        assert_eq!(app.world().resource::<PlaySession>().level, 4);

        app.world_mut().resource_mut::<PlaySession>().pending = Some(FlowRequest::Advance);
        app.update();
        app.update();

        assert_eq!(state(&app), GameFlowState::Finish);
        assert_eq!(hero_count(&mut app), 0);
        assert_eq!(
            app.world_mut()
                .query_filtered::<(), With<LevelEntity>>()
                .iter(app.world())
                .count(),
            0
        );
    }

    #[test]
    fn advancing_resets_session_for_next_level() {
        let mut app = test_app();
        enter_level(&mut app, 0);
        {
            let mut session = app.world_mut().resource_mut::<PlaySession>();
            session.coins = 4;
            session.has_key = true;
            session.pending = Some(FlowRequest::Advance);
        }
        app.update();

        let session = app.world().resource::<PlaySession>();
        assert_eq!(session.level, 1);
        assert_eq!(session.coins, 0);
        assert!(!session.has_key);
        assert_eq!(hero_count(&mut app), 1);
    }

    #[test]
    fn falling_out_restarts_same_level_from_scratch() {
        let mut app = test_app();
        enter_level(&mut app, 2);
        {
            let mut session = app.world_mut().resource_mut::<PlaySession>();
            session.coins = 3;
            session.has_key = true;
        }
        let hero = app
            .world_mut()
            .query_filtered::<Entity, With<Hero>>()
            .single(app.world());
        // Over the floor gap, below the bottom of the world.
        *app.world_mut()
            .get_mut::<GamePosition>(hero)
            .expect("hero position") = GamePosition { x: 378.0, y: 590.0 };

        app.update();

        assert_eq!(state(&app), GameFlowState::Play);
        let session = app.world().resource::<PlaySession>();
        assert_eq!(session.level, 2);
        assert_eq!(session.coins, 0);
        assert!(!session.has_key);
        assert!(!app.world().entities().contains(hero));
        assert_eq!(hero_count(&mut app), 1);
        let bus = app.world().resource::<GameEventBus>();
        assert_eq!(bus.count("hero_fell"), 1);
        assert_eq!(bus.count("level_restarted"), 1);
    }

    #[test]
    fn pause_freezes_hero_until_resumed() {
        let mut app = test_app();
        enter_level(&mut app, 0);
        app.world_mut()
            .resource_mut::<VirtualInput>()
            .apply_snapshot(HashSet::from([GameAction::Pause]));
        app.update();

        assert!(app.world().resource::<PlaySession>().paused);
        let hero = app
            .world_mut()
            .query_filtered::<Entity, With<Hero>>()
            .single(app.world());
        assert_eq!(app.world().get::<Body>(hero).map(|b| b.moves), Some(false));
        let frozen = *app.world().get::<GamePosition>(hero).expect("pos");

        // Still pressed: a second Escape edge while paused changes nothing.
        app.update();
        assert_eq!(app.world().resource::<GameEventBus>().count("game_paused"), 1);
        assert_eq!(app.world().get::<GamePosition>(hero).copied(), Some(frozen));

        app.world_mut()
            .run_system_once(
                |mut session: ResMut<PlaySession>, mut bodies: Query<&mut Body, With<Hero>>| {
                    resume_play(&mut session, &mut bodies);
                },
            )
            .expect("resume");
        assert!(!app.world().resource::<PlaySession>().paused);
        assert_eq!(app.world().get::<Body>(hero).map(|b| b.moves), Some(true));
    }

    #[test]
    fn paused_hero_ignores_jump_and_turn() {
        let mut app = test_app();
        enter_level(&mut app, 0);
        app.world_mut()
            .resource_mut::<VirtualInput>()
            .apply_snapshot(HashSet::from([GameAction::Pause]));
        app.update();
        assert!(app.world().resource::<PlaySession>().paused);

        let hero = app
            .world_mut()
            .query_filtered::<Entity, With<Hero>>()
            .single(app.world());
        // A frozen body keeps whatever contacts it had when paused.
        app.world_mut()
            .get_mut::<Contacts>(hero)
            .expect("contacts")
            .touching
            .down = true;
        let vy_before = app.world().get::<Velocity>(hero).expect("velocity").y;
        let facing_before = *app.world().get::<Facing>(hero).expect("facing");

        app.world_mut()
            .resource_mut::<VirtualInput>()
            .apply_snapshot(HashSet::from([GameAction::Jump, GameAction::Left]));
        app.update();

        assert_eq!(app.world().get::<Velocity>(hero).map(|v| v.y), Some(vy_before));
        assert_eq!(app.world().get::<Facing>(hero).copied(), Some(facing_before));
        assert_eq!(app.world().resource::<GameEventBus>().count("hero_jump"), 0);
    }

    #[test]
    fn menu_request_leaves_play_and_discards_session() {
        let mut app = test_app();
        enter_level(&mut app, 3);
        app.world_mut()
            .resource_mut::<PlaySession>()
            .request(FlowRequest::ToMenu);
        app.update();
        app.update();

        assert_eq!(state(&app), GameFlowState::Menu);
        assert!(app.world().get_resource::<PlaySession>().is_none());
        assert_eq!(hero_count(&mut app), 0);
    }
}
