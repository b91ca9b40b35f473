use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::audio::AudioManager;
use crate::components::{Body, HeadlessMode, Hero};
use crate::events::GameEventBus;
use crate::game_runtime::{
    resume_play, FlowRequest, GameFlowState, PlayRequest, PlaySession, RestartReason,
};

const NORMAL_BUTTON: Color = Color::srgb(0.93, 0.78, 0.33);
const HOVERED_BUTTON: Color = Color::srgb(0.98, 0.86, 0.45);
const PRESSED_BUTTON: Color = Color::srgb(0.8, 0.64, 0.22);
const SCREEN_BACKGROUND: Color = Color::srgb(0.36, 0.62, 0.85);
const FINISH_TEXT: Color = Color::srgb(0.0, 0.8, 1.0);
const KEY_HELD: Color = Color::srgb(1.0, 0.85, 0.1);
const KEY_EMPTY: Color = Color::srgba(1.0, 1.0, 1.0, 0.25);

/// What a screen button does when pressed.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    About,
    ToggleMute,
    BackToMenu,
    Continue,
    Restart,
    QuitToMenu,
}

impl MenuAction {
    fn label(self) -> &'static str {
        match self {
            MenuAction::Play => "Play",
            MenuAction::About => "About",
            MenuAction::ToggleMute => "Mute",
            MenuAction::BackToMenu | MenuAction::QuitToMenu => "Menu",
            MenuAction::Continue => "Continue",
            MenuAction::Restart => "Restart",
        }
    }
}

#[derive(Component)]
pub struct HudCoinText;

#[derive(Component)]
pub struct HudKeyIcon;

#[derive(Component)]
pub struct PauseOverlay;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(GameFlowState::Menu),
            (menu_music, spawn_menu_screen.run_if(windowed)),
        )
        .add_systems(
            OnEnter(GameFlowState::About),
            (about_music, spawn_about_screen.run_if(windowed)),
        )
        .add_systems(
            OnEnter(GameFlowState::Finish),
            (finish_music, spawn_finish_screen.run_if(windowed)),
        )
        .add_systems(OnEnter(GameFlowState::Play), spawn_hud.run_if(windowed))
        .add_systems(Update, menu_buttons.run_if(windowed))
        .add_systems(
            Update,
            (update_hud, sync_pause_overlay)
                .run_if(windowed)
                .run_if(in_state(GameFlowState::Play))
                .run_if(resource_exists::<PlaySession>),
        );
    }
}

fn windowed(headless: Option<Res<HeadlessMode>>) -> bool {
    !headless.is_some_and(|h| h.0)
}

/// Everything a button press may touch.
#[derive(SystemParam)]
pub struct MenuControl<'w, 's> {
    next_state: ResMut<'w, NextState<GameFlowState>>,
    play_request: ResMut<'w, PlayRequest>,
    audio: ResMut<'w, AudioManager>,
    events: Res<'w, GameEventBus>,
    session: Option<ResMut<'w, PlaySession>>,
    hero_bodies: Query<'w, 's, &'static mut Body, With<Hero>>,
}

impl MenuControl<'_, '_> {
    pub fn apply(&mut self, action: MenuAction) {
        match action {
            MenuAction::Play => {
                self.play_request.level = 0;
                switch_music(&mut self.audio, self.events.frame, "level");
                self.next_state.set(GameFlowState::Play);
            }
            MenuAction::About => self.next_state.set(GameFlowState::About),
            MenuAction::BackToMenu => self.next_state.set(GameFlowState::Menu),
            MenuAction::ToggleMute => {
                let muted = self.audio.toggle_music_mute(self.events.frame);
                info!("[Keyrunner audio] Music {}", if muted { "muted" } else { "unmuted" });
            }
            MenuAction::Continue => {
                if let Some(session) = self.session.as_deref_mut() {
                    resume_play(session, &mut self.hero_bodies);
                }
            }
            MenuAction::Restart => {
                if let Some(session) = self.session.as_deref_mut() {
                    session.request(FlowRequest::Restart(RestartReason::PlayerRequest));
                }
            }
            MenuAction::QuitToMenu => {
                if let Some(session) = self.session.as_deref_mut() {
                    session.request(FlowRequest::ToMenu);
                }
            }
        }
    }
}

fn switch_music(audio: &mut AudioManager, frame: u64, track: &str) {
    if let Err(err) = audio.play_music(track, frame) {
        warn!("[Keyrunner audio] {err}");
    }
}

fn menu_music(mut audio: ResMut<AudioManager>, bus: Res<GameEventBus>) {
    switch_music(&mut audio, bus.frame, "menu");
}

fn about_music(mut audio: ResMut<AudioManager>, bus: Res<GameEventBus>) {
    switch_music(&mut audio, bus.frame, "about");
}

fn finish_music(mut audio: ResMut<AudioManager>, bus: Res<GameEventBus>) {
    switch_music(&mut audio, bus.frame, "finish");
}

fn menu_buttons(
    mut buttons: Query<
        (&Interaction, &MenuAction, &mut BackgroundColor),
        (Changed<Interaction>, With<Button>),
    >,
    mut control: MenuControl,
) {
    for (interaction, action, mut color) in buttons.iter_mut() {
        match *interaction {
            Interaction::Pressed => {
                *color = PRESSED_BUTTON.into();
                control.apply(*action);
            }
            Interaction::Hovered => *color = HOVERED_BUTTON.into(),
            Interaction::None => *color = NORMAL_BUTTON.into(),
        }
    }
}

fn screen_root(commands: &mut Commands, state: GameFlowState, background: Color) -> Entity {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                flex_direction: FlexDirection::Column,
                align_items: AlignItems::Center,
                justify_content: JustifyContent::Center,
                row_gap: Val::Px(24.0),
                ..default()
            },
            BackgroundColor(background),
            GlobalZIndex(10),
            StateScoped(state),
        ))
        .id()
}

fn spawn_button(commands: &mut Commands, parent: Entity, action: MenuAction, size: (f32, f32), font_size: f32) {
    commands
        .spawn((
            Button,
            Node {
                width: Val::Px(size.0),
                height: Val::Px(size.1),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(NORMAL_BUTTON),
            action,
        ))
        .with_children(|button| {
            button.spawn((
                Text::new(action.label()),
                TextFont {
                    font_size,
                    ..default()
                },
                TextColor(Color::BLACK),
            ));
        })
        .set_parent(parent);
}

fn spawn_menu_screen(mut commands: Commands) {
    let root = screen_root(&mut commands, GameFlowState::Menu, SCREEN_BACKGROUND);
    commands
        .spawn((
            Text::new("KEYRUNNER"),
            TextFont {
                font_size: 64.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Node {
                margin: UiRect::bottom(Val::Px(40.0)),
                ..default()
            },
        ))
        .set_parent(root);
    spawn_button(&mut commands, root, MenuAction::Play, (170.0, 75.0), 30.0);
    spawn_button(&mut commands, root, MenuAction::About, (170.0, 75.0), 30.0);

    // Mute sits alone in the top-right corner.
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        })
        .set_parent(root)
        .with_children(|corner| {
            corner
                .spawn((
                    Button,
                    Node {
                        width: Val::Px(100.0),
                        height: Val::Px(35.0),
                        justify_content: JustifyContent::Center,
                        align_items: AlignItems::Center,
                        ..default()
                    },
                    BackgroundColor(NORMAL_BUTTON),
                    MenuAction::ToggleMute,
                ))
                .with_children(|button| {
                    button.spawn((
                        Text::new(MenuAction::ToggleMute.label()),
                        TextFont {
                            font_size: 20.0,
                            ..default()
                        },
                        TextColor(Color::BLACK),
                    ));
                });
        });
}

fn spawn_about_screen(mut commands: Commands) {
    let root = screen_root(&mut commands, GameFlowState::About, SCREEN_BACKGROUND);
    commands
        .spawn((
            Text::new("Collect the key, reach the door.\nStomp spiders from above.\nArrows or WASD to move, Escape to pause."),
            TextFont {
                font_size: 22.0,
                ..default()
            },
            TextColor(Color::WHITE),
            TextLayout::new_with_justify(JustifyText::Center),
        ))
        .set_parent(root);
    spawn_button(&mut commands, root, MenuAction::BackToMenu, (170.0, 60.0), 26.0);
}

fn spawn_finish_screen(mut commands: Commands) {
    let root = screen_root(&mut commands, GameFlowState::Finish, SCREEN_BACKGROUND);
    commands
        .spawn((
            Text::new("THANK YOU!"),
            TextFont {
                font_size: 72.0,
                ..default()
            },
            TextColor(FINISH_TEXT),
        ))
        .set_parent(root);
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                column_gap: Val::Px(8.0),
                align_items: AlignItems::Center,
                ..default()
            },
            GlobalZIndex(5),
            PickingBehavior::IGNORE,
            StateScoped(GameFlowState::Play),
        ))
        .with_children(|hud| {
            hud.spawn((
                Node {
                    width: Val::Px(22.0),
                    height: Val::Px(22.0),
                    ..default()
                },
                BackgroundColor(Color::srgb(1.0, 0.75, 0.0)),
            ));
            hud.spawn((
                Text::new("x0"),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
                TextColor(Color::WHITE),
                HudCoinText,
            ));
            hud.spawn((
                Node {
                    width: Val::Px(24.0),
                    height: Val::Px(24.0),
                    margin: UiRect::left(Val::Px(12.0)),
                    ..default()
                },
                BackgroundColor(KEY_EMPTY),
                HudKeyIcon,
            ));
        });
}

fn update_hud(
    session: Res<PlaySession>,
    mut coin_text: Query<&mut Text, With<HudCoinText>>,
    mut key_icon: Query<&mut BackgroundColor, With<HudKeyIcon>>,
) {
    for mut text in coin_text.iter_mut() {
        let label = format!("x{}", session.coins);
        if text.0 != label {
            text.0 = label;
        }
    }
    let color = if session.has_key { KEY_HELD } else { KEY_EMPTY };
    for mut icon in key_icon.iter_mut() {
        icon.0 = color;
    }
}

fn sync_pause_overlay(
    mut commands: Commands,
    session: Res<PlaySession>,
    overlay: Query<Entity, With<PauseOverlay>>,
) {
    match (session.paused, overlay.iter().next()) {
        (true, None) => spawn_pause_overlay(&mut commands),
        (false, Some(_)) => {
            for entity in overlay.iter() {
                commands.entity(entity).despawn_recursive();
            }
        }
        _ => {}
    }
}

fn spawn_pause_overlay(commands: &mut Commands) {
    let root = screen_root(commands, GameFlowState::Play, Color::srgba(0.0, 0.0, 0.0, 0.5));
    commands.entity(root).insert((PauseOverlay, GlobalZIndex(20)));
    for action in [MenuAction::Continue, MenuAction::Restart, MenuAction::QuitToMenu] {
        spawn_button(commands, root, action, (200.0, 60.0), 26.0);
    }
}
