//! App: terminal init, main loop, fixed-step frame driver and key handling.

use crate::game::{BASELINE_Y, DropOutcome, GameEngine, GameEvent, Phase};
use crate::input::{Action, key_to_action};
use crate::leaderboard::{ACHIEVEMENT_1000_POINTS, SessionLeaderboard, report_final_score};
use crate::scene::{FallingPiece, Scene};
use crate::theme::Theme;
use crate::ui::{self, UNITS_PER_ROW};
use crate::UiOptions;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Pieces are kept this far below the visible floor before being discarded.
const CULL_MARGIN: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// What the game-over card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOverSummary {
    pub final_score: u32,
    pub best: u32,
    pub new_best: bool,
    pub achievement_unlocked: bool,
}

pub struct App {
    options: UiOptions,
    theme: Theme,
    engine: GameEngine,
    scene: Scene,
    leaderboard: SessionLeaderboard,
    screen: Screen,
    paused: bool,
    /// Score and fail labels appear after the first drop.
    hud_visible: bool,
    show_leaderboard: bool,
    summary: Option<GameOverSummary>,
    /// TachyonFX flash on the score label (created on a score milestone).
    coin_effect: Option<Effect>,
    /// Last time we processed the coin effect (for delta).
    coin_effect_process_time: Option<Instant>,
    /// Playfield rows, refreshed from the terminal size every frame.
    view_rows: u16,
}

impl App {
    pub fn new(engine: GameEngine, options: UiOptions, theme: Theme) -> Self {
        let mut app = Self {
            options,
            theme,
            engine,
            scene: Scene::new(BASELINE_Y),
            leaderboard: SessionLeaderboard::new(),
            screen: Screen::Playing,
            paused: false,
            hud_visible: false,
            show_leaderboard: false,
            summary: None,
            coin_effect: None,
            coin_effect_process_time: None,
            view_rows: 24,
        };
        app.reset_game();
        app
    }

    fn reset_game(&mut self) {
        self.engine.start();
        self.scene = Scene::new(BASELINE_Y);
        self.screen = Screen::Playing;
        self.paused = false;
        self.hud_visible = false;
        self.summary = None;
        self.coin_effect = None;
        self.coin_effect_process_time = None;
    }

    /// One fixed step: move the block, react to what the engine reported, animate the scene.
    /// Everything holds still while paused or while the leaderboard is open.
    fn step(&mut self, dt: f32) {
        if self.paused || self.show_leaderboard {
            return;
        }
        if self.engine.phase() == Phase::Playing {
            self.engine.advance(dt);
        }
        self.dispatch_events();
        let floor = self.scene.camera.center_y
            - f32::from(self.view_rows) / 2.0 * UNITS_PER_ROW
            - CULL_MARGIN;
        self.scene.tick(dt, floor);
        if self.coin_effect.as_ref().is_some_and(|e| e.done()) {
            self.coin_effect = None;
            self.coin_effect_process_time = None;
        }
    }

    fn apply_action(&mut self, action: Action) {
        match (self.screen, action) {
            (_, Action::Leaderboard) => self.show_leaderboard = !self.show_leaderboard,
            (_, Action::Quit | Action::None) => {}
            (Screen::Playing, Action::Pause) => self.paused = !self.paused,
            (Screen::Playing, Action::Drop) if !self.paused && !self.show_leaderboard => {
                self.hud_visible = true;
                if let Some(DropOutcome::Partial { overlap }) = self.engine.drop_block() {
                    tracing::trace!(overlap, "block trimmed");
                }
                self.dispatch_events();
            }
            (Screen::GameOver, Action::Restart) => self.reset_game(),
            _ => {}
        }
    }

    /// Route engine events to the scene, effects and leaderboard.
    fn dispatch_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                GameEvent::ScoreChanged(score) => tracing::trace!(score, "score changed"),
                GameEvent::FailCountChanged(fails) => tracing::trace!(fails, "fail count changed"),
                GameEvent::BlockPlaced(block) => {
                    self.scene.camera.follow(block.position.y);
                    if self.options.no_animation {
                        self.scene.camera.settle();
                    }
                }
                GameEvent::PieceFell(block) => {
                    if !self.options.no_animation {
                        self.scene.falling.push(FallingPiece::new(block));
                    }
                }
                GameEvent::ScoreMilestone(milestone) => {
                    tracing::debug!(milestone, "score milestone");
                    if !self.options.no_animation {
                        self.coin_effect = Some(ui::coin_effect(&self.theme));
                        self.coin_effect_process_time = None;
                    }
                }
                GameEvent::GameOver { final_score } => self.on_game_over(final_score),
            }
        }
    }

    fn on_game_over(&mut self, final_score: u32) {
        let previous_best = self.leaderboard.best();
        let had_achievement = self.leaderboard.is_unlocked(ACHIEVEMENT_1000_POINTS);
        report_final_score(&mut self.leaderboard, final_score);
        self.summary = Some(GameOverSummary {
            final_score,
            best: self.leaderboard.best(),
            new_best: final_score > previous_best,
            achievement_unlocked: !had_achievement
                && self.leaderboard.is_unlocked(ACHIEVEMENT_1000_POINTS),
        });
        self.screen = Screen::GameOver;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.options.frame_rate);
        let dt = frame_duration.as_secs_f32();
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                self.view_rows = ui::playfield_rows_for_terminal(f.area().height);
                ui::draw(
                    f,
                    self.screen,
                    &self.engine,
                    &self.scene,
                    &self.theme,
                    &self.leaderboard,
                    self.paused,
                    self.hud_visible,
                    self.show_leaderboard,
                    self.summary.as_ref(),
                    &mut self.coin_effect,
                    &mut self.coin_effect_process_time,
                    now,
                )
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        let action = key_to_action(key);
                        if action == Action::Quit {
                            return Ok(());
                        }
                        self.apply_action(action);
                    }
                }
            }

            self.step(dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::EngineConfig;

    fn app() -> App {
        App::new(
            GameEngine::new(EngineConfig::default()),
            UiOptions::default(),
            Theme::default(),
        )
    }

    /// Step until the swinging block is centred over the tower top, then drop.
    fn drop_aligned(app: &mut App) {
        let top_x = app.engine.placed_blocks().last().unwrap().position.x;
        for _ in 0..10_000 {
            let x = app.engine.current_block().unwrap().position.x;
            if (x - top_x).abs() < 4.0 {
                break;
            }
            app.step(1.0 / 60.0);
        }
        app.apply_action(Action::Drop);
    }

    #[test]
    fn test_new_app_is_playing_with_hidden_hud() {
        let app = app();
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.engine.phase(), Phase::Playing);
        assert!(!app.hud_visible);
    }

    #[test]
    fn test_drop_shows_hud_and_moves_camera() {
        let mut app = app();
        let before = app.scene.camera.center_y;
        drop_aligned(&mut app);
        assert!(app.hud_visible);
        assert_eq!(app.engine.score(), 10);
        for _ in 0..30 {
            app.step(1.0 / 60.0);
        }
        assert_eq!(app.scene.camera.center_y, 160.0 + crate::scene::CAMERA_LEAD);
        assert!(app.scene.camera.center_y > before);
    }

    #[test]
    fn test_pause_freezes_block() {
        let mut app = app();
        app.apply_action(Action::Pause);
        let x = app.engine.current_block().unwrap().position.x;
        app.step(0.5);
        assert_eq!(app.engine.current_block().unwrap().position.x, x);
        app.apply_action(Action::Drop);
        assert_eq!(app.engine.placed_blocks().len(), 1);
    }

    #[test]
    fn test_pause_freezes_scene() {
        let mut app = app();
        for _ in 0..15 {
            app.step(1.0 / 60.0);
        }
        app.apply_action(Action::Drop);
        app.step(1.0 / 60.0);
        let piece_y = app.scene.falling[0].block.position.y;
        let camera_y = app.scene.camera.center_y;
        let clock = app.scene.clock;

        app.apply_action(Action::Pause);
        app.step(0.1);
        assert_eq!(app.scene.falling[0].block.position.y, piece_y);
        assert_eq!(app.scene.camera.center_y, camera_y);
        assert_eq!(app.scene.clock, clock);
        app.apply_action(Action::Pause);

        app.apply_action(Action::Leaderboard);
        app.step(0.1);
        assert_eq!(app.scene.falling[0].block.position.y, piece_y);
        assert_eq!(app.scene.clock, clock);
        app.apply_action(Action::Leaderboard);

        app.step(1.0 / 60.0);
        assert!(app.scene.falling[0].block.position.y < piece_y);
    }

    #[test]
    fn test_game_over_reports_to_leaderboard_and_restarts() {
        let mut app = app();
        drop_aligned(&mut app);
        // Block spawns flush right of a 400-wide field; a miss needs it fully left of the tower.
        while app.engine.current_block().unwrap().max_x() >= 100.0 {
            app.step(1.0 / 60.0);
        }
        app.apply_action(Action::Drop);
        assert_eq!(app.screen, Screen::GameOver);
        let summary = app.summary.clone().unwrap();
        assert_eq!(summary.final_score, 10);
        assert!(summary.new_best);
        assert!(!summary.achievement_unlocked);
        assert_eq!(app.leaderboard.top_scores(), &[10]);

        app.apply_action(Action::Restart);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.engine.score(), 0);
        assert!(app.summary.is_none());
    }

    #[test]
    fn test_partial_drop_spawns_falling_piece() {
        let mut app = app();
        for _ in 0..15 {
            app.step(1.0 / 60.0);
        }
        app.apply_action(Action::Drop);
        assert_eq!(app.engine.consecutive_misses(), 1);
        assert_eq!(app.scene.falling.len(), 1);
    }

    #[test]
    fn test_milestone_starts_coin_effect() {
        let mut app = app();
        for _ in 0..5 {
            drop_aligned(&mut app);
        }
        assert_eq!(app.engine.score(), 50);
        assert!(app.coin_effect.is_some());
    }
}
