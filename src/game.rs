//! Game state: the tower of placed blocks, the swinging block, drop resolution and scoring.
//!
//! World coordinates are in screen-independent units with y growing upward. Block
//! positions are centre points.

use thiserror::Error;

/// Centre distance below which a drop counts as perfect.
pub const PERFECT_THRESHOLD: f32 = 10.0;
/// Score for a perfect drop.
pub const PERFECT_BONUS: u32 = 10;
/// Score for an imperfect drop that still overlaps.
pub const PARTIAL_BONUS: u32 = 1;
/// Imperfect drops in a row that end the session.
pub const MAX_CONSECUTIVE_MISSES: u32 = 3;
/// Horizontal speed of the swinging block at the start of a session (units/s).
pub const BASE_MOVE_SPEED: f32 = 200.0;
/// Centre height of the base block.
pub const BASELINE_Y: f32 = 100.0;
/// Vertical gap between the top of the tower and a freshly spawned block.
pub const SPAWN_GAP: f32 = 20.0;

/// Difficulty steps as (minimum score, speed), ascending.
const SPEED_STEPS: [(u32, f32); 2] = [(150, 400.0), (500, 800.0)];

/// Speed of the swinging block for a given score.
pub fn speed_for_score(score: u32) -> f32 {
    SPEED_STEPS
        .iter()
        .rev()
        .find(|(min_score, _)| score >= *min_score)
        .map_or(BASE_MOVE_SPEED, |&(_, speed)| speed)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangular block; `position` is its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub size: Size,
    pub position: Point,
}

impl Block {
    pub const fn new(size: Size, position: Point) -> Self {
        Self { size, position }
    }

    #[inline]
    pub fn min_x(&self) -> f32 {
        self.position.x - self.size.width / 2.0
    }

    #[inline]
    pub fn max_x(&self) -> f32 {
        self.position.x + self.size.width / 2.0
    }

    #[inline]
    pub fn min_y(&self) -> f32 {
        self.position.y - self.size.height / 2.0
    }

    #[inline]
    pub fn max_y(&self) -> f32 {
        self.position.y + self.size.height / 2.0
    }

    /// Width of the horizontal span shared with `other` (0 when disjoint).
    pub fn overlap_with(&self, other: &Block) -> f32 {
        (self.max_x().min(other.max_x()) - self.min_x().max(other.min_x())).max(0.0)
    }
}

/// Edge of the field a moving block starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnSide {
    #[default]
    Left,
    Right,
}

impl SpawnSide {
    /// Travel direction away from this edge: +1 rightwards, -1 leftwards.
    pub fn direction(self) -> f32 {
        match self {
            Self::Left => 1.0,
            Self::Right => -1.0,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive number, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("block width {block} does not fit in a field {field} units wide")]
    BlockWiderThanField { block: f32, field: f32 },
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Width of the playing field in world units; blocks wrap around its edges.
    pub field_width: f32,
    /// Size of the base block and of every newly spawned block.
    pub block_size: Size,
    /// Alternate spawn edges between drops. When false every block starts on the left.
    pub alternate_spawn_side: bool,
    /// Score interval for [`GameEvent::ScoreMilestone`]; 0 disables it.
    pub milestone_step: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            field_width: 400.0,
            block_size: Size::new(200.0, 40.0),
            alternate_spawn_side: true,
            milestone_step: 50,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("field width", self.field_width),
            ("block width", self.block_size.width),
            ("block height", self.block_size.height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.block_size.width > self.field_width {
            return Err(ConfigError::BlockWiderThanField {
                block: self.block_size.width,
                field: self.field_width,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    NotStarted,
    Playing,
    GameOver,
}

/// Notifications produced by [`GameEngine::drop_block`], drained by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ScoreChanged(u32),
    FailCountChanged(u32),
    /// A block was added to the top of the tower.
    BlockPlaced(Block),
    /// The overhang sliced off an imperfect drop.
    PieceFell(Block),
    /// The score crossed a multiple of the milestone step (carries that multiple).
    ScoreMilestone(u32),
    GameOver { final_score: u32 },
}

/// How a drop resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Perfect,
    Partial { overlap: f32 },
    Miss,
}

/// Mutable session state.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Placed blocks, base first.
    pub stack: Vec<Block>,
    /// The swinging block; `None` before the first start and after game over.
    pub current: Option<Block>,
    pub score: u32,
    pub consecutive_misses: u32,
    pub move_speed: f32,
    pub next_spawns_from_left: bool,
    /// Edge the current block started from (sets its direction).
    pub moving_from: SpawnSide,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            stack: Vec::new(),
            current: None,
            score: 0,
            consecutive_misses: 0,
            move_speed: BASE_MOVE_SPEED,
            next_spawns_from_left: true,
            moving_from: SpawnSide::Left,
        }
    }
}

/// Owns one [`GameState`] and applies the stacking rules to it.
#[derive(Debug)]
pub struct GameEngine {
    config: EngineConfig,
    state: GameState,
    phase: Phase,
    events: Vec<GameEvent>,
}

impl GameEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: GameState::default(),
            phase: Phase::NotStarted,
            events: Vec::new(),
        }
    }

    /// Start a fresh session from any phase.
    pub fn start(&mut self) {
        let size = self.config.block_size;
        self.state = GameState::default();
        self.events.clear();
        self.state.stack.push(Block::new(
            size,
            Point::new(self.config.field_width / 2.0, BASELINE_Y),
        ));
        self.state.current = Some(self.spawn_block());
        self.phase = Phase::Playing;
        tracing::info!(
            field_width = self.config.field_width,
            alternate = self.config.alternate_spawn_side,
            "session started"
        );
    }

    /// Move the swinging block by `dt` seconds, wrapping at the field edges.
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let field_width = self.config.field_width;
        let speed = self.state.move_speed;
        let side = self.state.moving_from;
        let Some(block) = self.state.current.as_mut() else {
            return;
        };
        let half = block.size.width / 2.0;
        block.position.x += dt * speed * side.direction();
        match side {
            SpawnSide::Left => {
                if block.position.x - half > field_width {
                    block.position.x = -half;
                }
            }
            SpawnSide::Right => {
                if block.position.x + half < 0.0 {
                    block.position.x = field_width + half;
                }
            }
        }
    }

    /// Drop the swinging block onto the tower. Returns `None` when there is nothing to drop.
    pub fn drop_block(&mut self) -> Option<DropOutcome> {
        let (mut block, top) = match (self.state.current, self.state.stack.last().copied()) {
            (Some(block), Some(top)) => (block, top),
            _ => return None,
        };
        let overlap = block.overlap_with(&top);
        let is_perfect = (block.position.x - top.position.x).abs() < PERFECT_THRESHOLD;
        let score_before = self.state.score;

        let outcome = if is_perfect {
            self.state.score += PERFECT_BONUS;
            self.state.consecutive_misses = 0;
            DropOutcome::Perfect
        } else if overlap > 0.0 {
            self.state.score += PARTIAL_BONUS;
            self.state.consecutive_misses += 1;
            let kept_min = block.min_x().max(top.min_x());
            let kept_max = kept_min + overlap;
            let remainder = block.size.width - overlap;
            if remainder > 0.0 {
                let piece_x = if block.position.x < top.position.x {
                    kept_min - remainder / 2.0
                } else {
                    kept_max + remainder / 2.0
                };
                self.events.push(GameEvent::PieceFell(Block::new(
                    Size::new(remainder, block.size.height),
                    Point::new(piece_x, block.position.y),
                )));
            }
            block.size.width = overlap;
            DropOutcome::Partial { overlap }
        } else {
            DropOutcome::Miss
        };
        tracing::debug!(?outcome, score = self.state.score, misses = self.state.consecutive_misses, "drop");

        match outcome {
            DropOutcome::Miss => {
                self.finish();
                return Some(outcome);
            }
            DropOutcome::Partial { .. }
                if self.state.consecutive_misses >= MAX_CONSECUTIVE_MISSES =>
            {
                self.events
                    .push(GameEvent::FailCountChanged(self.state.consecutive_misses));
                self.events.push(GameEvent::ScoreChanged(self.state.score));
                self.finish();
                return Some(outcome);
            }
            _ => {}
        }

        self.state.stack.push(block);
        self.events.push(GameEvent::ScoreChanged(self.state.score));
        self.events
            .push(GameEvent::FailCountChanged(self.state.consecutive_misses));
        self.events.push(GameEvent::BlockPlaced(block));
        if let Some(milestone) =
            crossed_milestone(score_before, self.state.score, self.config.milestone_step)
        {
            self.events.push(GameEvent::ScoreMilestone(milestone));
        }

        self.state.move_speed = self.state.move_speed.max(speed_for_score(self.state.score));
        if self.config.alternate_spawn_side {
            self.state.next_spawns_from_left = !self.state.next_spawns_from_left;
        }
        self.state.current = Some(self.spawn_block());
        Some(outcome)
    }

    fn finish(&mut self) {
        self.phase = Phase::GameOver;
        self.state.current = None;
        self.events.push(GameEvent::GameOver {
            final_score: self.state.score,
        });
        tracing::info!(
            final_score = self.state.score,
            height = self.state.stack.len() - 1,
            "game over"
        );
    }

    /// New swinging block above the tower, on the edge chosen by the alternation flag.
    fn spawn_block(&mut self) -> Block {
        let size = self.config.block_size;
        let top_y = self.state.stack.last().map_or(BASELINE_Y, |b| b.position.y);
        let y = top_y + size.height + SPAWN_GAP;
        let side = if self.state.next_spawns_from_left {
            SpawnSide::Left
        } else {
            SpawnSide::Right
        };
        self.state.moving_from = side;
        let x = match side {
            SpawnSide::Left => size.width / 2.0,
            SpawnSide::Right => self.config.field_width - size.width / 2.0,
        };
        Block::new(size, Point::new(x, y))
    }

    /// Take every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn current_block(&self) -> Option<Block> {
        self.state.current
    }

    pub fn placed_blocks(&self) -> &[Block] {
        &self.state.stack
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn consecutive_misses(&self) -> u32 {
        self.state.consecutive_misses
    }

    pub fn move_speed(&self) -> f32 {
        self.state.move_speed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Travel direction of the swinging block (+1 right, -1 left).
    pub fn direction(&self) -> f32 {
        self.state.moving_from.direction()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Highest multiple of `step` in `(before, after]`, if any.
fn crossed_milestone(before: u32, after: u32, step: u32) -> Option<u32> {
    if step == 0 || after / step <= before / step {
        return None;
    }
    Some(after / step * step)
}
