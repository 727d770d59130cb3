use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use super::{
    config::GameConfig,
    direction::Direction,
    state::{GamePhase, GameSnapshot, Position, Snake},
};

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or already over; nothing moved
    Idle,
    /// The snake moved onto an empty cell
    Moved,
    /// The snake ate and grew
    AteFood,
    /// The snake ate and reached a new level; play is paused
    LevelUp { level: u32 },
    /// The snake ran into itself
    Collided,
    /// The snake ate the last free cell
    BoardFilled,
}

/// Result of a game tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickResult {
    pub outcome: TickOutcome,
    /// State after the tick, including a fatal position
    pub snapshot: GameSnapshot,
}

/// Identifies one pause. Only the token of the pause in force can end it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResumeToken(u64);

/// A pause the host must end by calling `GameEngine::resume` after `delay`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeRequest {
    pub token: ResumeToken,
    pub delay: Duration,
}

/// The game engine that handles all game logic
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
    snake: Snake,
    food: Option<Position>,
    score: u32,
    level: u32,
    phase: GamePhase,
    ticks: u64,
    /// Bumped on every pause and restart; older tokens go stale
    pause_epoch: u64,
    resume_request: Option<ResumeRequest>,
}

impl GameEngine {
    /// Create a new game engine seeded from the OS
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`GameConfig::validate`].
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create an engine whose food placement is reproducible
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`GameConfig::validate`].
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        if let Err(msg) = config.validate() {
            panic!("invalid game config: {msg}");
        }

        let snake = Self::initial_snake(&config);
        let mut engine = Self {
            config,
            rng,
            snake,
            food: None,
            score: 0,
            level: 1,
            phase: GamePhase::Intro,
            ticks: 0,
            pause_epoch: 0,
            resume_request: None,
        };
        engine.restart();
        engine
    }

    fn initial_snake(config: &GameConfig) -> Snake {
        Snake::new(
            Position::new(config.start_x as i32, config.start_y as i32),
            Direction::Right,
            config.grid_size as i32,
        )
    }

    /// Reset to a fresh game in the intro pause.
    ///
    /// Resume tokens handed out before this call stop working. The host must
    /// also drop any tick it had scheduled for the old game.
    pub fn restart(&mut self) {
        self.snake = Self::initial_snake(&self.config);
        self.score = 0;
        self.level = 1;
        self.ticks = 0;
        self.food = self.place_food();
        // Bumped even when there is nothing to resume, so older tokens go stale
        self.enter_pause(GamePhase::Intro, self.config.intro_pause());
        if self.food.is_none() {
            self.enter_won();
        }
        tracing::info!(food = ?self.food, phase = ?self.phase, "game restarted");
    }

    /// Pick a random free cell for food.
    ///
    /// Rejection sampling is bounded; when it keeps hitting the snake, the
    /// free cells are enumerated instead. Returns `None` on a full board.
    pub fn place_food(&mut self) -> Option<Position> {
        let size = self.config.grid_size as i32;
        let attempts = self.config.cell_count() * 2;

        for _ in 0..attempts {
            let pos = Position::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size));
            if !self.snake.occupies(pos) {
                tracing::debug!(x = pos.x, y = pos.y, "food placed");
                return Some(pos);
            }
        }

        let snake = &self.snake;
        let fallback = (0..size)
            .flat_map(|y| (0..size).map(move |x| Position::new(x, y)))
            .filter(|&pos| !snake.occupies(pos))
            .choose(&mut self.rng);
        tracing::debug!(food = ?fallback, len = snake.len(), "food placed by scanning free cells");
        fallback
    }

    /// Buffer a turn for the next tick; ignored once the game has ended
    pub fn change_direction(&mut self, direction: Direction) {
        if !self.phase.is_over() {
            self.snake.change_direction(direction);
        }
    }

    /// Execute one step of the game
    pub fn tick(&mut self) -> TickResult {
        let outcome = self.advance();
        TickResult {
            outcome,
            snapshot: self.snapshot(),
        }
    }

    fn advance(&mut self) -> TickOutcome {
        if self.phase != GamePhase::Running {
            return TickOutcome::Idle;
        }

        self.snake.commit_direction();
        let ate_food = self.snake.advance(self.food);
        self.ticks += 1;

        let mut outcome = TickOutcome::Moved;

        if ate_food {
            self.score += 1;
            self.food = self.place_food();
            outcome = TickOutcome::AteFood;

            let level_up = self.score % self.config.points_per_level == 0;
            if level_up {
                self.level += 1;
            }

            if self.food.is_none() {
                self.enter_won();
                return TickOutcome::BoardFilled;
            }

            if level_up {
                self.enter_pause(GamePhase::LevelUpPause, self.config.level_up_pause());
                tracing::info!(level = self.level, score = self.score, "level up");
                outcome = TickOutcome::LevelUp { level: self.level };
            }
        }

        if self.snake.has_self_collision() {
            self.phase = GamePhase::GameOver;
            self.resume_request = None;
            tracing::info!(
                score = self.score,
                level = self.level,
                head = ?self.snake.head(),
                "snake collided with itself"
            );
            return TickOutcome::Collided;
        }

        outcome
    }

    fn enter_won(&mut self) {
        self.phase = GamePhase::Won;
        self.resume_request = None;
        tracing::info!(score = self.score, level = self.level, "board filled");
    }

    fn enter_pause(&mut self, phase: GamePhase, delay: Duration) {
        self.pause_epoch += 1;
        self.phase = phase;
        self.resume_request = Some(ResumeRequest {
            token: ResumeToken(self.pause_epoch),
            delay,
        });
    }

    /// End the pause identified by `token`.
    ///
    /// Returns false, changing nothing, for a stale token or when the game
    /// is not paused.
    pub fn resume(&mut self, token: ResumeToken) -> bool {
        if token != ResumeToken(self.pause_epoch) || !self.phase.is_paused() {
            tracing::warn!(?token, phase = ?self.phase, "ignoring stale resume");
            return false;
        }

        self.phase = GamePhase::Running;
        if self.resume_request.map(|r| r.token) == Some(token) {
            self.resume_request = None;
        }
        tracing::debug!(level = self.level, "play resumed");
        true
    }

    /// Hand the pending pause to the host. Yields each request once.
    pub fn take_resume_request(&mut self) -> Option<ResumeRequest> {
        self.resume_request.take()
    }

    /// Delay before the next tick at the current level
    pub fn next_tick_delay(&self) -> Duration {
        self.config.tick_delay(self.level)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid_size: self.config.grid_size,
            segments: self.snake.segments().copied().collect(),
            direction: self.snake.direction(),
            food: self.food,
            score: self.score,
            level: self.level,
            phase: self.phase,
            paused: self.phase.is_paused(),
            game_over: self.phase.is_over(),
            won: self.phase == GamePhase::Won,
            ticks: self.ticks,
            tick_delay: self.next_tick_delay(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn food(&self) -> Option<Position> {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.phase.is_over()
    }
}
