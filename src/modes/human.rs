use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::interval;

use crate::clock::{ClockEvent, GameClock};
use crate::game::{GameConfig, GameEngine, GameSnapshot, TickOutcome};
use crate::input::{InputHandler, KeyAction, SwipeTracker};
use crate::metrics::GameMetrics;
use crate::render::Renderer;

pub struct HumanMode {
    engine: GameEngine,
    snapshot: GameSnapshot,
    clock: GameClock,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    swipe: SwipeTracker,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig, seed: Option<u64>) -> Self {
        let engine = match seed {
            Some(seed) => GameEngine::with_seed(config, seed),
            None => GameEngine::new(config),
        };
        let snapshot = engine.snapshot();

        let mut mode = Self {
            engine,
            snapshot,
            clock: GameClock::new(),
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            swipe: SwipeTracker::default(),
            should_quit: false,
        };
        mode.schedule();
        mode
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen, EnableMouseCapture)
            .context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        tracing::info!("interactive session started");

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(e)) => {
                            return Err(e).context("Failed to read terminal event");
                        }
                        None => self.should_quit = true,
                    }
                }

                // Tick and pause deadlines
                event = self.clock.next_event() => {
                    self.on_clock_event(event);
                    self.draw(terminal)?;
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update();
                    self.draw(terminal)?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        tracing::info!(
            games = self.metrics.games_played,
            best = self.metrics.high_score,
            "interactive session ended"
        );
        Ok(())
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stderr>>) -> Result<()> {
        terminal
            .draw(|frame| {
                self.renderer.render(frame, &self.snapshot, &self.metrics);
            })
            .context("Failed to draw frame")?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                // Only process key press events, not release
                if key.kind != KeyEventKind::Press {
                    return;
                }

                match self.input_handler.handle_key_event(key) {
                    KeyAction::Turn(direction) => self.engine.change_direction(direction),
                    KeyAction::Restart => self.restart(),
                    KeyAction::Quit => self.should_quit = true,
                    KeyAction::None => {}
                }
            }
            Event::Mouse(mouse) => {
                if let Some(direction) = self.swipe.handle_mouse_event(mouse) {
                    self.engine.change_direction(direction);
                }
            }
            _ => {}
        }
    }

    fn on_clock_event(&mut self, event: ClockEvent) {
        match event {
            ClockEvent::Tick => {
                let result = self.engine.tick();
                match result.outcome {
                    TickOutcome::Collided | TickOutcome::BoardFilled => {
                        self.metrics
                            .on_game_over(result.snapshot.score, result.snapshot.level);
                    }
                    TickOutcome::LevelUp { level } => {
                        tracing::debug!(new_level = level, "level-up pause scheduled");
                    }
                    _ => {}
                }
                self.snapshot = result.snapshot;
            }
            ClockEvent::Resume(token) => {
                self.engine.resume(token);
                self.snapshot = self.engine.snapshot();
            }
        }
        self.schedule();
    }

    /// Arm the clock from the engine's state: the next tick at the current
    /// level's speed, plus any pause the engine just raised.
    fn schedule(&mut self) {
        if let Some(request) = self.engine.take_resume_request() {
            self.clock.arm_resume(request);
        }
        if self.engine.is_game_over() {
            self.clock.cancel_all();
        } else if !self.clock.tick_armed() {
            self.clock.arm_tick(self.engine.next_tick_delay());
        }
    }

    fn restart(&mut self) {
        // Old timers must not fire into the new game
        self.clock.cancel_all();
        self.engine.restart();
        self.metrics.on_game_start();
        self.snapshot = self.engine.snapshot();
        self.schedule();
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )
        .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, GamePhase};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_initialization() {
        let mode = HumanMode::new(GameConfig::default(), Some(1));
        assert_eq!(mode.snapshot.phase, GamePhase::Intro);
        assert_eq!(mode.snapshot.score, 0);
        assert!(mode.clock.tick_armed());
        assert!(mode.clock.resume_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_intro_then_movement() {
        let mut mode = HumanMode::new(GameConfig::default(), Some(1));
        let head = mode.snapshot.head();

        // Ticks during the 3s intro are no-ops
        loop {
            let event = mode.clock.next_event().await;
            mode.on_clock_event(event);
            if let ClockEvent::Resume(_) = event {
                break;
            }
            assert_eq!(mode.snapshot.head(), head);
        }
        assert_eq!(mode.snapshot.phase, GamePhase::Running);

        let event = mode.clock.next_event().await;
        assert_eq!(event, ClockEvent::Tick);
        mode.on_clock_event(event);
        assert_ne!(mode.snapshot.head(), head);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_steer_the_snake() {
        let mut mode = HumanMode::new(GameConfig::default(), Some(1));
        mode.handle_event(press(KeyCode::Up));
        assert_eq!(mode.engine.snake().pending_direction(), Direction::Up);

        mode.handle_event(press(KeyCode::Char('q')));
        assert!(mode.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_reset() {
        let mut mode = HumanMode::new(GameConfig::default(), Some(1));
        let start = mode.snapshot.head();

        // Play past the intro and take a few steps
        let mut moves = 0;
        while moves < 3 {
            let event = mode.clock.next_event().await;
            mode.on_clock_event(event);
            if event == ClockEvent::Tick && mode.snapshot.phase == GamePhase::Running {
                moves += 1;
            }
        }
        assert_ne!(mode.snapshot.head(), start);
        assert!(mode.snapshot.ticks > 0);
        assert!(!mode.clock.resume_armed());

        mode.handle_event(press(KeyCode::Char('r')));

        assert_eq!(mode.snapshot.phase, GamePhase::Intro);
        assert_eq!(mode.snapshot.score, 0);
        assert_eq!(mode.snapshot.ticks, 0);
        assert_eq!(mode.snapshot.segments, vec![start]);
        assert_eq!(mode.snapshot.direction, Direction::Right);
        // Fresh timers for the fresh game
        assert!(mode.clock.tick_armed());
        assert!(mode.clock.resume_armed());
    }
}
