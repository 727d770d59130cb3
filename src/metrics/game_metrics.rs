use std::time::{Duration, Instant};

/// Session statistics. Nothing here outlives the process.
pub struct GameMetrics {
    pub start_time: Instant,
    pub elapsed_time: Duration,
    pub high_score: u32,
    pub best_level: u32,
    pub games_played: u32,
    /// Set once the current game's result has been counted
    recorded: bool,
}

impl GameMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            elapsed_time: Duration::ZERO,
            high_score: 0,
            best_level: 1,
            games_played: 0,
            recorded: false,
        }
    }

    /// Refresh the play clock; frozen once the game has ended
    pub fn update(&mut self) {
        if !self.recorded {
            self.elapsed_time = self.start_time.elapsed();
        }
    }

    pub fn on_game_start(&mut self) {
        self.start_time = Instant::now();
        self.elapsed_time = Duration::ZERO;
        self.recorded = false;
    }

    /// Count a finished game. Repeated calls for the same game are ignored.
    pub fn on_game_over(&mut self, final_score: u32, final_level: u32) {
        if self.recorded {
            return;
        }
        self.recorded = true;
        self.elapsed_time = self.start_time.elapsed();
        self.games_played += 1;
        self.high_score = self.high_score.max(final_score);
        self.best_level = self.best_level.max(final_level);
    }

    pub fn format_time(&self) -> String {
        let total_secs = self.elapsed_time.as_secs();
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{:02}:{:02}", minutes, seconds)
    }
}

impl Default for GameMetrics {
    fn default() -> Self {
        Self::new()
    }
}
