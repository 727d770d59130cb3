//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The grid wraps around on every edge; the only way to lose is to run into yourself.

pub mod config;
pub mod direction;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use config::GameConfig;
pub use direction::Direction;
pub use engine::{GameEngine, ResumeRequest, ResumeToken, TickOutcome, TickResult};
pub use state::{GamePhase, GameSnapshot, Position, Snake};
