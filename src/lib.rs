//! Torus Snake - a wrap-around Snake game with levels
//!
//! This library provides:
//! - Core game logic (game module): movement, food, scoring, levels, pauses
//! - A tokio clock that drives ticks and pause timers (clock module)
//! - TUI rendering, input mapping and session metrics for the terminal front end

pub mod clock;
pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
