use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

use super::direction::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Fold both axes back onto a toroidal grid of the given size
    pub fn wrapped(&self, grid_size: i32) -> Self {
        Self {
            x: self.x.rem_euclid(grid_size),
            y: self.y.rem_euclid(grid_size),
        }
    }

    /// One step in `direction`, wrapping around the grid edges
    pub fn step_wrapped(&self, direction: Direction, grid_size: i32) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy).wrapped(grid_size)
    }
}

/// The snake in the game
///
/// Movement, growth and the direction buffer live here; the engine decides
/// when they run.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    segments: VecDeque<Position>,
    /// Direction used by the next `advance`
    direction: Direction,
    /// Direction requested by input, committed at the start of the next tick
    pending_direction: Direction,
    grid_size: i32,
}

impl Snake {
    /// Create a one-segment snake
    pub fn new(head: Position, direction: Direction, grid_size: i32) -> Self {
        Self {
            segments: VecDeque::from([head]),
            direction,
            pending_direction: direction,
            grid_size,
        }
    }

    /// Build a snake from explicit segments, head first.
    /// Returns `None` for an empty body.
    #[cfg(test)]
    pub(crate) fn from_segments(
        segments: impl IntoIterator<Item = Position>,
        direction: Direction,
        grid_size: i32,
    ) -> Option<Self> {
        let segments: VecDeque<Position> = segments.into_iter().collect();
        if segments.is_empty() {
            return None;
        }
        Some(Self {
            segments,
            direction,
            pending_direction: direction,
            grid_size,
        })
    }

    /// Buffer a turn for the next tick.
    ///
    /// A request for the exact opposite of the committed direction is dropped,
    /// so the head can never fold back onto its neck.
    pub fn change_direction(&mut self, requested: Direction) {
        if !self.direction.is_opposite(requested) {
            self.pending_direction = requested;
        }
    }

    /// Make the buffered turn the current direction
    pub fn commit_direction(&mut self) {
        self.direction = self.pending_direction;
    }

    /// Move one cell, growing when the new head lands on `food`.
    ///
    /// Returns true if the food was eaten.
    pub fn advance(&mut self, food: Option<Position>) -> bool {
        let new_head = self.head().step_wrapped(self.direction, self.grid_size);
        self.segments.push_front(new_head);

        if food == Some(new_head) {
            return true;
        }

        self.segments.pop_back();
        false
    }

    /// True iff the head shares a cell with any other segment
    pub fn has_self_collision(&self) -> bool {
        let head = self.head();
        self.segments.iter().skip(1).any(|&seg| seg == head)
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.segments[0]
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Position {
        self.segments[self.segments.len() - 1]
    }

    pub fn segments(&self) -> impl ExactSizeIterator<Item = &Position> + '_ {
        self.segments.iter()
    }

    /// Check if any segment, head included, sits on `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.segments.contains(&pos)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false: a snake keeps at least its head
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Where the game is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the intro pause to run out
    Intro,
    Running,
    /// Suspended after a level milestone
    LevelUpPause,
    /// The snake ran into itself
    GameOver,
    /// The snake filled the whole board
    Won,
}

impl GamePhase {
    pub fn is_paused(&self) -> bool {
        matches!(self, GamePhase::Intro | GamePhase::LevelUpPause)
    }

    pub fn is_over(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Won)
    }
}

/// Immutable copy of everything the UI needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub grid_size: usize,
    /// Head first
    pub segments: Vec<Position>,
    pub direction: Direction,
    /// Absent only once the snake covers every cell
    pub food: Option<Position>,
    pub score: u32,
    pub level: u32,
    pub phase: GamePhase,
    pub paused: bool,
    pub game_over: bool,
    pub won: bool,
    /// Ticks that moved the snake since the last restart
    pub ticks: u64,
    pub tick_delay: Duration,
}

impl GameSnapshot {
    pub fn head(&self) -> Position {
        self.segments[0]
    }

    pub fn is_snake_at(&self, pos: Position) -> bool {
        self.segments.contains(&pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snake_with(segments: &[(i32, i32)], direction: Direction) -> Snake {
        Snake::from_segments(
            segments.iter().map(|&(x, y)| Position::new(x, y)),
            direction,
            20,
        )
        .unwrap()
    }

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_by(0, 1), Position::new(5, 6));
        assert_eq!(pos.moved_by(0, -1), Position::new(5, 4));
    }

    #[test]
    fn test_wrapping_on_every_edge() {
        assert_eq!(
            Position::new(19, 7).step_wrapped(Direction::Right, 20),
            Position::new(0, 7)
        );
        assert_eq!(
            Position::new(0, 7).step_wrapped(Direction::Left, 20),
            Position::new(19, 7)
        );
        assert_eq!(
            Position::new(3, 0).step_wrapped(Direction::Up, 20),
            Position::new(3, 19)
        );
        assert_eq!(
            Position::new(3, 19).step_wrapped(Direction::Down, 20),
            Position::new(3, 0)
        );
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(10, 10), Direction::Right, 20);
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(10, 10));
        assert_eq!(snake.tail(), Position::new(10, 10));
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.pending_direction(), Direction::Right);
        assert!(!snake.has_self_collision());
    }

    #[test]
    fn test_empty_segments_rejected() {
        assert!(Snake::from_segments(Vec::new(), Direction::Up, 20).is_none());
    }

    #[test]
    fn test_reversal_is_dropped() {
        let mut snake = Snake::new(Position::new(10, 10), Direction::Right, 20);
        snake.change_direction(Direction::Left);
        assert_eq!(snake.pending_direction(), Direction::Right);

        snake.commit_direction();
        assert_eq!(snake.direction(), Direction::Right);
    }

    #[test]
    fn test_reversal_checked_against_committed_direction() {
        let mut snake = Snake::new(Position::new(10, 10), Direction::Right, 20);

        // Up is buffered, but Left is still the reverse of the committed Right
        snake.change_direction(Direction::Up);
        snake.change_direction(Direction::Left);
        assert_eq!(snake.pending_direction(), Direction::Up);

        // Once Up is committed, Left becomes legal
        snake.commit_direction();
        snake.change_direction(Direction::Left);
        assert_eq!(snake.pending_direction(), Direction::Left);
    }

    #[test]
    fn test_last_buffered_turn_wins() {
        let mut snake = Snake::new(Position::new(10, 10), Direction::Right, 20);
        snake.change_direction(Direction::Up);
        snake.change_direction(Direction::Down);
        snake.commit_direction();
        assert_eq!(snake.direction(), Direction::Down);
    }

    #[test]
    fn test_advance_without_food_keeps_length() {
        let mut snake = snake_with(&[(5, 5), (4, 5), (3, 5)], Direction::Right);
        let ate = snake.advance(Some(Position::new(0, 0)));

        assert!(!ate);
        assert_eq!(snake.len(), 3);
        assert_eq!(
            snake.segments().copied().collect::<Vec<_>>(),
            vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]
        );
    }

    #[test]
    fn test_advance_onto_food_grows() {
        let mut snake = Snake::new(Position::new(10, 10), Direction::Right, 20);
        let ate = snake.advance(Some(Position::new(11, 10)));

        assert!(ate);
        assert_eq!(
            snake.segments().copied().collect::<Vec<_>>(),
            vec![Position::new(11, 10), Position::new(10, 10)]
        );
    }

    #[test]
    fn test_advance_wraps_the_head() {
        let mut snake = snake_with(&[(19, 4), (18, 4)], Direction::Right);
        snake.advance(None);
        assert_eq!(snake.head(), Position::new(0, 4));
        assert_eq!(snake.tail(), Position::new(19, 4));
    }

    #[test]
    fn test_collision_detection() {
        let fresh = snake_with(&[(5, 5), (4, 5), (3, 5)], Direction::Right);
        assert!(!fresh.has_self_collision());

        let crossed = snake_with(&[(4, 5), (4, 6), (5, 6), (5, 5), (4, 5)], Direction::Up);
        assert!(crossed.has_self_collision());
    }

    #[test]
    fn test_occupies() {
        let snake = snake_with(&[(5, 5), (4, 5)], Direction::Right);
        assert!(snake.occupies(Position::new(5, 5)));
        assert!(snake.occupies(Position::new(4, 5)));
        assert!(!snake.occupies(Position::new(10, 10)));
    }

    #[test]
    fn test_phase_flags() {
        assert!(GamePhase::Intro.is_paused());
        assert!(GamePhase::LevelUpPause.is_paused());
        assert!(!GamePhase::Running.is_paused());
        assert!(GamePhase::GameOver.is_over());
        assert!(GamePhase::Won.is_over());
        assert!(!GamePhase::Running.is_over());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn direction() -> impl Strategy<Value = Direction> {
            prop::sample::select(Direction::ALL.to_vec())
        }

        proptest! {
            #[test]
            fn moves_stay_on_the_grid(
                x in 0i32..20,
                y in 0i32..20,
                moves in prop::collection::vec(direction(), 1..200),
            ) {
                let mut snake = Snake::new(Position::new(x, y), Direction::Right, 20);
                for dir in moves {
                    snake.change_direction(dir);
                    snake.commit_direction();
                    snake.advance(None);
                    let head = snake.head();
                    prop_assert!((0..20).contains(&head.x), "x out of range: {}", head.x);
                    prop_assert!((0..20).contains(&head.y), "y out of range: {}", head.y);
                    prop_assert_eq!(snake.len(), 1);
                }
            }

            #[test]
            fn accepted_turns_are_committed(current in direction(), requested in direction()) {
                let mut snake = Snake::new(Position::new(10, 10), current, 20);
                snake.change_direction(requested);
                snake.commit_direction();
                if requested == current.opposite() {
                    prop_assert_eq!(snake.direction(), current);
                } else {
                    prop_assert_eq!(snake.direction(), requested);
                }
            }

            #[test]
            fn reversal_never_touches_pending(current in direction(), buffered in direction()) {
                let mut snake = Snake::new(Position::new(10, 10), current, 20);
                snake.change_direction(buffered);
                let before = snake.pending_direction();
                snake.change_direction(current.opposite());
                prop_assert_eq!(snake.pending_direction(), before);
            }
        }
    }
}
