use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

use crate::game::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Turn(Direction),
    Restart,
    Quit,
    None,
}

pub struct InputHandler;

impl InputHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle_key_event(&self, key: KeyEvent) -> KeyAction {
        // Handle Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyAction::Quit;
        }

        match key.code {
            // Movement - Arrow keys
            KeyCode::Up => KeyAction::Turn(Direction::Up),
            KeyCode::Down => KeyAction::Turn(Direction::Down),
            KeyCode::Left => KeyAction::Turn(Direction::Left),
            KeyCode::Right => KeyAction::Turn(Direction::Right),

            // Movement - WASD
            KeyCode::Char('w') | KeyCode::Char('W') => KeyAction::Turn(Direction::Up),
            KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::Turn(Direction::Down),
            KeyCode::Char('a') | KeyCode::Char('A') => KeyAction::Turn(Direction::Left),
            KeyCode::Char('d') | KeyCode::Char('D') => KeyAction::Turn(Direction::Right),

            // Controls
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,

            _ => KeyAction::None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns mouse drags into swipe directions.
///
/// Once the pointer has travelled past the threshold from where the drag
/// started, the longer axis picks the direction and the drag origin moves to
/// the current point, so one long drag can steer several times.
#[derive(Debug, Clone)]
pub struct SwipeTracker {
    origin: Option<(i32, i32)>,
    threshold: i32,
}

impl SwipeTracker {
    /// Cells the pointer must travel before a drag counts
    pub const DEFAULT_THRESHOLD: i32 = 3;

    pub fn new(threshold: i32) -> Self {
        Self {
            origin: None,
            threshold,
        }
    }

    pub fn handle_mouse_event(&mut self, event: MouseEvent) -> Option<Direction> {
        let point = (i32::from(event.column), i32::from(event.row));

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.origin = Some(point);
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => self.drag_to(point),
            MouseEventKind::Up(MouseButton::Left) => {
                self.origin = None;
                None
            }
            _ => None,
        }
    }

    fn drag_to(&mut self, (x, y): (i32, i32)) -> Option<Direction> {
        let (start_x, start_y) = self.origin?;
        let (dx, dy) = (x - start_x, y - start_y);

        if dx.abs() <= self.threshold && dy.abs() <= self.threshold {
            return None;
        }

        self.origin = Some((x, y));
        let direction = if dx.abs() > dy.abs() {
            if dx > 0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0 {
            Direction::Down
        } else {
            Direction::Up
        };
        Some(direction)
    }
}

impl Default for SwipeTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_THRESHOLD)
    }
}
