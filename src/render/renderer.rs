use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::{self, GamePhase, GameSnapshot, Position};
use crate::metrics::GameMetrics;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Draw one frame from a snapshot. Never touches the engine.
    pub fn render(&self, frame: &mut Frame, snapshot: &GameSnapshot, metrics: &GameMetrics) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(snapshot, metrics);
        frame.render_widget(stats, chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        // The board stays visible under every overlay, including the fatal frame
        frame.render_widget(self.render_grid(snapshot), game_area);

        if let Some(overlay) = self.render_overlay(snapshot, metrics) {
            let popup = centered_rect(game_area, 36, 9);
            frame.render_widget(Clear, popup);
            frame.render_widget(overlay, popup);
        }

        let controls = self.render_controls();
        frame.render_widget(controls, chunks[2]);
    }

    fn render_grid(&self, snapshot: &GameSnapshot) -> Paragraph<'_> {
        let mut lines = Vec::with_capacity(snapshot.grid_size);
        let size = snapshot.grid_size as i32;

        for y in 0..size {
            let mut spans = Vec::with_capacity(snapshot.grid_size);

            for x in 0..size {
                let pos = Position::new(x, y);

                let cell = if pos == snapshot.head() {
                    let style = if snapshot.game_over && !snapshot.won {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default().fg(Color::Cyan)
                    };
                    Span::styled(
                        head_glyph(snapshot.direction),
                        style.add_modifier(Modifier::BOLD),
                    )
                } else if snapshot.is_snake_at(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if snapshot.food == Some(pos) {
                    Span::styled(
                        "● ",
                        Style::default()
                            .fg(Color::White)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, snapshot: &GameSnapshot, metrics: &GameMetrics) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(snapshot.score.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Level: ", label),
            Span::styled(snapshot.level.to_string(), value.add_modifier(Modifier::BOLD)),
            Span::raw("    "),
            Span::styled("Speed: ", label),
            Span::styled(format!("{}ms", snapshot.tick_delay.as_millis()), value),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(metrics.high_score.to_string(), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(metrics.format_time(), value),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_overlay(&self, snapshot: &GameSnapshot, metrics: &GameMetrics) -> Option<Paragraph<'_>> {
        let (title, color, body) = match snapshot.phase {
            GamePhase::Running => return None,
            GamePhase::Intro => (
                "WRAP-AROUND SNAKE",
                Color::Green,
                vec![
                    Line::from("Edges wrap around."),
                    Line::from("Don't bite yourself."),
                    Line::from("Get ready..."),
                ],
            ),
            GamePhase::LevelUpPause => (
                "LEVEL UP!",
                Color::Yellow,
                vec![
                    Line::from(vec![
                        Span::raw("Level "),
                        Span::styled(
                            snapshot.level.to_string(),
                            Style::default().add_modifier(Modifier::BOLD),
                        ),
                    ]),
                    Line::from(format!("Speed {}ms", snapshot.tick_delay.as_millis())),
                ],
            ),
            GamePhase::GameOver => (
                "GAME OVER",
                Color::Red,
                result_lines(snapshot, metrics),
            ),
            GamePhase::Won => (
                "BOARD CLEARED!",
                Color::Green,
                result_lines(snapshot, metrics),
            ),
        };

        let mut text = vec![
            Line::from(vec![Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];
        text.extend(body);

        Some(
            Paragraph::new(text).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            ),
        )
    }

    fn render_controls(&self) -> Paragraph<'_> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" / "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" / drag to move | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" to restart | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" to quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn result_lines(snapshot: &GameSnapshot, metrics: &GameMetrics) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                snapshot.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  (level {})", snapshot.level)),
        ]),
        Line::from(format!(
            "Session best: {}  (level {})",
            metrics.high_score, metrics.best_level
        )),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::Gray)),
            Span::styled(
                "R",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to restart or ", Style::default().fg(Color::Gray)),
            Span::styled(
                "Q",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" to quit", Style::default().fg(Color::Gray)),
        ]),
    ]
}

fn head_glyph(direction: game::Direction) -> &'static str {
    match direction {
        game::Direction::Up => "▲ ",
        game::Direction::Down => "▼ ",
        game::Direction::Left => "◀ ",
        game::Direction::Right => "▶ ",
    }
}

/// A `width` x `height` rect centred in `area`, clamped to fit
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
