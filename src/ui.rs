//! Layout and drawing: sky, tower, swinging block, falling pieces, HUD, sidebar and overlays.

use crate::app::{GameOverSummary, Screen};
use crate::game::{Block as GameBlock, GameEngine, MAX_CONSECUTIVE_MISSES};
use crate::leaderboard::SessionLeaderboard;
use crate::scene::Scene;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// World units covered by one terminal row (a default block is two rows tall).
pub const UNITS_PER_ROW: f32 = 20.0;
/// Widest playfield in terminal columns (inside the border).
const MAX_PLAYFIELD_COLS: u16 = 80;
const SIDEBAR_WIDTH: u16 = 24;
/// Duration of the score milestone flash in ms.
const COIN_FLASH_MS: u32 = 600;

const CLOUD: [&str; 2] = [" ▄▆██▆▄  ", "▆████████▆"];

/// Maps world coordinates (y up) onto the playfield rect (rows down).
struct Viewport {
    rect: Rect,
    units_per_col: f32,
    camera_y: f32,
}

impl Viewport {
    fn new(rect: Rect, field_width: f32, camera_y: f32) -> Self {
        Self {
            rect,
            units_per_col: field_width / f32::from(rect.width.max(1)),
            camera_y,
        }
    }

    fn col(&self, x: f32) -> i32 {
        (x / self.units_per_col).round() as i32
    }

    fn row(&self, y: f32) -> i32 {
        (f32::from(self.rect.height) / 2.0 - (y - self.camera_y) / UNITS_PER_ROW).round() as i32
    }

    fn put(&self, buf: &mut Buffer, col: i32, row: i32, symbol: &str, style: Style) {
        if col < 0 || row < 0 || col >= i32::from(self.rect.width) || row >= i32::from(self.rect.height) {
            return;
        }
        buf[(self.rect.x + col as u16, self.rect.y + row as u16)]
            .set_symbol(symbol)
            .set_style(style);
    }

    /// Fill a block's footprint; its bottom row is shaded for depth.
    fn fill(&self, buf: &mut Buffer, block: &GameBlock, color: Color, sky: Color) {
        let (c0, c1) = (self.col(block.min_x()), self.col(block.max_x()));
        let (r0, r1) = (self.row(block.max_y()), self.row(block.min_y()));
        let c1 = c1.max(c0 + 1);
        let r1 = r1.max(r0 + 1);
        for row in r0..r1 {
            let fg = if row == r1 - 1 && r1 - r0 > 1 {
                shade(color, 0.75)
            } else {
                color
            };
            for col in c0..c1 {
                self.put(buf, col, row, "█", Style::default().fg(fg).bg(sky));
            }
        }
    }
}

/// Scale a colour's RGB channels.
fn shade(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    };
    Color::Rgb(
        (r as f32 * factor).min(255.0) as u8,
        (g as f32 * factor).min(255.0) as u8,
        (b as f32 * factor).min(255.0) as u8,
    )
}

/// Playfield rows that fit in a terminal of `term_rows`, used to pick where falling pieces are culled.
pub fn playfield_rows_for_terminal(term_rows: u16) -> u16 {
    term_rows.saturating_sub(2).max(1)
}

/// Flash for the score label when a milestone is crossed.
pub fn coin_effect(theme: &Theme) -> Effect {
    fx::fade_from(theme.coin, theme.coin, (COIN_FLASH_MS, Interpolation::QuadOut))
}

/// Split the terminal into (playfield with border, sidebar), centred horizontally.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let pw = (area.width.saturating_sub(SIDEBAR_WIDTH)).min(MAX_PLAYFIELD_COLS + 2);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(pw),
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Fill(1),
        ])
        .split(area);
    (horiz[1], horiz[2])
}

/// Score label rect inside the playfield (the row the coin flash covers).
fn score_label_rect(inner: Rect) -> Rect {
    Rect {
        x: inner.x,
        y: inner.y + inner.height.saturating_sub(3),
        width: inner.width,
        height: inner.height.min(1),
    }
}

/// Draw the current screen with optional pause and leaderboard overlays.
/// While `coin_effect` is Some, it is processed over the score label and `coin_process_time` tracks its delta.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    engine: &GameEngine,
    scene: &Scene,
    theme: &Theme,
    leaderboard: &SessionLeaderboard,
    paused: bool,
    hud_visible: bool,
    show_leaderboard: bool,
    summary: Option<&GameOverSummary>,
    coin_effect: &mut Option<Effect>,
    coin_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    let (playfield, sidebar) = game_layout(area);
    let inner = draw_playfield(frame, engine, scene, theme, playfield, hud_visible);
    draw_sidebar(frame, engine, theme, leaderboard, sidebar);

    if let Some(effect) = coin_effect {
        let delta = coin_process_time
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
        *coin_process_time = Some(now);
        frame.render_effect(effect, score_label_rect(inner), TfxDuration::from_millis(delta_ms));
    }

    match screen {
        Screen::Playing if paused => draw_pause_overlay(frame, theme, playfield),
        Screen::Playing => {}
        Screen::GameOver => {
            if let Some(summary) = summary {
                draw_game_over(frame, theme, summary, playfield);
            }
        }
    }
    if show_leaderboard {
        draw_leaderboard(frame, theme, leaderboard, playfield);
    }
}

/// Sky, clouds, tower, swinging block, falling pieces and HUD. Returns the inner rect.
fn draw_playfield(
    frame: &mut Frame,
    engine: &GameEngine,
    scene: &Scene,
    theme: &Theme,
    area: Rect,
    hud_visible: bool,
) -> Rect {
    let height = engine.placed_blocks().len().saturating_sub(1);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.sky))
        .title(Span::styled(
            format!(" Sky Stacker  | Height: {} ", height),
            Style::default().fg(theme.title),
        ));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in inner.y..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.sky));
        }
    }

    let view = Viewport::new(inner, engine.config().field_width, scene.camera.center_y);
    draw_clouds(buf, &view, scene, theme);

    for placed in engine.placed_blocks() {
        view.fill(buf, placed, theme.block, theme.sky);
    }
    for piece in &scene.falling {
        view.fill(buf, &piece.block, theme.falling, theme.sky);
    }
    if let Some(current) = engine.current_block() {
        view.fill(buf, &current, theme.block, theme.sky);
    }

    if hud_visible {
        let score = format!("Score: {}", engine.score());
        let fails = format!("Fails: {}", engine.consecutive_misses());
        draw_3d_label(buf, theme, score_label_rect(inner), &score);
        let fail_rect = Rect {
            y: inner.y + inner.height.saturating_sub(2),
            ..score_label_rect(inner)
        };
        draw_3d_label(buf, theme, fail_rect, &fails);
    }
    inner
}

/// Clouds hang from the camera: one top-left, one top-right swaying the other way.
fn draw_clouds(buf: &mut Buffer, view: &Viewport, scene: &Scene, theme: &Theme) {
    let sway = (scene.cloud_offset() / view.units_per_col).round() as i32;
    let cloud_w = CLOUD[1].chars().count() as i32;
    let right = i32::from(view.rect.width) - cloud_w - 2;
    let style = Style::default().fg(theme.cloud).bg(theme.sky);
    for (origin, dir) in [(2, 1), (right, -1)] {
        for (dy, line) in CLOUD.iter().enumerate() {
            for (dx, ch) in line.chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let mut s = [0u8; 4];
                view.put(
                    buf,
                    origin + sway * dir + dx as i32,
                    1 + dy as i32,
                    ch.encode_utf8(&mut s),
                    style,
                );
            }
        }
    }
}

/// Centred label with a black shadow one cell to the left.
fn draw_3d_label(buf: &mut Buffer, theme: &Theme, rect: Rect, text: &str) {
    if rect.height == 0 || rect.width == 0 {
        return;
    }
    let len = text.chars().count() as u16;
    let x = rect.x + rect.width.saturating_sub(len) / 2;
    let shadow = Style::default()
        .fg(theme.label_shadow)
        .bg(theme.sky)
        .add_modifier(Modifier::BOLD);
    let face = Style::default()
        .fg(theme.label)
        .bg(theme.sky)
        .add_modifier(Modifier::BOLD);
    buf.set_string(x.saturating_sub(1).max(rect.x), rect.y, text, shadow);
    buf.set_string(x, rect.y, text, face);
}

fn draw_sidebar(
    frame: &mut Frame,
    engine: &GameEngine,
    theme: &Theme,
    leaderboard: &SessionLeaderboard,
    area: Rect,
) {
    let title_style = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(theme.main_fg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let stat = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<8}"), title_style),
            Span::styled(value, text_style),
        ])
    };
    let stats = vec![
        stat("Score", engine.score().to_string()),
        stat(
            "Fails",
            format!("{} / {}", engine.consecutive_misses(), MAX_CONSECUTIVE_MISSES),
        ),
        stat(
            "Height",
            engine.placed_blocks().len().saturating_sub(1).to_string(),
        ),
        stat(
            "Speed",
            format!(
                "{:.0} {}",
                engine.move_speed(),
                if engine.direction() > 0.0 { "→" } else { "←" }
            ),
        ),
        stat("Best", leaderboard.best().to_string()),
    ];
    Paragraph::new(stats)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .title(Span::styled(" Stats ", title_style)),
        )
        .render(chunks[0], frame.buffer_mut());

    let trophy = if leaderboard.achievements().is_empty() {
        Line::from(Span::styled("none yet", text_style))
    } else {
        Line::from(Span::styled(leaderboard.achievements().join(", "), Style::default().fg(theme.coin)))
    };
    Paragraph::new(vec![trophy])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .title(Span::styled(" Achievements ", title_style)),
        )
        .render(chunks[1], frame.buffer_mut());

    let keys = vec![
        Line::from(Span::styled("Space  Drop", text_style)),
        Line::from(Span::styled("P      Pause", text_style)),
        Line::from(Span::styled("L      Leaderboard", text_style)),
        Line::from(Span::styled("R      Restart", text_style)),
        Line::from(Span::styled("Q      Quit", text_style)),
    ];
    Paragraph::new(keys)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .title(Span::styled(" Keys ", title_style)),
        )
        .render(chunks[2], frame.buffer_mut());
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.label),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line)),
        )
        .render(popup, frame.buffer_mut());
}

/// "Game Over!" card with the final score and a restart button.
fn draw_game_over(frame: &mut Frame, theme: &Theme, summary: &GameOverSummary, area: Rect) {
    let popup = centered(area, 34, 12);
    let label = Style::default().fg(theme.label).add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(" Game Over! ", label)),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", summary.final_score), label)),
        Line::from(Span::styled(
            format!(" Best: {} ", summary.best),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if summary.new_best {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(theme.coin).add_modifier(Modifier::BOLD),
        )));
    }
    if summary.achievement_unlocked {
        lines.push(Line::from(Span::styled(
            " Achievement: 1000 points ",
            Style::default().fg(theme.coin),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " [ R  Restart ] ",
        Style::default()
            .fg(theme.label)
            .bg(Color::White)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        " Q — Quit ",
        Style::default().fg(theme.main_fg),
    )));
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.label))
                .title(Span::styled(" Sky Stacker ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_leaderboard(frame: &mut Frame, theme: &Theme, leaderboard: &SessionLeaderboard, area: Rect) {
    let scores = leaderboard.top_scores();
    let popup = centered(area, 30, scores.len().max(1) as u16 + 6);
    let mut lines = vec![Line::from("")];
    if scores.is_empty() {
        lines.push(Line::from(Span::styled(
            " No games yet ",
            Style::default().fg(theme.main_fg),
        )));
    }
    for (i, score) in scores.iter().enumerate() {
        let style = if i == 0 {
            Style::default().fg(theme.coin).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.main_fg)
        };
        lines.push(Line::from(Span::styled(format!(" {:>2}. {:>6} ", i + 1, score), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(" Games played: {} ", leaderboard.games_played()),
        Style::default().fg(theme.main_fg),
    )));
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.title))
                .title(Span::styled(" Leaderboard ", Style::default().fg(theme.title))),
        )
        .render(popup, frame.buffer_mut());
}
