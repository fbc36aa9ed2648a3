//! TUI rendering for the single-item view.

pub mod buttons;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::{app::App, engagement::Phase};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(3), // buttons
      Constraint::Length(1), // status bar
    ])
    .split(f.area());

  draw_header(f, rows[0]);
  draw_body(f, rows[1], app);
  draw_buttons(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    " clubhub  [l] like  [s] save  [h] share  [r] reload  [q] quit",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{date} "), Style::default().fg(Color::DarkGray));

  let pad = area
    .width
    .saturating_sub(left.width() as u16)
    .saturating_sub(right.width() as u16);
  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  f.render_widget(Paragraph::new(line).style(Style::default().bg(Color::DarkGray)), area);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  let item = app.handle.item();
  let title = match &app.content {
    Some(content) => format!(" {} ", content.title.as_deref().unwrap_or("(untitled)")),
    None => format!(" {item} "),
  };
  let block = Block::default()
    .title(title)
    .title_bottom(format!(" {} ", item.content_type))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));

  let mut lines: Vec<Line> = Vec::new();
  if let Some(content) = &app.content {
    for text in content.body.lines() {
      lines.push(Line::from(text.to_owned()));
    }
    lines.push(Line::from(Span::styled(
      format!("by {} · {}", content.author_id, content.created_at.format("%Y-%m-%d %H:%M")),
      Style::default().fg(Color::DarkGray),
    )));
  }

  if !app.comments.is_empty() {
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
      "Comments",
      Style::default().add_modifier(Modifier::BOLD),
    )));
    for comment in &app.comments {
      lines.push(Line::from(vec![
        Span::styled(format!("{}: ", comment.author_id), Style::default().fg(Color::Yellow)),
        Span::raw(comment.content.clone()),
      ]));
    }
  }

  f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

// ─── Buttons ──────────────────────────────────────────────────────────────────

fn draw_buttons(f: &mut Frame, area: Rect, app: &App) {
  let snap = app.handle.snapshot();
  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  f.render_widget(Paragraph::new(buttons::button_row(&snap)).block(block), area);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let snap = app.handle.snapshot();
  let (label, color) = match snap.phase {
    _ if snap.loading => ("LOADING", Color::Blue),
    Phase::Idle => ("READY", Color::Cyan),
    Phase::Pending => ("SAVING", Color::Yellow),
    Phase::Confirmed => ("OK", Color::Green),
    Phase::RolledBack => ("FAILED", Color::Red),
  };

  let mode_span = Span::styled(
    format!(" {label} "),
    Style::default().fg(Color::Black).bg(color).add_modifier(Modifier::BOLD),
  );
  let hint_span =
    Span::styled(format!("  {}", app.status_line()), Style::default().fg(Color::DarkGray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}
