//! The interaction-button row: `♥ n  💬 n  ↗ n  [saved]`.

use clubhub_core::engagement::{ContentStats, EngagementState};
use ratatui::{
  style::{Color, Modifier, Style},
  text::{Line, Span},
};

use crate::engagement::{HandleSnapshot, Phase};

/// Compact count: `999`, `1.0k`, `12.3k`. Negative counts render as `0`.
pub fn format_count(count: i64) -> String {
  let count = count.max(0);
  if count >= 1000 {
    format!("{:.1}k", count as f64 / 1000.0)
  } else {
    count.to_string()
  }
}

/// Plain-text row for non-interactive output.
pub fn button_text(state: &EngagementState, stats: &ContentStats) -> String {
  format!(
    "♥ {}  💬 {}  ↗ {}  {}",
    format_count(stats.like_count),
    format_count(stats.comment_count),
    format_count(stats.share_count),
    if state.saved { "[saved]" } else { "[save]" },
  )
}

/// Styled row for the TUI. Active flags are highlighted; the whole row is
/// dimmed while a request is in flight.
pub fn button_row(snap: &HandleSnapshot) -> Line<'static> {
  let base = if snap.phase == Phase::Pending || snap.loading {
    Style::default().fg(Color::DarkGray)
  } else {
    Style::default().fg(Color::Gray)
  };
  let active = |on: bool, color: Color| {
    if on { base.fg(color).add_modifier(Modifier::BOLD) } else { base }
  };

  let engagement = &snap.engagement;
  let stats = &snap.stats;
  Line::from(vec![
    Span::styled(
      format!("♥ {}", format_count(stats.like_count)),
      active(engagement.liked, Color::Red),
    ),
    Span::raw("  "),
    Span::styled(format!("💬 {}", format_count(stats.comment_count)), base),
    Span::raw("  "),
    Span::styled(
      format!("↗ {}", format_count(stats.share_count)),
      active(engagement.shared, Color::Green),
    ),
    Span::raw("  "),
    Span::styled(
      if engagement.saved { "[saved]" } else { "[save]" },
      active(engagement.saved, Color::Green),
    ),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counts_format_like_the_web_client() {
    assert_eq!(format_count(0), "0");
    assert_eq!(format_count(999), "999");
    assert_eq!(format_count(1000), "1.0k");
    assert_eq!(format_count(1260), "1.3k");
    assert_eq!(format_count(12_345), "12.3k");
    assert_eq!(format_count(-3), "0");
  }

  #[test]
  fn text_row_shows_saved_marker() {
    let mut state = EngagementState::default();
    let stats = ContentStats { like_count: 1500, comment_count: 2, share_count: 1, ..Default::default() };
    assert_eq!(button_text(&state, &stats), "♥ 1.5k  💬 2  ↗ 1  [save]");

    state.saved = true;
    assert!(button_text(&state, &stats).ends_with("[saved]"));
  }

  #[test]
  fn styled_row_highlights_liked() {
    let mut snap = HandleSnapshot {
      engagement: EngagementState::default(),
      stats:      ContentStats { like_count: 3, ..Default::default() },
      loading:    false,
      phase:      Phase::Confirmed,
      last_error: None,
    };
    snap.engagement.liked = true;

    let line = button_row(&snap);
    assert_eq!(line.spans[0].content, "♥ 3");
    assert_eq!(line.spans[0].style.fg, Some(Color::Red));
    assert_eq!(line.spans[6].content, "[save]");
  }
}
