//! Insights panel rendering
//!
//! Renders the streaming insights view: a pre-activation hint, a skeleton
//! while the first fragment is pending, the accumulated text with a
//! pending cursor while streaming, and terminal success/error states.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::session::{StreamPhase, StreamState};

use super::theme::{COLOR_ACTIVE, COLOR_BORDER, COLOR_DIM, COLOR_ERROR, COLOR_HEADER, COLOR_SKELETON};

/// Pending cursor shown at the end of the text while fragments are arriving.
const STREAM_CURSOR: &str = "▋";

/// Skeleton bar widths as a fraction of the panel width, mirroring the
/// uneven lines of text they stand in for.
const SKELETON_WIDTHS: [(u16, u16); 5] = [(1, 1), (5, 6), (4, 6), (1, 1), (3, 4)];

/// Render the insights panel into `area`.
pub fn render_insights(frame: &mut Frame, area: Rect, state: &StreamState) {
    let block = Block::default()
        .title(Span::styled(" Insights ", Style::default().fg(COLOR_HEADER)))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(COLOR_BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let paragraph = if let Some(error) = &state.error {
        Paragraph::new(Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(COLOR_ERROR),
        )]))
        .wrap(Wrap { trim: false })
    } else if !state.content.is_empty() || state.done {
        let mut spans = vec![Span::raw(state.content.clone())];
        if state.phase == StreamPhase::Streaming && !state.done {
            spans.push(Span::styled(
                STREAM_CURSOR,
                Style::default().fg(COLOR_ACTIVE),
            ));
        }
        Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false })
    } else if state.url.is_some() {
        // A target with no text yet means the first fragment is pending
        Paragraph::new(skeleton_lines(inner.width))
    } else {
        Paragraph::new(Line::from(Span::styled(
            "Press i to generate insights from your collection",
            Style::default().fg(COLOR_DIM),
        )))
    };

    frame.render_widget(paragraph, inner);
}

/// Build the dim placeholder bars shown before the first fragment arrives.
fn skeleton_lines(width: u16) -> Vec<Line<'static>> {
    SKELETON_WIDTHS
        .iter()
        .flat_map(|(num, den)| {
            let bar_width = (width as u32 * *num as u32 / *den as u32) as usize;
            [
                Line::from(Span::styled(
                    "▆".repeat(bar_width),
                    Style::default().fg(COLOR_SKELETON),
                )),
                Line::default(),
            ]
        })
        .collect()
}
