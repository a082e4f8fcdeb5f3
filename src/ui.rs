//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a three-row split: the stream on top, a detail pane for the
//!   selected entry, and a one-line status bar.
//! * Entry content is shown verbatim.  The parse service is trusted to have
//!   sanitized it.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::source::Entry;

const DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [list_area, detail_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(8),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_stream(app, frame, list_area);
    draw_detail(app, frame, detail_area);
    draw_status_bar(app, frame, status_area);
}

fn format_date(entry: &Entry) -> String {
    entry
        .published()
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "no date".into())
}

/// Render the scrollable stream of rendered entries.
fn draw_stream(app: &mut App, frame: &mut Frame, area: Rect) {
    let mut list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|entry| {
            let line = Line::from(vec![
                Span::styled(
                    format!("{:<16}", format_date(entry)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(entry.display_title(), Style::default().fg(Color::White)),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", entry.display_source()),
                    Style::default().fg(Color::Cyan),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let footer = if app.exhausted {
        "-- end of stream --"
    } else {
        "loading…"
    };
    list_items.push(ListItem::new(Line::from(Span::styled(
        footer,
        Style::default().fg(Color::DarkGray),
    ))));

    let list = List::new(list_items)
        .block(Block::default().title(" Stream ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the selected entry's links and raw content.
fn draw_detail(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default().borders(Borders::TOP);

    let Some(entry) = app.selected() else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("link  ", label),
            Span::raw(entry.link.as_deref().unwrap_or("-")),
        ]),
        Line::from(vec![
            Span::styled("feed  ", label),
            Span::raw(entry.source_link.as_deref().unwrap_or("-")),
            Span::raw("  "),
            Span::styled(entry.feed_link.as_str(), Style::default().fg(Color::Cyan)),
        ]),
    ];
    lines.extend(entry.content.lines().map(Line::raw));

    let detail = Paragraph::new(lines)
        .block(block.title(format!(" {} ", entry.display_title())))
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} entries", app.items.len()),
            Style::default().fg(Color::Green),
        ),
    ];
    if let Some(cycle) = &app.last_cycle {
        spans.push(Span::raw(format!(
            "  {} buffered, {} sources",
            cycle.buffered, cycle.active
        )));
    }
    if app.failed_sources > 0 {
        spans.push(Span::styled(
            format!("  {} failed", app.failed_sources),
            Style::default().fg(Color::Red),
        ));
    }
    spans.push(Span::raw("  q: quit  ↑/↓: scroll  m: more  r: reload  f: feed"));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
