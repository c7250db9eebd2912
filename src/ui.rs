//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).  This makes it easy to change the
//! visual layout without touching business logic.
//!
//! ## For contributors
//!
//! * The base layout is a two-row split: the scrollable listing table on top
//!   and a one-line status bar at the bottom.
//! * Overlays (URL box, detail modal, status picker, delete prompt) are drawn
//!   last, over a [`Clear`]ed centred rectangle.  [`App::mode`] decides which.
//! * Status colours live in [`status_color`]; keep them in sync with the
//!   picker order in [`ListingStatus::CHOICES`].

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Mode};
use crate::listing::{Listing, ListingStatus, Pending, TaskPhase};

/// `about` keys shown with a friendly label in the detail modal, in order.
const ABOUT_LABELS: [(&str, &str); 6] = [
    ("mileage", "Mileage"),
    ("transmission", "Transmission"),
    ("color", "Color"),
    ("fuel_type", "Fuel Type"),
    ("mpg", "MPG"),
    ("safety", "Safety"),
];

/// Colour used for a listing status badge.
pub fn status_color(status: &ListingStatus) -> Color {
    match status {
        ListingStatus::New => Color::Blue,
        ListingStatus::Contacted => Color::Yellow,
        ListingStatus::Viewed => Color::Magenta,
        ListingStatus::Negotiating => Color::Green,
        ListingStatus::Completed | ListingStatus::Other(_) => Color::Gray,
    }
}

/// Draw the complete UI for one frame.
///
/// Called once per tick from the main loop.  Delegates to helper functions
/// for each screen region.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_listings(app, frame, main_area);
    draw_status_bar(app, frame, status_area);

    match app.mode.clone() {
        Mode::Browse => {}
        Mode::AddUrl { input } => draw_url_box(&input, frame),
        Mode::Detail { id } => {
            if let Some(listing) = app.store.get(&id) {
                draw_detail(listing, frame);
            }
        }
        Mode::PickStatus { index, .. } => draw_status_picker(index, frame),
        Mode::ConfirmDelete { id } => {
            if let Some(listing) = app.store.get(&id) {
                draw_delete_prompt(listing, frame);
            }
        }
    }
}

/// Render the scrollable listing table.
fn draw_listings(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Car Tracker ")
        .borders(Borders::ALL);

    if app.store.is_empty() {
        let text = if app.loaded { "No cars found" } else { "Loading…" };
        let empty = Paragraph::new(Line::styled(text, Style::default().fg(Color::DarkGray)))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let list_items: Vec<ListItem> = app
        .store
        .items()
        .iter()
        .map(|listing| match &listing.pending {
            Some(pending) => ListItem::new(pending_line(listing, pending)),
            None => ListItem::new(listing_line(listing)),
        })
        .collect();

    let list = List::new(list_items)
        .block(block)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn listing_line(listing: &Listing) -> Line<'_> {
    let price = listing
        .price
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_default();

    let mut spans = vec![
        Span::styled(
            format!("{:<12}", listing.status.as_str()),
            Style::default().fg(status_color(&listing.status)),
        ),
        Span::styled(&listing.title, Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(price, Style::default().fg(Color::Green)),
        Span::raw("  "),
        Span::styled(&listing.location, Style::default().fg(Color::DarkGray)),
    ];
    if let Some(mileage) = listing.about_value("mileage") {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(mileage, Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn pending_line<'a>(listing: &'a Listing, pending: &'a Pending) -> Line<'a> {
    let title = if listing.title.is_empty() {
        "Adding new car..."
    } else {
        listing.title.as_str()
    };
    let phase_color = match pending.phase {
        TaskPhase::Error => Color::Red,
        TaskPhase::Complete => Color::Green,
        _ => Color::LightBlue,
    };

    Line::from(vec![
        Span::styled(
            format!("{:<12}", pending.phase.as_str()),
            Style::default()
                .fg(phase_color)
                .add_modifier(Modifier::ITALIC),
        ),
        Span::styled(title, Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(&pending.message, Style::default().fg(Color::DarkGray)),
    ])
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} cars", app.store.len()),
            Style::default().fg(Color::Green),
        ),
    ];

    let pending = app.pending_count();
    if pending > 0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("{pending} pending"),
            Style::default().fg(Color::LightBlue),
        ));
    }
    if let Some(at) = app.last_refreshed {
        spans.push(Span::styled(
            format!("  @{}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    spans.push(Span::raw(match app.mode {
        Mode::Browse => "  a: add  enter: details  o: open  s: status  d: delete  r: refresh  q: quit",
        Mode::AddUrl { .. } => "  enter: submit  esc: cancel",
        Mode::Detail { .. } => "  o: open in browser  esc: close",
        Mode::PickStatus { .. } => "  ↑/↓: choose  enter: apply  esc: cancel",
        Mode::ConfirmDelete { .. } => "  y: delete  n: keep",
    }));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// A rectangle of the given percentage size centred in `area`.
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn overlay_block(title: &str) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

fn draw_url_box(input: &str, frame: &mut Frame) {
    let area = centered(frame.area(), 70, 20);
    let text = Line::from(vec![
        Span::styled(input, Style::default().fg(Color::White)),
        Span::styled("▏", Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(overlay_block(" Enter car URL ")),
        area,
    );
}

fn labelled<'a>(label: &'a str, value: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn draw_detail(listing: &Listing, frame: &mut Frame) {
    let area = centered(frame.area(), 80, 80);
    let price = listing
        .price
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "unknown".into());

    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::styled("Details", heading),
        labelled("Price", &price),
        labelled("Location", &listing.location),
        Line::from(vec![
            Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                listing.status.label(),
                Style::default().fg(status_color(&listing.status)),
            ),
        ]),
    ];
    if let Some(posted) = &listing.time_posted {
        lines.push(labelled("Listed", posted));
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled("Vehicle Information", heading));
    for (key, label) in ABOUT_LABELS {
        if let Some(value) = listing.about_value(key) {
            lines.push(labelled(label, value));
        }
    }
    for (key, value) in &listing.about {
        let known = ABOUT_LABELS.iter().any(|(k, _)| *k == key.as_str());
        if let (false, Some(value)) = (known, value) {
            lines.push(labelled(key, value));
        }
    }

    lines.push(Line::raw(""));
    lines.push(Line::styled("Description", heading));
    lines.push(Line::raw(
        listing
            .description
            .as_deref()
            .unwrap_or("No description available."),
    ));

    lines.push(Line::raw(""));
    if listing.images.is_empty() {
        lines.push(Line::styled("No images available", Style::default().fg(Color::DarkGray)));
    } else {
        lines.push(Line::styled(
            format!("{} image(s)", listing.images.len()),
            heading,
        ));
        for url in &listing.images {
            lines.push(Line::styled(url.as_str(), Style::default().fg(Color::DarkGray)));
        }
    }
    lines.push(Line::raw(""));
    lines.push(labelled("Listing", &listing.url));

    let title = format!(" {} ", listing.title);
    let detail = Paragraph::new(Text::from(lines))
        .block(overlay_block(&title))
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(detail, area);
}

fn draw_status_picker(index: usize, frame: &mut Frame) {
    let area = centered(frame.area(), 30, 40);
    let items: Vec<ListItem> = ListingStatus::CHOICES
        .iter()
        .map(|status| {
            ListItem::new(Line::styled(
                status.label(),
                Style::default().fg(status_color(status)),
            ))
        })
        .collect();

    let list = List::new(items)
        .block(overlay_block(" Status "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("▸ ");
    let mut state = ListState::default().with_selected(Some(index));

    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_delete_prompt(listing: &Listing, frame: &mut Frame) {
    let area = centered(frame.area(), 50, 20);
    let name = if listing.title.is_empty() {
        listing.url.as_str()
    } else {
        listing.title.as_str()
    };
    let prompt = Paragraph::new(vec![
        Line::raw(format!("Delete \"{name}\"?")),
        Line::styled("y: yes   n: no", Style::default().fg(Color::DarkGray)),
    ])
    .block(overlay_block(" Confirm "))
    .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(prompt, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
