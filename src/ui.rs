//! Terminal rendering of a [`TickerFrame`].
//!
//! All drawing lives here, separated from ticker state ([`crate::app`]) and
//! the rotation models ([`crate::rotate`]).  The frame already says what is
//! visible; this module only maps it onto terminal cells.
//!
//! ## For contributors
//!
//! * The layout is a bordered ticker box on top and a one-line status bar at
//!   the bottom.
//! * Marquee and carousel text sits on the middle row of the box.  Carousel
//!   slides move whole box widths (left/right) or heights (up/down).
//! * Widths are display columns ([`unicode_width`]), so CJK headlines line
//!   up correctly.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::TickerFrame;
use crate::rotate::{CarouselView, SlotId, FETCHING_PLACEHOLDER, LOADING_PLACEHOLDER};

/// Draw the complete UI for one frame.
pub fn draw(frame: &mut Frame, ticker: &TickerFrame, status: &str) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());

    draw_ticker(frame, ticker, main_area);
    draw_status_bar(frame, status, status_area);
}

fn draw_ticker(frame: &mut Frame, ticker: &TickerFrame, area: Rect) {
    let block = Block::default().title(" News ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let text_style = Style::default().fg(Color::White);
    let row = middle_row(inner);
    match ticker {
        TickerFrame::Loading => draw_placeholder(frame, inner, LOADING_PLACEHOLDER),
        TickerFrame::Fetching => draw_placeholder(frame, inner, FETCHING_PLACEHOLDER),
        TickerFrame::Marquee { stream, offset, .. } => {
            place(frame, inner, row, 0, stream, *offset, text_style);
        }
        TickerFrame::Carousel { texts, view } => draw_carousel(frame, inner, texts, view),
    }
}

fn draw_placeholder(frame: &mut Frame, area: Rect, text: &str) {
    let width = i32::from(area.width);
    let start = (width - text.width() as i32).max(0) / 2;
    let style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC);
    place(frame, area, middle_row(area), start, text, 0, style);
}

fn draw_carousel(frame: &mut Frame, area: Rect, texts: &[String; 2], view: &CarouselView) {
    let text_of = |slot: SlotId| match slot {
        SlotId::A => texts[0].as_str(),
        SlotId::B => texts[1].as_str(),
    };
    let outgoing = text_of(view.active);
    let style = Style::default().fg(Color::White);

    if !view.transitioning {
        draw_slot(frame, area, outgoing, (0.0, 0.0), style);
        return;
    }

    let p = view.progress;
    let exit = (f32::from(view.exit_to.0) * p, f32::from(view.exit_to.1) * p);
    let enter = (
        f32::from(view.enter_from.0) * (1.0 - p),
        f32::from(view.enter_from.1) * (1.0 - p),
    );
    draw_slot(frame, area, outgoing, exit, style.add_modifier(Modifier::DIM));
    draw_slot(frame, area, text_of(view.active.other()), enter, style);
}

/// Draw `text` centred in `area`, displaced by `shift` box sizes.
fn draw_slot(frame: &mut Frame, area: Rect, text: &str, shift: (f32, f32), style: Style) {
    let width = i32::from(area.width);
    let height = i32::from(area.height);
    let dx = (shift.0 * width as f32).round() as i32;
    let dy = (shift.1 * height as f32).round() as i32;

    let row = i32::from(middle_row(area)) + dy;
    if row < i32::from(area.y) || row >= i32::from(area.y) + height {
        return;
    }
    let start = (width - text.width() as i32).max(0) / 2 + dx;
    place(frame, area, row as u16, start, text, 0, style);
}

/// Render one line of `text` on `row`, beginning at column `start` of
/// `area` (may be negative) after skipping `skip` columns of the text.
/// Anything outside `area` is clipped.
fn place(frame: &mut Frame, area: Rect, row: u16, start: i32, text: &str, skip: usize, style: Style) {
    let width = i32::from(area.width);
    if start >= width {
        return;
    }
    let skip = skip + start.min(0).unsigned_abs() as usize;
    let left = start.max(0);
    let available = (width - left) as usize;

    let visible = visible_columns(text, skip, available);
    let visible_width = visible.width() as u16;
    if visible_width == 0 {
        return;
    }
    let rect = Rect {
        x: area.x + left as u16,
        y: row,
        width: visible_width,
        height: 1,
    };
    frame.render_widget(Paragraph::new(Line::from(Span::styled(visible, style))), rect);
}

fn middle_row(area: Rect) -> u16 {
    area.y + area.height.saturating_sub(1) / 2
}

/// The part of `text` from display column `skip`, at most `width` columns
/// wide.  A wide character cut by either edge becomes a space.
pub fn visible_columns(text: &str, skip: usize, width: usize) -> String {
    let mut out = String::new();
    let mut column = 0;
    let mut used = 0;

    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        let end = column + w;
        if end <= skip {
            column = end;
            continue;
        }
        if column < skip {
            // Straddles the left edge.
            let shown = end - skip;
            if used + shown > width {
                break;
            }
            out.extend(std::iter::repeat(' ').take(shown));
            used += shown;
        } else if used + w > width {
            if used < width {
                out.push(' ');
            }
            break;
        } else {
            out.push(c);
            used += w;
        }
        column = end;
    }
    out
}

/// Render the bottom status bar.
fn draw_status_bar(frame: &mut Frame, status: &str, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status, Style::default().fg(Color::Yellow)),
        Span::raw("  q: quit  t: marquee/carousel"),
    ]));
    frame.render_widget(status, area);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
