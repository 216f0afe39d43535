//! Print layout of a month: a flat display list of boxes and text blocks in logical
//! pixels, built from the same cells as the live grid.
//!
//! Building the layout has no side effects; it is handed to a [`Rasterizer`] which
//! paints it off-screen.
//!
//! [`Rasterizer`]: super::raster::Rasterizer

use crate::config::{Labels, Orientation};
use crate::grid::{CalendarDayCell, DAYS_PER_WEEK};
use crate::month::DisplayedMonth;
use crate::notes::NoteStore;

/// Logical pixels per millimetre of the print layout.
pub const PX_PER_MM: f32 = 3.78;

const PADDING: i32 = 24;
const GAP: i32 = 4;
const TITLE_SIZE: u32 = 40;
const TITLE_HEIGHT: i32 = 60;
const TITLE_MARGIN: i32 = 24;
const WEEKDAY_SIZE: u32 = 18;
const WEEKDAY_HEIGHT: i32 = 44;
const WEEKDAY_MARGIN: i32 = 8;
const CELL_MIN_HEIGHT: i32 = 150;
const CELL_RADIUS: u32 = 8;
const DAY_NUM_SIZE: u32 = 24;
const DAY_NUM_OFFSET: i32 = 8;
const NOTE_OFFSET: i32 = 32;
const NOTE_INSET: i32 = 12;
const NOTE_PADDING: i32 = 8;
const NOTE_SIZE: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const GRAY_50: Rgb = Rgb(0xF9, 0xFA, 0xFB);
    pub const GRAY_100: Rgb = Rgb(0xF3, 0xF4, 0xF6);
    pub const GRAY_200: Rgb = Rgb(0xE5, 0xE7, 0xEB);
    pub const GRAY_400: Rgb = Rgb(0x9C, 0xA3, 0xAF);
    pub const GRAY_600: Rgb = Rgb(0x4B, 0x55, 0x63);
    pub const GRAY_800: Rgb = Rgb(0x1F, 0x29, 0x37);
    pub const BLUE_500: Rgb = Rgb(0x3B, 0x82, 0xF6);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Shrinks the rectangle by `by` on every side.
    pub fn inset(&self, by: i32) -> Rect {
        Rect::new(
            self.x + by,
            self.y + by,
            (self.width as i32 - 2 * by).max(0) as u32,
            (self.height as i32 - 2 * by).max(0) as u32,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Border {
    pub color: Rgb,
    pub width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Box {
        rect: Rect,
        fill: Rgb,
        border: Option<Border>,
        radius: u32,
    },
    /// Lines are drawn top to bottom inside `rect`; lines longer than the
    /// rectangle is wide wrap, whatever does not fit below is clipped.
    Text {
        rect: Rect,
        lines: Vec<String>,
        size: u32,
        color: Rgb,
        bold: bool,
        align: Align,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotLayout {
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub nodes: Vec<Node>,
}

impl SnapshotLayout {
    pub fn texts(&self) -> impl Iterator<Item = (&Rect, &[String])> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Text { rect, lines, .. } => Some((rect, lines.as_slice())),
            _ => None,
        })
    }
}

/// Logical page size for `orientation`, A4 at [`PX_PER_MM`].
pub fn page_size(orientation: Orientation) -> (u32, u32) {
    let long = (297.0 * PX_PER_MM).round() as u32;
    let short = (210.0 * PX_PER_MM).round() as u32;
    match orientation {
        Orientation::Landscape => (long, short),
        Orientation::Portrait => (short, long),
    }
}

/// Splits a note into its visual lines. Every line break of the note starts a new
/// line; nothing is collapsed.
pub fn note_lines(note: &str) -> Vec<String> {
    if note.is_empty() {
        return Vec::new();
    }
    note.split('\n')
        .map(|line| line.trim_end_matches('\r').to_owned())
        .collect()
}

/// Builds the print layout of `month` from the live grid `cells`.
pub fn build(
    month: DisplayedMonth,
    cells: &[CalendarDayCell],
    notes: &NoteStore,
    labels: &Labels,
    orientation: Orientation,
) -> SnapshotLayout {
    let (width, min_height) = page_size(orientation);
    let mut nodes = Vec::with_capacity(cells.len() * 3 + 16);

    let inner_width = width as i32 - 2 * PADDING;
    let col_width = (inner_width - GAP * (DAYS_PER_WEEK as i32 - 1)) / DAYS_PER_WEEK as i32;
    let column_x = |col: usize| PADDING + col as i32 * (col_width + GAP);

    let mut y = PADDING;

    nodes.push(Node::Text {
        rect: Rect::new(PADDING, y, inner_width as u32, TITLE_HEIGHT as u32),
        lines: vec![format!("{} {}", labels.month(month.index()), month.year())],
        size: TITLE_SIZE,
        color: Rgb::GRAY_800,
        bold: true,
        align: Align::Center,
    });
    y += TITLE_HEIGHT + TITLE_MARGIN;

    for col in 0..DAYS_PER_WEEK {
        let rect = Rect::new(column_x(col), y, col_width as u32, WEEKDAY_HEIGHT as u32);
        nodes.push(Node::Box {
            rect,
            fill: Rgb::GRAY_200,
            border: None,
            radius: 6,
        });
        nodes.push(Node::Text {
            rect: rect.inset(NOTE_PADDING),
            lines: vec![labels.weekday(col).to_owned()],
            size: WEEKDAY_SIZE,
            color: Rgb::GRAY_600,
            bold: true,
            align: Align::Center,
        });
    }
    y += WEEKDAY_HEIGHT + WEEKDAY_MARGIN;

    let rows = cells.len().div_ceil(DAYS_PER_WEEK) as i32;
    let available = min_height as i32 - PADDING - y - GAP * (rows - 1).max(0);
    let cell_height = if rows > 0 {
        (available / rows).max(CELL_MIN_HEIGHT)
    } else {
        CELL_MIN_HEIGHT
    };

    for (idx, cell) in cells.iter().enumerate() {
        let row = (idx / DAYS_PER_WEEK) as i32;
        let rect = Rect::new(
            column_x(idx % DAYS_PER_WEEK),
            y + row * (cell_height + GAP),
            col_width as u32,
            cell_height as u32,
        );
        push_cell(&mut nodes, rect, cell, notes);
    }

    let content_bottom = y + rows * cell_height + (rows - 1).max(0) * GAP + PADDING;
    let height = (content_bottom.max(0) as u32).max(min_height);

    log::debug!(
        "Print layout for {}: {}x{} px, {} rows of {} px",
        month,
        width,
        height,
        rows,
        cell_height
    );

    SnapshotLayout {
        width,
        height,
        background: Rgb::WHITE,
        nodes,
    }
}

fn push_cell(nodes: &mut Vec<Node>, rect: Rect, cell: &CalendarDayCell, notes: &NoteStore) {
    let (fill, text_color, note_fill) = if cell.in_month {
        (Rgb::WHITE, Rgb::GRAY_800, Rgb::GRAY_50)
    } else {
        (Rgb::GRAY_50, Rgb::GRAY_400, Rgb::GRAY_100)
    };

    let border = if cell.is_today {
        Border {
            color: Rgb::BLUE_500,
            width: 2,
        }
    } else {
        Border {
            color: Rgb::GRAY_200,
            width: 1,
        }
    };

    nodes.push(Node::Box {
        rect,
        fill,
        border: Some(border),
        radius: CELL_RADIUS,
    });

    nodes.push(Node::Text {
        rect: Rect::new(
            rect.x + DAY_NUM_OFFSET,
            rect.y + DAY_NUM_OFFSET,
            rect.width.saturating_sub(2 * DAY_NUM_OFFSET as u32),
            DAY_NUM_SIZE + 4,
        ),
        lines: vec![cell.day_num().to_string()],
        size: DAY_NUM_SIZE,
        color: text_color,
        bold: true,
        align: Align::Left,
    });

    let note_box = Rect::new(
        rect.x + NOTE_INSET,
        rect.y + NOTE_OFFSET + NOTE_INSET,
        rect.width.saturating_sub(2 * NOTE_INSET as u32),
        (rect.height as i32 - NOTE_OFFSET - 2 * NOTE_INSET).max(0) as u32,
    );
    nodes.push(Node::Box {
        rect: note_box,
        fill: note_fill,
        border: None,
        radius: 4,
    });

    let lines = note_lines(notes.text(&cell.key));
    if !lines.is_empty() {
        nodes.push(Node::Text {
            rect: note_box.inset(NOTE_PADDING),
            lines,
            size: NOTE_SIZE,
            color: text_color,
            bold: false,
            align: Align::Left,
        });
    }
}
