//! Page geometry: paper formats and placement of the rasterized month on them.
//!
//! All lengths are millimetres with the origin in the top-left corner of the page.

use crate::config::{FitPolicy, Orientation};

pub const A4_SHORT_MM: f32 = 210.0;
pub const A4_LONG_MM: f32 = 297.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl PageFormat {
    pub fn a4(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Landscape => PageFormat {
                width_mm: A4_LONG_MM,
                height_mm: A4_SHORT_MM,
            },
            Orientation::Portrait => PageFormat {
                width_mm: A4_SHORT_MM,
                height_mm: A4_LONG_MM,
            },
        }
    }
}

/// Where the image goes on one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// One placement per page for an image of `width_px` × `height_px`.
pub fn place(
    width_px: u32,
    height_px: u32,
    page: PageFormat,
    fill: f32,
    policy: FitPolicy,
) -> Vec<Placement> {
    match policy {
        FitPolicy::Page => vec![fit_page(width_px, height_px, page, fill)],
        FitPolicy::Width => stack_by_width(width_px, height_px, page, fill),
    }
}

/// Scales the image to `fill` of the page width, or of the height if it would not
/// fit otherwise, keeping its aspect ratio, centred on both axes.
pub fn fit_page(width_px: u32, height_px: u32, page: PageFormat, fill: f32) -> Placement {
    let ratio = width_px.max(1) as f32 / height_px.max(1) as f32;

    let mut width_mm = page.width_mm * fill;
    let mut height_mm = width_mm / ratio;

    if height_mm > page.height_mm * fill {
        height_mm = page.height_mm * fill;
        width_mm = height_mm * ratio;
    }

    Placement {
        x_mm: (page.width_mm - width_mm) / 2.0,
        y_mm: (page.height_mm - height_mm) / 2.0,
        width_mm,
        height_mm,
    }
}

/// Scales the image to `fill` of the page width. An image taller than the printable
/// window is repeated on as many pages as needed, each copy shifted up by one window,
/// so every part of it lands inside the window of some page.
pub fn stack_by_width(width_px: u32, height_px: u32, page: PageFormat, fill: f32) -> Vec<Placement> {
    let ratio = width_px.max(1) as f32 / height_px.max(1) as f32;

    let width_mm = page.width_mm * fill;
    let height_mm = width_mm / ratio;
    let x_mm = (page.width_mm - width_mm) / 2.0;

    let margin_mm = page.height_mm * (1.0 - fill) / 2.0;
    let window_mm = page.height_mm - 2.0 * margin_mm;

    if height_mm <= window_mm {
        return vec![Placement {
            x_mm,
            y_mm: (page.height_mm - height_mm) / 2.0,
            width_mm,
            height_mm,
        }];
    }

    let pages = (height_mm / window_mm).ceil() as usize;

    (0..pages)
        .map(|page_idx| Placement {
            x_mm,
            y_mm: margin_mm - page_idx as f32 * window_mm,
            width_mm,
            height_mm,
        })
        .collect()
}
