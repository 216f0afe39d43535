use std::fmt::Write;

use chrono::Datelike;
use itertools::Itertools;
use unsegen::base::*;
use unsegen::widget::*;

use super::Context;
use crate::export::ExportState;
use crate::grid::DayKey;

/// Note of the selected day and export status.
pub struct NoteWindow<'a> {
    context: &'a Context,
}

impl<'a> NoteWindow<'a> {
    pub fn new(context: &'a Context) -> Self {
        NoteWindow { context }
    }

    /// Days of the displayed month that carry a note, e.g. `3, 14, 29`.
    fn noted_days(&self) -> String {
        let session = self.context.session();
        let month = session.month();
        (1..=month.num_days())
            .map(|day| month.day(day))
            .filter(|date| !session.note(*date).trim().is_empty())
            .map(|date| date.day())
            .join(", ")
    }

    fn export_status(&self) -> String {
        let session = self.context.session();
        let state = match session.export_state() {
            ExportState::Idle => "idle",
            ExportState::Generating => "generating",
            ExportState::Ready => "ready",
            ExportState::Failed => "failed",
        };
        let mut status = format!("PDF export: {} ({})", session.capability().label(), state);
        if let Some(artifact) = session.artifact() {
            let _ = write!(status, ", last {}", artifact.file_name);
        }
        status
    }
}

impl Widget for NoteWindow<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::at_least(20),
            height: RowDemand::at_least(8),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let session = self.context.session();
        let theme = &self.context.theme;
        let date = self.context.cursor();
        let labels = session.labels();

        let mut cursor = Cursor::new(&mut window).wrapping_mode(WrappingMode::Wrap);

        cursor.set_style_modifier(theme.month_header_style);
        if let Err(err) = write!(
            &mut cursor,
            "{} {} {} {}",
            labels.weekday(date.weekday().num_days_from_sunday() as usize),
            date.day(),
            labels.month(date.month0()),
            date.year()
        ) {
            log::warn!("Error while writing note header: {}", err);
        }
        cursor.fill_and_wrap_line();
        cursor.set_style_modifier(theme.day_style);

        if !self.context.cursor_editable() {
            cursor.set_style_modifier(theme.filler_day_style);
            let _ = write!(&mut cursor, "(adjacent month, not editable)");
            cursor.fill_and_wrap_line();
        } else {
            let note = session.notes().text(&DayKey::from(date));
            if note.is_empty() {
                cursor.set_style_modifier(theme.filler_day_style);
                let _ = write!(&mut cursor, "(no note, press i to add a line)");
                cursor.fill_and_wrap_line();
            } else {
                for line in note.lines() {
                    if let Err(err) = write!(&mut cursor, "{}", line) {
                        log::warn!("Error while writing note: {}", err);
                    }
                    cursor.fill_and_wrap_line();
                }
            }
        }

        cursor.set_style_modifier(theme.day_style);
        cursor.fill_and_wrap_line();

        let noted = self.noted_days();
        if !noted.is_empty() {
            let _ = write!(&mut cursor, "Notes on: {}", noted);
            cursor.fill_and_wrap_line();
        }
        let _ = write!(&mut cursor, "{}", self.export_status());
        cursor.fill_and_wrap_line();
    }
}
