use std::fmt::{Display, Write};

use unsegen::base::*;
use unsegen::widget::*;

use super::{Context, Theme};
use crate::grid::{CalendarDayCell, DAYS_PER_WEEK};

pub struct DayCell<'a> {
    day_num: u32,
    selected: bool,
    is_today: bool,
    has_note: bool,
    theme: &'a Theme,
}

impl<'a> DayCell<'a> {
    const CELL_HEIGHT: usize = 1;
    const CELL_WIDTH: usize = 5;

    fn new(day_num: u32, theme: &'a Theme) -> Self {
        DayCell {
            day_num,
            selected: false,
            is_today: false,
            has_note: false,
            theme,
        }
    }

    fn select(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn today(mut self, is_today: bool) -> Self {
        self.is_today = is_today;
        self
    }

    fn note(mut self, has_note: bool) -> Self {
        self.has_note = has_note;
        self
    }
}

impl Display for DayCell<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arg_today = if self.is_today {
            self.theme.today_day_char.unwrap_or(' ')
        } else {
            ' '
        };

        let arg_focus = if self.selected {
            self.theme.focus_day_char.unwrap_or(' ')
        } else {
            ' '
        };

        let arg_note = if self.has_note {
            self.theme.note_char
        } else {
            ' '
        };

        write!(f, "{}{}{:>2}{}", arg_today, arg_focus, self.day_num, arg_note)
    }
}

/// The live grid of the displayed month.
pub struct CalendarWindow<'a> {
    context: &'a Context,
}

impl<'a> CalendarWindow<'a> {
    const TITLE_ROWS: usize = 1;
    const HEADER_ROWS: usize = 1;
    const MAX_ROWS: usize = 6;

    pub fn new(context: &'a Context) -> Self {
        CalendarWindow { context }
    }

    fn cell_style(&self, cell: &CalendarDayCell) -> StyleModifier {
        let theme = &self.context.theme;
        if cell.date == self.context.cursor() {
            theme.focus_day_style
        } else if cell.is_today {
            theme.today_day_style
        } else if !cell.in_month {
            theme.filler_day_style
        } else {
            theme.day_style
        }
    }
}

impl Widget for CalendarWindow<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::exact(DAYS_PER_WEEK * DayCell::CELL_WIDTH),
            height: RowDemand::at_least(
                Self::TITLE_ROWS + Self::HEADER_ROWS + Self::MAX_ROWS * DayCell::CELL_HEIGHT,
            ),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let session = self.context.session();
        let theme = &self.context.theme;
        let labels = session.labels();
        let month = session.month();

        let mut cursor = Cursor::new(&mut window).wrapping_mode(WrappingMode::Wrap);

        cursor.set_style_modifier(theme.month_header_style);
        if let Err(err) = write!(
            &mut cursor,
            "{:^width$}",
            format!("< {} {} >", labels.month(month.index()), month.year()),
            width = DAYS_PER_WEEK * DayCell::CELL_WIDTH
        ) {
            log::warn!("Error while writing month header: {}", err);
        }
        cursor.fill_and_wrap_line();

        cursor.set_style_modifier(theme.weekday_header_style);
        for idx in 0..DAYS_PER_WEEK {
            if let Err(err) = write!(
                &mut cursor,
                "{:>width$}",
                labels.weekday(idx),
                width = DayCell::CELL_WIDTH
            ) {
                log::warn!("Error while writing weekday header: {}", err);
            }
        }
        cursor.fill_and_wrap_line();

        let cells = match session.cells() {
            Some(cells) => cells,
            None => {
                cursor.set_style_modifier(theme.error_style);
                let _ = write!(&mut cursor, "(calendar not mounted)");
                return;
            }
        };

        for week in cells.chunks(DAYS_PER_WEEK) {
            for cell in week {
                cursor.set_style_modifier(self.cell_style(cell));
                let day = DayCell::new(cell.day_num(), theme)
                    .select(cell.date == self.context.cursor())
                    .today(cell.is_today)
                    .note(!session.notes().text(&cell.key).trim().is_empty());
                if let Err(err) = write!(&mut cursor, "{}", day) {
                    log::warn!("Error while writing day {}: {}", cell.key, err);
                }
            }
            cursor.set_style_modifier(theme.day_style);
            cursor.fill_and_wrap_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_cell_markers() {
        let theme = Theme::default();
        assert_eq!(DayCell::new(7, &theme).to_string(), "   7 ");
        assert_eq!(
            DayCell::new(14, &theme).today(true).note(true).to_string(),
            "* 14+"
        );
        assert_eq!(DayCell::new(1, &theme).select(true).to_string().len(), DayCell::CELL_WIDTH);
    }
}
