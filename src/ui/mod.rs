pub mod app;
mod calendar_window;
mod command;
mod context;
mod insert;
mod note_window;

pub use app::App;
pub use calendar_window::CalendarWindow;
pub use context::{Context, Level, Message, Mode, Theme};
pub use note_window::NoteWindow;
