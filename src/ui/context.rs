use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use unsegen::base::style::*;
use unsegen::widget::builtin::PromptLine;

use crate::error::{Error, Result};
use crate::export::ShareOutcome;
use crate::month::DisplayedMonth;
use crate::session::Session;

pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);
pub const FALLBACK_MESSAGE_TIMEOUT: Duration = Duration::from_secs(7);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Insert,
    Command,
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub day_style: StyleModifier,
    pub filler_day_style: StyleModifier,
    pub focus_day_style: StyleModifier,
    pub focus_day_char: Option<char>,
    pub today_day_style: StyleModifier,
    pub today_day_char: Option<char>,
    pub note_char: char,
    pub month_header_style: StyleModifier,
    pub weekday_header_style: StyleModifier,
    pub info_style: StyleModifier,
    pub error_style: StyleModifier,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            day_style: StyleModifier::new(),
            filler_day_style: StyleModifier::new().fg_color(Color::LightBlack),
            focus_day_style: StyleModifier::new().bg_color(Color::Blue),
            focus_day_char: None,
            today_day_style: StyleModifier::new().invert(true),
            today_day_char: Some('*'),
            note_char: '+',
            month_header_style: StyleModifier::new().fg_color(Color::Yellow).bold(true),
            weekday_header_style: StyleModifier::new().fg_color(Color::Yellow),
            info_style: StyleModifier::new().fg_color(Color::Green),
            error_style: StyleModifier::new().fg_color(Color::LightRed),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// A transient line in the bottom bar.
#[derive(Clone, Debug)]
pub struct Message {
    pub text: String,
    pub level: Level,
    expires: Instant,
}

impl Message {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

pub struct Context {
    pub mode: Mode,
    pub theme: Theme,
    session: Session,
    cursor: NaiveDate,
    command_line: PromptLine,
    insert_line: PromptLine,
    message: Option<Message>,
    quit_armed: bool,
    quit: bool,
}

impl Context {
    pub fn new(session: Session) -> Self {
        let cursor = session.today();
        let mut context = Context {
            mode: Mode::Normal,
            theme: Theme::default(),
            session,
            cursor,
            command_line: PromptLine::with_prompt(":".to_owned()),
            insert_line: PromptLine::with_prompt("+ ".to_owned()),
            message: None,
            quit_armed: false,
            quit: false,
        };
        context.follow_month();
        context
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn cursor(&self) -> NaiveDate {
        self.cursor
    }

    pub fn input_sink(&self, mode: Mode) -> &PromptLine {
        match mode {
            Mode::Insert => &self.insert_line,
            _ => &self.command_line,
        }
    }

    pub fn input_sink_mut(&mut self, mode: Mode) -> &mut PromptLine {
        match mode {
            Mode::Insert => &mut self.insert_line,
            _ => &mut self.command_line,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn show(&mut self, level: Level, text: impl Into<String>, timeout: Duration) {
        self.message = Some(Message {
            text: text.into(),
            level,
            expires: Instant::now() + timeout,
        });
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.show(Level::Info, text, MESSAGE_TIMEOUT);
    }

    pub fn error(&mut self, err: &Error) {
        log::warn!("{}", err);
        self.show(Level::Error, err.to_string(), MESSAGE_TIMEOUT);
    }

    pub fn update(&mut self, now: NaiveDateTime, instant: Instant) {
        self.session.tick(now);
        if self.message.as_ref().map_or(false, |m| m.is_expired(instant)) {
            self.message = None;
        }
    }

    /// Keeps the cursor inside the displayed month, on the same day where possible.
    fn follow_month(&mut self) {
        let month = self.session.month();
        if !month.contains(&self.cursor) {
            self.cursor = month.day(self.cursor.day());
        }
    }

    /// Moves the cursor, showing its month if it leaves the displayed one. The
    /// cursor stays put when that month is outside the supported range.
    pub fn set_cursor(&mut self, date: NaiveDate) {
        match DisplayedMonth::of(&date) {
            Ok(month) => {
                self.cursor = date;
                self.session.go_to(month);
            }
            Err(err) => self.error(&err),
        }
    }

    pub fn move_cursor(&mut self, days: i64) {
        if let Some(date) = self
            .cursor
            .checked_add_signed(chrono::Duration::days(days))
        {
            self.set_cursor(date);
        }
    }

    pub fn next_month(&mut self, count: u32) -> Result<()> {
        self.session.next_month(count)?;
        self.follow_month();
        Ok(())
    }

    pub fn prev_month(&mut self, count: u32) -> Result<()> {
        self.session.prev_month(count)?;
        self.follow_month();
        Ok(())
    }

    pub fn go_to(&mut self, month: DisplayedMonth) {
        self.session.go_to(month);
        self.follow_month();
    }

    pub fn go_to_today(&mut self) {
        self.set_cursor(self.session.today());
    }

    /// Whether the selected day can take notes.
    pub fn cursor_editable(&self) -> bool {
        self.session.month().contains(&self.cursor)
    }

    pub fn set_note(&mut self, text: String) -> Result<()> {
        self.session.set_note(self.cursor, text)
    }

    pub fn append_note(&mut self, line: &str) -> Result<()> {
        self.session.append_note(self.cursor, line)
    }

    pub fn export(&mut self) {
        match self.session.generate_document(true) {
            Ok(artifact) => {
                let text = match &artifact.downloaded {
                    Some(path) => format!("Saved {} ({} page(s))", path.display(), artifact.pages),
                    None => format!("Generated {}", artifact.file_name),
                };
                self.info(text);
            }
            Err(err) => self.error(&err),
        }
    }

    pub fn share(&mut self) {
        match self.session.share() {
            Ok(ShareOutcome::Shared) => self.info("Calendar shared"),
            Ok(ShareOutcome::Unsupported { path, .. }) => self.show(
                Level::Info,
                fallback_message(&path),
                FALLBACK_MESSAGE_TIMEOUT,
            ),
            Err(err) => self.error(&err),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Quits unless notes would be lost, in which case a second request is needed.
    /// `force` skips the confirmation.
    pub fn request_quit(&mut self, force: bool) {
        if force || self.quit_armed || !self.session.has_unsaved_notes() {
            self.quit = true;
        } else {
            self.quit_armed = true;
            self.show(
                Level::Error,
                "Notes are only kept while notecal runs. Press q again or use :q! to quit",
                FALLBACK_MESSAGE_TIMEOUT,
            );
        }
    }

    pub fn disarm_quit(&mut self) {
        self.quit_armed = false;
    }
}

fn fallback_message(path: &Path) -> String {
    format!(
        "Sharing files is not supported here. The PDF was saved to {}, attach it manually",
        path.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::export::platform::{CommandShare, DirectoryDownloader};
    use crate::export::Platform;

    fn context(dir: &Path) -> Context {
        let now = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let platform = Platform::new(
            Box::new(DirectoryDownloader::new(dir)),
            Box::new(CommandShare::new(None)),
        );
        let mut session = Session::new(&Config::default(), platform, now);
        session.mount();
        Context::new(session)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cursor_follows_month() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        assert_eq!(ctx.cursor(), date(2024, 1, 31));

        ctx.next_month(1).unwrap();
        assert_eq!(ctx.cursor(), date(2024, 2, 29));

        ctx.move_cursor(1);
        assert_eq!(ctx.cursor(), date(2024, 3, 1));
        assert_eq!(ctx.session().month(), DisplayedMonth::new(2024, 2));

        ctx.go_to_today();
        assert_eq!(ctx.cursor(), date(2024, 1, 31));
        assert_eq!(ctx.session().month(), DisplayedMonth::new(2024, 0));
    }

    #[test]
    fn quit_needs_confirmation_with_notes() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());

        ctx.request_quit(false);
        assert!(ctx.should_quit());

        let mut ctx = context(tmp.path());
        ctx.append_note("dentist").unwrap();
        ctx.request_quit(false);
        assert!(!ctx.should_quit());
        assert_eq!(ctx.message().unwrap().level, Level::Error);

        ctx.disarm_quit();
        ctx.request_quit(false);
        assert!(!ctx.should_quit());
        ctx.request_quit(false);
        assert!(ctx.should_quit());

        let mut ctx = context(tmp.path());
        ctx.append_note("dentist").unwrap();
        ctx.request_quit(true);
        assert!(ctx.should_quit());
    }

    #[test]
    fn export_without_capability_shows_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        ctx.export();
        let message = ctx.message().unwrap();
        assert_eq!(message.level, Level::Error);
        assert!(message.text.starts_with(&ErrorKind::CapabilityUnavailable.as_str()));
    }

    #[test]
    fn messages_expire() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ctx = context(tmp.path());
        let now = ctx.session().now();

        ctx.info("hello");
        ctx.update(now, Instant::now());
        assert!(ctx.message().is_some());

        ctx.update(now, Instant::now() + MESSAGE_TIMEOUT);
        assert!(ctx.message().is_none());
    }
}
