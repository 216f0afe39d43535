use std::str::FromStr;

use unsegen::input::*;

use nom::{
    bytes::complete::take_till1,
    character::complete::{digit1, space1},
    combinator::{all_consuming, opt, rest},
    error::{ErrorKind as NomErrorKind, ParseError},
    sequence::{preceded, tuple},
    Err, IResult,
};

use super::context::{Context, Mode};
use crate::error::{Error, ErrorKind, Result};
use crate::month::DisplayedMonth;

pub struct CommandParser<'a> {
    context: &'a mut Context,
}

pub fn match_action<'a, 's, T: ?Sized, Act: 's>(
    c: &'a T,
) -> impl Fn(&str) -> IResult<&str, (&'s str, &'s Act)> + 'a
where
    &'a T: IntoIterator<Item = &'s (&'s str, Act)>,
{
    move |input| {
        if let Some((name, act)) = c.into_iter().find(|(name, _)| name == &input) {
            Ok(("", (name, act)))
        } else {
            Err(Err::Failure(ParseError::from_error_kind(
                input,
                NomErrorKind::Tag,
            )))
        }
    }
}

/// Splits `[count]name[ argument]`.
fn split_command(cmd: &str) -> IResult<&str, (Option<&str>, &str, Option<&str>)> {
    all_consuming(tuple((
        opt(digit1),
        take_till1(char::is_whitespace),
        opt(preceded(space1, rest)),
    )))(cmd)
}

fn parse_count(count: &str) -> Result<u32> {
    u32::from_str(count)
        .map_err(|_| Error::new(ErrorKind::UnknownCommand, &format!("bad count '{}'", count)))
}

/// Turns `\n` into line breaks and `\\` into a backslash.
pub fn unescape(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl<'a> CommandParser<'a> {
    pub fn new(context: &'a mut Context) -> Self {
        CommandParser { context }
    }

    pub fn run_command(&mut self, cmd: &str) -> ActionResult {
        let (_, (count, name, arg)) = split_command(cmd.trim())?;
        let (_, (_, act)) = match_action(COMMANDS)(name)
            .map_err(|_| Error::new(ErrorKind::UnknownCommand, name))?;
        let arg = arg.map(str::trim).filter(|arg| !arg.is_empty());

        match (act, count, arg) {
            (Action::NoArg(a), None, None) => a(self.context),
            (Action::Arg(a), None, Some(arg)) => a(self.context, arg),
            (Action::Repeatable(a), None, None) => a(self.context, 1),
            (Action::Repeatable(a), Some(n), None) | (Action::Repeatable(a), None, Some(n)) => {
                a(self.context, parse_count(n)?)
            }
            _ => Err(Error::new(
                ErrorKind::UnknownCommand,
                &format!("wrong arguments for '{}'", name),
            )),
        }
    }
}

impl Behavior for CommandParser<'_> {
    fn input(mut self, input: Input) -> Option<Input> {
        if let Event::Key(key) = input.event {
            match key {
                Key::Char('\n') => {
                    let cmd = self
                        .context
                        .input_sink_mut(Mode::Command)
                        .finish_line()
                        .to_owned();
                    self.context.mode = Mode::Normal;
                    if let Err(e) = self.run_command(&cmd) {
                        self.context.error(&e);
                    }
                    None
                }
                _ => Some(input),
            }
        } else {
            Some(input)
        }
    }
}

pub type ActionResult = Result<()>;

pub enum Action {
    Arg(fn(&mut Context, &str) -> ActionResult),
    NoArg(fn(&mut Context) -> ActionResult),
    Repeatable(fn(&mut Context, u32) -> ActionResult),
}

const COMMANDS: &[(&'static str, Action)] = &[
    ("next", Action::Repeatable(|c, n| c.next_month(n))),
    ("prev", Action::Repeatable(|c, n| c.prev_month(n))),
    (
        "goto",
        Action::Arg(|c, arg| {
            c.go_to(DisplayedMonth::from_str(arg)?);
            Ok(())
        }),
    ),
    (
        "today",
        Action::NoArg(|c| {
            c.go_to_today();
            Ok(())
        }),
    ),
    ("note", Action::Arg(|c, arg| c.set_note(unescape(arg)))),
    ("clear", Action::NoArg(|c| c.set_note(String::new()))),
    (
        "export",
        Action::NoArg(|c| {
            c.export();
            Ok(())
        }),
    ),
    (
        "share",
        Action::NoArg(|c| {
            c.share();
            Ok(())
        }),
    ),
    (
        "q",
        Action::NoArg(|c| {
            c.request_quit(false);
            Ok(())
        }),
    ),
    (
        "q!",
        Action::NoArg(|c| {
            c.request_quit(true);
            Ok(())
        }),
    ),
];
