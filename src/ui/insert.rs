use unsegen::input::*;

use super::context::{Context, Mode};

/// Appends the finished insert line to the note of the selected day.
pub struct InsertParser<'a> {
    context: &'a mut Context,
}

impl<'a> InsertParser<'a> {
    pub fn new(context: &'a mut Context) -> Self {
        InsertParser { context }
    }
}

impl Behavior for InsertParser<'_> {
    fn input(self, input: Input) -> Option<Input> {
        if let Event::Key(key) = input.event {
            match key {
                Key::Char('\n') => {
                    let line = self
                        .context
                        .input_sink_mut(Mode::Insert)
                        .finish_line()
                        .to_owned();
                    if let Err(err) = self.context.append_note(&line) {
                        self.context.error(&err);
                    }
                    self.context.mode = Mode::Normal;
                    None
                }
                _ => Some(input),
            }
        } else {
            Some(input)
        }
    }
}
