use std::fmt::Write;
use std::time::Instant;

use chrono::Local;

use crate::events::{Dispatcher, Event};
use crate::session::Session;

use super::command::CommandParser;
use super::context::{Level, MESSAGE_TIMEOUT};
use super::insert::InsertParser;
use super::{CalendarWindow, Context, Mode, NoteWindow};

use unsegen::base::{Cursor, Terminal, Window};
use unsegen::input::{
    EditBehavior, Input, Key, Navigatable, NavigateBehavior, OperationResult, ScrollBehavior,
};
use unsegen::widget::*;

pub struct App {
    context: Context,
}

impl App {
    pub fn new(mut session: Session) -> App {
        session.mount();
        App {
            context: Context::new(session),
        }
    }

    fn bottom_bar<'w>(&'w self) -> impl Widget + 'w {
        let spacer = " ".with_demand(|_| Demand2D {
            width: ColDemand::exact(1),
            height: RowDemand::exact(1),
        });

        let mut layout = HLayout::new().widget(spacer);
        if let mode @ (Mode::Command | Mode::Insert) = self.context.mode {
            layout = layout.widget(self.context.input_sink(mode).as_widget());
        } else {
            layout = layout.widget(MessageLine(&self.context));
        }

        layout
    }

    fn as_widget<'w>(&'w self) -> impl Widget + 'w {
        VLayout::new()
            .widget(
                HLayout::new()
                    .widget(CalendarWindow::new(&self.context))
                    .widget(NoteWindow::new(&self.context)),
            )
            .widget(self.bottom_bar())
    }

    fn handle_input(&mut self, input: Input) {
        if self.context.mode != Mode::Normal || !input.matches(Key::Char('q')) {
            self.context.disarm_quit();
        }

        if input.matches(Key::Esc) {
            self.context.mode = Mode::Normal;
            return;
        }

        match self.context.mode {
            Mode::Normal => {
                input
                    .chain((Key::Char('q'), || self.context.request_quit(false)))
                    .chain((Key::Char(':'), || self.context.mode = Mode::Command))
                    .chain((Key::Char('i'), || {
                        if self.context.cursor_editable() {
                            self.context.mode = Mode::Insert
                        } else {
                            self.context.show(
                                Level::Error,
                                "Days of adjacent months take no notes",
                                MESSAGE_TIMEOUT,
                            )
                        }
                    }))
                    .chain((Key::Char('<'), || {
                        if let Err(err) = self.context.prev_month(1) {
                            self.context.error(&err)
                        }
                    }))
                    .chain((Key::Char('H'), || {
                        if let Err(err) = self.context.prev_month(1) {
                            self.context.error(&err)
                        }
                    }))
                    .chain((Key::Char('>'), || {
                        if let Err(err) = self.context.next_month(1) {
                            self.context.error(&err)
                        }
                    }))
                    .chain((Key::Char('L'), || {
                        if let Err(err) = self.context.next_month(1) {
                            self.context.error(&err)
                        }
                    }))
                    .chain((Key::Char('t'), || self.context.go_to_today()))
                    .chain((Key::Char('e'), || self.context.export()))
                    .chain((Key::Char('s'), || self.context.share()))
                    .chain(
                        NavigateBehavior::new(&mut CursorBehaviour(&mut self.context))
                            .down_on(Key::Char('j'))
                            .up_on(Key::Char('k'))
                            .left_on(Key::Char('h'))
                            .right_on(Key::Char('l'))
                            .down_on(Key::Down)
                            .up_on(Key::Up)
                            .left_on(Key::Left)
                            .right_on(Key::Right),
                    )
                    .finish();
            }
            mode @ Mode::Insert => {
                input
                    .chain(
                        EditBehavior::new(self.context.input_sink_mut(mode))
                            .delete_forwards_on(Key::Delete)
                            .delete_backwards_on(Key::Backspace)
                            .left_on(Key::Left)
                            .right_on(Key::Right),
                    )
                    .chain(InsertParser::new(&mut self.context))
                    .finish();
            }
            mode @ Mode::Command => {
                input
                    .chain(
                        EditBehavior::new(self.context.input_sink_mut(mode))
                            .delete_forwards_on(Key::Delete)
                            .delete_backwards_on(Key::Backspace)
                            .left_on(Key::Left)
                            .right_on(Key::Right),
                    )
                    .chain(
                        ScrollBehavior::new(self.context.input_sink_mut(mode))
                            .backwards_on(Key::Up)
                            .forwards_on(Key::Down),
                    )
                    .chain(CommandParser::new(&mut self.context))
                    .finish();
            }
        }
    }

    pub fn run(
        &mut self,
        dispatcher: Dispatcher,
        mut term: Terminal,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while !self.context.should_quit() {
            // Handle events
            match dispatcher.next() {
                Ok(Event::Update) => self
                    .context
                    .update(Local::now().naive_local(), Instant::now()),
                Ok(Event::CapabilityLoaded(result)) => {
                    match &result {
                        Ok(_) => self.context.info("PDF export ready"),
                        Err(err) => self.context.error(err),
                    }
                    self.context.session_mut().capability_loaded(result);
                }
                Ok(Event::Input(input)) => self.handle_input(input),
                Err(err) => {
                    log::error!("Event channel closed: {}", err);
                    break;
                }
            }

            // Draw
            let root = term.create_root_window();
            self.as_widget().draw(root, RenderingHints::new());
            term.present();
        }

        Ok(())
    }
}

/// Shows the current message, if any.
struct MessageLine<'a>(&'a Context);

impl Widget for MessageLine<'_> {
    fn space_demand(&self) -> Demand2D {
        Demand2D {
            width: ColDemand::at_least(1),
            height: RowDemand::exact(1),
        }
    }

    fn draw(&self, mut window: Window, _hints: RenderingHints) {
        let Some(message) = self.0.message() else {
            return;
        };
        let style = match message.level {
            Level::Info => self.0.theme.info_style,
            Level::Error => self.0.theme.error_style,
        };
        let mut cursor = Cursor::new(&mut window);
        cursor.set_style_modifier(style);
        if let Err(err) = write!(&mut cursor, "{}", message.text) {
            log::warn!("Error while writing message: {}", err);
        }
    }
}

struct CursorBehaviour<'a>(&'a mut Context);

impl Navigatable for CursorBehaviour<'_> {
    fn move_down(&mut self) -> OperationResult {
        self.0.move_cursor(7);
        Ok(())
    }

    fn move_left(&mut self) -> OperationResult {
        self.0.move_cursor(-1);
        Ok(())
    }

    fn move_right(&mut self) -> OperationResult {
        self.0.move_cursor(1);
        Ok(())
    }

    fn move_up(&mut self) -> OperationResult {
        self.0.move_cursor(-7);
        Ok(())
    }
}
