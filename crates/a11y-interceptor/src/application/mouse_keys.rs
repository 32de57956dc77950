//! Numeric-keypad control of the mouse pointer.

use a11y_core::{
    EventFlags, KeyAction, KeyCode, KeyEvent, MouseButton, MouseKeysConfig, Point, PointerAction,
    PointerEvent, SourceKind,
};
use tracing::debug;

use super::chain::{Disposition, EventSink, LinkContext};

/// Which button keypad 5 and `+` click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClickTarget {
    #[default]
    Left,
    Right,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyCommand {
    Move(i8, i8),
    Click(u8),
    Select(ClickTarget),
}

fn command_for(code: KeyCode) -> Option<KeyCommand> {
    let command = match code {
        KeyCode::KEYPAD_1 => KeyCommand::Move(-1, 1),
        KeyCode::KEYPAD_2 => KeyCommand::Move(0, 1),
        KeyCode::KEYPAD_3 => KeyCommand::Move(1, 1),
        KeyCode::KEYPAD_4 => KeyCommand::Move(-1, 0),
        KeyCode::KEYPAD_6 => KeyCommand::Move(1, 0),
        KeyCode::KEYPAD_7 => KeyCommand::Move(-1, -1),
        KeyCode::KEYPAD_8 => KeyCommand::Move(0, -1),
        KeyCode::KEYPAD_9 => KeyCommand::Move(1, -1),
        KeyCode::KEYPAD_5 => KeyCommand::Click(1),
        KeyCode::KEYPAD_ADD => KeyCommand::Click(2),
        KeyCode::KEYPAD_DIVIDE => KeyCommand::Select(ClickTarget::Left),
        KeyCode::KEYPAD_MULTIPLY => KeyCommand::Select(ClickTarget::Both),
        KeyCode::KEYPAD_SUBTRACT => KeyCommand::Select(ClickTarget::Right),
        _ => return None,
    };
    Some(command)
}

pub struct MouseKeys {
    config: MouseKeysConfig,
    target: ClickTarget,
    held: Vec<KeyCode>,
    /// Last mouse move seen from the device, or synthesized here.
    last_move: Option<PointerEvent>,
}

impl MouseKeys {
    pub fn new(config: MouseKeysConfig) -> Self {
        Self {
            config,
            target: ClickTarget::default(),
            held: Vec::new(),
            last_move: None,
        }
    }

    pub fn click_target(&self) -> ClickTarget {
        self.target
    }

    fn execute(&mut self, command: KeyCommand, event: &KeyEvent, ctx: &mut LinkContext<'_>) {
        if let KeyCommand::Select(target) = command {
            self.target = target;
            debug!(?target, "mouse keys button selected");
            return;
        }
        let Some(last) = self.last_move else {
            debug!("no known pointer position, mouse key ignored");
            return;
        };
        let base = last
            .with_timestamp(event.timestamp)
            .flagged(EventFlags::SYNTHETIC);

        match command {
            KeyCommand::Move(dx, dy) => {
                let step = self.config.step;
                let position = last.position + Point::new(f64::from(dx) * step, f64::from(dy) * step);
                let moved = base.with_action(PointerAction::Move).with_position(position);
                self.last_move = Some(moved);
                ctx.emit(moved);
            }
            KeyCommand::Click(count) => {
                let buttons: &[MouseButton] = match self.target {
                    ClickTarget::Left => &[MouseButton::Left],
                    ClickTarget::Right => &[MouseButton::Right],
                    ClickTarget::Both => &[MouseButton::Left, MouseButton::Right],
                };
                for _ in 0..count {
                    for button in buttons {
                        ctx.emit(base.with_action(PointerAction::ButtonDown(*button)));
                    }
                    for button in buttons {
                        ctx.emit(base.with_action(PointerAction::ButtonUp(*button)));
                    }
                }
                debug!(count, target = ?self.target, "mouse keys click");
            }
            KeyCommand::Select(_) => {}
        }
    }
}

impl EventSink for MouseKeys {
    fn on_pointer(&mut self, event: PointerEvent, _ctx: &mut LinkContext<'_>) -> Disposition {
        if event.source == SourceKind::Mouse && event.action == PointerAction::Move {
            self.last_move = Some(event);
        }
        Disposition::Forward(event.into())
    }

    fn on_key(&mut self, event: KeyEvent, ctx: &mut LinkContext<'_>) -> Disposition {
        match event.action {
            KeyAction::Down => {
                if !self.held.contains(&event.code) {
                    self.held.push(event.code);
                }
            }
            KeyAction::Up => {}
        }
        let alone = self.held.len() == 1 && self.held[0] == event.code;
        if event.action == KeyAction::Up {
            self.held.retain(|k| *k != event.code);
        }

        match command_for(event.code) {
            Some(command) if alone => {
                if event.action == KeyAction::Down {
                    self.execute(command, &event, ctx);
                }
                Disposition::Handled
            }
            _ => Disposition::Forward(event.into()),
        }
    }

    fn teardown(&mut self, _ctx: &mut LinkContext<'_>) {
        self.held.clear();
    }
}
