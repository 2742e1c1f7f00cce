use egui::{Key, Modifiers};

/// Everything the chart responds to besides pointer gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    DeleteSelection,
    /// Clear the selection and end any drag.
    Cancel,
    /// Shift the selection by whole days.
    Nudge(i64),
    /// Move a single selection to the previous / next visible assignment.
    Step { forward: bool },
    SelectAll,
    Duplicate,
    Undo,
    Redo,
    /// Index into the timescale presets.
    Timescale(usize),
    FocusSearch,
    ZoomIn,
    ZoomOut,
}

/// Map a key press to a command. Shortcuts accept either Ctrl or Cmd.
pub fn command_for(key: Key, modifiers: Modifiers) -> Option<Command> {
    let cmd = modifiers.command || modifiers.ctrl;
    let command = match key {
        Key::Delete | Key::Backspace => Command::DeleteSelection,
        Key::Escape => Command::Cancel,
        Key::ArrowLeft | Key::ArrowRight => {
            let days = if modifiers.shift { 7 } else { 1 };
            Command::Nudge(if key == Key::ArrowLeft { -days } else { days })
        }
        Key::ArrowUp => Command::Step { forward: false },
        Key::ArrowDown => Command::Step { forward: true },
        Key::A if cmd => Command::SelectAll,
        Key::D if cmd => Command::Duplicate,
        Key::Z if cmd && modifiers.shift => Command::Redo,
        Key::Z if cmd => Command::Undo,
        Key::Y if cmd => Command::Redo,
        Key::Slash => Command::FocusSearch,
        Key::Num1 | Key::Num2 | Key::Num3 | Key::Num4 | Key::Num5 if !cmd => {
            Command::Timescale(digit_index(key)?)
        }
        _ => return None,
    };
    Some(command)
}

fn digit_index(key: Key) -> Option<usize> {
    [Key::Num1, Key::Num2, Key::Num3, Key::Num4, Key::Num5]
        .iter()
        .position(|k| *k == key)
}
