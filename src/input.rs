use minifb::Key;

/// What a key press asks the capture loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Make `<letter>.csv` the active output file.
    Select(char),
    /// Save the cursor position for the displayed frame.
    Trigger,
    TogglePause,
    Quit,
}

impl Command {
    pub fn from_key(key: Key) -> Option<Self> {
        let command = match key {
            Key::LeftShift | Key::RightShift => Command::Trigger,
            Key::Space => Command::TogglePause,
            Key::Escape => Command::Quit,
            _ => Command::Select(letter(key)?),
        };
        Some(command)
    }
}

fn letter(key: Key) -> Option<char> {
    const LETTERS: [(Key, char); 26] = [
        (Key::A, 'a'),
        (Key::B, 'b'),
        (Key::C, 'c'),
        (Key::D, 'd'),
        (Key::E, 'e'),
        (Key::F, 'f'),
        (Key::G, 'g'),
        (Key::H, 'h'),
        (Key::I, 'i'),
        (Key::J, 'j'),
        (Key::K, 'k'),
        (Key::L, 'l'),
        (Key::M, 'm'),
        (Key::N, 'n'),
        (Key::O, 'o'),
        (Key::P, 'p'),
        (Key::Q, 'q'),
        (Key::R, 'r'),
        (Key::S, 's'),
        (Key::T, 't'),
        (Key::U, 'u'),
        (Key::V, 'v'),
        (Key::W, 'w'),
        (Key::X, 'x'),
        (Key::Y, 'y'),
        (Key::Z, 'z'),
    ];

    LETTERS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|&(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_select_lowercase_files() {
        assert_eq!(Command::from_key(Key::A), Some(Command::Select('a')));
        assert_eq!(Command::from_key(Key::Q), Some(Command::Select('q')));
        assert_eq!(Command::from_key(Key::Z), Some(Command::Select('z')));
    }

    #[test]
    fn either_shift_triggers() {
        assert_eq!(Command::from_key(Key::LeftShift), Some(Command::Trigger));
        assert_eq!(Command::from_key(Key::RightShift), Some(Command::Trigger));
    }

    #[test]
    fn playback_keys() {
        assert_eq!(Command::from_key(Key::Space), Some(Command::TogglePause));
        assert_eq!(Command::from_key(Key::Escape), Some(Command::Quit));
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(Command::from_key(Key::Key1), None);
        assert_eq!(Command::from_key(Key::Enter), None);
        assert_eq!(Command::from_key(Key::LeftCtrl), None);
    }
}
