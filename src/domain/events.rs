#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    QuitRequested,
    Key(KeyInput),
}

/// Keys the shell reacts to; everything else is dropped by the event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Tab,
    Esc,
    Backspace,
    Up,
    Down,
}
