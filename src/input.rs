use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCommand {
    Quit,
    UseMock,
    UseLive,
    NextSymbol,
    ClearChart,
    GenerateBatch,
    ToggleRunning,
    FasterUpdates,
    SlowerUpdates,
    MorePoints,
    FewerPoints,
    RaiseVolatility,
    LowerVolatility,
    Reconnect,
}

/// `v`/`V` are the only case-sensitive keys; everything else ignores case.
pub fn parse_main_command(key_code: &KeyCode) -> Option<UiCommand> {
    match key_code {
        KeyCode::Esc => Some(UiCommand::Quit),
        KeyCode::Char('v') => Some(UiCommand::LowerVolatility),
        KeyCode::Char('V') => Some(UiCommand::RaiseVolatility),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(UiCommand::FasterUpdates),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(UiCommand::SlowerUpdates),
        KeyCode::Char(']') => Some(UiCommand::MorePoints),
        KeyCode::Char('[') => Some(UiCommand::FewerPoints),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'q' => Some(UiCommand::Quit),
            'm' => Some(UiCommand::UseMock),
            'l' => Some(UiCommand::UseLive),
            's' => Some(UiCommand::NextSymbol),
            'c' => Some(UiCommand::ClearChart),
            'b' => Some(UiCommand::GenerateBatch),
            'p' => Some(UiCommand::ToggleRunning),
            'r' => Some(UiCommand::Reconnect),
            _ => None,
        },
        _ => None,
    }
}
