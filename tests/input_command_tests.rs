use crossterm::event::KeyCode;
use lightning_trade::input::{parse_main_command, UiCommand};

#[test]
fn parse_main_command_maps_case_insensitive_char_keys() {
    assert_eq!(parse_main_command(&KeyCode::Char('q')), Some(UiCommand::Quit));
    assert_eq!(parse_main_command(&KeyCode::Char('Q')), Some(UiCommand::Quit));
    assert_eq!(parse_main_command(&KeyCode::Char('M')), Some(UiCommand::UseMock));
    assert_eq!(parse_main_command(&KeyCode::Char('l')), Some(UiCommand::UseLive));
    assert_eq!(parse_main_command(&KeyCode::Char('s')), Some(UiCommand::NextSymbol));
    assert_eq!(parse_main_command(&KeyCode::Char('C')), Some(UiCommand::ClearChart));
    assert_eq!(
        parse_main_command(&KeyCode::Char('b')),
        Some(UiCommand::GenerateBatch)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char('p')),
        Some(UiCommand::ToggleRunning)
    );
    assert_eq!(parse_main_command(&KeyCode::Char('R')), Some(UiCommand::Reconnect));
}

#[test]
fn parse_main_command_maps_adjustment_keys() {
    assert_eq!(
        parse_main_command(&KeyCode::Char('+')),
        Some(UiCommand::FasterUpdates)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char('-')),
        Some(UiCommand::SlowerUpdates)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char(']')),
        Some(UiCommand::MorePoints)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char('[')),
        Some(UiCommand::FewerPoints)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char('V')),
        Some(UiCommand::RaiseVolatility)
    );
    assert_eq!(
        parse_main_command(&KeyCode::Char('v')),
        Some(UiCommand::LowerVolatility)
    );
}

#[test]
fn parse_main_command_ignores_unmapped_keys() {
    assert_eq!(parse_main_command(&KeyCode::Char('x')), None);
    assert_eq!(parse_main_command(&KeyCode::Enter), None);
    assert_eq!(parse_main_command(&KeyCode::Esc), Some(UiCommand::Quit));
}
