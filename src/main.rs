use std::time::Duration;

use anyhow::Result;
use crossterm::event::Event;
use tokio::sync::{mpsc, watch};

use lightning_trade::config::Config;
use lightning_trade::event::{LogLevel, LogRecord, RouterEvent, SourceMode};
use lightning_trade::input::{parse_main_command, UiCommand};
use lightning_trade::kraken::ws::{FeedConnection, FeedEvent};
use lightning_trade::mock::MockGenerator;
use lightning_trade::router::{DataSourceRouter, RouterCommand};
use lightning_trade::runtime::run_router;
use lightning_trade::ui::{self, AppState, VOLATILITY_STEP};

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Make sure config/default.toml exists and is valid");
            std::process::exit(1);
        }
    };

    // Log to a file so it doesn't interfere with the TUI.
    let log_file = std::fs::File::create(&config.logging.file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    let settings = config.router_settings();
    tracing::info!(
        symbol = %settings.symbol,
        endpoint = %settings.endpoint_url,
        mode = %settings.mode,
        "Starting lightning-trade"
    );

    let (feed_tx, feed_rx) = mpsc::channel::<FeedEvent>(EVENT_CHANNEL_CAPACITY);
    let (command_tx, command_rx) = mpsc::channel::<RouterCommand>(64);
    let (ui_tx, mut ui_rx) = mpsc::channel::<RouterEvent>(EVENT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let generator = MockGenerator::new(config.mock.generator_params());
    let feed = FeedConnection::new(feed_tx);
    let mut router = DataSourceRouter::new(settings.clone(), generator, feed);
    router.subscribe(Box::new(move |event: &RouterEvent| {
        // A full channel means the UI is behind; it catches up on the next range update.
        if ui_tx.try_send(event.clone()).is_err() {
            tracing::debug!("ui event channel full, dropping event");
        }
    }));

    let worker = tokio::spawn(run_router(router, command_rx, feed_rx, shutdown_rx.clone()));

    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = ctrl_c_shutdown.send(true);
    });

    let mut terminal = ratatui::init();
    let mut app_state = AppState::new(
        &settings.symbol,
        config.feed.selectable_symbols(),
        settings.mode,
    );
    app_state.running = true;
    app_state.update_interval_ms = config.mock.update_interval_ms;
    app_state.max_points = config.window.max_points;
    app_state.volatility = config.mock.volatility;
    app_state.push_log(LogRecord::new(
        LogLevel::Info,
        format!("lightning-trade started | {} | {}", settings.symbol, settings.mode),
    ));

    loop {
        while let Ok(event) = ui_rx.try_recv() {
            app_state.apply(event);
        }

        terminal.draw(|frame| ui::render(frame, &app_state))?;

        if crossterm::event::poll(Duration::from_millis(config.ui.refresh_rate_ms))? {
            if let Event::Key(key) = crossterm::event::read()? {
                let Some(cmd) = parse_main_command(&key.code) else {
                    continue;
                };
                if cmd == UiCommand::Quit {
                    tracing::info!("User quit");
                    let _ = shutdown_tx.send(true);
                    break;
                }
                if let Some(router_cmd) = to_router_command(cmd, &mut app_state) {
                    if command_tx.send(router_cmd).await.is_err() {
                        tracing::warn!("router worker is gone");
                        break;
                    }
                }
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }
    }

    drop(command_tx);
    match worker.await {
        Ok(router) => {
            let metrics = router.metrics();
            tracing::info!(
                updates = metrics.updates,
                stale = metrics.stale_discarded,
                dropped_frames = metrics.frames_dropped,
                "router finished"
            );
        }
        Err(e) => tracing::error!(error = %e, "router worker panicked"),
    }

    ratatui::restore();
    tracing::info!("Shutdown complete");
    println!("Goodbye! Check {} for details.", config.logging.file);
    Ok(())
}

/// Maps a key command onto a router command and mirrors the requested
/// setting into the UI state.
fn to_router_command(cmd: UiCommand, state: &mut AppState) -> Option<RouterCommand> {
    match cmd {
        UiCommand::Quit => None,
        UiCommand::UseMock => Some(RouterCommand::SwitchSource(SourceMode::Mock)),
        UiCommand::UseLive => Some(RouterCommand::SwitchSource(SourceMode::Live)),
        UiCommand::NextSymbol => state.next_symbol().map(RouterCommand::SetSymbol),
        UiCommand::ClearChart => Some(RouterCommand::ClearWindow),
        UiCommand::GenerateBatch => Some(RouterCommand::GenerateBatch),
        UiCommand::ToggleRunning => {
            state.running = !state.running;
            Some(if state.running {
                RouterCommand::Start
            } else {
                RouterCommand::Stop
            })
        }
        UiCommand::FasterUpdates => {
            state.update_interval_ms = state.faster_interval();
            Some(RouterCommand::SetUpdateInterval(state.update_interval_ms))
        }
        UiCommand::SlowerUpdates => {
            state.update_interval_ms = state.slower_interval();
            Some(RouterCommand::SetUpdateInterval(state.update_interval_ms))
        }
        UiCommand::MorePoints => {
            state.max_points = state.more_points();
            Some(RouterCommand::SetMaxPoints(state.max_points))
        }
        UiCommand::FewerPoints => {
            state.max_points = state.fewer_points();
            Some(RouterCommand::SetMaxPoints(state.max_points))
        }
        UiCommand::RaiseVolatility => {
            state.volatility = state.adjusted_volatility(VOLATILITY_STEP).min(1.0);
            Some(RouterCommand::SetVolatility(state.volatility))
        }
        UiCommand::LowerVolatility => {
            state.volatility = state.adjusted_volatility(-VOLATILITY_STEP).max(0.0);
            Some(RouterCommand::SetVolatility(state.volatility))
        }
        UiCommand::Reconnect => Some(RouterCommand::Reconnect),
    }
}
