pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod kraken;
pub mod metrics;
pub mod mock;
pub mod model;
pub mod router;
pub mod runtime;
pub mod symbol;
pub mod ui;
pub mod window;
