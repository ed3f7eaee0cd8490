//! Terminal front end for the storyteller job monitor.
pub mod config;
pub mod effects;
pub mod logging;
pub mod monitor;
pub mod render;

pub use config::Cli;
pub use effects::EffectRunner;
pub use monitor::{JobMonitor, RunOutcome};
pub use render::TerminalRenderer;
