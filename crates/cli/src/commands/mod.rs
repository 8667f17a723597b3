//! Command handlers for the askgate CLI.

mod ask;
mod serve;

pub use ask::AskCommand;
pub use serve::ServeCommand;
