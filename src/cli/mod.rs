//! # CLI
//!
//! The `xia` binary runs a demo application on the engine and inspects its
//! routing table.
//!
//! ```bash
//! # Serve on the address from app.ini ([server] addr), or 0.0.0.0:9999
//! xia serve --config app.ini
//!
//! # Serve static files and templates too
//! xia serve --config app.ini --addr 127.0.0.1:8080 --static ./public --templates ./views
//!
//! # Print the registered routes
//! xia routes --config app.ini
//! ```
//!
//! Logging is configured from the `[project]` section and `XIA_LOG_*`
//! variables; see [`crate::logging`].

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{demo_engine, run_cli, run_command, Cli, Commands, DemoOptions};
