//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`, keeping stdout for results.
//! `RUST_LOG` wins when set; otherwise only warnings are shown unless the
//! caller asked for debug output.

use tracing_subscriber::EnvFilter;

/// How much diagnostic output a command wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    Debug,
}

impl Verbosity {
    pub fn from_debug_flag(debug: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else {
            Verbosity::Quiet
        }
    }

    fn default_directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Debug => "warn,gitkit=debug",
        }
    }
}

/// Install the stderr subscriber. Calling it twice is harmless.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
