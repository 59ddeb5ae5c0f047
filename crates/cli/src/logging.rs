//! Subscriber setup for the `sunat` binary
//!
//! Logs go to stderr so stdout only carries results (tickets, CDR paths).
//! `RUST_LOG` takes precedence over `-v`.

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for a `-v` count.
///
/// Dependencies stay at `warn` unless `RUST_LOG` says otherwise; only the
/// pipeline crates follow the verbosity.
pub fn directives(verbosity: u8) -> String {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };

    format!("warn,sunat={level},sunat_core={level},sunat_infra={level}")
}

pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .init();
}
