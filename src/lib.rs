pub mod aggregate;
pub mod cli;
pub mod db;
pub mod error;
pub mod fmt;
pub mod importer;
pub mod layout;
pub mod models;
pub mod options;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod query;
pub mod reports;
pub mod session;
pub mod settings;
pub mod source;
pub mod table;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber. Logs go to stderr so command output stays
/// clean; `RUST_LOG` overrides the default level.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("painel=warn"));

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}
