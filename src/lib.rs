pub mod args;
pub mod auth;
pub mod campaign;
pub mod config;
pub mod export;
pub mod gui;
pub mod report;

// Re-export commonly used items
pub use args::Args;
pub use auth::{IdentityCheck, SessionGate, StaticIdentity};
pub use campaign::{CampaignClient, CampaignReport, FetchError, QueryOutcome};
pub use config::{ApiConfig, LoginConfig};
pub use export::{download_file_name, to_spreadsheet_bytes, ReportKind};
pub use report::Table;

/// Installs the `tracing` subscriber used by both binaries.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}
