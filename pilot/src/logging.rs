use tracing::level_filters::LevelFilter;
use tracing_subscriber::FmtSubscriber;

use crate::error::PilotError;

/// Installs a compact, stdout-bound subscriber as the global default. This can only succeed once
/// per process.
pub fn init(level: LevelFilter) -> Result<(), PilotError> {
    let subscriber = FmtSubscriber::builder()
        .compact()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| PilotError::Logging { source })
}
