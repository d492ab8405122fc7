//! Process-wide `tracing` subscriber setup.

use tracing_core::Level;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

use crate::config::Config;

/// Database driver targets, capped at `WARN`.
const QUIET_TARGETS: [&str; 3] = ["sqlx", "sea_orm", "sea_orm_migration"];

/// Install the global subscriber.
///
/// Every target other than the database driver ones logs at the configured level.
/// Fails if a global subscriber is already installed.
pub fn init(config: &Config) -> Result<(), TryInitError> {
    let fmt = fmt::format().with_target(false).compact();

    let target_filters = QUIET_TARGETS
        .into_iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(target, Level::WARN)
        })
        .with_default(config.logging.level);

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(fmt))
        .with(target_filters)
        .try_init()
}
