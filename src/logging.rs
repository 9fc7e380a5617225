use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "meal_planner=info,tower_http=info";

/// Installs the global fmt subscriber. `RUST_LOG` overrides
/// [`DEFAULT_FILTER`]. Calling it twice is harmless.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
