// Eye Distance Monitor Core
// Monocular eye-to-screen distance estimation from face landmarks

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod overlay;
pub mod source;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{DistanceMonitor, DistanceStatus, FrameObservation, FrameReport, WarningPolicy};
pub use calibration::{CalibrationProgress, DistanceEstimator};
pub use config::AppConfig;

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static LOGGING: OnceCell<()> = OnceCell::new();

/// Install the global `tracing` subscriber (stderr, `RUST_LOG` filter).
///
/// `log` records are bridged through `tracing-subscriber`'s log adapter.
/// Safe to call more than once; only the first call installs anything.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        if let Err(err) = installed {
            log::debug!("[Logging] Subscriber already installed: {}", err);
        }
    });
}
