pub mod build_info;
pub mod paths;

use std::sync::Once;

pub use paths::{ensure_dir, PathResolver};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "reminder_core=info";

/// Initializes the global tracing subscriber. `RUST_LOG` directives are
/// honored on top of the crate default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

        let directive = DEFAULT_DIRECTIVE
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into());
        let filter = EnvFilter::from_default_env().add_directive(directive);

        // A host may already have installed a subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
