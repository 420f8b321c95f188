use std::sync::Once;

use handler_lifecycle_core::context::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Installs the global subscriber. Safe to call more than once; later calls
/// are no-ops.
///
/// `RUST_LOG` overrides the default `info` filter. Panic messages are routed
/// through the subscriber at `warn` instead of the default stderr hook.
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = match format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_current_span(true).with_target(false))
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .try_init(),
        };
        if let Err(error) = installed {
            eprintln!("tracing subscriber already installed: {error}");
            return;
        }
        std::panic::set_hook(Box::new(|info| {
            tracing::warn!(panic = %info, "panic captured");
        }));
    });
}
