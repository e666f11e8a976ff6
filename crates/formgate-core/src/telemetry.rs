use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with an env-filtered fmt layer.
///
/// Honors `RUST_LOG`; defaults to debug for formgate crates when unset.
pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "formgate_core=debug,formgate_storage=debug,formgate_scan=debug,\
             formgate_services=debug,formgate_worker=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
