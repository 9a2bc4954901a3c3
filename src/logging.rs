//! Diagnostic logging setup.
//!
//! Library code only emits `tracing` events under the `serbridge*` targets.
//! Binaries and tests call [`init`] once to print them on stderr.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt};

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install a stderr subscriber filtered by `RUST_LOG`, or by `directive`
/// when the variable is unset or malformed.
///
/// Returns whether a subscriber from this crate is active. Repeated calls
/// are no-ops; if another global subscriber was installed first, this
/// returns `false`.
pub fn init(directive: &str) -> bool {
    *INSTALLED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
        let subscriber = fmt::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    })
}
