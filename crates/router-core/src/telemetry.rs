//! Tracing subscriber setup for binaries and integration harnesses

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"routing=debug"`). Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = default_directive.parse() {
        filter = filter.add_directive(directive);
    }
    if let Ok(directive) = "info".parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
