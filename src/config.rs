// ABOUTME: Build-time constants and REPL banner text

/// Crate version, taken from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "eta - a small tree-walking interpreter";
pub const WELCOME_SUBTITLE: &str = "Type an expression, or :quit / :exit / :clear";

/// Allocation-count threshold that triggers a sweep of the reference-counted
/// arena. Re-exported from `rca` so driver/REPL code has one name to import
/// for diagnostics without reaching into the allocator module directly.
pub const RCA_SWEEP_THRESHOLD: usize = crate::rca::SWEEP_THRESHOLD;
