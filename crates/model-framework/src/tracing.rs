//! # Observability
//!
//! Every layer of the crate logs through `tracing` with structured fields:
//!
//! - the schema engine warns on writes to undeclared root keys (`model`, `key`)
//! - CRUD operations run inside spans named after the operation (`model`, `url`)
//! - the memory backend logs each handled request (`method`, `path`)
//!
//! **Usage:**
//! ```bash
//! RUST_LOG=info cargo run      # Compact logs
//! RUST_LOG=debug cargo run     # Coercion fallbacks and every request
//! ```

/// Installs the global compact subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
