//! Layered config loading, env secret resolution, and a small concurrent
//! read cache for the resulting runtime config. This crate owns no
//! domain types — `tc-scalper::ScalperConfig` and friends are parsed
//! from the `Value` this crate produces, not defined here.

pub mod cache;
pub mod consumption;
pub mod layered;
pub mod secrets;

pub use cache::RuntimeConfigCache;
pub use consumption::consumed_pointers;
pub use layered::{load_layered_yaml, merge_layers, LoadedConfig};
pub use secrets::{resolve_secrets_for_mode, ResolvedSecrets, RunMode};
