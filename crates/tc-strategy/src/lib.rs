//! The strategy catalog and the multi-strategy arbitrator.
//!
//! Every strategy in [`catalog`] is a pure function of candles to a
//! [`types::StrategyOutcome`] — no strategy holds mutable state across
//! evaluations. [`arbitrator::arbitrate`] runs the whole (or an
//! allow-listed subset of the) catalog and resolves the outcomes into a
//! single decision, or refuses to decide when the catalog disagrees on
//! direction. [`registry::PluginRegistry`] is the discovery layer on top,
//! letting callers enumerate and instantiate strategies by name.

pub mod arbitrator;
pub mod catalog;
pub mod registry;
pub mod support;
pub mod types;

pub use arbitrator::{arbitrate, ArbitratorResult, TrendLabel};
pub use registry::PluginRegistry;
pub use types::{Direction, EngineContext, Strategy, StrategyAction, StrategyOutcome};
