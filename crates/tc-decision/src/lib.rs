//! Decision pipeline: turns signals into decisions, gated by risk, score,
//! position-conflict, and cadence checks, with flip handling for
//! opposite-direction reversals.

mod flip;
mod pipeline;
mod types;

pub use flip::{resolve_flip, FlipVerdict};
pub use pipeline::{evaluate_signal, PipelineOutcome};
pub use types::{DecisionContext, DecisionRuntimeConfig, ProposedOpen};
