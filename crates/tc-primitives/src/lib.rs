//! Fixed-point money/price primitives, the candle model, and the indicator
//! library every strategy and sizing calculation is built on.
//!
//! # No float for money
//!
//! [`Decimal8`] is the only type allowed to represent a price, a quantity,
//! or a monetary amount anywhere above this crate. Conversions from a
//! broker's native `f64` tick happen at the broker adapter boundary exactly
//! once (see `tc-broker`), never inside strategy or accounting code.

pub mod candle;
pub mod decimal;
pub mod indicators;

pub use candle::Candle;
pub use decimal::Decimal8;
