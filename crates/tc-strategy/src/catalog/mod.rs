pub mod breakout_retest;
pub mod candlestick;
pub mod doji_breakout;
pub mod momentum_ignition;
pub mod pin_bar;
pub mod range_reversion;
pub mod smc;
pub mod trend_pullback;

use candlestick::CandlestickSpec;

use crate::types::{EngineContext, Strategy, StrategyOutcome};

macro_rules! candlestick_strategy {
    ($struct_name:ident, $name:literal, $spec_fn:expr, $shape_fn:expr) => {
        pub struct $struct_name;

        impl Strategy for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            fn evaluate(&self, ctx: &EngineContext<'_>) -> StrategyOutcome {
                let spec: CandlestickSpec = $spec_fn;
                candlestick::evaluate(ctx.entry_candles, &spec, $shape_fn)
            }
        }
    };
}

// Bullish harami is the one exception in the family: a 1*ATR stop buffer
// and 3R target instead of the shared reversal defaults (0.25*ATR, 2R).
candlestick_strategy!(
    HaramiBullishStrategy,
    "harami",
    CandlestickSpec {
        quality_floor: 0.5,
        sl_buffer_atr: 1.0,
        reward_multiple: 3.0,
        ..CandlestickSpec::reversal("harami")
    },
    candlestick::bullish_harami_shape
);

candlestick_strategy!(
    HaramiBearishStrategy,
    "harami",
    CandlestickSpec {
        quality_floor: 0.5,
        ..CandlestickSpec::reversal("harami")
    },
    candlestick::bearish_harami_shape
);

candlestick_strategy!(
    EngulfingStrategy,
    "engulfing",
    CandlestickSpec::reversal("engulfing"),
    |candles| candlestick::bullish_engulfing_shape(candles).or_else(|| candlestick::bearish_engulfing_shape(candles))
);

candlestick_strategy!(
    HammerStrategy,
    "hammer",
    CandlestickSpec::reversal("hammer"),
    candlestick::hammer_shape
);

candlestick_strategy!(
    ShootingStarStrategy,
    "shooting_star",
    CandlestickSpec::reversal("shooting_star"),
    candlestick::shooting_star_shape
);

candlestick_strategy!(
    MarubozuStrategy,
    "marubozu",
    CandlestickSpec::continuation("marubozu"),
    candlestick::marubozu_shape
);

candlestick_strategy!(
    ThreeSoldiersStrategy,
    "three_soldiers",
    CandlestickSpec::continuation("three_soldiers"),
    candlestick::three_soldiers_shape
);

/// Every strategy named in the catalog, in priority order low-to-high as
/// listed by the arbitrator (the arbitrator re-derives its own ordering;
/// this is simply the full roster used to populate the registry).
pub fn all_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(HaramiBullishStrategy),
        Box::new(HaramiBearishStrategy),
        Box::new(EngulfingStrategy),
        Box::new(HammerStrategy),
        Box::new(ShootingStarStrategy),
        Box::new(MarubozuStrategy),
        Box::new(ThreeSoldiersStrategy),
        Box::new(pin_bar::PinBarStrategy),
        Box::new(doji_breakout::DojiBreakoutStrategy),
        Box::new(trend_pullback::TrendPullbackStrategy),
        Box::new(breakout_retest::BreakoutRetestStrategy),
        Box::new(range_reversion::RangeReversionStrategy),
        Box::new(momentum_ignition::MomentumIgnitionStrategy),
        Box::new(smc::LiquiditySweepStrategy),
        Box::new(smc::FvgSweepStrategy),
    ]
}
