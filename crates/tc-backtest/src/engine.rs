//! Walk-forward replay of the strategy arbitrator over a candle series.
//! Single position at a time, no stacking — this backs an operator sanity
//! check on `min_score`/`warmup` tuning, not a portfolio-level simulator.

use chrono::{DateTime, Utc};
use tc_primitives::{Candle, Decimal8};
use tc_strategy::{arbitrate, Direction, EngineContext, StrategyAction};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "sl",
            ExitReason::TakeProfit => "tp",
            ExitReason::EndOfData => "end_of_data",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug)]
pub struct TradeResult {
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: Decimal8,
    pub exit_price: Decimal8,
    pub reason: ExitReason,
    pub score: f64,
    pub pnl: Decimal8,
}

struct OpenPosition {
    direction: Direction,
    entry_price: Decimal8,
    entry_time: DateTime<Utc>,
    sl: Option<Decimal8>,
    tp: Option<Decimal8>,
    score: f64,
}

fn pnl_for(direction: Direction, entry: Decimal8, exit: Decimal8) -> Decimal8 {
    match direction {
        Direction::Buy => exit.saturating_sub(entry),
        Direction::Sell => entry.saturating_sub(exit),
    }
}

/// Checks the current bar's high/low against the open position's SL/TP.
/// Stop loss takes priority over take profit when a bar's range spans both
/// — the same conservative ordering the live monitor uses for gap bars.
fn maybe_exit(position: &OpenPosition, bar: &Candle) -> Option<TradeResult> {
    let (exit_price, reason) = match position.direction {
        Direction::Buy => {
            if position.sl.is_some_and(|sl| bar.low <= sl) {
                (position.sl.unwrap(), ExitReason::StopLoss)
            } else if position.tp.is_some_and(|tp| bar.high >= tp) {
                (position.tp.unwrap(), ExitReason::TakeProfit)
            } else {
                return None;
            }
        }
        Direction::Sell => {
            if position.sl.is_some_and(|sl| bar.high >= sl) {
                (position.sl.unwrap(), ExitReason::StopLoss)
            } else if position.tp.is_some_and(|tp| bar.low <= tp) {
                (position.tp.unwrap(), ExitReason::TakeProfit)
            } else {
                return None;
            }
        }
    };

    Some(TradeResult {
        direction: position.direction,
        entry_time: position.entry_time,
        exit_time: bar.time,
        entry_price: position.entry_price,
        exit_price,
        reason,
        score: position.score,
        pnl: pnl_for(position.direction, position.entry_price, exit_price),
    })
}

#[derive(Clone, Debug)]
pub struct BacktestConfig {
    pub symbol: String,
    pub timeframe: String,
    pub min_score: f64,
    pub warmup: usize,
}

/// Runs the arbitrator on each bar after `warmup`; opens at the *next* bar's
/// open when it clears `min_score`, manages the position against SL/TP on
/// every subsequent bar, and force-closes anything still open at the last
/// close. Mirrors the source system's own quick-pass backtest loop.
pub fn run_backtest(candles: &[Candle], config: &BacktestConfig) -> Vec<TradeResult> {
    if candles.len() < config.warmup + 2 {
        return Vec::new();
    }

    let mut trades = Vec::new();
    let mut position: Option<OpenPosition> = None;

    for i in config.warmup..candles.len() - 1 {
        let bar = &candles[i];

        if let Some(open) = position.as_ref() {
            if let Some(closed) = maybe_exit(open, bar) {
                trades.push(closed);
                position = None;
            }
        }

        if position.is_some() {
            continue;
        }

        let window = &candles[..=i];
        let ctx = EngineContext {
            symbol: config.symbol.clone(),
            timeframe: config.timeframe.clone(),
            entry_candles: window,
            htf_candles: None,
            allowed_strategies: None,
        };
        let verdict = arbitrate(&ctx);
        if verdict.outcome.action != StrategyAction::Open {
            continue;
        }
        let Some(direction) = verdict.outcome.direction else { continue };
        if verdict.outcome.score < config.min_score {
            continue;
        }

        let next_bar = &candles[i + 1];
        position = Some(OpenPosition {
            direction,
            entry_price: next_bar.open,
            entry_time: next_bar.time,
            sl: verdict.outcome.sl,
            tp: verdict.outcome.tp,
            score: verdict.outcome.score,
        });
    }

    if let Some(open) = position {
        let last = candles.last().expect("checked length above");
        trades.push(TradeResult {
            direction: open.direction,
            entry_time: open.entry_time,
            exit_time: last.time,
            entry_price: open.entry_price,
            exit_price: last.close,
            reason: ExitReason::EndOfData,
            score: open.score,
            pnl: pnl_for(open.direction, open.entry_price, last.close),
        });
    }

    trades
}

#[derive(Clone, Debug)]
pub struct BacktestSummary {
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub flats: usize,
    pub win_rate: f64,
    pub total_pnl: Decimal8,
    pub avg_pnl: Decimal8,
}

pub fn summarise(trades: &[TradeResult]) -> BacktestSummary {
    let total = trades.len();
    let wins = trades.iter().filter(|t| t.pnl.is_positive()).count();
    let losses = trades.iter().filter(|t| t.pnl.is_negative()).count();
    let flats = total - wins - losses;
    let total_pnl = trades.iter().fold(Decimal8::from_f64(0.0), |acc, t| acc.saturating_add(t.pnl));
    let avg_pnl = if total > 0 {
        total_pnl.checked_div_i64(total as i64).unwrap_or(Decimal8::from_f64(0.0))
    } else {
        Decimal8::from_f64(0.0)
    };
    let win_rate = if total > 0 { wins as f64 / total as f64 } else { 0.0 };

    BacktestSummary { trades: total, wins, losses, flats, win_rate, total_pnl, avg_pnl }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(hour: u32, o: f64, h: f64, l: f64, c: f64) -> Candle {
        use chrono::{Duration, TimeZone};
        Candle::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour as i64),
            Decimal8::from_f64(o),
            Decimal8::from_f64(h),
            Decimal8::from_f64(l),
            Decimal8::from_f64(c),
            10,
        )
    }

    #[test]
    fn too_few_bars_for_warmup_produces_no_trades() {
        let candles = vec![candle(0, 1.0, 1.0, 1.0, 1.0); 5];
        let config = BacktestConfig { symbol: "EURUSD".into(), timeframe: "M5".into(), min_score: 0.5, warmup: 200 };
        assert!(run_backtest(&candles, &config).is_empty());
    }

    #[test]
    fn flat_featureless_candles_never_open_a_position() {
        let candles: Vec<Candle> = (0..60).map(|h| candle(h, 1.0, 1.0, 1.0, 1.0)).collect();
        let config = BacktestConfig { symbol: "EURUSD".into(), timeframe: "M5".into(), min_score: 0.5, warmup: 10 };
        assert!(run_backtest(&candles, &config).is_empty());
    }

    #[test]
    fn summary_counts_wins_losses_and_flats() {
        let trades = vec![
            TradeResult {
                direction: Direction::Buy,
                entry_time: Utc::now(),
                exit_time: Utc::now(),
                entry_price: Decimal8::from_f64(1.0),
                exit_price: Decimal8::from_f64(1.1),
                reason: ExitReason::TakeProfit,
                score: 0.8,
                pnl: Decimal8::from_f64(0.1),
            },
            TradeResult {
                direction: Direction::Sell,
                entry_time: Utc::now(),
                exit_time: Utc::now(),
                entry_price: Decimal8::from_f64(1.0),
                exit_price: Decimal8::from_f64(1.05),
                reason: ExitReason::StopLoss,
                score: 0.6,
                pnl: Decimal8::from_f64(-0.05),
            },
        ];
        let summary = summarise(&trades);
        assert_eq!(summary.trades, 2);
        assert_eq!(summary.wins, 1);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.flats, 0);
        assert!((summary.win_rate - 0.5).abs() < 1e-9);
    }
}
