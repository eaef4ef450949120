//! Which config subtrees each run mode actually reads — used by
//! `show_runtime_config` to flag keys that are set but never consumed,
//! and by config-hash stability tests to scope comparisons.

use crate::secrets::RunMode;

pub fn consumed_pointers(mode: RunMode) -> &'static [&'static str] {
    match mode {
        RunMode::Backtest => BACKTEST,
        RunMode::Paper => PAPER,
        RunMode::Live => LIVE,
    }
}

static BACKTEST: &[&str] = &["/runtime/mode", "/backtest", "/decision", "/risk"];

static PAPER: &[&str] = &["/runtime/mode", "/broker", "/risk", "/execution", "/scalper"];

static LIVE: &[&str] = &["/runtime/mode", "/broker", "/risk", "/execution", "/scalper", "/reconcile", "/secrets"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_mode_consumes_a_superset_of_paper() {
        let paper: std::collections::BTreeSet<_> = consumed_pointers(RunMode::Paper).iter().collect();
        let live: std::collections::BTreeSet<_> = consumed_pointers(RunMode::Live).iter().collect();
        assert!(paper.is_subset(&live));
    }
}
