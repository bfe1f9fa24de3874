//! The atomic mutable portfolio state, behind a single lock.
//!
//! [`OrderEngine`](crate::order_engine::OrderEngine),
//! [`RiskEngine`](crate::risk_engine::RiskEngine), and
//! [`PortfolioMetrics`](crate::metrics::PortfolioMetrics) each hold a
//! non-owning reference to one [`PortfolioCore`] and mutate or read it
//! only through [`PortfolioCore::with_state`]. There are no back-pointers
//! from the state to its components.

use btengine_model::{Snapshot, Symbol, Trade, TradingMode};
use btengine_model::{MAX_HISTORY_ENTRIES, MAX_POSITIONS_PER_PORTFOLIO};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// The portfolio's configuration knobs that do not change over a run.
#[derive(Clone, Copy, Debug)]
pub struct PortfolioParams {
    pub trading_mode: TradingMode,
    pub max_leverage: f64,
    pub maintenance_margin_rate: f64,
    pub taker_fee_rate: f64,
}

/// The full mutable state of one portfolio.
#[derive(Debug)]
pub struct PortfolioState {
    pub initial_capital: f64,
    pub cash: f64,
    pub positions: IndexMap<Symbol, btengine_model::Position>,
    pub trades: Vec<Trade>,
    pub history: Vec<Snapshot>,
    pub params: PortfolioParams,
}

impl PortfolioState {
    /// Appends `snapshot`, trimming the oldest entries in one O(K) pass
    /// if the bound is exceeded rather than popping the front repeatedly.
    pub fn push_snapshot(&mut self, snapshot: Snapshot) {
        self.history.push(snapshot);
        if self.history.len() > MAX_HISTORY_ENTRIES {
            let overflow = self.history.len() - MAX_HISTORY_ENTRIES;
            self.history.drain(0..overflow);
        }
    }

    /// Debug-only invariant checks, run after every committed mutation.
    /// Production builds skip these for speed; the same invariants are
    /// covered by this crate's test suite.
    pub(crate) fn debug_check_invariants(&self) {
        debug_assert!(self.cash >= 0.0, "cash must never go negative: {}", self.cash);
        debug_assert!(
            self.positions.len() <= MAX_POSITIONS_PER_PORTFOLIO,
            "too many open positions: {}",
            self.positions.len()
        );
        for (key, position) in &self.positions {
            debug_assert_eq!(*key, position.symbol, "position map key must match position.symbol");
        }
        debug_assert!(
            self.history.len() <= MAX_HISTORY_ENTRIES,
            "history exceeded its bound: {}",
            self.history.len()
        );
    }
}

/// A container with a single mutex guarding [`PortfolioState`]. Every
/// mutating operation, and every read that needs a consistent
/// multi-field view, acquires the lock for the duration of the closure
/// passed to [`PortfolioCore::with_state`].
///
/// Not reentrant: no component composes two operations by calling
/// `with_state` from within another `with_state` closure on the same
/// thread. Each public method on [`crate::order_engine::OrderEngine`],
/// [`crate::risk_engine::RiskEngine`], and
/// [`crate::metrics::PortfolioMetrics`] acquires the lock exactly once.
#[derive(Debug)]
pub struct PortfolioCore {
    lock: Mutex<PortfolioState>,
}

impl PortfolioCore {
    #[must_use]
    pub fn new(initial_capital: f64, params: PortfolioParams) -> Self {
        Self {
            lock: Mutex::new(PortfolioState {
                initial_capital,
                cash: initial_capital,
                positions: IndexMap::new(),
                trades: Vec::new(),
                history: Vec::new(),
                params,
            }),
        }
    }

    /// Acquires the lock and runs `f` against the state, checking
    /// invariants (debug builds only) before returning.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut PortfolioState) -> R) -> R {
        let mut state = self.lock.lock();
        let result = f(&mut state);
        state.debug_check_invariants();
        result
    }
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
