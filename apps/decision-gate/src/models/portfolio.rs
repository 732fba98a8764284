//! Portfolio snapshot consumed by the risk gate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open position with its protective stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    /// Instrument ticker.
    pub ticker: String,
    /// Shares held.
    pub quantity: u64,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Stop-loss price protecting the position.
    pub stop_loss: Decimal,
}

impl OpenPosition {
    /// Dollar amount lost if the stop is hit.
    #[must_use]
    pub fn risk_amount(&self) -> Decimal {
        let per_share = (self.entry_price - self.stop_loss).max(Decimal::ZERO);
        per_share * Decimal::from(self.quantity)
    }
}

/// Point-in-time account snapshot.
///
/// Owned by the cycle that received it. Concurrent cycles get their own
/// copies, so the gate never observes a position list mutating under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Total account equity.
    pub equity: Decimal,
    /// Current drawdown from the high-water mark, as a fraction (0.08 = 8%).
    pub current_drawdown: Decimal,
    /// All open positions.
    #[serde(default)]
    pub open_positions: Vec<OpenPosition>,
    /// Historical win rate in `[0, 1]`, for Kelly sizing.
    #[serde(default)]
    pub win_rate: Option<Decimal>,
    /// Average winning-trade return, for Kelly sizing.
    #[serde(default)]
    pub avg_win: Option<Decimal>,
    /// Average losing-trade return (positive magnitude), for Kelly sizing.
    #[serde(default)]
    pub avg_loss: Option<Decimal>,
}

impl PortfolioState {
    /// Fraction of equity already at risk across open stops.
    ///
    /// Returns zero when equity is non-positive; the circuit breaker will
    /// have tripped long before that case matters.
    #[must_use]
    pub fn committed_risk(&self) -> Decimal {
        if self.equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let total: Decimal = self.open_positions.iter().map(OpenPosition::risk_amount).sum();
        total / self.equity
    }

    /// The open position in `ticker`, if any.
    #[must_use]
    pub fn position(&self, ticker: &str) -> Option<&OpenPosition> {
        self.open_positions.iter().find(|p| p.ticker == ticker)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn snapshot() -> PortfolioState {
        PortfolioState {
            equity: dec!(100000),
            current_drawdown: dec!(0.03),
            open_positions: vec![
                OpenPosition {
                    ticker: "AAPL".to_string(),
                    quantity: 100,
                    entry_price: dec!(180),
                    stop_loss: dec!(171),
                },
                OpenPosition {
                    ticker: "MSFT".to_string(),
                    quantity: 50,
                    entry_price: dec!(400),
                    stop_loss: dec!(388),
                },
            ],
            win_rate: Some(dec!(0.55)),
            avg_win: Some(dec!(0.08)),
            avg_loss: Some(dec!(0.04)),
        }
    }

    #[test]
    fn test_position_risk_amount() {
        let position = &snapshot().open_positions[0];
        assert_eq!(position.risk_amount(), dec!(900));
    }

    #[test]
    fn test_stop_above_entry_contributes_zero_risk() {
        let position = OpenPosition {
            ticker: "TSLA".to_string(),
            quantity: 10,
            entry_price: dec!(200),
            stop_loss: dec!(210),
        };
        assert_eq!(position.risk_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_committed_risk() {
        // 900 + 600 = 1500 on 100k equity.
        assert_eq!(snapshot().committed_risk(), dec!(0.015));
    }

    #[test]
    fn test_committed_risk_zero_equity() {
        let mut state = snapshot();
        state.equity = Decimal::ZERO;
        assert_eq!(state.committed_risk(), Decimal::ZERO);
    }

    #[test]
    fn test_position_lookup() {
        let state = snapshot();
        assert!(state.position("AAPL").is_some());
        assert!(state.position("NVDA").is_none());
    }
}
