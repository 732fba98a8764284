//! Deterministic position sizing.
//!
//! Stops are placed a fixed ATR multiple below entry, and size is derived
//! from the dollars at risk between entry and stop. Two methods share
//! that frame: fixed-fractional risks a constant fraction of equity per
//! trade; Kelly scales the fraction from the account's win statistics,
//! hard-capped because full Kelly assumes the statistics are exact.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PortfolioState;

/// Sizing method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingMethod {
    /// Risk a fixed fraction of equity per trade.
    FixedFractional,
    /// Risk a capped Kelly fraction derived from win statistics.
    Kelly,
}

/// Sizing failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SizingError {
    /// The stop distance collapsed to zero; size would be unbounded.
    #[error("risk per share is zero")]
    ZeroRiskPerShare,
    /// Equity is zero or negative; nothing can be sized.
    #[error("equity is not positive")]
    NonPositiveEquity,
}

/// A fully computed entry size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizedPosition {
    /// Whole shares to buy.
    pub quantity: u64,
    /// Protective stop price.
    pub stop_loss: Decimal,
    /// Dollars at risk per share (entry minus stop).
    pub risk_per_share: Decimal,
    /// Notional value at entry.
    pub notional: Decimal,
    /// Total dollars at risk if the stop is hit.
    pub risk_amount: Decimal,
    /// Risk as a fraction of equity.
    pub risk_pct: Decimal,
    /// The Kelly fraction applied, when Kelly sizing was used.
    pub kelly_fraction: Option<Decimal>,
}

/// Clamped Kelly fraction from account win statistics.
///
/// kelly = (win_rate * avg_win - (1 - win_rate) * avg_loss) / avg_win,
/// clamped to `[0, cap]`. `None` when any statistic is missing or
/// `avg_win` is not positive.
#[must_use]
pub fn kelly_fraction(portfolio: &PortfolioState, cap: Decimal) -> Option<Decimal> {
    let win_rate = portfolio.win_rate?;
    let avg_win = portfolio.avg_win?;
    let avg_loss = portfolio.avg_loss?;
    if avg_win <= Decimal::ZERO {
        return None;
    }
    let raw = (win_rate * avg_win - (Decimal::ONE - win_rate) * avg_loss) / avg_win;
    Some(raw.clamp(Decimal::ZERO, cap))
}

/// ATR-stop position sizer.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    method: SizingMethod,
    atr_stop_multiple: Decimal,
    max_position_risk: Decimal,
    kelly_cap: Decimal,
}

impl PositionSizer {
    /// Build a sizer.
    #[must_use]
    pub const fn new(
        method: SizingMethod,
        atr_stop_multiple: Decimal,
        max_position_risk: Decimal,
        kelly_cap: Decimal,
    ) -> Self {
        Self {
            method,
            atr_stop_multiple,
            max_position_risk,
            kelly_cap,
        }
    }

    /// Size a long entry at `entry` with volatility `atr`.
    ///
    /// Kelly sizing falls back to fixed-fractional when the portfolio
    /// carries no win statistics; a missing edge estimate must never
    /// inflate size.
    pub fn size_buy(
        &self,
        portfolio: &PortfolioState,
        entry: Decimal,
        atr: Decimal,
    ) -> Result<SizedPosition, SizingError> {
        if portfolio.equity <= Decimal::ZERO {
            return Err(SizingError::NonPositiveEquity);
        }

        let risk_per_share = atr * self.atr_stop_multiple;
        if risk_per_share <= Decimal::ZERO {
            return Err(SizingError::ZeroRiskPerShare);
        }
        let stop_loss = (entry - risk_per_share).max(Decimal::ZERO);

        let (risk_fraction, applied_kelly) = match self.method {
            SizingMethod::FixedFractional => (self.max_position_risk, None),
            SizingMethod::Kelly => match kelly_fraction(portfolio, self.kelly_cap) {
                Some(kelly) => (kelly, Some(kelly)),
                None => (self.max_position_risk, None),
            },
        };

        let risk_budget = portfolio.equity * risk_fraction;
        let quantity = (risk_budget / risk_per_share).floor().to_u64().unwrap_or(0);
        let qty = Decimal::from(quantity);
        let risk_amount = qty * risk_per_share;

        Ok(SizedPosition {
            quantity,
            stop_loss,
            risk_per_share,
            notional: qty * entry,
            risk_amount,
            risk_pct: risk_amount / portfolio.equity,
            kelly_fraction: applied_kelly,
        })
    }
}
