//! Market data types: price history, technical snapshot, ground truth.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A single dated closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date of the observation.
    pub date: NaiveDate,
    /// Closing price.
    pub price: f64,
}

/// An ordered, validated series of closing prices.
///
/// Construction is the only place series data is checked: dates must be
/// strictly ascending and every price finite and positive. Once built the
/// series cannot be modified, so downstream math never re-validates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PricePoint>", into = "Vec<PricePoint>")]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from dated points, validating order and finiteness.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, InputError> {
        if points.is_empty() {
            return Err(InputError::EmptySeries);
        }
        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() || point.price <= 0.0 {
                return Err(InputError::InvalidPrice {
                    index,
                    price: point.price,
                });
            }
            if index > 0 && point.date <= points[index - 1].date {
                return Err(InputError::OutOfOrder { index });
            }
        }
        Ok(Self { points })
    }

    /// Number of points in the series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series is empty (never true for a constructed series).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The validated points, oldest first.
    #[must_use]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Closing prices in series order.
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    /// Most recent closing price.
    #[must_use]
    pub fn last_price(&self) -> f64 {
        self.points[self.points.len() - 1].price
    }

    /// Most recent trading date.
    #[must_use]
    pub fn last_date(&self) -> NaiveDate {
        self.points[self.points.len() - 1].date
    }

    /// Simple return over the most recent `window` points.
    ///
    /// Falls back to the full-series return when `window` exceeds the
    /// series length.
    #[must_use]
    pub fn window_return(&self, window: usize) -> f64 {
        let start = self.points.len().saturating_sub(window);
        self.last_price() / self.points[start].price - 1.0
    }

    /// Simple return from the first point to the last.
    #[must_use]
    pub fn overall_return(&self) -> f64 {
        self.last_price() / self.points[0].price - 1.0
    }
}

impl TryFrom<Vec<PricePoint>> for PriceSeries {
    type Error = InputError;

    fn try_from(points: Vec<PricePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<PriceSeries> for Vec<PricePoint> {
    fn from(series: PriceSeries) -> Self {
        series.points
    }
}

/// Point-in-time technical snapshot for one instrument.
///
/// Every field is optional because upstream feeds drop fields routinely;
/// the risk gate and gatekeeper decide which absences are fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Last closing price.
    #[serde(default)]
    pub close: Option<Decimal>,
    /// Last session volume.
    #[serde(default)]
    pub volume: Option<u64>,
    /// Average true range (14-period).
    #[serde(default)]
    pub atr: Option<Decimal>,
    /// Relative strength index (14-period).
    #[serde(default)]
    pub rsi: Option<f64>,
    /// Long moving average (200-period).
    #[serde(default)]
    pub ma_long: Option<Decimal>,
}

/// Deterministic ground truth for one trading cycle.
///
/// Numeric values agent claims are checked against. A `None` field means
/// no truth is known for that domain this cycle; claims in that domain
/// validate as neutral rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthFacts {
    /// Trading date these facts were captured for.
    pub trading_date: NaiveDate,
    /// Year-over-year revenue growth as a fraction (0.05 = +5%).
    #[serde(default)]
    pub revenue_growth_yoy: Option<f64>,
    /// Price change over the lookback window as a fraction.
    #[serde(default)]
    pub price_change_pct: Option<f64>,
    /// Relative strength index reading.
    #[serde(default)]
    pub rsi: Option<f64>,
}

impl GroundTruthFacts {
    /// Facts with only a trading date, for cycles with no fundamentals.
    #[must_use]
    pub const fn empty(trading_date: NaiveDate) -> Self {
        Self {
            trading_date,
            revenue_growth_yoy: None,
            price_change_pct: None,
            rsi: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).expect("valid date")
    }

    fn series(prices: &[f64]) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                date: date(u32::try_from(i).expect("small index") + 1),
                price,
            })
            .collect();
        PriceSeries::new(points).expect("valid series")
    }

    #[test]
    fn test_empty_series_rejected() {
        assert_eq!(PriceSeries::new(vec![]), Err(InputError::EmptySeries));
    }

    #[test]
    fn test_nan_price_rejected() {
        let points = vec![
            PricePoint {
                date: date(1),
                price: 100.0,
            },
            PricePoint {
                date: date(2),
                price: f64::NAN,
            },
        ];
        assert!(matches!(
            PriceSeries::new(points),
            Err(InputError::InvalidPrice { index: 1, .. })
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let points = vec![PricePoint {
            date: date(1),
            price: -5.0,
        }];
        assert!(matches!(
            PriceSeries::new(points),
            Err(InputError::InvalidPrice { index: 0, .. })
        ));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let points = vec![
            PricePoint {
                date: date(5),
                price: 100.0,
            },
            PricePoint {
                date: date(4),
                price: 101.0,
            },
        ];
        assert_eq!(
            PriceSeries::new(points),
            Err(InputError::OutOfOrder { index: 1 })
        );
    }

    #[test]
    fn test_duplicate_date_rejected() {
        let points = vec![
            PricePoint {
                date: date(5),
                price: 100.0,
            },
            PricePoint {
                date: date(5),
                price: 101.0,
            },
        ];
        assert_eq!(
            PriceSeries::new(points),
            Err(InputError::OutOfOrder { index: 1 })
        );
    }

    #[test]
    fn test_returns() {
        let s = series(&[100.0, 110.0, 120.0, 150.0]);
        assert!((s.overall_return() - 0.5).abs() < 1e-12);
        assert!((s.window_return(2) - (150.0 / 120.0 - 1.0)).abs() < 1e-12);
        // Window larger than series falls back to overall.
        assert!((s.window_return(100) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let json = r#"[
            {"date": "2026-01-02", "price": 100.0},
            {"date": "2026-01-03", "price": 101.5}
        ]"#;
        let s: PriceSeries = serde_json::from_str(json).expect("valid series json");
        assert_eq!(s.len(), 2);

        let bad = r#"[
            {"date": "2026-01-03", "price": 100.0},
            {"date": "2026-01-02", "price": 101.5}
        ]"#;
        assert!(serde_json::from_str::<PriceSeries>(bad).is_err());
    }
}
