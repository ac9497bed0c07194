//! Period and annualized price returns.
//!
//! Both figures are computed from price levels only (no coupon/yield income)
//! and must be presented as a "price-only proxy".

use crate::domain::PricePoint;

/// Label to show next to the annualized figure.
pub const PRICE_ONLY_LABEL: &str = "price-only proxy";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Returns {
    /// Percent change from the first to the last price.
    pub period_return: Option<f64>,
    /// Geometric annualization of `period_return` over the nominal horizon.
    pub annualized_return: Option<f64>,
}

impl Returns {
    pub fn is_insufficient(&self) -> bool {
        self.period_return.is_none()
    }
}

/// Compute returns over a caller-declared horizon.
///
/// `horizon_days` is the nominal window the series was requested for; the
/// timestamps in `prices` are not inspected.
///
/// Both outputs are `None` when there are fewer than two points or when the
/// first price is not strictly positive. `annualized_return` is also `None`
/// when the horizon is zero.
pub fn compute_returns(prices: &[PricePoint], horizon_days: u32) -> Returns {
    let (Some(first), Some(last)) = (prices.first(), prices.last()) else {
        return Returns::default();
    };
    if prices.len() < 2 {
        return Returns::default();
    }

    // NaN fails this comparison too.
    if !(first.value > 0.0) {
        return Returns::default();
    }

    let ratio = last.value / first.value;
    let period_return = Some((ratio - 1.0) * 100.0);

    let years = horizon_days as f64 / 365.0;
    let annualized_return = if years > 0.0 {
        Some((ratio.powf(1.0 / years) - 1.0) * 100.0)
    } else {
        None
    };

    Returns {
        period_return,
        annualized_return,
    }
}
