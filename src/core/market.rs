//! Illustrative market index paths for charting.
//!
//! Each step perturbs the base monthly return by a uniform factor in
//! `[-1, 1]` scaled to a tenth of the volatility. One call yields one
//! realized path; nothing here is a statistical estimate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const INDEX_START: f64 = 100.0;

/// Volatility used for the chart path attached to simulation results.
pub const CHART_VOLATILITY: f64 = 15.0;

const VOLATILITY_DAMPING: f64 = 0.1;

/// Lazy index path. Yields at most `months` values, fewer if the factor
/// source runs dry.
#[derive(Debug, Clone)]
pub struct MarketPath<F> {
    value: f64,
    monthly_drift: f64,
    shock_scale: f64,
    remaining: u32,
    factors: F,
}

impl<F: Iterator<Item = f64>> Iterator for MarketPath<F> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }
        let factor = self.factors.next()?;
        self.remaining -= 1;

        let monthly_return = self.monthly_drift + self.shock_scale * factor;
        self.value *= 1.0 + monthly_return;
        Some(self.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.factors.size_hint();
        let cap = self.remaining as usize;
        (lo.min(cap), Some(hi.map_or(cap, |hi| hi.min(cap))))
    }
}

/// Path driven by an explicit factor sequence. Factors are expected in
/// `[-1, 1]` but are not clamped.
pub fn market_path_from_factors<I>(
    base_return_percent: f64,
    volatility_percent: f64,
    months: u32,
    factors: I,
) -> MarketPath<I::IntoIter>
where
    I: IntoIterator<Item = f64>,
{
    MarketPath {
        value: INDEX_START,
        monthly_drift: base_return_percent / 12.0 / 100.0,
        shock_scale: volatility_percent / 100.0 * VOLATILITY_DAMPING,
        remaining: months,
        factors: factors.into_iter(),
    }
}

/// Path driven by uniform draws from `rng`; always yields exactly `months`
/// values.
pub fn market_path<'a, R>(
    base_return_percent: f64,
    volatility_percent: f64,
    months: u32,
    rng: &'a mut R,
) -> MarketPath<impl Iterator<Item = f64> + 'a>
where
    R: Rng + ?Sized,
{
    market_path_from_factors(
        base_return_percent,
        volatility_percent,
        months,
        std::iter::repeat_with(move || rng.gen_range(-1.0..=1.0)),
    )
}

/// Reproducible generator when a seed is given, OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
