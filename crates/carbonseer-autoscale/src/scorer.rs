//! Multi-objective scorer.
//!
//! Every component score is clamped into [0, 1]. The combined score is the
//! weighted sum with weights taken verbatim from config, clamped into
//! [0, w_slo + w_carbon + w_cost].

use carbonseer_carbon::CarbonResolver;
use carbonseer_core::{ControllerConfig, ScoreResult, Weights};

/// SLO score used when no latency measurement is available.
pub const NEUTRAL_SLO_SCORE: f64 = 0.5;

/// Upper bound of the carbon normalization band (gCO2eq/kWh).
pub const CARBON_NORM_MAX: f64 = 1000.0;

/// Latency at `target * (1 + SLO_DEGRADE_SPAN)` scores zero.
const SLO_DEGRADE_SPAN: f64 = 5.0;

pub struct Scorer {
    resolver: CarbonResolver,
    weights: Weights,
    slo_target_ms: f64,
    cost_score: f64,
}

impl Scorer {
    pub fn new(
        resolver: CarbonResolver,
        weights: Weights,
        slo_target_ms: f64,
        cost_per_replica: f64,
        cost_norm_max: f64,
    ) -> Self {
        Self {
            resolver,
            weights,
            slo_target_ms,
            cost_score: cost_score(cost_per_replica, cost_norm_max),
        }
    }

    pub fn from_config(config: &ControllerConfig, resolver: CarbonResolver) -> Self {
        Self::new(
            resolver,
            config.weights,
            config.slo_p95_ms,
            config.cost_per_replica,
            config.cost_norm_max,
        )
    }

    /// Score a latency reading against the carbon intensity of `region`.
    pub async fn score(&self, p95_ms: Option<f64>, region: &str) -> ScoreResult {
        let carbon = self.resolver.resolve(region).await;
        self.compose(p95_ms, carbon)
    }

    /// Score with an already resolved carbon value.
    pub fn compose(&self, p95_ms: Option<f64>, carbon_value: f64) -> ScoreResult {
        let slo = slo_score(p95_ms, self.slo_target_ms);
        let carbon = carbon_score(carbon_value);
        let cost = self.cost_score;
        let w = &self.weights;
        let combined = (w.slo * slo + w.carbon * carbon + w.cost * cost).clamp(0.0, w.sum().max(0.0));

        ScoreResult {
            slo_score: slo,
            carbon_score: carbon,
            cost_score: cost,
            combined,
            carbon_value,
        }
    }
}

/// 1.0 at or under target, falling linearly to 0.0 at six times target.
pub fn slo_score(p95_ms: Option<f64>, target_ms: f64) -> f64 {
    match p95_ms {
        None => NEUTRAL_SLO_SCORE,
        Some(latency) if latency <= target_ms => 1.0,
        Some(latency) => clamp_unit(1.0 - (latency - target_ms) / (target_ms * SLO_DEGRADE_SPAN)),
    }
}

/// 1.0 at zero intensity, 0.0 at or above the normalization ceiling.
pub fn carbon_score(intensity: f64) -> f64 {
    clamp_unit(1.0 - intensity / CARBON_NORM_MAX)
}

/// Per-unit cost penalty, independent of the current replica count.
pub fn cost_score(cost_per_replica: f64, cost_norm_max: f64) -> f64 {
    clamp_unit(1.0 - (cost_per_replica / cost_norm_max).min(1.0))
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use carbonseer_carbon::CarbonCache;

    fn resolver(map: &[(&str, f64)]) -> CarbonResolver {
        let map: HashMap<String, f64> = map.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        CarbonResolver::new(CarbonCache::new(), Vec::new(), map, 300.0, Duration::from_secs(300))
    }

    fn scorer(weights: Weights) -> Scorer {
        Scorer::new(resolver(&[]), weights, 200.0, 0.02, 1.0)
    }

    #[test]
    fn slo_is_full_at_or_under_target() {
        for latency in [0.0, 50.0, 199.9, 200.0] {
            assert_eq!(slo_score(Some(latency), 200.0), 1.0, "latency {latency}");
        }
    }

    #[test]
    fn slo_is_zero_at_six_times_target_and_beyond() {
        for latency in [1200.0, 1500.0, 1e9] {
            assert_eq!(slo_score(Some(latency), 200.0), 0.0, "latency {latency}");
        }
    }

    #[test]
    fn slo_degrades_linearly_and_monotonically() {
        assert!((slo_score(Some(700.0), 200.0) - 0.5).abs() < 1e-12);
        assert!((slo_score(Some(250.0), 200.0) - 0.95).abs() < 1e-12);

        let mut previous = 1.0;
        for step in 0..=130 {
            let latency = 200.0 + step as f64 * 10.0;
            let score = slo_score(Some(latency), 200.0);
            assert!(score <= previous, "not monotonic at {latency}");
            previous = score;
        }
    }

    #[test]
    fn absent_latency_is_neutral() {
        assert_eq!(slo_score(None, 200.0), NEUTRAL_SLO_SCORE);
    }

    #[test]
    fn carbon_score_bounds() {
        assert_eq!(carbon_score(0.0), 1.0);
        assert_eq!(carbon_score(1000.0), 0.0);
        assert_eq!(carbon_score(2500.0), 0.0);
        assert!((carbon_score(250.0) - 0.75).abs() < 1e-12);
        assert_eq!(carbon_score(-40.0), 1.0);
    }

    #[test]
    fn cost_score_is_per_unit() {
        assert!((cost_score(0.02, 1.0) - 0.98).abs() < 1e-12);
        assert_eq!(cost_score(5.0, 1.0), 0.0);
        assert_eq!(cost_score(0.0, 1.0), 1.0);
        assert!((cost_score(0.5, 2.0) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn combined_uses_weights_verbatim() {
        let s = scorer(Weights { slo: 0.6, carbon: 0.3, cost: 0.1 });
        let r = s.compose(Some(100.0), 250.0);
        let expected = 0.6 * 1.0 + 0.3 * 0.75 + 0.1 * 0.98;
        assert!((r.combined - expected).abs() < 1e-12);
        assert_eq!(r.carbon_value, 250.0);
    }

    #[test]
    fn combined_is_not_renormalized() {
        let s = scorer(Weights { slo: 2.0, carbon: 1.0, cost: 1.0 });
        let r = s.compose(Some(100.0), 0.0);
        assert!((r.combined - (2.0 + 1.0 + 0.98)).abs() < 1e-12);
    }

    #[test]
    fn all_scores_stay_in_range_for_extreme_inputs() {
        let weights = Weights { slo: 0.5, carbon: 0.7, cost: 0.2 };
        let s = scorer(weights);
        for latency in [None, Some(0.0), Some(-5.0), Some(1e12), Some(f64::NAN)] {
            for carbon in [-1e6, 0.0, 999.0, 1e9, f64::NAN] {
                let r = s.compose(latency, carbon);
                for v in [r.slo_score, r.carbon_score, r.cost_score] {
                    assert!((0.0..=1.0).contains(&v), "{latency:?}/{carbon}: {r:?}");
                }
                assert!((0.0..=weights.sum()).contains(&r.combined), "{r:?}");
            }
        }
    }

    #[tokio::test]
    async fn score_resolves_region_carbon() {
        let s = Scorer::new(
            resolver(&[("eu", 500.0)]),
            Weights::default(),
            200.0,
            0.02,
            1.0,
        );
        let r = s.score(None, "eu").await;
        assert_eq!(r.carbon_value, 500.0);
        assert_eq!(r.slo_score, NEUTRAL_SLO_SCORE);
        assert!((r.carbon_score - 0.5).abs() < 1e-12);

        let r = s.score(Some(150.0), "elsewhere").await;
        assert_eq!(r.carbon_value, 300.0);
    }
}
