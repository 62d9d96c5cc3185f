//! Conservative recommendation engine: a pure threshold gate over an
//! external forecast and the entity's population/market signals. Thresholds
//! live in configuration, so tuning never touches the evaluation logic.

use crate::config::config::DecisionCfg;
use crate::core::types::{
    Action, CanonicalCardEntity, CardSignals, Forecast, Recommendation, RiskLevel,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Fraction of the predicted return credited when pricing targets. The
/// haircut keeps targets conservative relative to the model.
const TARGET_HAIRCUT: f64 = 0.8;
/// Half-width of the target band, in percentage points.
const TARGET_BAND_PP: f64 = 5.0;

pub struct DecisionEngine {
    cfg: DecisionCfg,
}

impl DecisionEngine {
    pub fn new(cfg: DecisionCfg) -> Self {
        Self { cfg }
    }

    /// Evaluates the tier table BUY -> WATCH -> AVOID; the first tier whose
    /// conditions all hold wins. Pure: no side effects, re-evaluated per scan.
    pub fn decide(
        &self,
        entity: &CanonicalCardEntity,
        forecast: &Forecast,
        signals: &CardSignals,
    ) -> Recommendation {
        let buy = &self.cfg.buy;
        let watch = &self.cfg.watch;

        // Each check keeps its label so the rationale can name exactly what
        // passed or failed.
        let buy_checks = [
            (
                forecast.predicted_return_pct >= buy.min_return_pct,
                format!("return below {}% threshold", buy.min_return_pct),
            ),
            (
                forecast.model_confidence >= buy.min_confidence_pct,
                format!("confidence below {}%", buy.min_confidence_pct),
            ),
            (
                signals.scarcity_score >= buy.min_scarcity,
                format!("scarcity below {}", buy.min_scarcity),
            ),
            (
                signals.gem_rate < buy.max_gem_rate_pct,
                format!("gem rate at or above {}%", buy.max_gem_rate_pct),
            ),
            (
                signals.liquidity_score >= buy.min_liquidity,
                "insufficient liquidity".to_string(),
            ),
            (
                signals.momentum_score >= buy.min_momentum,
                "insufficient momentum".to_string(),
            ),
            (
                signals.stability_score >= buy.min_stability,
                "price volatility concerns".to_string(),
            ),
        ];

        if buy_checks.iter().all(|(ok, _)| *ok) {
            return self.buy_recommendation(entity, forecast, signals);
        }

        let watch_checks = [
            forecast.predicted_return_pct >= watch.min_return_pct,
            forecast.model_confidence >= watch.min_confidence_pct,
            forecast.predicted_return_pct > watch.max_drawdown_pct,
        ];

        if watch_checks.iter().all(|ok| *ok) {
            let failed: Vec<&str> = buy_checks
                .iter()
                .filter(|(ok, _)| !ok)
                .map(|(_, label)| label.as_str())
                .collect();
            return self.watch_recommendation(entity, forecast, signals, &failed);
        }

        self.avoid_recommendation(entity, forecast, signals)
    }

    fn buy_recommendation(
        &self,
        entity: &CanonicalCardEntity,
        forecast: &Forecast,
        signals: &CardSignals,
    ) -> Recommendation {
        let mut parts = vec![format!(
            "STRONG BUY: {:.1}% predicted return with {:.0}% confidence",
            forecast.predicted_return_pct, forecast.model_confidence
        )];

        if signals.momentum_score >= 8.0 {
            parts.push("Exceptional price momentum".to_string());
        } else {
            parts.push("Strong price momentum".to_string());
        }
        if signals.liquidity_score >= 8.0 {
            parts.push("Excellent liquidity".to_string());
        } else {
            parts.push("Good liquidity".to_string());
        }
        if signals.stability_score >= 8.0 {
            parts.push("High price stability".to_string());
        } else {
            parts.push("Stable pricing".to_string());
        }
        parts.push("All conservative criteria met".to_string());

        let risk_level = if signals.stability_score >= 8.0 && signals.liquidity_score >= 8.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Medium
        };

        let (low, high) = self.price_targets(entity, forecast);

        Recommendation {
            canonical_sku: entity.canonical_sku.clone(),
            action: Action::Buy,
            predicted_return_pct: forecast.predicted_return_pct,
            confidence: forecast.model_confidence,
            risk_level,
            rationale: format!("{}.", parts.join(". ")),
            price_target_low: low,
            price_target_high: high,
        }
    }

    fn watch_recommendation(
        &self,
        entity: &CanonicalCardEntity,
        forecast: &Forecast,
        signals: &CardSignals,
        failed_buy_checks: &[&str],
    ) -> Recommendation {
        let mut parts = vec![format!(
            "WATCH: {:.1}% predicted return with {:.0}% confidence",
            forecast.predicted_return_pct, forecast.model_confidence
        )];
        for failure in failed_buy_checks {
            parts.push(failure.to_string());
        }
        parts.push("Monitor for improvement".to_string());

        let risk_level = if signals.stability_score >= 6.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        Recommendation {
            canonical_sku: entity.canonical_sku.clone(),
            action: Action::Watch,
            predicted_return_pct: forecast.predicted_return_pct,
            confidence: forecast.model_confidence,
            risk_level,
            rationale: format!("{}.", parts.join(". ")),
            price_target_low: None,
            price_target_high: None,
        }
    }

    fn avoid_recommendation(
        &self,
        entity: &CanonicalCardEntity,
        forecast: &Forecast,
        signals: &CardSignals,
    ) -> Recommendation {
        let mut parts = vec![format!(
            "AVOID: {:.1}% predicted return with {:.0}% confidence",
            forecast.predicted_return_pct, forecast.model_confidence
        )];

        if forecast.predicted_return_pct < 0.0 {
            parts.push("Negative return expected".to_string());
        } else if forecast.predicted_return_pct < self.cfg.watch.min_return_pct {
            parts.push("Low return potential".to_string());
        }
        if forecast.model_confidence < self.cfg.watch.min_confidence_pct {
            parts.push("Low prediction confidence".to_string());
        }
        if signals.liquidity_score < 4.0 {
            parts.push("Poor liquidity".to_string());
        }
        if signals.stability_score < 4.0 {
            parts.push("High volatility".to_string());
        }
        parts.push("Does not meet investment criteria".to_string());

        Recommendation {
            canonical_sku: entity.canonical_sku.clone(),
            action: Action::Avoid,
            predicted_return_pct: forecast.predicted_return_pct,
            confidence: forecast.model_confidence,
            risk_level: RiskLevel::High,
            rationale: format!("{}.", parts.join(". ")),
            price_target_low: None,
            price_target_high: None,
        }
    }

    /// Conservative price band around the haircut return, anchored on the
    /// observed price. No observed price, no targets.
    fn price_targets(
        &self,
        entity: &CanonicalCardEntity,
        forecast: &Forecast,
    ) -> (Option<Decimal>, Option<Decimal>) {
        let Some(price) = entity.observed_price else {
            return (None, None);
        };
        let conservative_return = forecast.predicted_return_pct * TARGET_HAIRCUT;

        let target = |adjustment_pp: f64| -> Option<Decimal> {
            let factor = 1.0 + (conservative_return + adjustment_pp) / 100.0;
            let factor = Decimal::from_f64(factor)?;
            Some((price * factor).round_dp(2))
        };

        (target(-TARGET_BAND_PP), target(TARGET_BAND_PP))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ListingQuality, MarketTier};

    fn engine() -> DecisionEngine {
        DecisionEngine::new(DecisionCfg::default())
    }

    fn entity(price: Option<f64>) -> CanonicalCardEntity {
        CanonicalCardEntity {
            canonical_sku: "BRS-074-CHARIZARD_VMAX".to_string(),
            name_normalized: "charizard vmax".to_string(),
            set_code: "BRS".to_string(),
            card_number: "074".to_string(),
            market_tier: MarketTier::Premium,
            filter_quality: ListingQuality::Good,
            resolution_confidence: 100.0,
            source_title: "Charizard VMAX 074/172 Brilliant Stars".to_string(),
            observed_price: price.and_then(Decimal::from_f64),
        }
    }

    fn strong_signals() -> CardSignals {
        CardSignals {
            scarcity_score: 80.0,
            gem_rate: 5.0,
            liquidity_score: 8.0,
            momentum_score: 7.0,
            stability_score: 7.0,
        }
    }

    #[test]
    fn test_buy_when_all_criteria_met() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let rec = engine().decide(&entity(Some(200.0)), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Buy);
        assert!(rec.rationale.contains("STRONG BUY"));
        assert!(rec.price_target_low.is_some());
        assert!(rec.price_target_high.is_some());
    }

    #[test]
    fn test_lower_confidence_drops_buy_to_watch() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 80.0,
        };
        let rec = engine().decide(&entity(Some(200.0)), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Watch);
        assert!(rec.rationale.contains("confidence below 90%"));
        assert!(rec.price_target_low.is_none());
    }

    #[test]
    fn test_buy_boundary_values_inclusive() {
        let forecast = Forecast {
            predicted_return_pct: 20.0,
            model_confidence: 90.0,
        };
        let signals = CardSignals {
            scarcity_score: 70.0,
            gem_rate: 14.9,
            liquidity_score: 7.0,
            momentum_score: 6.0,
            stability_score: 6.0,
        };
        let rec = engine().decide(&entity(Some(100.0)), &forecast, &signals);
        assert_eq!(rec.action, Action::Buy);
    }

    #[test]
    fn test_gem_rate_boundary_is_exclusive() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let mut signals = strong_signals();
        signals.gem_rate = 15.0;
        let rec = engine().decide(&entity(Some(100.0)), &forecast, &signals);
        assert_ne!(rec.action, Action::Buy);
        assert!(rec.rationale.contains("gem rate"));
    }

    #[test]
    fn test_watch_window() {
        let forecast = Forecast {
            predicted_return_pct: 8.0,
            model_confidence: 75.0,
        };
        let rec = engine().decide(&entity(Some(50.0)), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Watch);
    }

    #[test]
    fn test_avoid_on_low_return_and_confidence() {
        let forecast = Forecast {
            predicted_return_pct: 2.0,
            model_confidence: 60.0,
        };
        let rec = engine().decide(&entity(Some(50.0)), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Avoid);
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert!(rec.rationale.contains("Low return potential"));
        assert!(rec.rationale.contains("Low prediction confidence"));
    }

    #[test]
    fn test_avoid_on_deep_predicted_loss() {
        let forecast = Forecast {
            predicted_return_pct: -20.0,
            model_confidence: 95.0,
        };
        let rec = engine().decide(&entity(Some(50.0)), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Avoid);
        assert!(rec.rationale.contains("Negative return expected"));
    }

    #[test]
    fn test_risk_levels() {
        let buy_forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let mut calm = strong_signals();
        calm.stability_score = 9.0;
        calm.liquidity_score = 9.0;
        let rec = engine().decide(&entity(Some(100.0)), &buy_forecast, &calm);
        assert_eq!(rec.risk_level, RiskLevel::Low);

        let rec = engine().decide(&entity(Some(100.0)), &buy_forecast, &strong_signals());
        assert_eq!(rec.risk_level, RiskLevel::Medium);

        let watch_forecast = Forecast {
            predicted_return_pct: 8.0,
            model_confidence: 75.0,
        };
        let mut shaky = strong_signals();
        shaky.stability_score = 4.0;
        let rec = engine().decide(&entity(Some(100.0)), &watch_forecast, &shaky);
        assert_eq!(rec.action, Action::Watch);
        assert_eq!(rec.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_price_targets_use_haircut_return() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let rec = engine().decide(&entity(Some(100.0)), &forecast, &strong_signals());
        // Haircut return 20%; band +-5pp around it on a 100.00 base.
        assert_eq!(rec.price_target_low, Decimal::from_f64(115.0));
        assert_eq!(rec.price_target_high, Decimal::from_f64(125.0));
    }

    #[test]
    fn test_no_price_targets_without_observed_price() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let rec = engine().decide(&entity(None), &forecast, &strong_signals());
        assert_eq!(rec.action, Action::Buy);
        assert!(rec.price_target_low.is_none());
    }

    #[test]
    fn test_decision_is_pure() {
        let forecast = Forecast {
            predicted_return_pct: 25.0,
            model_confidence: 95.0,
        };
        let e = entity(Some(100.0));
        let s = strong_signals();
        let a = engine().decide(&e, &forecast, &s);
        let b = engine().decide(&e, &forecast, &s);
        assert_eq!(a.action, b.action);
        assert_eq!(a.rationale, b.rationale);
        assert_eq!(a.price_target_low, b.price_target_low);
    }
}
