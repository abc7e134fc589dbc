//! End-to-end Monte Carlo runs of the target-volatility engine.

mod common;

use approx::assert_relative_eq;
use common::flat_market;
use tvs_math::{BlockRemainder, InverseCumulativeNormalRng};
use tvs_processes::{CholeskyTDependent, Drift};
use tvs_strategy::{
    ConstraintMode, Frequency, RebalancingPolicy, TvsConfig, TvsEngine, TvsForwardCurve,
};

#[test]
fn zero_drift_index_is_a_martingale() {
    let market = flat_market(&[0.2, 0.2], &[0.0, 0.0], 0.0, 0.0);
    let config = TvsConfig {
        target_volatility: 0.05,
        maturity: 1.0,
        frequency: Frequency::Monthly,
        constraint: ConstraintMode::OnlyLong,
        n_paths: 4_000,
        n_blocks: 20,
        ..TvsConfig::default()
    };
    let engine = TvsEngine::from_config(
        &config,
        market.model,
        market.variance_curves,
        market.discounting,
    )
    .unwrap();
    assert_eq!(engine.generator().grid().intervals(), 12);

    let report = engine
        .run_batch(InverseCumulativeNormalRng::new(config.seed()), config.n_paths, None, None)
        .unwrap();
    let (mean, err) = report.mean_index(config.n_blocks, BlockRemainder::Reject).unwrap();
    let (_, plain_err) = report.mean_index_plain().unwrap();
    assert!(err > 0.0);
    assert!(
        (mean - config.initial_index).abs() < 5.0 * err.max(plain_err),
        "mean {mean} ± {err}"
    );
    // one year at 5% volatility
    assert!((0.5 * 0.05 / (4_000.0_f64).sqrt()..3.0 * 0.05 / (4_000.0_f64).sqrt())
        .contains(&plain_err));
}

#[test]
fn fixed_seed_is_reproducible() {
    let market = flat_market(&[0.2, 0.3, 0.25], &[-0.01, -0.02, 0.005], 0.4, 0.01);
    for (constraint, rebalancing) in [
        (ConstraintMode::OnlyLong, RebalancingPolicy::Baseline),
        (
            ConstraintMode::LongShortLimit {
                long_limit: 1.25,
                short_limit: 0.25,
            },
            RebalancingPolicy::Dynamic,
        ),
    ] {
        let config = TvsConfig {
            constraint,
            rebalancing,
            frequency: Frequency::Dates(vec![0.25, 0.5, 0.75, 1.0]),
            optimizer_trials: 3,
            worker_rank: 2,
            run_offset: 40,
            ..TvsConfig::default()
        };
        let engine = TvsEngine::from_config(
            &config,
            market.model.clone(),
            market.variance_curves.clone(),
            market.discounting.clone(),
        )
        .unwrap();
        let run = |seed| {
            engine
                .run_batch(InverseCumulativeNormalRng::new(seed), 10, None, None)
                .unwrap()
        };
        let a = run(config.seed());
        let b = run(config.seed());
        let c = run(config.seed() + 1);
        assert_eq!(a, b);
        assert_ne!(a.terminal_values, c.terminal_values);
        assert!(a.terminal_values.iter().all(|v| v.is_finite() && *v > 0.0));
    }
}

#[test]
fn static_strategy_matches_closed_form() {
    let market = flat_market(&[0.2, 0.3], &[-0.03, -0.02], 0.3, 0.01);
    let config = TvsConfig {
        maturity: 1.0,
        fine_steps: 4,
        n_paths: 8_000,
        n_blocks: 20,
        strike: 1.0,
        ..TvsConfig::default()
    };
    let engine = TvsEngine::from_config(
        &config,
        market.model.clone(),
        market.variance_curves.clone(),
        market.discounting.clone(),
    )
    .unwrap();

    let drift = Drift::new(market.model.forward_curves().to_vec()).unwrap();
    let nu = CholeskyTDependent::new(
        market.variance_curves.clone(),
        market.model.correlation().clone(),
    )
    .unwrap();
    let curve = TvsForwardCurve::new(
        config.initial_index,
        config.target_volatility,
        engine.baseline().clone(),
        drift,
        nu,
        market.discounting.clone(),
    )
    .with_breakpoints(&market.repo_dates);

    let t = engine.generator().grid().maturity();
    assert_relative_eq!(t, 1.0, max_relative = 1e-12);
    let report = engine
        .run_batch(InverseCumulativeNormalRng::new(5), config.n_paths, None, None)
        .unwrap();

    let (mean, err) = report.mean_index(config.n_blocks, BlockRemainder::Reject).unwrap();
    let forward = curve.forward(t).unwrap();
    assert!(forward > 1.0);
    assert!((mean - forward).abs() < 5.0 * err + 1e-4, "{mean} ± {err} vs {forward}");

    let (price, price_err) = report.price(config.n_blocks, BlockRemainder::Reject).unwrap();
    let reference = curve.call_price(config.strike, t).unwrap();
    assert!(
        (price - reference).abs() < 5.0 * price_err + 1e-4,
        "{price} ± {price_err} vs {reference}"
    );
}
