//! Market fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use tvs_core::{Real, Time};
use tvs_math::CorrelationStructure;
use tvs_processes::LocalVolatilityModel;
use tvs_termstructures::{
    DiscountCurve, EquityForwardCurve, FlatDiscountCurve, ForwardCurve, ForwardVariance,
    LocalConstantVol, LocalVolSurface, VarianceCurve,
};

/// A basket with flat local volatilities and matching variance curves.
pub struct Market {
    pub model: Arc<LocalVolatilityModel>,
    pub variance_curves: Vec<Arc<dyn VarianceCurve>>,
    pub discounting: Arc<dyn DiscountCurve>,
    pub repo_dates: Vec<Time>,
}

/// `vols[i]` flat volatilities, repo `repos[i]` constant up to `T = 2`,
/// flat short rate `rate`.
pub fn flat_market(vols: &[Real], repos: &[Real], rho: Real, rate: Real) -> Market {
    let n = vols.len();
    let discounting: Arc<dyn DiscountCurve> = Arc::new(FlatDiscountCurve::new(rate));
    let forwards: Vec<Arc<dyn ForwardCurve>> = repos
        .iter()
        .map(|&q| {
            Arc::new(EquityForwardCurve::new(1.0, discounting.clone(), &[q], &[2.0]).unwrap())
                as Arc<dyn ForwardCurve>
        })
        .collect();
    let local_vols: Vec<Arc<dyn LocalVolSurface>> = vols
        .iter()
        .map(|&v| Arc::new(LocalConstantVol::new(v).unwrap()) as Arc<dyn LocalVolSurface>)
        .collect();
    let variance_curves: Vec<Arc<dyn VarianceCurve>> = vols
        .iter()
        .map(|&v| Arc::new(ForwardVariance::flat(v).unwrap()) as Arc<dyn VarianceCurve>)
        .collect();
    let mut corr = vec![rho; n * n];
    for i in 0..n {
        corr[i * n + i] = 1.0;
    }
    let correlation = CorrelationStructure::from_row_slice(n, &corr).unwrap();
    Market {
        model: Arc::new(LocalVolatilityModel::new(forwards, local_vols, correlation).unwrap()),
        variance_curves,
        discounting,
        repo_dates: vec![2.0],
    }
}
