//! Integration tests for module exports.
//!
//! Every public type the calibration crate builds on must be reachable both
//! through its module path and through the flattened re-exports.

use std::sync::Arc;

use chrono::NaiveDate;

fn valuation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

#[test]
fn test_types_module_exports() {
    use curve_core::types::currency::{Currency, CurrencyPair};
    use curve_core::types::error::{CurrencyError, SolverError};
    use curve_core::types::index::{RateIndex, Tenor};

    let pair = CurrencyPair::new(Currency::EUR, Currency::USD).unwrap();
    assert_eq!(pair.inverse().base(), Currency::USD);
    assert!(matches!(
        CurrencyPair::new(Currency::USD, Currency::USD),
        Err(CurrencyError::SameCurrency(_))
    ));

    let index = RateIndex::new("USD-LIBOR-3M", Currency::USD, Tenor::ThreeMonth);
    assert_eq!(index.tenor(), Tenor::ThreeMonth);
    assert_eq!(index.currency(), Currency::USD);

    let err = SolverError::MaxIterationsExceeded { iterations: 7 };
    assert!(err.to_string().contains('7'));
}

#[test]
fn test_market_data_module_exports() {
    use curve_core::market_data::curves::{
        CurveInterpolation, CurveName, InterpolatedCurve, JacobianCalibrationMatrix, JacobianColumn,
        ValueType, YieldCurve,
    };
    use curve_core::market_data::{MarketData, PointSensitivities, QuoteId, RatesProvider};
    use curve_core::types::Currency;

    let curve = InterpolatedCurve::new(
        "USD-OIS",
        vec![1.0, 5.0],
        vec![0.04, 0.045],
        ValueType::ZeroRate,
        CurveInterpolation::Linear,
    )
    .unwrap();
    let column = JacobianColumn {
        curve: CurveName::new("USD-OIS"),
        node: "1Y".to_string(),
        quote_id: QuoteId::new("OIS-1Y"),
    };
    let jacobian = JacobianCalibrationMatrix::new(vec![column], nalgebra::DMatrix::from_element(2, 1, 1.0)).unwrap();
    let curve = curve.with_jacobian(jacobian).unwrap();
    assert!(curve.jacobian().is_some());

    let market = MarketData::new(valuation_date()).with_quote("OIS-1Y", 0.04);
    assert_eq!(market.quote(&QuoteId::new("OIS-1Y")), Some(0.04));

    let provider = RatesProvider::builder(valuation_date())
        .discount_curve(Currency::USD, curve.clone())
        .build();
    let df = provider.discount_factor(Currency::USD, 1.0).unwrap();
    assert!((df - curve.discount_factor(1.0).unwrap()).abs() < 1e-15);

    let extended = RatesProvider::empty(valuation_date()).with_curves([Arc::new(curve)]);
    assert!(extended.contains_curve(&CurveName::new("USD-OIS")));

    let sensitivities = provider.parameter_sensitivity(&PointSensitivities::empty()).unwrap();
    assert_eq!(sensitivities.iter().count(), 0);
}

#[test]
fn test_math_module_exports() {
    use curve_core::math::linalg::{lu_solve, DEFAULT_MIN_PIVOT_RATIO};
    use curve_core::math::solvers::{ConvergenceResult, NewtonSystemConfig, NewtonSystemSolver, NonlinearSystem};
    use nalgebra::{DMatrix, DVector};

    let a = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
    let x = lu_solve(&a, &DVector::from_vec(vec![1.0, 2.0]), DEFAULT_MIN_PIVOT_RATIO).unwrap();
    assert!((4.0 * x[0] + x[1] - 1.0).abs() < 1e-14);

    struct Square;

    impl NonlinearSystem for Square {
        type Error = std::convert::Infallible;

        fn dimension(&self) -> usize {
            1
        }

        fn residuals(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
            Ok(vec![x[0] * x[0] - 2.0])
        }

        fn jacobian(&self, x: &[f64]) -> Result<DMatrix<f64>, Self::Error> {
            Ok(DMatrix::from_element(1, 1, 2.0 * x[0]))
        }
    }

    let result = NewtonSystemSolver::new(NewtonSystemConfig::high_precision())
        .solve(&Square, vec![1.0])
        .unwrap();
    match result {
        ConvergenceResult::Converged(solution) => {
            assert!((solution.parameters[0] - 2.0_f64.sqrt()).abs() < 1e-12);
        }
        ConvergenceResult::Failed(failure) => panic!("did not converge: {:?}", failure),
    }
}

#[test]
fn test_flattened_reexports() {
    use curve_core::market_data::{CurveInterpolation, CurveName, InterpolatedCurve, MarketDataError, ValueType};
    use curve_core::types::{Currency, RateIndex};

    let err = InterpolatedCurve::new("BAD", vec![], vec![], ValueType::ZeroRate, CurveInterpolation::Linear)
        .unwrap_err();
    assert!(matches!(err, MarketDataError::InvalidCurve { .. }));
    assert_eq!(CurveName::from("X").as_str(), "X");
    assert_eq!(RateIndex::overnight("USD-SOFR", Currency::USD).name(), "USD-SOFR");
}

#[cfg(feature = "serde")]
#[test]
fn test_identifiers_serialise() {
    use curve_core::market_data::curves::CurveName;
    use curve_core::market_data::QuoteId;
    use curve_core::types::{Currency, RateIndex, Tenor};

    let json = serde_json::to_string(&CurveName::new("USD-OIS")).unwrap();
    assert_eq!(json, "\"USD-OIS\"");
    let quote: QuoteId = serde_json::from_str("\"OIS-1Y\"").unwrap();
    assert_eq!(quote.as_str(), "OIS-1Y");

    let index = RateIndex::new("EUR-EURIBOR-6M", Currency::EUR, Tenor::SixMonth);
    let parsed: RateIndex = serde_json::from_str(&serde_json::to_string(&index).unwrap()).unwrap();
    assert_eq!(parsed, index);
}
