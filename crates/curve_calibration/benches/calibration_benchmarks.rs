//! Benchmarks for curve_calibration.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use curve_calibration::calibration::{
    CalibrationRequest, CurveCalibrator, CurveDefinition, CurveGroupDefinition, CurveNode,
    MarketQuoteSensitivityCalculator,
};
use curve_calibration::instruments::{Frequency, NodeTemplate};
use curve_core::market_data::curves::{CurveInterpolation, ValueType};
use curve_core::market_data::{MarketData, RatesProvider};
use curve_core::types::{Currency, RateIndex, Tenor};

fn valuation_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn sofr() -> RateIndex {
    RateIndex::overnight("USD-SOFR", Currency::USD)
}

fn libor() -> RateIndex {
    RateIndex::new("USD-LIBOR-3M", Currency::USD, Tenor::ThreeMonth)
}

/// OIS group with `count` annual swap nodes, quotes from 3% upwards.
fn ois_group(count: usize) -> (CurveGroupDefinition, MarketData) {
    let mut market = MarketData::new(valuation_date());
    let mut nodes = Vec::with_capacity(count);
    for i in 1..=count {
        let id = format!("OIS-{}Y", i);
        market = market.with_quote(id.as_str(), 0.03 + i as f64 * 0.0005);
        nodes.push(CurveNode::new(
            format!("{}Y", i),
            id,
            NodeTemplate::swap(sofr(), i as f64, Frequency::Annual),
        ));
    }
    let group = CurveGroupDefinition::new("OIS").with_curve(
        CurveDefinition::new("USD-OIS", ValueType::ZeroRate, CurveInterpolation::Linear, nodes),
        vec![Currency::USD],
        vec![sofr()],
    );
    (group, market)
}

/// Forward group with `count` semi-annual swap nodes, discounted on OIS.
fn libor_group(count: usize, mut market: MarketData) -> (CurveGroupDefinition, MarketData) {
    let mut nodes = Vec::with_capacity(count);
    for i in 1..=count {
        let id = format!("3M-IRS-{}Y", i);
        market = market.with_quote(id.as_str(), 0.032 + i as f64 * 0.0005);
        nodes.push(CurveNode::new(
            format!("{}Y", i),
            id,
            NodeTemplate::swap(libor(), i as f64, Frequency::SemiAnnual),
        ));
    }
    let group = CurveGroupDefinition::new("LIBOR").with_forward_curve(
        CurveDefinition::new("USD-3M", ValueType::ZeroRate, CurveInterpolation::Linear, nodes),
        libor(),
    );
    (group, market)
}

fn benchmark_single_group(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate_single_group");
    let calibrator = CurveCalibrator::default();
    let known = RatesProvider::empty(valuation_date());

    for size in [5, 10, 20, 30] {
        let (definition, market) = ois_group(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| calibrator.calibrate(black_box(&[definition.clone()]), &market, &known))
        });
    }

    group.finish();
}

fn benchmark_staged_vs_joint(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate_two_curves");
    let calibrator = CurveCalibrator::default();
    let known = RatesProvider::empty(valuation_date());

    let (ois, market) = ois_group(10);
    let (libor, market) = libor_group(10, market);
    let staged = vec![ois.clone(), libor.clone()];
    let mut joint = CurveGroupDefinition::new("JOINT");
    for entry in ois.entries().iter().chain(libor.entries()) {
        joint = joint.with_curve(
            entry.definition.clone(),
            entry.discount_currencies.clone(),
            entry.indices.clone(),
        );
    }
    let joint = vec![joint];

    group.bench_function("staged", |b| {
        b.iter(|| calibrator.calibrate(black_box(&staged), &market, &known))
    });
    group.bench_function("joint", |b| {
        b.iter(|| calibrator.calibrate(black_box(&joint), &market, &known))
    });

    group.finish();
}

fn benchmark_quote_sensitivity(c: &mut Criterion) {
    let known = RatesProvider::empty(valuation_date());
    let (ois, market) = ois_group(10);
    let (libor, market) = libor_group(10, market);
    let provider = CurveCalibrator::default()
        .calibrate(&[ois, libor], &market, &known)
        .unwrap()
        .into_provider();
    let trade = NodeTemplate::swap(libor(), 7.0, Frequency::SemiAnnual)
        .resolve(0.035, &market, 1e8)
        .unwrap();
    let calculator = MarketQuoteSensitivityCalculator::new();

    c.bench_function("quote_sensitivity_7y_swap", |b| {
        b.iter(|| {
            let pv = trade.present_value(black_box(&provider)).unwrap();
            calculator.point_sensitivity(&pv.sensitivities, &provider)
        })
    });
}

fn benchmark_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("calibrate_batch");
    let calibrator = CurveCalibrator::default();
    let known = RatesProvider::empty(valuation_date());

    for count in [1, 4, 16] {
        let requests: Vec<CalibrationRequest> = (0..count)
            .map(|_| {
                let (ois, market) = ois_group(10);
                CalibrationRequest {
                    groups: vec![ois],
                    market_data: market,
                    known: known.clone(),
                }
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| calibrator.calibrate_batch(black_box(&requests)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_group,
    benchmark_staged_vs_joint,
    benchmark_quote_sensitivity,
    benchmark_batch
);
criterion_main!(benches);
