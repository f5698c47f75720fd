//! Integration test: config load, window extraction scenario, round trip through
//! every stage, seed regression of fit → predict → assess.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray::{Array1, Array2, ArrayView3, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;
use stickleback::{
    assess::{Outcome, OutcomeTable},
    config::{NoneventConfig, PipelineConfig},
    data::{split_deployments, subset, synthetic_deployments, SyntheticConfig},
    features::{extract_at, extract_dense, sample_nonevents},
    Deployments, EventSet, GaussianNaiveBayes, LocalClassifier, LocalModel, LogisticRegression,
    SensorSeries, Stickleback,
};

/// Remembers the event windows it was trained on; scores 1.0 for those, 0.0 otherwise.
struct Memorizer;

struct MemorizedWindows(Vec<Vec<u64>>);

fn fingerprint(w: ndarray::ArrayView2<'_, f64>) -> Vec<u64> {
    w.iter().map(|v| v.to_bits()).collect()
}

impl LocalClassifier for Memorizer {
    type Model = MemorizedWindows;

    fn fit(&self, windows: ArrayView3<'_, f64>, labels: &[bool]) -> stickleback::Result<MemorizedWindows> {
        Ok(MemorizedWindows(
            windows
                .axis_iter(Axis(0))
                .zip(labels)
                .filter(|(_, l)| **l)
                .map(|(w, _)| fingerprint(w))
                .collect(),
        ))
    }
}

impl LocalModel for MemorizedWindows {
    fn predict_proba(&self, windows: ArrayView3<'_, f64>) -> stickleback::Result<Array1<f64>> {
        Ok(windows
            .axis_iter(Axis(0))
            .map(|w| if self.0.contains(&fingerprint(w)) { 1.0 } else { 0.0 })
            .collect())
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
}

/// Two deployments of `n` one-second samples; every window is distinct.
fn ramp_sensors(n: usize) -> Deployments<SensorSeries> {
    let mut sensors = Deployments::new();
    for (id, sign) in [("d1", 1.0), ("d2", -1.0)] {
        let values = Array2::from_shape_fn((n, 2), |(i, c)| sign * ((i * i) as f64 + c as f64));
        let s = SensorSeries::uniform(t0(), Duration::seconds(1), vec!["a".into(), "b".into()], values)
            .unwrap();
        sensors.insert(id.to_string(), s);
    }
    sensors
}

fn events_at(sensors: &Deployments<SensorSeries>, offsets: &[usize]) -> Deployments<EventSet> {
    sensors
        .iter()
        .map(|(id, s)| (id.clone(), offsets.iter().map(|&i| s.timestamps()[i]).collect()))
        .collect()
}

#[test]
fn config_load_default() {
    let c = PipelineConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c, PipelineConfig::default());
    assert_eq!(c.win_size, 20);
}

#[test]
fn config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stickleback.json");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, r#"{{"win_size": 12, "tol_ms": 2500, "nonevent": {{"ratio": 2.0}}}}"#).unwrap();

    let c = PipelineConfig::load(&path);
    assert_eq!(c.win_size, 12);
    assert_eq!(c.tol(), Duration::milliseconds(2500));
    assert_eq!(c.nonevent.ratio, 2.0);
    assert_eq!(c.n_folds, 2);
}

#[test]
fn config_strict_load_reports_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        PipelineConfig::from_json_file(&path),
        Err(stickleback::Error::Json(_))
    ));
    // lenient load falls back to defaults
    assert_eq!(PipelineConfig::load(&path), PipelineConfig::default());
}

#[test]
fn twenty_sample_scenario() {
    let sensors = ramp_sensors(20);
    let events = events_at(&sensors, &[2, 6]);

    let dense = extract_dense(&sensors, 3, 1).unwrap();
    assert_eq!(dense["d1"].len(), 18);
    assert_eq!(dense["d1"].win_size(), 3);

    let mut rng = StdRng::seed_from_u64(1234);
    let nonevents = sample_nonevents(&sensors, &events, 3, &NoneventConfig::default(), &mut rng).unwrap();
    for (id, anchors) in &nonevents {
        for e in &events[id] {
            for a in anchors {
                assert!((*a - *e).abs() > Duration::seconds(3));
            }
        }
    }
}

#[test]
fn memorized_event_windows_round_trip_to_all_true_positives() {
    let sensors = ramp_sensors(80);
    let events = events_at(&sensors, &[10, 30, 55]);

    // Event windows scored directly are exactly the remembered ones.
    let windows = extract_at(&sensors, &events, 3).unwrap();
    let model = Memorizer
        .fit(windows["d1"].windows(), &[true, true, true])
        .unwrap();
    assert!(model
        .predict_proba(windows["d1"].windows())
        .unwrap()
        .iter()
        .all(|&p| p == 1.0));

    let config = PipelineConfig {
        win_size: 3,
        nth: 1,
        tol_ms: 1_000,
        ..PipelineConfig::default()
    };
    let mut sb = Stickleback::new(Memorizer, config).unwrap();
    sb.fit(&sensors, &events).unwrap();
    let predictions = sb.predict(&sensors).unwrap();
    for (id, p) in &predictions {
        assert_eq!(p.events(), events[id].iter().copied().collect::<Vec<_>>());
    }

    let outcomes = sb.assess(&predictions, &events).unwrap();
    for (id, series) in &outcomes {
        assert_eq!(series.len(), events[id].len());
        assert!(series.values().all(|o| *o == Outcome::TruePositive));
    }
    let table = OutcomeTable::from_outcomes(&outcomes);
    assert_eq!(table.total.true_positives, 6);
    assert_eq!(table.total.f1(), 1.0);
}

#[test]
fn predictions_align_with_sensor_timestamps() {
    let sensors = ramp_sensors(60);
    let events = events_at(&sensors, &[15, 40]);
    let config = PipelineConfig {
        win_size: 4,
        nth: 3,
        ..PipelineConfig::default()
    };
    let mut sb = Stickleback::new(Memorizer, config).unwrap();
    sb.fit(&sensors, &events).unwrap();
    let predictions = sb.predict(&sensors).unwrap();
    for (id, p) in &predictions {
        // floor((60 - 4) / 3) + 1
        assert_eq!(p.local.len(), 19);
        assert_eq!(p.is_event.len(), p.local.len());
        for t in &p.local.timestamps {
            assert!(sensors[id].index_of(*t).is_some());
        }
    }
}

#[test]
fn out_of_fold_scores_cover_training_windows() {
    let sensors = ramp_sensors(80);
    let events = events_at(&sensors, &[10, 30, 55]);
    let config = PipelineConfig {
        win_size: 3,
        nth: 1,
        n_folds: 3,
        ..PipelineConfig::default()
    };
    let mut sb = Stickleback::new(Memorizer, config).unwrap();
    sb.fit(&sensors, &events).unwrap();
    // three events plus three nonevents per deployment
    for series in sb.cv_scores().values() {
        assert_eq!(series.len(), 6);
    }
}

fn run_synthetic<C: LocalClassifier>(classifier: C) -> (
    Deployments<stickleback::GlobalPrediction>,
    Deployments<stickleback::OutcomeSeries>,
) {
    let sample = SyntheticConfig {
        deployments: 4,
        samples: 2_000,
        events_per_deployment: 6,
        seed: 99,
        ..SyntheticConfig::default()
    };
    let (sensors, events) = synthetic_deployments(&sample).unwrap();
    let mut rng = StdRng::seed_from_u64(12345);
    let (test_ids, train_ids) = split_deployments(sensors.keys().cloned(), 2, &mut rng);

    let config = PipelineConfig {
        win_size: 20,
        tol_ms: 5_000,
        nth: 5,
        n_folds: 2,
        seed: 1234,
        ..PipelineConfig::default()
    };
    let mut sb = Stickleback::new(classifier, config).unwrap();
    sb.fit(&subset(&sensors, &train_ids), &subset(&events, &train_ids))
        .unwrap();
    let predictions = sb.predict(&subset(&sensors, &test_ids)).unwrap();
    let outcomes = sb
        .assess(&predictions, &subset(&events, &test_ids))
        .unwrap();
    (predictions, outcomes)
}

#[test]
fn seed_regression_logistic() {
    let (pred1, out1) = run_synthetic(LogisticRegression::default());
    let (pred2, out2) = run_synthetic(LogisticRegression::default());
    assert_eq!(pred1.len(), 2);
    for (id, p) in &pred1 {
        assert_eq!(p.local.scores, pred2[id].local.scores);
        assert_eq!(p.events(), pred2[id].events());
        assert_eq!(out1[id], out2[id]);
    }
    let table = OutcomeTable::from_outcomes(&out1);
    assert!(table.total.true_positives > 0);
    assert_eq!(
        table.total.true_positives + table.total.false_negatives,
        12
    );
}

#[test]
fn seed_regression_naive_bayes() {
    let (pred1, out1) = run_synthetic(GaussianNaiveBayes::default());
    let (pred2, out2) = run_synthetic(GaussianNaiveBayes::default());
    assert_eq!(pred1, pred2);
    assert_eq!(out1, out2);
}
