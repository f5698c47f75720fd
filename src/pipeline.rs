//! Fit / predict / assess orchestration.
//!
//! `fit` samples nonevents, extracts labeled windows, cross-validates the local
//! classifier and keeps the refitted model. `predict` scores a dense window grid
//! with that model and selects local maxima. `assess` matches the selected
//! events against ground truth.

use crate::assess::{self, OutcomeSeries};
use crate::config::PipelineConfig;
use crate::data::{check_subset, common_channels, Deployments, EventSet, SensorSeries};
use crate::error::{Error, Result};
use crate::features::{extract_at, extract_dense, sample_nonevents};
use crate::global::{GlobalPrediction, GlobalStage};
use crate::model::{cross_validate, LabeledWindows, LocalClassifier, LocalModel, ScoreSeries};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub struct Stickleback<C: LocalClassifier> {
    classifier: C,
    config: PipelineConfig,
    model: Option<C::Model>,
    channels: Vec<String>,
    cv_scores: Deployments<ScoreSeries>,
}

impl<C: LocalClassifier> Stickleback<C> {
    pub fn new(classifier: C, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier,
            config,
            model: None,
            channels: Vec::new(),
            cv_scores: Deployments::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn model(&self) -> Option<&C::Model> {
        self.model.as_ref()
    }

    /// Out-of-fold local scores of the labeled training windows from the last `fit`.
    pub fn cv_scores(&self) -> &Deployments<ScoreSeries> {
        &self.cv_scores
    }

    pub fn global_stage(&self) -> GlobalStage {
        GlobalStage::new(self.config.radius(), self.config.global.floor)
    }

    /// Train the local model. Every deployment in `sensors` needs a non-empty event set.
    ///
    /// A fresh random source seeded from the config drives nonevent sampling
    /// (deployments in key order) and then fold assignment, so repeated fits on
    /// the same data are identical.
    pub fn fit(
        &mut self,
        sensors: &Deployments<SensorSeries>,
        events: &Deployments<EventSet>,
    ) -> Result<()> {
        check_subset(events, sensors)?;
        check_subset(sensors, events)?;
        if let Some((id, _)) = events.iter().find(|(_, e)| e.is_empty()) {
            return Err(Error::EmptyEventSet {
                deployment: id.clone(),
            });
        }
        let channels = common_channels(sensors)?;
        let win_size = self.config.win_size;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let nonevents = sample_nonevents(sensors, events, win_size, &self.config.nonevent, &mut rng)?;
        let event_windows = extract_at(sensors, events, win_size)?;
        let nonevent_windows = extract_at(sensors, &nonevents, win_size)?;
        let data = LabeledWindows::build(&event_windows, &nonevent_windows)?;
        info!(
            deployments = sensors.len(),
            windows = data.len(),
            events = data.labels().iter().filter(|&&l| l).count(),
            "labeled training windows"
        );

        let cv = cross_validate(&self.classifier, &data, self.config.n_folds, &mut rng)?;
        info!(n_folds = self.config.n_folds, "local model fitted");

        self.model = Some(cv.model);
        self.cv_scores = cv.out_of_fold;
        self.channels = channels;
        Ok(())
    }

    /// Local scores on every `nth` window and the event flags selected from them.
    pub fn predict(
        &self,
        sensors: &Deployments<SensorSeries>,
    ) -> Result<Deployments<GlobalPrediction>> {
        let model = self.model.as_ref().ok_or(Error::NotFitted)?;
        for (id, series) in sensors {
            if series.channels() != self.channels.as_slice() {
                return Err(Error::ChannelMismatch {
                    deployment: id.clone(),
                    expected: self.channels.clone(),
                    found: series.channels().to_vec(),
                });
            }
        }

        let stage = self.global_stage();
        let dense = extract_dense(sensors, self.config.win_size, self.config.nth)?;
        let mut out = Deployments::new();
        for (id, table) in dense {
            let scores = model.predict_proba(table.windows())?;
            if scores.len() != table.len() {
                return Err(Error::Classifier(format!(
                    "model returned {} scores for {} windows",
                    scores.len(),
                    table.len()
                )));
            }
            let local = ScoreSeries {
                timestamps: table.anchors().to_vec(),
                positions: table.positions().to_vec(),
                scores: scores.to_vec(),
            };
            let prediction = stage.predict(local);
            info!(
                deployment = %id,
                windows = table.len(),
                events = prediction.is_event.iter().filter(|&&e| e).count(),
                "predicted deployment"
            );
            out.insert(id, prediction);
        }
        Ok(out)
    }

    /// TP/FP/FN outcomes per deployment using the configured tolerance.
    pub fn assess(
        &self,
        predictions: &Deployments<GlobalPrediction>,
        events: &Deployments<EventSet>,
    ) -> Result<Deployments<OutcomeSeries>> {
        assess::assess(predictions, events, self.config.tol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LogisticRegression;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ndarray::{Array1, Array2, ArrayView3, Axis};

    /// Scores every window 0.5 regardless of training data.
    struct Flat;

    impl LocalClassifier for Flat {
        type Model = Flat;

        fn fit(&self, _windows: ArrayView3<'_, f64>, _labels: &[bool]) -> Result<Flat> {
            Ok(Flat)
        }
    }

    impl LocalModel for Flat {
        fn predict_proba(&self, windows: ArrayView3<'_, f64>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(windows.len_of(Axis(0)), 0.5))
        }
    }

    fn tiny() -> (Deployments<SensorSeries>, Deployments<EventSet>) {
        let t0: DateTime<Utc> = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let values = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let s = SensorSeries::uniform(t0, Duration::seconds(1), vec!["a".into()], values).unwrap();
        let ev: EventSet = [s.timestamps()[10]].into_iter().collect();
        let mut sensors = Deployments::new();
        let mut events = Deployments::new();
        sensors.insert("d1".to_string(), s);
        events.insert("d1".to_string(), ev);
        (sensors, events)
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            win_size: 3,
            nth: 1,
            tol_ms: 2_000,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn predict_before_fit_fails() {
        let (sensors, _) = tiny();
        let sb = Stickleback::new(LogisticRegression::default(), config()).unwrap();
        assert!(matches!(sb.predict(&sensors), Err(Error::NotFitted)));
    }

    #[test]
    fn fit_rejects_empty_event_set() {
        let (sensors, mut events) = tiny();
        events.insert("d1".to_string(), EventSet::new());
        let mut sb = Stickleback::new(LogisticRegression::default(), config()).unwrap();
        assert!(matches!(
            sb.fit(&sensors, &events),
            Err(Error::EmptyEventSet { .. })
        ));
        assert!(!sb.is_fitted());
    }

    #[test]
    fn fit_rejects_events_for_unknown_deployment() {
        let (sensors, mut events) = tiny();
        let extra = events["d1"].clone();
        events.insert("d2".to_string(), extra);
        let mut sb = Stickleback::new(LogisticRegression::default(), config()).unwrap();
        match sb.fit(&sensors, &events) {
            Err(Error::DeploymentMismatch { deployment }) => assert_eq!(deployment, "d2"),
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let bad = PipelineConfig {
            win_size: 0,
            ..config()
        };
        assert!(Stickleback::new(LogisticRegression::default(), bad).is_err());
    }

    #[test]
    fn predict_rejects_different_channels() {
        let (sensors, events) = tiny();
        let mut sb = Stickleback::new(Flat, config()).unwrap();
        sb.fit(&sensors, &events).unwrap();

        let renamed = SensorSeries::new(
            sensors["d1"].timestamps().to_vec(),
            vec!["b".into()],
            sensors["d1"].values().to_owned(),
        )
        .unwrap();
        let mut other = Deployments::new();
        other.insert("d1".to_string(), renamed);
        match sb.predict(&other) {
            Err(Error::ChannelMismatch {
                deployment,
                expected,
                found,
            }) => {
                assert_eq!(deployment, "d1");
                assert_eq!(expected, vec!["a".to_string()]);
                assert_eq!(found, vec!["b".to_string()]);
            }
            other => panic!("unexpected {:?}", other.err()),
        }
    }

    #[test]
    fn huge_configured_tolerance_assesses_without_overflow() {
        let (sensors, events) = tiny();
        let huge = PipelineConfig {
            tol_ms: 10_000_000_000_000_000,
            ..config()
        };
        assert!(huge.validate().is_ok());
        let mut sb = Stickleback::new(Flat, huge).unwrap();
        sb.fit(&sensors, &events).unwrap();
        let predictions = sb.predict(&sensors).unwrap();
        let outcomes = sb.assess(&predictions, &events).unwrap();
        assert_eq!(outcomes["d1"].len(), predictions["d1"].events().len());
    }

    #[test]
    fn assess_rejects_unknown_deployment() {
        let (_, events) = tiny();
        let sb = Stickleback::new(LogisticRegression::default(), config()).unwrap();
        let mut predictions = Deployments::new();
        predictions.insert(
            "zz".to_string(),
            GlobalPrediction {
                local: ScoreSeries {
                    timestamps: vec![],
                    positions: vec![],
                    scores: vec![],
                },
                is_event: vec![],
            },
        );
        assert!(matches!(
            sb.assess(&predictions, &events),
            Err(Error::DeploymentMismatch { .. })
        ));
    }
}
