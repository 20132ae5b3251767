//! Lazily trained flood risk classifier.
//!
//! The model starts untrained. The first `predict` call loads the full
//! reading history, labels it, fits a decision tree, and keeps it for the
//! life of the `RiskModel`. The whole check-train-predict sequence runs
//! under one mutex, so concurrent first callers serialize: exactly one of
//! them trains and the rest see the finished model.
//!
//! Two soft failures leave the model untrained and make `predict` return
//! `Indeterminate` so a later call can retry:
//! - the history is empty;
//! - some risk class has a single example and cannot be split.
//!
//! Store failures are hard errors and propagate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::labeling::{self, LabeledReading};
use super::split::stratified_split;
use super::tree::{DecisionTree, TreeParams};
use crate::config::{ModelSettings, RiskThresholds};
use crate::logging::{self, Component};
use crate::model::{FEATURE_COUNT, FEATURE_NAMES, Reading, RiskError, RiskLabel};
use crate::store::ReadingStore;

/// A fitted classifier and its diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub tree: DecisionTree,
    /// Feature names in the order the tree expects them.
    pub feature_names: [&'static str; FEATURE_COUNT],
    /// Accuracy on the held-out split. Diagnostic only.
    pub holdout_accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
}

impl TrainedModel {
    pub fn predict(&self, reading: &Reading) -> RiskLabel {
        self.tree.predict(&reading.features())
    }
}

fn features_and_labels(rows: &[LabeledReading]) -> (Vec<[f64; FEATURE_COUNT]>, Vec<RiskLabel>) {
    rows.iter().map(|r| (r.reading.features(), r.label)).unzip()
}

/// Labels `readings`, splits them, and fits a tree. Pure: touches no state.
pub fn train(
    readings: &[Reading],
    thresholds: &RiskThresholds,
    settings: &ModelSettings,
) -> Result<TrainedModel, RiskError> {
    if readings.is_empty() {
        return Err(RiskError::EmptyHistory);
    }
    for reading in readings {
        reading.validate().map_err(|e| match e {
            RiskError::MalformedReading(detail) => {
                RiskError::MalformedReading(format!("stored history: {}", detail))
            }
            other => other,
        })?;
    }

    let labeled = labeling::label_all(readings, thresholds);
    let split = stratified_split(&labeled, settings.test_fraction, settings.seed)?;

    let (train_x, train_y) = features_and_labels(&split.train);
    let (test_x, test_y) = features_and_labels(&split.test);

    let params = TreeParams {
        max_depth: settings.max_depth,
        min_samples_split: settings.min_samples_split,
    };
    let tree = DecisionTree::fit(&train_x, &train_y, &params)?;
    let holdout_accuracy = tree.accuracy(&test_x, &test_y);

    Ok(TrainedModel {
        tree,
        feature_names: FEATURE_NAMES,
        holdout_accuracy,
        train_size: split.train.len(),
        test_size: split.test.len(),
    })
}

/// Owns the train-once model state.
#[derive(Debug)]
pub struct RiskModel {
    thresholds: RiskThresholds,
    settings: ModelSettings,
    state: Mutex<Option<TrainedModel>>,
    training_runs: AtomicUsize,
}

impl RiskModel {
    pub fn new(thresholds: RiskThresholds, settings: ModelSettings) -> Self {
        RiskModel {
            thresholds,
            settings,
            state: Mutex::new(None),
            training_runs: AtomicUsize::new(0),
        }
    }

    /// Predicts the risk label for `reading`, training first if needed.
    ///
    /// Returns `Indeterminate` when there is no usable history yet.
    pub fn predict(
        &self,
        store: &dyn ReadingStore,
        reading: &Reading,
    ) -> Result<RiskLabel, RiskError> {
        reading.validate()?;

        // A panic mid-training never stores a partial model, so a poisoned
        // lock still guards a consistent `Option`.
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if state.is_none() {
            logging::info(Component::Model, None, "Model not trained yet, training now");
            let history = store.all_readings()?;
            match self.fit(&history) {
                Ok(model) => {
                    logging::log_training_summary(
                        model.train_size,
                        model.test_size,
                        model.holdout_accuracy,
                    );
                    *state = Some(model);
                }
                Err(RiskError::EmptyHistory) => {
                    logging::warn(
                        Component::Model,
                        None,
                        "Reading history is empty, cannot train the model",
                    );
                    return Ok(RiskLabel::Indeterminate);
                }
                Err(e @ RiskError::InsufficientData { .. }) => {
                    logging::warn(Component::Model, None, &format!("Training skipped: {}", e));
                    return Ok(RiskLabel::Indeterminate);
                }
                Err(e) => return Err(e),
            }
        }

        match state.as_ref() {
            Some(model) => Ok(model.predict(reading)),
            None => Ok(RiskLabel::Indeterminate),
        }
    }

    fn fit(&self, history: &[Reading]) -> Result<TrainedModel, RiskError> {
        if history.is_empty() {
            return Err(RiskError::EmptyHistory);
        }
        self.training_runs.fetch_add(1, Ordering::SeqCst);
        train(history, &self.thresholds, &self.settings)
    }

    pub fn is_trained(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    /// Number of training passes attempted on non-empty history.
    pub fn training_runs(&self) -> usize {
        self.training_runs.load(Ordering::SeqCst)
    }

    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.snapshot().map(|m| m.holdout_accuracy)
    }

    /// Feature names of the trained model, if trained.
    pub fn feature_names(&self) -> Option<[&'static str; FEATURE_COUNT]> {
        self.snapshot().map(|m| m.feature_names)
    }

    /// A copy of the trained model, if any.
    pub fn snapshot(&self) -> Option<TrainedModel> {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Hourly history with all three classes well represented.
    fn mixed_history() -> Vec<Reading> {
        (0..60)
            .map(|i| {
                let level = match i % 6 {
                    0 | 1 | 2 => 150.0 + i as f64,
                    3 | 4 => 320.0 + i as f64,
                    _ => 420.0 + i as f64,
                };
                Reading::new(start() + Duration::hours(i), "s1", level, 2.0, 60.0, 25.0, 85.0)
            })
            .collect()
    }

    fn train_default(history: &[Reading]) -> Result<TrainedModel, RiskError> {
        train(history, &RiskThresholds::default(), &ModelSettings::default())
    }

    fn model() -> RiskModel {
        RiskModel::new(RiskThresholds::default(), ModelSettings::default())
    }

    #[test]
    fn test_train_reports_split_sizes_and_accuracy() {
        let trained = train_default(&mixed_history()).unwrap();
        assert_eq!(trained.train_size + trained.test_size, 60);
        assert_eq!(trained.test_size, 12);
        assert!((0.0..=1.0).contains(&trained.holdout_accuracy));
        assert_eq!(trained.feature_names, FEATURE_NAMES);
    }

    #[test]
    fn test_train_is_reproducible() {
        let a = train_default(&mixed_history()).unwrap();
        let b = train_default(&mixed_history()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_train_on_empty_history_is_empty_history_error() {
        let result = train_default(&[]);
        assert_eq!(result, Err(RiskError::EmptyHistory));
    }

    #[test]
    fn test_train_names_the_malformed_stored_row() {
        let mut history = mixed_history();
        history[7].rain_rate_mm_per_h = f64::NAN;

        let result = train_default(&history);

        match result {
            Err(RiskError::MalformedReading(detail)) => {
                assert!(detail.starts_with("stored history:"), "{}", detail);
                assert!(detail.contains("rain_rate_mm_per_h"), "{}", detail);
                assert!(detail.contains("2025-05-01 07:00:00"), "{}", detail);
            }
            other => panic!("expected MalformedReading, got {:?}", other),
        }
    }

    #[test]
    fn test_predict_trains_once_and_classifies() {
        let store = MemoryStore::with_readings(mixed_history());
        let model = model();
        assert!(!model.is_trained());

        let current = Reading::new(start(), "s1", 430.0, 2.0, 60.0, 25.0, 85.0);
        assert_eq!(model.predict(&store, &current).unwrap(), RiskLabel::Danger);
        assert!(model.is_trained());
        assert_eq!(model.training_runs(), 1);

        let calm = Reading::new(start(), "s1", 160.0, 2.0, 60.0, 25.0, 85.0);
        assert_eq!(model.predict(&store, &calm).unwrap(), RiskLabel::Normal);
        assert_eq!(model.training_runs(), 1);
        assert!(model.holdout_accuracy().is_some());
    }

    #[test]
    fn test_predict_on_empty_store_is_indeterminate_and_untrained() {
        let store = MemoryStore::new();
        let model = model();
        let current = Reading::new(start(), "s1", 430.0, 2.0, 60.0, 25.0, 85.0);
        assert_eq!(model.predict(&store, &current).unwrap(), RiskLabel::Indeterminate);
        assert!(!model.is_trained());
        assert_eq!(model.training_runs(), 0);
        assert!(model.feature_names().is_none());
    }

    #[test]
    fn test_predict_rejects_malformed_reading() {
        let store = MemoryStore::with_readings(mixed_history());
        let model = model();
        let current = Reading::new(start(), "s1", f64::INFINITY, 2.0, 60.0, 25.0, 85.0);
        assert!(matches!(model.predict(&store, &current), Err(RiskError::MalformedReading(_))));
        assert!(!model.is_trained());
    }
}
