//! Stratified train/test split.
//!
//! Each class is shuffled independently with a seeded RNG and cut so that
//! its share of the test set matches its share of the data. Classes are
//! visited in a fixed order and share one RNG stream, so identical input
//! and seed always give identical splits.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::labeling::LabeledReading;
use crate::model::{RiskError, RiskLabel};

/// Result of a stratified split. Both halves keep input order within a class.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<LabeledReading>,
    pub test: Vec<LabeledReading>,
}

/// Number of rows of a class with `count` members that go to the test set.
///
/// At least one row lands on each side, which is why a class needs two
/// members to be split at all.
fn test_share(count: usize, test_fraction: f64) -> usize {
    let wanted = (count as f64 * test_fraction).round() as usize;
    wanted.clamp(1, count - 1)
}

/// Splits `rows` into train and test sets, stratified by label.
///
/// Fails with `InsufficientData` if any label present in `rows` has fewer
/// than two members. Labels absent from `rows` are ignored.
pub fn stratified_split(
    rows: &[LabeledReading],
    test_fraction: f64,
    seed: u64,
) -> Result<Split, RiskError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::new(),
        test: Vec::new(),
    };

    for class in RiskLabel::CLASSES {
        let mut members: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.label == class)
            .map(|(i, _)| i)
            .collect();

        match members.len() {
            0 => continue,
            1 => return Err(RiskError::InsufficientData { label: class, count: 1 }),
            _ => {}
        }

        members.shuffle(&mut rng);
        let n_test = test_share(members.len(), test_fraction);
        let (test_idx, train_idx) = members.split_at_mut(n_test);
        test_idx.sort_unstable();
        train_idx.sort_unstable();

        split.test.extend(test_idx.iter().map(|&i| rows[i].clone()));
        split.train.extend(train_idx.iter().map(|&i| rows[i].clone()));
    }

    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;
    use chrono::{Duration, NaiveDate};

    fn rows(normal: usize, alert: usize, danger: usize) -> Vec<LabeledReading> {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let labels = std::iter::repeat(RiskLabel::Normal)
            .take(normal)
            .chain(std::iter::repeat(RiskLabel::Alert).take(alert))
            .chain(std::iter::repeat(RiskLabel::Danger).take(danger));
        labels
            .enumerate()
            .map(|(i, label)| LabeledReading {
                reading: Reading::new(
                    start + Duration::minutes(i as i64),
                    "s1",
                    i as f64,
                    0.0,
                    50.0,
                    25.0,
                    80.0,
                ),
                label,
            })
            .collect()
    }

    fn count(rows: &[LabeledReading], label: RiskLabel) -> usize {
        rows.iter().filter(|r| r.label == label).count()
    }

    #[test]
    fn test_split_preserves_class_proportions() {
        let data = rows(50, 30, 20);
        let split = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(count(&split.test, RiskLabel::Normal), 10);
        assert_eq!(count(&split.test, RiskLabel::Alert), 6);
        assert_eq!(count(&split.test, RiskLabel::Danger), 4);
        assert_eq!(split.train.len(), 80);
        assert_eq!(split.test.len(), 20);
    }

    #[test]
    fn test_split_is_a_partition() {
        let data = rows(13, 7, 5);
        let split = stratified_split(&data, 0.2, 42).unwrap();
        let mut levels: Vec<i64> = split
            .train
            .iter()
            .chain(split.test.iter())
            .map(|r| r.reading.water_level_cm as i64)
            .collect();
        levels.sort_unstable();
        let expected: Vec<i64> = (0..25).collect();
        assert_eq!(levels, expected);
    }

    #[test]
    fn test_same_seed_same_split() {
        let data = rows(40, 12, 9);
        let a = stratified_split(&data, 0.2, 42).unwrap();
        let b = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_two_member_class_puts_one_on_each_side() {
        let data = rows(10, 2, 0);
        let split = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(count(&split.test, RiskLabel::Alert), 1);
        assert_eq!(count(&split.train, RiskLabel::Alert), 1);
    }

    #[test]
    fn test_singleton_class_is_insufficient_data() {
        let data = rows(10, 5, 1);
        let result = stratified_split(&data, 0.2, 42);
        assert_eq!(
            result,
            Err(RiskError::InsufficientData {
                label: RiskLabel::Danger,
                count: 1
            })
        );
    }

    #[test]
    fn test_absent_classes_are_ignored() {
        let data = rows(10, 0, 0);
        let split = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);
    }
}
