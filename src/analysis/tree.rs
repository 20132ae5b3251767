//! CART decision tree classifier over the five reading features.
//!
//! Splits minimise weighted Gini impurity over axis-aligned thresholds placed
//! halfway between adjacent distinct feature values. Candidate splits are
//! scanned in feature order and ties keep the first candidate found, so a
//! fit is fully determined by its input rows.

use crate::model::{FEATURE_COUNT, RiskError, RiskLabel};

const CLASS_COUNT: usize = RiskLabel::CLASSES.len();

/// Stopping rules for tree growth.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        label: RiskLabel,
        samples: usize,
    },
    Split {
        feature: usize,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    root: Node,
}

type Sample = [f64; FEATURE_COUNT];

fn class_index(label: RiskLabel) -> usize {
    RiskLabel::CLASSES
        .iter()
        .position(|&c| c == label)
        .unwrap_or(0)
}

fn gini(counts: &[usize; CLASS_COUNT], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

/// Majority class; ties go to the least severe class.
fn majority(counts: &[usize; CLASS_COUNT]) -> RiskLabel {
    let mut best = 0;
    for i in 1..CLASS_COUNT {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    RiskLabel::CLASSES[best]
}

struct Candidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Builder<'a> {
    samples: &'a [Sample],
    classes: Vec<usize>,
    params: &'a TreeParams,
}

impl Builder<'_> {
    fn counts(&self, indices: &[usize]) -> [usize; CLASS_COUNT] {
        let mut counts = [0; CLASS_COUNT];
        for &i in indices {
            counts[self.classes[i]] += 1;
        }
        counts
    }

    fn build(&self, indices: Vec<usize>, depth: usize) -> Node {
        let counts = self.counts(&indices);
        let leaf = Node::Leaf {
            label: majority(&counts),
            samples: indices.len(),
        };

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_small = indices.len() < self.params.min_samples_split;
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_small || too_deep {
            return leaf;
        }

        let Some(best) = self.best_split(&indices, &counts) else {
            return leaf;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.samples[i][best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.build(left, depth + 1)),
            right: Box::new(self.build(right, depth + 1)),
        }
    }

    fn best_split(&self, indices: &[usize], totals: &[usize; CLASS_COUNT]) -> Option<Candidate> {
        let n = indices.len();
        let mut best: Option<Candidate> = None;

        for feature in 0..FEATURE_COUNT {
            let mut order = indices.to_vec();
            order.sort_by(|&a, &b| self.samples[a][feature].total_cmp(&self.samples[b][feature]));

            let mut left = [0usize; CLASS_COUNT];
            for pos in 0..n - 1 {
                left[self.classes[order[pos]]] += 1;

                let here = self.samples[order[pos]][feature];
                let next = self.samples[order[pos + 1]][feature];
                if here == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                let mut right = *totals;
                for c in 0..CLASS_COUNT {
                    right[c] -= left[c];
                }
                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;

                let improves = match &best {
                    None => true,
                    Some(b) => impurity < b.impurity - 1e-12,
                };
                if improves {
                    let mut threshold = here + (next - here) / 2.0;
                    if threshold >= next {
                        threshold = here;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

impl DecisionTree {
    /// Fits a tree to `samples` with matching `labels`.
    ///
    /// Labels must be one of `RiskLabel::CLASSES`.
    pub fn fit(
        samples: &[Sample],
        labels: &[RiskLabel],
        params: &TreeParams,
    ) -> Result<Self, RiskError> {
        if samples.is_empty() || samples.len() != labels.len() {
            return Err(RiskError::EmptyHistory);
        }
        let builder = Builder {
            samples,
            classes: labels.iter().map(|&l| class_index(l)).collect(),
            params,
        };
        let root = builder.build((0..samples.len()).collect(), 0);
        Ok(DecisionTree { root })
    }

    pub fn predict(&self, sample: &Sample) -> RiskLabel {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { label, .. } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Fraction of `samples` whose prediction matches `labels`.
    /// Returns 0.0 for an empty set.
    pub fn accuracy(&self, samples: &[Sample], labels: &[RiskLabel]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let correct = samples
            .iter()
            .zip(labels)
            .filter(|(s, l)| self.predict(s) == **l)
            .count();
        correct as f64 / samples.len() as f64
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    pub fn leaf_count(&self) -> usize {
        fn walk(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => walk(left) + walk(right),
            }
        }
        walk(&self.root)
    }

    /// Training samples that reached each leaf, left to right.
    pub fn leaf_sizes(&self) -> Vec<usize> {
        fn walk(node: &Node, out: &mut Vec<usize>) {
            match node {
                Node::Leaf { samples, .. } => out.push(*samples),
                Node::Split { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(level: f64, rain: f64, soil: f64) -> Sample {
        [level, rain, soil, 25.0, 85.0]
    }

    #[test]
    fn test_single_class_fits_a_single_leaf() {
        let xs = vec![sample(100.0, 0.0, 50.0), sample(150.0, 1.0, 60.0)];
        let ys = vec![RiskLabel::Normal, RiskLabel::Normal];
        let tree = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(&sample(999.0, 99.0, 99.0)), RiskLabel::Normal);
    }

    #[test]
    fn test_learns_a_level_threshold() {
        let xs: Vec<Sample> = (0..10).map(|i| sample(100.0 + 50.0 * i as f64, 0.0, 50.0)).collect();
        // Levels 100..=550; at or above 400 is Danger.
        let ys: Vec<RiskLabel> = xs
            .iter()
            .map(|s| if s[0] >= 400.0 { RiskLabel::Danger } else { RiskLabel::Normal })
            .collect();
        let tree = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        assert_eq!(tree.leaf_count(), 2);
        // Threshold sits halfway between 350 and 400.
        assert_eq!(tree.predict(&sample(370.0, 0.0, 50.0)), RiskLabel::Normal);
        assert_eq!(tree.predict(&sample(380.0, 0.0, 50.0)), RiskLabel::Danger);
    }

    #[test]
    fn test_fits_training_data_exactly_without_depth_limit() {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for level in [120.0, 250.0, 310.0, 420.0] {
            for rain in [0.0, 10.0, 30.0, 60.0] {
                for soil in [60.0, 90.0, 97.0] {
                    let s = sample(level, rain, soil);
                    let label = if level >= 400.0 || rain > 50.0 {
                        RiskLabel::Danger
                    } else if level >= 300.0
                        || (rain > 25.0 && soil > 85.0)
                        || (rain > 5.0 && soil > 95.0)
                    {
                        RiskLabel::Alert
                    } else {
                        RiskLabel::Normal
                    };
                    xs.push(s);
                    ys.push(label);
                }
            }
        }
        let tree = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        assert_eq!(tree.accuracy(&xs, &ys), 1.0);
        assert_eq!(tree.leaf_sizes().iter().sum::<usize>(), xs.len());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let xs: Vec<Sample> = (0..30)
            .map(|i| sample((i * 17 % 450) as f64, (i * 7 % 60) as f64, (i * 13 % 100) as f64))
            .collect();
        let ys: Vec<RiskLabel> = xs
            .iter()
            .map(|s| {
                if s[0] >= 400.0 {
                    RiskLabel::Danger
                } else if s[0] >= 300.0 {
                    RiskLabel::Alert
                } else {
                    RiskLabel::Normal
                }
            })
            .collect();
        let a = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        let b = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let xs: Vec<Sample> = (0..12).map(|i| sample(i as f64 * 40.0, 0.0, 50.0)).collect();
        let ys: Vec<RiskLabel> = (0..12)
            .map(|i| RiskLabel::CLASSES[i % 3])
            .collect();
        let params = TreeParams {
            max_depth: Some(1),
            min_samples_split: 2,
        };
        let tree = DecisionTree::fit(&xs, &ys, &params).unwrap();
        assert!(tree.depth() <= 1);
        assert!(tree.leaf_count() <= 2);
    }

    #[test]
    fn test_identical_features_with_mixed_labels_stop_at_majority_leaf() {
        let xs = vec![sample(100.0, 0.0, 50.0); 3];
        let ys = vec![RiskLabel::Alert, RiskLabel::Alert, RiskLabel::Normal];
        let tree = DecisionTree::fit(&xs, &ys, &TreeParams::default()).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(&xs[0]), RiskLabel::Alert);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let result = DecisionTree::fit(&[], &[], &TreeParams::default());
        assert_eq!(result, Err(RiskError::EmptyHistory));
    }
}
