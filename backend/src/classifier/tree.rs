//! CART decision tree for the two-class outbreak problem

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::services::features::FEATURE_COUNT;

/// Number of label classes (no outbreak, outbreak)
pub const N_CLASSES: usize = 2;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Non-constant features examined per split
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Weighted class distribution, normalized to sum to 1
        distribution: [f64; N_CLASSES],
    },
}

/// Training view shared by every node of one tree
pub struct TrainingSet<'a> {
    pub features: &'a [[f64; FEATURE_COUNT]],
    pub labels: &'a [u8],
    /// Per-sample weight (bootstrap multiplicity times class weight)
    pub weights: &'a [f64],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    position: usize,
    children_impurity: f64,
}

impl DecisionTree {
    /// Grow a tree on `samples`, which index into `data` and must all carry
    /// positive weight.
    ///
    /// Returns the tree and its unnormalized impurity decrease per feature.
    pub fn fit<R: Rng>(
        data: &TrainingSet<'_>,
        samples: &mut [usize],
        params: &TreeParams,
        rng: &mut R,
    ) -> (Self, [f64; FEATURE_COUNT]) {
        let mut builder = Builder {
            data,
            params,
            nodes: Vec::new(),
            importances: [0.0; FEATURE_COUNT],
        };
        builder.grow(samples, 0, rng);
        (
            DecisionTree {
                nodes: builder.nodes,
            },
            builder.importances,
        )
    }

    /// Class distribution of the leaf `features` falls into
    pub fn predict_distribution(&self, features: &[f64; FEATURE_COUNT]) -> [f64; N_CLASSES] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return *distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural check used when loading a persisted forest
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { .. } => true,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < FEATURE_COUNT
                        && *left > idx
                        && *right > idx
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

struct Builder<'a, 'b> {
    data: &'a TrainingSet<'b>,
    params: &'a TreeParams,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl Builder<'_, '_> {
    fn grow<R: Rng>(&mut self, samples: &mut [usize], depth: usize, rng: &mut R) -> usize {
        let totals = self.class_totals(samples);
        let weight: f64 = totals.iter().sum();
        let impurity = gini(&totals);

        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: normalize(totals),
        });

        let n = samples.len();
        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || impurity <= f64::EPSILON
        {
            return node_idx;
        }

        let Some(best) = self.best_split(samples, rng) else {
            return node_idx;
        };

        self.importances[best.feature] += weight * impurity - best.children_impurity;

        let feature = best.feature;
        samples.sort_by(|a, b| {
            self.data.features[*a][feature].total_cmp(&self.data.features[*b][feature])
        });
        let (left_samples, right_samples) = samples.split_at_mut(best.position);

        let left = self.grow(left_samples, depth + 1, rng);
        let right = self.grow(right_samples, depth + 1, rng);
        self.nodes[node_idx] = Node::Split {
            feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_idx
    }

    /// Lowest weighted child impurity over a random subset of features
    fn best_split<R: Rng>(&self, samples: &mut [usize], rng: &mut R) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
        order.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;

        for feature in order {
            if visited >= self.params.max_features {
                break;
            }
            let values = &self.data.features;
            samples.sort_by(|a, b| values[*a][feature].total_cmp(&values[*b][feature]));

            let first = values[samples[0]][feature];
            let last = values[samples[samples.len() - 1]][feature];
            if first == last {
                continue;
            }
            visited += 1;

            if let Some(candidate) = self.scan_feature(samples, feature) {
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.children_impurity < b.children_impurity);
                if better {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Scan the thresholds of one feature; `samples` must be sorted on it
    fn scan_feature(&self, samples: &[usize], feature: usize) -> Option<SplitCandidate> {
        let totals = self.class_totals(samples);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let n = samples.len();

        let mut left = [0.0; N_CLASSES];
        let mut best: Option<SplitCandidate> = None;

        for position in 1..n {
            let prev = samples[position - 1];
            left[self.data.labels[prev] as usize] += self.data.weights[prev];

            if position < min_leaf || n - position < min_leaf {
                continue;
            }
            let lo = self.data.features[prev][feature];
            let hi = self.data.features[samples[position]][feature];
            if lo == hi {
                continue;
            }

            let right = [totals[0] - left[0], totals[1] - left[1]];
            let children_impurity =
                gini(&left) * left.iter().sum::<f64>() + gini(&right) * right.iter().sum::<f64>();

            if best
                .as_ref()
                .map_or(true, |b| children_impurity < b.children_impurity)
            {
                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    position,
                    children_impurity,
                });
            }
        }

        best
    }

    fn class_totals(&self, samples: &[usize]) -> [f64; N_CLASSES] {
        let mut totals = [0.0; N_CLASSES];
        for &s in samples {
            totals[self.data.labels[s] as usize] += self.data.weights[s];
        }
        totals
    }
}

fn gini(totals: &[f64; N_CLASSES]) -> f64 {
    let total: f64 = totals.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - totals.iter().map(|w| (w / total).powi(2)).sum::<f64>()
}

fn normalize(totals: [f64; N_CLASSES]) -> [f64; N_CLASSES] {
    let total: f64 = totals.iter().sum();
    if total <= 0.0 {
        return [1.0 / N_CLASSES as f64; N_CLASSES];
    }
    [totals[0] / total, totals[1] / total]
}
