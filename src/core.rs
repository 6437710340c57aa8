//! Core RANSAC traits and pipeline.
//!
//! The pipeline is assembled from three seams:
//! - an [`Estimator`] turning a sample of rows into candidate models,
//! - a [`Sampler`] drawing minimal samples,
//! - a [`Scoring`] strategy measuring every row against a candidate.
//!
//! [`Ransac`] runs a fixed number of independent trials and folds each trial
//! into a [`RansacOutcome`]. The fold only ever replaces the current best with
//! a strictly better candidate, so the retained score never regresses.
//! Refinement on the inlier set is a separate [`LocalOptimizer`] step the
//! caller composes after the loop.

use std::cmp::Ordering;
use std::fmt::Debug;

use crate::types::DataMatrix;

/// Estimator responsible for generating model hypotheses from samples.
pub trait Estimator {
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample for this estimator.
    fn sample_size(&self) -> usize;

    /// Check whether a given sample is usable: large enough, in range and
    /// free of repeated rows.
    fn is_valid_sample(&self, data: &DataMatrix, sample: &[usize]) -> bool;

    /// Estimate candidate models from a sample of at least `sample_size` rows.
    fn estimate_model(&self, data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model>;

    /// Validate a candidate model before scoring.
    fn is_valid_model(
        &self,
        model: &Self::Model,
        data: &DataMatrix,
        sample: &[usize],
        threshold: f64,
    ) -> bool;
}

/// Sampler responsible for drawing minimal samples from the data.
pub trait Sampler {
    /// Draw `sample_size` distinct row indices into `out_indices`.
    ///
    /// Returns `false` if no sample can be drawn (e.g. too few rows).
    fn sample(&mut self, data: &DataMatrix, sample_size: usize, out_indices: &mut [usize]) -> bool;
}

/// Scoring strategy used to evaluate model quality against all rows.
pub trait Scoring<M> {
    /// Score type. `Default` is the score of a model with no support at all;
    /// a candidate must beat it to be kept.
    type Score: Clone + PartialOrd + Default + Debug;

    /// Inlier/outlier threshold for residuals in the chosen domain.
    fn threshold(&self) -> f64;

    /// Whether a single residual counts as an inlier.
    fn is_inlier(&self, error: f64) -> bool;

    /// Score a model and return the residual of every row, in row order.
    fn score(&self, data: &DataMatrix, model: &M) -> (Self::Score, Vec<f64>);
}

/// Refinement of a model from its inlier rows.
pub trait LocalOptimizer<M> {
    /// Return a refined model, or the input model when refinement is not
    /// possible.
    fn run(&self, data: &DataMatrix, inliers: &[usize], model: &M) -> M;
}

/// Local optimizer that returns the input model unchanged.
pub struct NoopLocalOptimizer;

impl<M: Clone> LocalOptimizer<M> for NoopLocalOptimizer {
    fn run(&self, _data: &DataMatrix, _inliers: &[usize], model: &M) -> M {
        model.clone()
    }
}

/// Least squares local optimizer that refits the model using all inliers.
///
/// Falls back to the input model when there are fewer inliers than a minimal
/// sample or the estimator produces nothing.
pub struct LeastSquaresOptimizer<E>
where
    E: Estimator,
{
    estimator: E,
}

impl<E> LeastSquaresOptimizer<E>
where
    E: Estimator,
{
    pub fn new(estimator: E) -> Self {
        Self { estimator }
    }
}

impl<E> LocalOptimizer<E::Model> for LeastSquaresOptimizer<E>
where
    E: Estimator,
{
    fn run(&self, data: &DataMatrix, inliers: &[usize], model: &E::Model) -> E::Model {
        if inliers.len() < self.estimator.sample_size() {
            log::warn!(
                "skipping refinement: {} inliers, need {}",
                inliers.len(),
                self.estimator.sample_size()
            );
            return model.clone();
        }

        log::debug!("refitting on {} inliers", inliers.len());
        match self.estimator.estimate_model(data, inliers).into_iter().next() {
            Some(refined) => refined,
            None => {
                log::warn!("refit produced no model; keeping the sampled one");
                model.clone()
            }
        }
    }
}

/// Best model of a run together with its support.
#[derive(Debug, Clone, PartialEq)]
pub struct Consensus<M, S> {
    pub model: M,
    pub score: S,
    /// Residual of every row under `model`, in row order.
    pub errors: Vec<f64>,
    /// Index of the trial that produced `model`.
    pub trial: usize,
}

impl<M, S> Consensus<M, S> {
    /// Rows whose residual passes `scoring`'s inlier test.
    pub fn inliers<Sc>(&self, scoring: &Sc) -> Vec<usize>
    where
        Sc: Scoring<M, Score = S>,
    {
        self.errors
            .iter()
            .enumerate()
            .filter(|(_, &e)| scoring.is_inlier(e))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Accumulated RANSAC result.
#[derive(Debug, Clone, PartialEq)]
pub enum RansacOutcome<M, S> {
    /// No trial produced a model with any support.
    NoModel,
    Model(Consensus<M, S>),
}

impl<M, S> Default for RansacOutcome<M, S> {
    fn default() -> Self {
        RansacOutcome::NoModel
    }
}

impl<M, S> RansacOutcome<M, S>
where
    S: PartialOrd + Default,
{
    /// Keep `candidate` only if it strictly beats the current best (or, for
    /// `NoModel`, the empty score).
    pub fn consider(self, candidate: Consensus<M, S>) -> Self {
        let improves = match &self {
            RansacOutcome::NoModel => candidate.score > S::default(),
            RansacOutcome::Model(best) => candidate.score > best.score,
        };
        if improves {
            RansacOutcome::Model(candidate)
        } else {
            self
        }
    }

    /// Combine two partial results.
    ///
    /// The higher score wins; equal scores go to the earlier trial. Merging
    /// is associative and commutative, so any reduction order over the same
    /// trials yields the same result as a sequential pass.
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (RansacOutcome::NoModel, x) | (x, RansacOutcome::NoModel) => x,
            (RansacOutcome::Model(a), RansacOutcome::Model(b)) => {
                let b_wins = match b.score.partial_cmp(&a.score) {
                    Some(Ordering::Greater) => true,
                    Some(Ordering::Equal) => b.trial < a.trial,
                    _ => false,
                };
                RansacOutcome::Model(if b_wins { b } else { a })
            }
        }
    }
}

impl<M, S> RansacOutcome<M, S> {
    pub fn is_model(&self) -> bool {
        matches!(self, RansacOutcome::Model(_))
    }

    pub fn consensus(&self) -> Option<&Consensus<M, S>> {
        match self {
            RansacOutcome::Model(c) => Some(c),
            RansacOutcome::NoModel => None,
        }
    }

    pub fn into_consensus(self) -> Option<Consensus<M, S>> {
        match self {
            RansacOutcome::Model(c) => Some(c),
            RansacOutcome::NoModel => None,
        }
    }

    pub fn model(&self) -> Option<&M> {
        self.consensus().map(|c| &c.model)
    }

    pub fn score(&self) -> Option<&S> {
        self.consensus().map(|c| &c.score)
    }

    pub fn errors(&self) -> Option<&[f64]> {
        self.consensus().map(|c| c.errors.as_slice())
    }
}

impl<M> RansacOutcome<M, crate::scoring::Score> {
    /// Inlier count of the best model, zero for `NoModel`.
    pub fn inlier_count(&self) -> usize {
        self.score().map_or(0, |s| s.inlier_count)
    }
}

/// RANSAC pipeline running a fixed number of trials.
#[derive(Debug)]
pub struct Ransac<E, Sa, Sc>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
{
    pub iterations: usize,
    pub estimator: E,
    pub sampler: Sa,
    pub scoring: Sc,
}

impl<E, Sa, Sc> Ransac<E, Sa, Sc>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring<E::Model>,
{
    pub fn new(iterations: usize, estimator: E, sampler: Sa, scoring: Sc) -> Self {
        Self {
            iterations,
            estimator,
            sampler,
            scoring,
        }
    }

    /// Run exactly `iterations` trials on `data`.
    pub fn run(&mut self, data: &DataMatrix) -> RansacOutcome<E::Model, Sc::Score> {
        self.run_with_observer(data, |_, _| {})
    }

    /// Like [`Ransac::run`], calling `observer(trial, best_so_far)` after
    /// every trial.
    pub fn run_with_observer<F>(
        &mut self,
        data: &DataMatrix,
        mut observer: F,
    ) -> RansacOutcome<E::Model, Sc::Score>
    where
        F: FnMut(usize, &RansacOutcome<E::Model, Sc::Score>),
    {
        let sample_size = self.estimator.sample_size();
        let mut sample = vec![0usize; sample_size];
        let mut best = RansacOutcome::NoModel;

        for trial in 0..self.iterations {
            if self.sampler.sample(data, sample_size, &mut sample) {
                let local = self.evaluate(data, &sample, trial);
                if let Some(c) = local.consensus() {
                    let beats = best.score().map_or(true, |b| c.score > *b);
                    if beats {
                        log::debug!("trial {}: new best {:?}", trial, c.score);
                    }
                }
                best = best.merge(local);
            } else {
                log::trace!("trial {}: no sample drawn from {} rows", trial, data.nrows());
            }
            observer(trial, &best);
        }

        if !best.is_model() {
            log::warn!(
                "no model with support after {} trials on {} rows",
                self.iterations,
                data.nrows()
            );
        }
        best
    }

    /// Fit and score one sample, keeping the best of its candidate models.
    fn evaluate(
        &self,
        data: &DataMatrix,
        sample: &[usize],
        trial: usize,
    ) -> RansacOutcome<E::Model, Sc::Score> {
        if !self.estimator.is_valid_sample(data, sample) {
            log::trace!("trial {}: rejected sample {:?}", trial, sample);
            return RansacOutcome::NoModel;
        }

        let threshold = self.scoring.threshold();
        let mut local = RansacOutcome::NoModel;
        for model in self.estimator.estimate_model(data, sample) {
            if !self.estimator.is_valid_model(&model, data, sample, threshold) {
                continue;
            }
            let (score, errors) = self.scoring.score(data, &model);
            log::trace!("trial {}: sample {:?} scored {:?}", trial, sample, score);
            local = local.consider(Consensus {
                model,
                score,
                errors,
                trial,
            });
        }
        local
    }
}

/// Seed for trial `trial` of a parallel run started from `seed`.
#[cfg(feature = "parallel")]
fn trial_seed(seed: u64, trial: usize) -> u64 {
    // SplitMix64 finalizer, so neighbouring trials get unrelated streams.
    let mut z = seed.wrapping_add((trial as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(feature = "parallel")]
impl<E, Sa, Sc> Ransac<E, Sa, Sc>
where
    E: Estimator + Sync,
    E::Model: Send,
    Sa: Sampler + Sync,
    Sc: Scoring<E::Model> + Sync,
    Sc::Score: Send,
{
    /// Run the trials on the rayon thread pool.
    ///
    /// Every trial draws from its own uniform sampler seeded by
    /// `(seed, trial)`, so the outcome depends only on `seed` and not on the
    /// number of threads. `self.sampler` is not used.
    pub fn run_parallel(&self, data: &DataMatrix, seed: u64) -> RansacOutcome<E::Model, Sc::Score> {
        self.run_parallel_with(data, |trial| {
            crate::samplers::UniformRandomSampler::from_seed(trial_seed(seed, trial))
        })
    }

    /// Run the trials on the rayon thread pool, drawing trial `t`'s sample
    /// from `make_sampler(t)`.
    ///
    /// Results are combined with [`RansacOutcome::merge`]. When the sampler
    /// for trial `t` yields the same sample that [`Ransac::run`] would draw
    /// on trial `t`, both return the same outcome.
    pub fn run_parallel_with<F, T>(
        &self,
        data: &DataMatrix,
        make_sampler: F,
    ) -> RansacOutcome<E::Model, Sc::Score>
    where
        F: Fn(usize) -> T + Sync + Send,
        T: Sampler,
    {
        use rayon::prelude::*;

        let sample_size = self.estimator.sample_size();
        let best = (0..self.iterations)
            .into_par_iter()
            .map(|trial| {
                let mut sampler = make_sampler(trial);
                let mut sample = vec![0usize; sample_size];
                if sampler.sample(data, sample_size, &mut sample) {
                    self.evaluate(data, &sample, trial)
                } else {
                    RansacOutcome::NoModel
                }
            })
            .reduce(|| RansacOutcome::NoModel, RansacOutcome::merge);

        match best.consensus() {
            Some(c) => log::debug!("parallel run: best {:?} from trial {}", c.score, c.trial),
            None => log::warn!(
                "no model with support after {} parallel trials on {} rows",
                self.iterations,
                data.nrows()
            ),
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::DataMatrix;

    #[derive(Clone, Debug, PartialEq)]
    struct MockModel(usize);

    #[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
    struct MockScore(usize);

    /// Model = first sampled row; rows hold their own "support" in column 0.
    struct MockEstimator;

    impl Estimator for MockEstimator {
        type Model = MockModel;

        fn sample_size(&self) -> usize {
            1
        }

        fn is_valid_sample(&self, _data: &DataMatrix, sample: &[usize]) -> bool {
            !sample.is_empty()
        }

        fn estimate_model(&self, _data: &DataMatrix, sample: &[usize]) -> Vec<Self::Model> {
            vec![MockModel(sample[0])]
        }

        fn is_valid_model(
            &self,
            _model: &Self::Model,
            _data: &DataMatrix,
            _sample: &[usize],
            _threshold: f64,
        ) -> bool {
            true
        }
    }

    /// Visits rows in a fixed order.
    struct ScriptedSampler {
        order: Vec<usize>,
        next: usize,
    }

    impl Sampler for ScriptedSampler {
        fn sample(&mut self, _data: &DataMatrix, _sample_size: usize, out_indices: &mut [usize]) -> bool {
            let Some(&row) = self.order.get(self.next) else {
                return false;
            };
            self.next += 1;
            out_indices[0] = row;
            true
        }
    }

    struct MockScoring;

    impl Scoring<MockModel> for MockScoring {
        type Score = MockScore;

        fn threshold(&self) -> f64 {
            1.0
        }

        fn is_inlier(&self, error: f64) -> bool {
            error < 1.0
        }

        fn score(&self, data: &DataMatrix, model: &MockModel) -> (MockScore, Vec<f64>) {
            let support = data[(model.0, 0)] as usize;
            let errors = (0..data.nrows())
                .map(|i| if i < support { 0.0 } else { 5.0 })
                .collect();
            (MockScore(support), errors)
        }
    }

    fn support_data(support: &[usize]) -> DataMatrix {
        let mut data = DataMatrix::zeros(support.len(), 1);
        for (i, s) in support.iter().enumerate() {
            data[(i, 0)] = *s as f64;
        }
        data
    }

    fn pipeline(order: Vec<usize>) -> Ransac<MockEstimator, ScriptedSampler, MockScoring> {
        let iterations = order.len();
        Ransac::new(
            iterations,
            MockEstimator,
            ScriptedSampler { order, next: 0 },
            MockScoring,
        )
    }

    fn consensus(model: usize, score: usize, trial: usize) -> Consensus<MockModel, MockScore> {
        Consensus {
            model: MockModel(model),
            score: MockScore(score),
            errors: Vec::new(),
            trial,
        }
    }

    #[test]
    fn keeps_strictly_best_and_first_on_ties() {
        let data = support_data(&[2, 5, 1, 5, 3]);
        let mut ransac = pipeline(vec![0, 1, 2, 3, 4]);
        let outcome = ransac.run(&data);

        let best = outcome.consensus().unwrap();
        assert_eq!(best.model, MockModel(1));
        assert_eq!(best.score, MockScore(5));
        assert_eq!(best.trial, 1);
        assert_eq!(best.errors.len(), 5);
        assert_eq!(best.inliers(&MockScoring), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn observer_sees_non_decreasing_scores() {
        let data = support_data(&[1, 4, 0, 2, 6, 3, 6]);
        let mut ransac = pipeline(vec![0, 1, 2, 3, 4, 5, 6]);
        let mut history = Vec::new();
        ransac.run_with_observer(&data, |trial, best| {
            history.push((trial, best.score().map_or(0, |s| s.0)));
        });

        assert_eq!(history.len(), 7);
        assert_eq!(
            history.iter().map(|(_, s)| *s).collect::<Vec<_>>(),
            vec![1, 4, 4, 4, 6, 6, 6]
        );
    }

    #[test]
    fn zero_support_everywhere_gives_no_model() {
        let data = support_data(&[0, 0, 0]);
        let mut ransac = pipeline(vec![0, 1, 2]);
        assert_eq!(ransac.run(&data), RansacOutcome::NoModel);
    }

    #[test]
    fn failed_samples_still_count_as_trials() {
        let data = support_data(&[3, 3]);
        let mut ransac = pipeline(vec![0]);
        ransac.iterations = 4;
        let mut calls = 0;
        let outcome = ransac.run_with_observer(&data, |_, _| calls += 1);
        assert_eq!(calls, 4);
        assert_eq!(outcome.model(), Some(&MockModel(0)));
    }

    #[test]
    fn merge_is_order_independent() {
        let a = RansacOutcome::Model(consensus(0, 3, 4));
        let b = RansacOutcome::Model(consensus(1, 3, 2));
        let c = RansacOutcome::Model(consensus(2, 1, 0));

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = c.merge(b.clone().merge(a));
        assert_eq!(left, right);
        assert_eq!(left.model(), Some(&MockModel(1)));
        assert_eq!(RansacOutcome::NoModel.merge(b.clone()), b);
    }

    #[test]
    fn consider_requires_strict_improvement() {
        let empty: RansacOutcome<MockModel, MockScore> = RansacOutcome::NoModel;
        assert_eq!(empty.clone().consider(consensus(0, 0, 0)), RansacOutcome::NoModel);

        let held = empty.consider(consensus(0, 2, 0));
        let tied = held.clone().consider(consensus(1, 2, 1));
        assert_eq!(tied, held);

        let better = tied.consider(consensus(2, 3, 2));
        assert_eq!(better.model(), Some(&MockModel(2)));
    }

    #[test]
    fn least_squares_optimizer_falls_back_with_too_few_inliers() {
        let data = support_data(&[1, 2]);
        let lo = LeastSquaresOptimizer::new(MockEstimator);
        assert_eq!(lo.run(&data, &[], &MockModel(7)), MockModel(7));
        assert_eq!(lo.run(&data, &[1, 0], &MockModel(7)), MockModel(1));
        assert_eq!(NoopLocalOptimizer.run(&data, &[1], &MockModel(7)), MockModel(7));
    }
}
