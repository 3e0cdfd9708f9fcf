use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rand::Rng;
use tracing::info;

use crate::activation::ActivationFunction;
use crate::data::DatasetCache;
use crate::error::{Error, Result};
use crate::experiment::options::TrainOptions;
use crate::experiment::session::train_on_mnist;
use crate::report;

/// The hyperparameter an experiment varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentKind {
    LearningRate,
    Momentum,
    InitialWeightsRange,
    ActivationFunction,
}

impl FromStr for ExperimentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<ExperimentKind> {
        match s.to_ascii_lowercase().as_str() {
            "learningrate" => Ok(ExperimentKind::LearningRate),
            "momentum" => Ok(ExperimentKind::Momentum),
            "initialweightsrange" | "standarddeviation" => Ok(ExperimentKind::InitialWeightsRange),
            "activationfunction" => Ok(ExperimentKind::ActivationFunction),
            other => Err(Error::InvalidArgument(format!("unknown experiment kind '{other}'"))),
        }
    }
}

/// One point of a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepValue {
    Number(f64),
    Activation(ActivationFunction),
}

impl fmt::Display for SweepValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepValue::Number(v) => write!(f, "{v}"),
            SweepValue::Activation(a) => write!(f, "{a}"),
        }
    }
}

impl ExperimentKind {
    /// Parses a JSON array of sweep values: numbers for the numeric kinds, activation names
    /// for [`ExperimentKind::ActivationFunction`].
    pub fn parse_values(self, json: &str) -> Result<Vec<SweepValue>> {
        let values = match self {
            ExperimentKind::ActivationFunction => serde_json::from_str::<Vec<String>>(json)?
                .iter()
                .map(|name| name.parse().map(SweepValue::Activation))
                .collect::<Result<Vec<_>>>()?,
            _ => serde_json::from_str::<Vec<f64>>(json)?
                .into_iter()
                .map(SweepValue::Number)
                .collect(),
        };
        if values.is_empty() {
            return Err(Error::InvalidArgument("experiment needs at least one value".into()));
        }
        Ok(values)
    }

    /// `base` with the swept field replaced by `value`.
    pub fn apply(self, base: &TrainOptions, value: SweepValue) -> Result<TrainOptions> {
        let mut options = base.clone();
        match (self, value) {
            (ExperimentKind::LearningRate, SweepValue::Number(v)) => options.learning_rate = v,
            (ExperimentKind::Momentum, SweepValue::Number(v)) => options.momentum = v,
            (ExperimentKind::InitialWeightsRange, SweepValue::Number(v)) => options.initial_weights_range = v,
            (ExperimentKind::ActivationFunction, SweepValue::Activation(a)) => options.activation = a,
            (kind, value) => {
                return Err(Error::InvalidArgument(format!("value {value} does not fit a {kind:?} experiment")));
            }
        }
        Ok(options)
    }
}

/// Trains `repetitions` fresh networks for every value and writes one side-by-side log per
/// value to `<prefix>_<value>.csv`. Returns the written paths in sweep order.
///
/// Every run goes the full `max_epochs` (threshold forced to 0) and is evaluated after each
/// epoch. Datasets are loaded once through `cache`.
pub fn run_experiment<R: Rng + ?Sized>(
    kind: ExperimentKind,
    values: &[SweepValue],
    base: &TrainOptions,
    repetitions: usize,
    prefix: &str,
    cache: &mut DatasetCache,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    if repetitions == 0 {
        return Err(Error::InvalidArgument("repetitions must be > 0".into()));
    }

    let mut paths = Vec::with_capacity(values.len());
    for &value in values {
        let mut options = kind.apply(base, value)?;
        options.error_threshold = 0.0;
        options.evaluate_each_epoch = true;

        info!(experiment = ?kind, %value, repetitions, "running experiment");
        let mut results = Vec::with_capacity(repetitions);
        for _ in 0..repetitions {
            results.push(train_on_mnist(&options, cache, rng)?);
        }

        let path = PathBuf::from(format!("{prefix}_{value}.csv"));
        report::write_log(&path, &report::experiment_log(&results))?;
        paths.push(path);
    }
    Ok(paths)
}
