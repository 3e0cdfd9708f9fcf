use rand::Rng;
use tracing::info;

use crate::data::{DatasetCache, DatasetKey, DatasetRole};
use crate::error::Result;
use crate::experiment::options::TrainOptions;
use crate::network::{Network, OutputMode};
use crate::train::{Trainer, TrainingConfig, TrainingResult};

/// Builds a fresh network from `options`, loads (or reuses) the training and test sets and
/// trains it.
///
/// When `options.validation_path` is set, the trained classifier is also scored on that set
/// and the result logged.
pub fn train_on_mnist<R: Rng + ?Sized>(
    options: &TrainOptions,
    cache: &mut DatasetCache,
    rng: &mut R,
) -> Result<TrainingResult> {
    train_on_mnist_with(options, options.training_config(), cache, rng)
}

/// Same as [`train_on_mnist`], with a caller-supplied config (e.g. one carrying a progress
/// channel).
pub fn train_on_mnist_with<R: Rng + ?Sized>(
    options: &TrainOptions,
    config: TrainingConfig,
    cache: &mut DatasetCache,
    rng: &mut R,
) -> Result<TrainingResult> {
    let network = Network::new(
        options.activation,
        options.initial_weights_range,
        &options.sizes,
        options.output_mode(),
        rng,
    )?;
    let trainer = Trainer::new(network, config)?;

    let training_key = DatasetKey::new(&options.training_path, options.normalize_input, options.encoder);
    let test_key = DatasetKey::new(&options.test_path, options.normalize_input, options.encoder);
    cache.load(DatasetRole::Training, &training_key)?;
    cache.load(DatasetRole::Test, &test_key)?;
    let training = cache.samples(DatasetRole::Training);
    let test = cache.samples(DatasetRole::Test);

    let result = trainer.train(training, test, rng)?;

    if let Some(path) = &options.validation_path {
        if result.network.mode() == OutputMode::Classifier {
            let key = DatasetKey::new(path, options.normalize_input, options.encoder);
            let validation = cache.get_or_load(DatasetRole::Validation, &key)?;
            let score = result.network.evaluate(validation)?;
            info!(
                correct = score.correct,
                total = score.total,
                "validation accuracy {:.2}",
                score.percentage()
            );
        }
    }

    Ok(result)
}
