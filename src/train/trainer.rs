use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::data::Sample;
use crate::error::{Error, Result};
use crate::eval::{self, EvaluationResult};
use crate::loss::AbsoluteError;
use crate::math::{vector, Matrix};
use crate::network::{Network, OutputMode};
use crate::optim::{Sgd, Velocity};
use crate::train::backprop::backpropagate;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainingConfig;
use crate::train::training_result::TrainingResult;

/// Where a [`Trainer`] is in its run.
///
/// `Initializing → Iterating → (Converged | MaxEpochsReached | Stopped | Diverged)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    /// Buffers allocated, no epoch run yet.
    Initializing,
    Iterating,
    /// The mean batch error dropped to the threshold.
    Converged,
    MaxEpochsReached,
    /// The stop flag was raised or the progress receiver went away.
    Stopped,
    /// The mean batch error became NaN.
    Diverged,
}

/// Owns a network for the duration of a training run, together with the gradient
/// accumulators and the momentum buffers.
///
/// [`train`](Trainer::train) drives the whole epoch loop; [`step`](Trainer::step) runs a
/// single accumulate-and-update on a caller-chosen batch.
pub struct Trainer {
    network: Network,
    config: TrainingConfig,
    optimizer: Sgd,
    state: TrainerState,
    epoch: usize,
    nabla_weights: Vec<Matrix>,
    nabla_biases: Vec<Vec<f64>>,
    velocities: Vec<Velocity>,
    epoch_errors: Vec<f64>,
    evaluations: Vec<EvaluationResult>,
}

impl Trainer {
    pub fn new(network: Network, config: TrainingConfig) -> Result<Trainer> {
        config.validate()?;
        let expected_mode = if config.encoder {
            OutputMode::Reconstruction
        } else {
            OutputMode::Classifier
        };
        if network.mode() != expected_mode {
            return Err(Error::InvalidConfiguration(format!(
                "network mode {:?} does not match encoder = {}",
                network.mode(),
                config.encoder
            )));
        }

        let layers = network.layers();
        let nabla_weights = layers.iter().map(|l| l.zeroed_weights()).collect();
        let nabla_biases = layers.iter().map(|l| l.zeroed_biases()).collect();
        let velocities = layers.iter().map(Velocity::zeroed).collect();

        Ok(Trainer {
            optimizer: Sgd::new(config.learning_rate, config.momentum),
            epoch_errors: Vec::with_capacity(config.max_epochs),
            evaluations: Vec::new(),
            network,
            config,
            state: TrainerState::Initializing,
            epoch: 0,
            nabla_weights,
            nabla_biases,
            velocities,
        })
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    /// Epochs completed so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn epoch_errors(&self) -> &[f64] {
        &self.epoch_errors
    }

    /// Forgets the previous update so the next step carries no momentum.
    pub fn reset_momentum(&mut self) {
        self.velocities.iter_mut().for_each(Velocity::clear);
    }

    /// Accumulates gradients over `batch`, applies one momentum update to every layer and
    /// returns the mean absolute error of the batch (measured before the update).
    pub fn step(&mut self, batch: &[&Sample]) -> Result<f64> {
        if batch.is_empty() {
            return Err(Error::InvalidArgument("cannot train on an empty batch".into()));
        }

        let accumulated = self.accumulate(batch);
        if accumulated.is_err() {
            self.clear_gradients();
        }
        let error = accumulated? / batch.len() as f64;

        let layers = self.network.layers_mut().iter_mut();
        let grads = self.nabla_weights.iter().zip(&self.nabla_biases);
        for ((layer, (w_grad, b_grad)), velocity) in layers.zip(grads).zip(&mut self.velocities) {
            self.optimizer.step(layer, w_grad, b_grad, batch.len(), velocity);
        }

        self.clear_gradients();
        Ok(error)
    }

    /// Runs epochs until the mean batch error reaches the threshold or `max_epochs` is hit.
    ///
    /// Every epoch draws a fresh random permutation of `training` and uses its first
    /// `batch_size` samples (all of them if the set is smaller). `test` is only read when
    /// per-epoch evaluation is on or the run is verbose.
    pub fn train<R: Rng + ?Sized>(
        mut self,
        training: &[Sample],
        test: &[Sample],
        rng: &mut R,
    ) -> Result<TrainingResult> {
        if training.is_empty() {
            return Err(Error::InvalidArgument("training set is empty".into()));
        }
        if self.config.evaluate_each_epoch && test.is_empty() {
            return Err(Error::InvalidArgument(
                "per-epoch evaluation needs a non-empty test set".into(),
            ));
        }

        let batch_size = self.config.batch_size.min(training.len());
        self.log_start(batch_size);

        if self.config.verbose && !self.config.encoder && !test.is_empty() {
            let initial = eval::evaluate(&self.network, test)?;
            info!("initial state, test accuracy {:.2}", initial.percentage());
        }

        // One random sample is followed through training when reconstructions are logged.
        let snapshot = match (self.config.reconstruction.clone(), self.config.encoder) {
            (Some(log), true) => {
                let values = &training[rng.gen_range(0..training.len())].values;
                log.write_original(values)?;
                Some((log, values))
            }
            _ => None,
        };

        let mut indices: Vec<usize> = (0..training.len()).collect();
        let mut error = f64::INFINITY;
        self.state = TrainerState::Iterating;

        while error > self.config.error_threshold && self.epoch < self.config.max_epochs {
            if self.stop_requested() {
                self.state = TrainerState::Stopped;
                break;
            }

            let t_start = Instant::now();
            self.epoch += 1;

            indices.shuffle(rng);
            let batch: Vec<&Sample> = indices[..batch_size].iter().map(|&i| &training[i]).collect();
            error = self.step(&batch)?;
            self.epoch_errors.push(error);

            let evaluation = if self.config.evaluate_each_epoch {
                let evaluation = eval::evaluate(&self.network, test)?;
                self.evaluations.push(evaluation);
                Some(evaluation)
            } else {
                None
            };

            self.log_epoch(error, evaluation, test)?;
            if let (Some((log, values)), true) = (&snapshot, self.config.verbose) {
                log.write_epoch(self.epoch, &self.network.forward(values)?)?;
            }

            let stats = EpochStats {
                epoch: self.epoch,
                max_epochs: self.config.max_epochs,
                error,
                evaluation,
                elapsed_ms: t_start.elapsed().as_millis() as u64,
            };
            if let Some(ref tx) = self.config.progress_tx {
                // If the receiver has been dropped, stop training.
                if tx.send(stats).is_err() {
                    self.state = TrainerState::Stopped;
                    break;
                }
            }
        }

        if self.state == TrainerState::Iterating {
            self.state = if error.is_nan() {
                warn!(epoch = self.epoch, "training diverged: mean error is NaN");
                TrainerState::Diverged
            } else if error <= self.config.error_threshold {
                TrainerState::Converged
            } else {
                TrainerState::MaxEpochsReached
            };
        }

        info!(epochs = self.epoch, state = ?self.state, final_error = error, "training finished");
        Ok(self.into_result())
    }

    pub fn into_result(self) -> TrainingResult {
        TrainingResult {
            network: self.network,
            epochs: self.epoch,
            epoch_errors: self.epoch_errors,
            evaluations: self.evaluations,
            state: self.state,
        }
    }

    /// Sums per-sample gradients into the accumulators and returns the summed error.
    fn accumulate(&mut self, batch: &[&Sample]) -> Result<f64> {
        let mut error_sum = 0.0;
        for sample in batch {
            let bp = backpropagate(&self.network, &sample.values, &sample.expected)?;
            for (acc, grad) in self.nabla_weights.iter_mut().zip(&bp.nabla_weights) {
                *acc += grad;
            }
            for (acc, grad) in self.nabla_biases.iter_mut().zip(&bp.nabla_biases) {
                vector::add_assign(acc, grad);
            }
            error_sum += AbsoluteError::loss(&bp.solution, &sample.expected);
        }
        Ok(error_sum)
    }

    fn clear_gradients(&mut self) {
        self.nabla_weights.iter_mut().for_each(Matrix::clear);
        for b in &mut self.nabla_biases {
            b.iter_mut().for_each(|x| *x = 0.0);
        }
    }

    fn stop_requested(&self) -> bool {
        self.config
            .stop_flag
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    fn log_start(&self, batch_size: usize) {
        let network = &self.network;
        info!(
            sizes = ?network.sizes(),
            learning_rate = self.config.learning_rate,
            momentum = self.config.momentum,
            error_threshold = self.config.error_threshold,
            max_epochs = self.config.max_epochs,
            batch_size,
            activation = %network.activation(),
            initial_weights_range = network.initial_weights_range(),
            encoder = self.config.encoder,
            "starting training"
        );
    }

    fn log_epoch(&self, error: f64, evaluation: Option<EvaluationResult>, test: &[Sample]) -> Result<()> {
        if !self.config.verbose {
            debug!(epoch = self.epoch, error, "epoch done");
            return Ok(());
        }
        if self.config.encoder {
            info!("epoch {}, error {:.3}", self.epoch, error);
            return Ok(());
        }
        let evaluation = match evaluation {
            Some(e) => Some(e),
            None if !test.is_empty() => Some(eval::evaluate(&self.network, test)?),
            None => None,
        };
        match evaluation {
            Some(e) => info!("epoch {}, error {:.3}, test {:.2}", self.epoch, error, e.percentage()),
            None => info!("epoch {}, error {:.3}", self.epoch, error),
        }
        Ok(())
    }
}

/// Trains `network` with `config` on `training`, scoring against `test` when asked to.
pub fn train_network<R: Rng + ?Sized>(
    network: Network,
    training: &[Sample],
    test: &[Sample],
    config: TrainingConfig,
    rng: &mut R,
) -> Result<TrainingResult> {
    Trainer::new(network, config)?.train(training, test, rng)
}

impl Network {
    /// Consumes the network and returns it trained inside the [`TrainingResult`].
    pub fn train<R: Rng + ?Sized>(
        self,
        training: &[Sample],
        test: &[Sample],
        config: TrainingConfig,
        rng: &mut R,
    ) -> Result<TrainingResult> {
        train_network(self, training, test, config, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::loss::QuadraticLoss;
    use crate::train::ReconstructionLog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};

    fn network(sizes: &[usize], mode: OutputMode, seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        Network::new(ActivationFunction::Sigmoid, 0.5, sizes, mode, &mut rng).unwrap()
    }

    fn xor_like() -> Vec<Sample> {
        vec![
            Sample::classification(vec![0.0, 0.0], 0, 2).unwrap(),
            Sample::classification(vec![0.0, 1.0], 1, 2).unwrap(),
            Sample::classification(vec![1.0, 0.0], 1, 2).unwrap(),
            Sample::classification(vec![1.0, 1.0], 0, 2).unwrap(),
        ]
    }

    #[test]
    fn zero_threshold_runs_every_epoch() {
        let data = xor_like();
        let config = TrainingConfig::new(0.5, 0.9, 17, 3);
        let mut rng = StdRng::seed_from_u64(1);
        let result = network(&[2, 3, 2], OutputMode::Classifier, 1)
            .train(&data, &[], config, &mut rng)
            .unwrap();

        assert_eq!(result.epochs, 17);
        assert_eq!(result.epoch_errors.len(), 17);
        assert!(result.evaluations.is_empty());
        assert_eq!(result.state, TrainerState::MaxEpochsReached);
    }

    #[test]
    fn generous_threshold_converges_after_first_epoch() {
        let data = xor_like();
        let config = TrainingConfig {
            error_threshold: 10.0,
            ..TrainingConfig::new(0.5, 0.0, 50, 4)
        };
        let mut rng = StdRng::seed_from_u64(2);
        let result = network(&[2, 3, 2], OutputMode::Classifier, 2)
            .train(&data, &[], config, &mut rng)
            .unwrap();
        assert_eq!(result.epochs, 1);
        assert_eq!(result.state, TrainerState::Converged);
    }

    #[test]
    fn per_epoch_evaluation_is_recorded() {
        let data = xor_like();
        let config = TrainingConfig {
            evaluate_each_epoch: true,
            ..TrainingConfig::new(0.5, 0.9, 5, 10)
        };
        let mut rng = StdRng::seed_from_u64(3);
        let result = network(&[2, 3, 2], OutputMode::Classifier, 3)
            .train(&data, &data, config, &mut rng)
            .unwrap();
        assert_eq!(result.evaluations.len(), 5);
        assert!(result.evaluations.iter().all(|e| e.total == 4));
    }

    #[test]
    fn per_epoch_evaluation_without_test_set_is_rejected() {
        let config = TrainingConfig {
            evaluate_each_epoch: true,
            ..TrainingConfig::new(0.5, 0.9, 5, 10)
        };
        let mut rng = StdRng::seed_from_u64(3);
        let res = network(&[2, 3, 2], OutputMode::Classifier, 3).train(&xor_like(), &[], config, &mut rng);
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let res = network(&[2, 2], OutputMode::Classifier, 0)
            .train(&[], &[], TrainingConfig::new(0.1, 0.0, 1, 1), &mut rng);
        assert!(matches!(res, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn encoder_flag_must_match_network_mode() {
        let config = TrainingConfig { encoder: true, ..TrainingConfig::new(0.1, 0.0, 1, 1) };
        let res = Trainer::new(network(&[2, 2], OutputMode::Classifier, 0), config);
        assert!(matches!(res, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn single_small_step_decreases_error() {
        let sample = Sample::classification(vec![0.3, -0.7, 0.5], 1, 2).unwrap();
        let net = network(&[3, 4, 2], OutputMode::Classifier, 11);
        let before = QuadraticLoss::loss(&net.forward(&sample.values).unwrap(), &sample.expected);

        let mut trainer = Trainer::new(net, TrainingConfig::new(0.01, 0.0, 1, 1)).unwrap();
        trainer.step(&[&sample]).unwrap();
        let after_out = trainer.network().forward(&sample.values).unwrap();
        let after = QuadraticLoss::loss(&after_out, &sample.expected);

        assert!(after < before, "{after} !< {before}");
    }

    #[test]
    fn step_reports_mean_absolute_error_of_batch() {
        let data = xor_like();
        let net = network(&[2, 3, 2], OutputMode::Classifier, 5);
        let expected: f64 = data
            .iter()
            .map(|s| AbsoluteError::loss(&net.forward(&s.values).unwrap(), &s.expected))
            .sum::<f64>()
            / data.len() as f64;

        let mut trainer = Trainer::new(net, TrainingConfig::new(0.5, 0.0, 1, 4)).unwrap();
        let batch: Vec<&Sample> = data.iter().collect();
        assert!((trainer.step(&batch).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn zeroed_momentum_replays_the_plain_sgd_trajectory() {
        let data = xor_like();
        let batches: Vec<Vec<&Sample>> = vec![
            vec![&data[0], &data[2]],
            vec![&data[1], &data[3]],
            vec![&data[3], &data[0]],
            vec![&data[2], &data[1]],
        ];

        let mut plain = Trainer::new(network(&[2, 3, 2], OutputMode::Classifier, 8), TrainingConfig::new(0.5, 0.0, 10, 2)).unwrap();
        let mut heavy = Trainer::new(network(&[2, 3, 2], OutputMode::Classifier, 8), TrainingConfig::new(0.5, 0.9, 10, 2)).unwrap();
        let mut carried = Trainer::new(network(&[2, 3, 2], OutputMode::Classifier, 8), TrainingConfig::new(0.5, 0.9, 10, 2)).unwrap();

        for batch in &batches {
            plain.step(batch).unwrap();
            heavy.reset_momentum();
            heavy.step(batch).unwrap();
            carried.step(batch).unwrap();
        }

        assert_eq!(plain.network(), heavy.network());
        assert_ne!(plain.network(), carried.network());
    }

    #[test]
    fn batch_size_is_clamped_to_training_set() {
        let data = xor_like();
        let config = TrainingConfig::new(0.5, 0.9, 3, 1000);
        let mut rng = StdRng::seed_from_u64(4);
        let result = network(&[2, 3, 2], OutputMode::Classifier, 4)
            .train(&data, &[], config, &mut rng)
            .unwrap();
        assert_eq!(result.epochs, 3);
        assert!(result.epoch_errors.iter().all(|e| e.is_finite()));
    }

    #[test]
    fn stop_flag_halts_between_epochs() {
        let flag = Arc::new(AtomicBool::new(true));
        let config = TrainingConfig {
            stop_flag: Some(flag),
            ..TrainingConfig::new(0.5, 0.9, 10, 2)
        };
        let mut rng = StdRng::seed_from_u64(6);
        let result = network(&[2, 2], OutputMode::Classifier, 6)
            .train(&xor_like(), &[], config, &mut rng)
            .unwrap();
        assert_eq!(result.epochs, 0);
        assert_eq!(result.state, TrainerState::Stopped);
    }

    #[test]
    fn progress_channel_receives_one_stat_per_epoch() {
        let (tx, rx) = mpsc::channel();
        let config = TrainingConfig {
            progress_tx: Some(tx),
            ..TrainingConfig::new(0.5, 0.9, 4, 2)
        };
        let mut rng = StdRng::seed_from_u64(7);
        let result = network(&[2, 2], OutputMode::Classifier, 7)
            .train(&xor_like(), &[], config, &mut rng)
            .unwrap();
        let stats: Vec<EpochStats> = rx.try_iter().collect();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats.iter().map(|s| s.epoch).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(stats.iter().map(|s| s.error).collect::<Vec<_>>(), result.epoch_errors);
    }

    #[test]
    fn runaway_learning_rate_surfaces_as_divergence() {
        let data = xor_like();
        let mut net_params = network(&[2, 2], OutputMode::Classifier, 9).to_params();
        net_params.layers[0].weights[0][0] = f64::NAN;
        let net = Network::from_params(net_params).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let result = net.train(&data, &[], TrainingConfig::new(0.5, 0.0, 5, 4), &mut rng).unwrap();
        assert_eq!(result.state, TrainerState::Diverged);
        assert_eq!(result.epochs, 1);
        assert!(result.epoch_errors[0].is_nan());
    }

    #[test]
    fn autoencoder_learns_to_reduce_reconstruction_error() {
        let data: Vec<Sample> = (0..4)
            .map(|i| {
                let mut v = vec![0.1; 4];
                v[i] = 0.9;
                Sample::reconstruction(v, i)
            })
            .collect();
        let config = TrainingConfig {
            encoder: true,
            ..TrainingConfig::new(2.0, 0.5, 400, 4)
        };
        let mut rng = StdRng::seed_from_u64(10);
        let result = network(&[4, 3, 4], OutputMode::Reconstruction, 10)
            .train(&data, &[], config, &mut rng)
            .unwrap();
        let first = result.epoch_errors[0];
        let last = result.final_error().unwrap();
        assert!(last < first * 0.5, "{last} vs {first}");
    }

    #[test]
    fn encoder_snapshots_follow_one_sample_through_verbose_epochs() {
        let dir = std::env::temp_dir().join(format!("mnist-mlp-trainer-recon-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let data: Vec<Sample> = (0..4)
            .map(|i| {
                let mut v = vec![0.0; 4];
                v[i] = 1.0;
                Sample::reconstruction(v, i)
            })
            .collect();
        let log = ReconstructionLog::new(&dir);
        let config = TrainingConfig {
            encoder: true,
            verbose: true,
            reconstruction: Some(log.clone()),
            ..TrainingConfig::new(0.5, 0.9, 3, 4)
        };
        let mut rng = StdRng::seed_from_u64(12);
        network(&[4, 2, 4], OutputMode::Reconstruction, 12)
            .train(&data, &[], config, &mut rng)
            .unwrap();

        assert!(log.original_path().exists());
        for epoch in 1..=3 {
            let img = image::open(log.epoch_path(epoch)).unwrap().to_luma8();
            assert_eq!(img.dimensions(), (2, 2));
        }
        assert!(!log.epoch_path(4).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn snapshots_need_verbose_epochs_and_encoder_mode() {
        let dir = std::env::temp_dir().join(format!("mnist-mlp-trainer-quiet-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let log = ReconstructionLog::new(&dir);
        let data = xor_like();

        let config = TrainingConfig {
            reconstruction: Some(log.clone()),
            verbose: true,
            ..TrainingConfig::new(0.5, 0.9, 2, 4)
        };
        let mut rng = StdRng::seed_from_u64(13);
        network(&[2, 2], OutputMode::Classifier, 13)
            .train(&data, &[], config, &mut rng)
            .unwrap();
        assert!(!dir.exists());

        let encoder_data: Vec<Sample> = data.iter().map(|s| Sample::reconstruction(s.values.clone(), s.label)).collect();
        let config = TrainingConfig {
            encoder: true,
            reconstruction: Some(log.clone()),
            ..TrainingConfig::new(0.5, 0.9, 2, 4)
        };
        network(&[2, 2], OutputMode::Reconstruction, 13)
            .train(&encoder_data, &[], config, &mut rng)
            .unwrap();
        assert!(log.original_path().exists());
        assert!(!log.epoch_path(1).exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}
