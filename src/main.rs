//! Command-line front end: train, test, inspect and sweep MNIST multilayer perceptrons.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mnist_mlp::data::{mnist, viewer, DatasetCache};
use mnist_mlp::experiment::{self, ExperimentKind};
use mnist_mlp::{report, ActivationFunction, Network, Output, OutputMode, TrainOptions};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mnist-mlp")]
#[command(about = "MNIST multilayer perceptron and autoencoder trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// JSON file with training options; flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for weight initialization and batch sampling
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Per-run overrides of [`TrainOptions`].
#[derive(Args, Default)]
struct Overrides {
    #[arg(long, global = true)]
    learning_rate: Option<f64>,
    #[arg(long, global = true)]
    momentum: Option<f64>,
    #[arg(long, global = true)]
    error_threshold: Option<f64>,
    /// Layer sizes, input first (e.g. 784,100,10)
    #[arg(long, value_delimiter = ',', global = true)]
    sizes: Option<Vec<usize>>,
    #[arg(long, global = true)]
    training_path: Option<PathBuf>,
    #[arg(long, global = true)]
    validation_path: Option<PathBuf>,
    #[arg(long, global = true)]
    test_path: Option<PathBuf>,
    #[arg(long, global = true)]
    max_epochs: Option<usize>,
    #[arg(long, global = true)]
    batch_size: Option<usize>,
    /// sigmoid or tanh
    #[arg(long, global = true)]
    activation: Option<String>,
    #[arg(long, global = true)]
    initial_weights_range: Option<f64>,
    #[arg(long, global = true)]
    evaluate_each_epoch: bool,
    #[arg(long, global = true)]
    normalize: bool,
    #[arg(long, global = true)]
    encoder: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Encoder runs: write reconstruction snapshots of one sample to this directory
    #[arg(long, global = true)]
    reconstruction_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network and save it as JSON
    Train {
        /// Where to write the trained model
        output: PathBuf,

        /// Also write the per-epoch training log next to the model (classifiers are then
        /// evaluated after every epoch)
        #[arg(long)]
        dump: bool,
    },

    /// Classify one image and/or evaluate a saved model on the test directory
    Test {
        model: PathBuf,

        #[arg(long)]
        image: Option<PathBuf>,

        #[arg(long)]
        evaluate: bool,
    },

    /// Show one image as text
    View {
        image: PathBuf,

        /// Also print every pixel value
        #[arg(long)]
        print: bool,
    },

    /// Sweep one hyperparameter and log every run
    Experiment {
        /// Log files are written to `<prefix>_<value>.csv`
        prefix: String,

        /// learningrate, momentum, standarddeviation or activationfunction
        #[arg(long)]
        experiment: String,

        /// JSON array of values, e.g. "[0.1, 0.5]" or "[\"sigmoid\", \"tanh\"]"
        #[arg(long)]
        values: String,

        #[arg(long, default_value = "1")]
        repetitions: usize,
    },

    /// Write the first-layer features of a model as PNG images
    Features {
        model: PathBuf,
        out_dir: PathBuf,

        /// Image width; defaults to the square root of the input size
        #[arg(long)]
        width: Option<usize>,
    },
}

impl Overrides {
    fn apply(&self, options: &mut TrainOptions) -> Result<()> {
        if let Some(v) = self.learning_rate {
            options.learning_rate = v;
        }
        if let Some(v) = self.momentum {
            options.momentum = v;
        }
        if let Some(v) = self.error_threshold {
            options.error_threshold = v;
        }
        if let Some(v) = &self.sizes {
            options.sizes = v.clone();
        }
        if let Some(v) = &self.training_path {
            options.training_path = v.clone();
        }
        if let Some(v) = &self.validation_path {
            options.validation_path = Some(v.clone());
        }
        if let Some(v) = &self.test_path {
            options.test_path = v.clone();
        }
        if let Some(v) = self.max_epochs {
            options.max_epochs = v;
        }
        if let Some(v) = self.batch_size {
            options.batch_size = v;
        }
        if let Some(v) = &self.activation {
            options.activation = v.parse::<ActivationFunction>()?;
        }
        if let Some(v) = self.initial_weights_range {
            options.initial_weights_range = v;
        }
        options.evaluate_each_epoch |= self.evaluate_each_epoch;
        options.normalize_input |= self.normalize;
        options.encoder |= self.encoder;
        options.verbose |= self.verbose;
        if let Some(v) = &self.reconstruction_dir {
            options.reconstruction_dir = Some(v.clone());
        }
        Ok(())
    }
}

fn load_options(cli: &Cli) -> Result<TrainOptions> {
    let mut options = match &cli.config {
        Some(path) => TrainOptions::load_json(path)
            .with_context(|| format!("reading options from {}", path.display()))?,
        None => TrainOptions::default(),
    };
    cli.overrides.apply(&mut options)?;
    if cli.seed.is_some() {
        options.seed = cli.seed;
    }
    Ok(options)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn square_width(len: usize) -> Result<usize> {
    let width = (len as f64).sqrt().round() as usize;
    if width * width != len {
        bail!("input size {} is not a square; pass --width", len);
    }
    Ok(width)
}

fn load_model(path: &Path) -> Result<Network> {
    Network::load_json(path).with_context(|| format!("loading model from {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = load_options(&cli)?;

    match cli.command {
        Commands::Train { output, dump } => {
            let options = if dump { options.with_training_log() } else { options };
            let mut rng = make_rng(options.seed);
            let mut cache = DatasetCache::new();
            let result = experiment::train_on_mnist(&options, &mut cache, &mut rng)?;

            result
                .network
                .save_json(&output)
                .with_context(|| format!("writing model to {}", output.display()))?;
            options.save_json(output.with_extension("options.json"))?;
            if dump {
                let log_path = output.with_extension("csv");
                report::write_log(&log_path, &report::training_log(&result))?;
                info!("training log written to {}", log_path.display());
            }

            println!(
                "{:?} after {} epochs, final error {:.4}",
                result.state,
                result.epochs,
                result.final_error().unwrap_or(f64::NAN)
            );
        }

        Commands::Test { model, image, evaluate } => {
            if image.is_none() && !evaluate {
                bail!("nothing to do: pass --image and/or --evaluate");
            }
            let network = load_model(&model)?;
            let encoder = network.mode() == OutputMode::Reconstruction;

            if let Some(path) = image {
                let image = mnist::read_image(&path, options.normalize_input, encoder)?;
                match network.compute(&image.sample.values)? {
                    Output::Class(class) => {
                        println!("{}: label {}, classified as {}", image.file_name, image.sample.label, class);
                    }
                    Output::Reconstruction(values) => {
                        println!("{} reconstructed:", image.file_name);
                        print!("{}", viewer::print(&values, image.width as usize));
                    }
                }
            }

            if evaluate {
                let samples = mnist::read_samples(&options.test_path, options.normalize_input, encoder)?;
                let score = network.evaluate(&samples)?;
                println!("{}/{} correct ({:.2}%)", score.correct, score.total, score.percentage());
            }
        }

        Commands::View { image, print } => {
            let image = mnist::read_image(&image, options.normalize_input, false)?;
            print!("{}", viewer::describe(&image, print));
        }

        Commands::Experiment {
            prefix,
            experiment: kind,
            values,
            repetitions,
        } => {
            let kind: ExperimentKind = kind.parse()?;
            let values = kind.parse_values(&values)?;
            let mut rng = make_rng(options.seed);
            let mut cache = DatasetCache::new();
            let paths = experiment::run_experiment(kind, &values, &options, repetitions, &prefix, &mut cache, &mut rng)?;
            for path in paths {
                println!("{}", path.display());
            }
        }

        Commands::Features { model, out_dir, width } => {
            let network = load_model(&model)?;
            let width = match width {
                Some(w) => w,
                None => square_width(network.input_size())?,
            };
            std::fs::create_dir_all(&out_dir)?;

            let features = network.features().into_iter().next().unwrap_or_default();
            for (i, feature) in features.iter().enumerate() {
                let path = out_dir.join(format!("feature_{i}.png"));
                viewer::to_image(&viewer::rescale(feature), width)?
                    .save(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            println!("{} features written to {}", features.len(), out_dir.display());
        }
    }

    Ok(())
}
