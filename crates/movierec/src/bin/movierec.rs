//! Command-line runner.
//!
//! ```text
//! movierec split ratings.csv --train ratings-train.csv --test ratings-test.csv
//! movierec train --config pipeline.json
//! movierec train --ratings ratings.csv --algorithm ffm --seed 42
//! movierec predict model.mrec 6 10 --movies movies.csv
//! ```

use std::path::PathBuf;
use std::process;

use clap::{ColorChoice, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use movierec::{
    Algorithm, DatasetSplitter, Model, MovieCatalog, Pipeline, PipelineConfig, Prediction, Probe,
    Verbosity,
};

#[derive(Debug, Parser)]
#[command(name = "movierec", version, about, color = ColorChoice::Never)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a ratings CSV chronologically into train and test files.
    Split {
        ratings: PathBuf,
        #[arg(long, default_value = "ratings-train.csv")]
        train: PathBuf,
        #[arg(long, default_value = "ratings-test.csv")]
        test: PathBuf,
        #[arg(long, default_value_t = 0.9)]
        fraction: f64,
        /// Replace ratings with 1/0 relevance labels (rating > 3).
        #[arg(long)]
        binarize: bool,
    },

    /// Split, train, evaluate and save a model.
    Train {
        /// JSON pipeline configuration; other flags are ignored when given.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, required_unless_present = "config")]
        ratings: Option<PathBuf>,
        #[arg(long, default_value = "matrix_factorization")]
        algorithm: Algorithm,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        rank: Option<u32>,
        #[arg(long)]
        iterations: Option<u32>,
        #[arg(long)]
        learning_rate: Option<f32>,
        #[arg(long, default_value = "model.mrec")]
        model: PathBuf,
    },

    /// Score one user/movie pair with a saved model.
    Predict {
        model: PathBuf,
        user: String,
        movie: String,
        /// Optional `movieId,title,genres` CSV used to show the title.
        #[arg(long)]
        movies: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(command: Command) -> movierec::Result<()> {
    match command {
        Command::Split {
            ratings,
            train,
            test,
            fraction,
            binarize,
        } => {
            let summary = DatasetSplitter::new(fraction)?
                .with_binarize(binarize)
                .split_file(&ratings, &train, &test)?;
            println!(
                "{} rows: {} train, {} test",
                summary.total_rows, summary.train_rows, summary.test_rows
            );
        }

        Command::Train {
            config,
            ratings,
            algorithm,
            seed,
            rank,
            iterations,
            learning_rate,
            model,
        } => {
            let config = match (config, ratings) {
                (Some(path), _) => PipelineConfig::from_json_file(path)?,
                (None, Some(ratings)) => PipelineConfig::builder()
                    .ratings_path(ratings)
                    .algorithm(algorithm)
                    .seed(seed)
                    .maybe_rank(rank)
                    .maybe_iterations(iterations)
                    .maybe_learning_rate(learning_rate)
                    .model_path(model)
                    .verbosity(Verbosity::Info)
                    .build()?,
                (None, None) => return Err(movierec::ConfigError::MissingPath("ratings").into()),
            };

            let report = Pipeline::new(config).run()?;
            println!("{}", report.metrics);
            print_prediction(&report.probe, &report.prediction, None);
            println!("model saved to {}", report.model_path.display());
        }

        Command::Predict {
            model,
            user,
            movie,
            movies,
        } => {
            let model = Model::load(&model)?;
            let prediction = model.predict_raw(&user, &movie)?;
            let catalog = movies.map(MovieCatalog::load).transpose()?;
            let title = catalog
                .as_ref()
                .and_then(|c| movie.trim().parse::<u32>().ok().and_then(|id| c.title(id)));
            print_prediction(&Probe::new(user, movie.as_str()), &prediction, title);
        }
    }
    Ok(())
}

fn print_prediction(probe: &Probe, prediction: &Prediction, title: Option<&str>) {
    let movie = match title {
        Some(t) => format!("{} ({t})", probe.movie),
        None => probe.movie.clone(),
    };
    match prediction {
        Prediction::Rating(p) => {
            println!("user {} / movie {movie}: predicted rating {:.2}", probe.user, p.score)
        }
        Prediction::Relevance(p) => println!(
            "user {} / movie {movie}: {} ({:.2}%)",
            probe.user,
            if p.label { "relevant" } else { "not relevant" },
            p.score
        ),
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();

    if let Err(err) = run(args.command) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}
