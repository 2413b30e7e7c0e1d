//! Final grade prediction CLI
//!
//! Trains the random forest offline and runs the serving hooks against a payload.

use clap::{Parser, Subcommand};
use grades::{Config, Result};

#[derive(Parser)]
#[command(name = "grades")]
#[command(about = "Random forest final grade prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model and write the artifact
    Train {
        /// Training CSV (overrides config)
        #[arg(long)]
        data: Option<String>,
        /// Output model directory (overrides config)
        #[arg(long)]
        output: Option<String>,
        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,
        /// Random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Worker threads (0 = all cores)
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Predict the final grade for a request payload
    Predict {
        /// JSON payload; read from stdin when omitted
        payload: Option<String>,
        /// Model directory (overrides config)
        #[arg(long)]
        model_dir: Option<String>,
        /// Declared content type of the payload
        #[arg(long, default_value = "application/json")]
        content_type: String,
        /// Response content type
        #[arg(long, default_value = "application/json")]
        accept: String,
    },
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Write a default config file
    Init,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show model information
    Info {
        /// Model directory (overrides config)
        #[arg(long)]
        model_dir: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Train {
            data,
            output,
            trees,
            seed,
            jobs,
        } => commands::train(config, data, output, trees, seed, jobs),
        Commands::Predict {
            payload,
            model_dir,
            content_type,
            accept,
        } => commands::predict(&config, payload, model_dir, &content_type, &accept),
        Commands::Model { action } => match action {
            ModelCommands::Info { model_dir } => commands::model_info(&config, model_dir),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use grades::model::artifact;
    use grades::predict::{GradeHandler, Predictor};
    use grades::training::{ranked_importances, run_training};
    use std::io::Read;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to point at your training data", config_path);
        println!("  2. Run 'grades train' to fit the model");
        println!("  3. Run 'grades predict' with a JSON payload to score a student");

        Ok(())
    }

    pub fn train(
        mut config: Config,
        data: Option<String>,
        output: Option<String>,
        trees: Option<usize>,
        seed: Option<u64>,
        jobs: Option<usize>,
    ) -> Result<()> {
        if let Some(d) = data {
            config.data.training_path = d;
        }
        if let Some(o) = output {
            config.data.model_dir = o;
        }
        if let Some(t) = trees {
            config.training.n_estimators = t;
        }
        if let Some(s) = seed {
            config.training.random_state = s;
        }
        if let Some(j) = jobs {
            config.training.n_jobs = j;
        }

        run_training(&config)?;
        Ok(())
    }

    pub fn predict(
        config: &Config,
        payload: Option<String>,
        model_dir: Option<String>,
        content_type: &str,
        accept: &str,
    ) -> Result<()> {
        let model_dir = model_dir.unwrap_or_else(|| config.data.model_dir.clone());
        let body = match payload {
            Some(p) => p.into_bytes(),
            None => {
                let mut buf = Vec::new();
                std::io::stdin().read_to_end(&mut buf)?;
                buf
            }
        };

        let predictor = Predictor::load(GradeHandler, &model_dir)?;
        log::debug!(
            "Loaded {} trees from {}",
            predictor.model().n_trees(),
            model_dir
        );

        let response = predictor.invoke(&body, content_type, accept)?;
        println!("{}", String::from_utf8_lossy(&response));

        Ok(())
    }

    pub fn model_info(config: &Config, model_dir: Option<String>) -> Result<()> {
        let model_dir = model_dir.unwrap_or_else(|| config.data.model_dir.clone());
        let model = artifact::load(&model_dir)?;
        let params = model.params();

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:       {}", artifact::artifact_path(&model_dir).display());
        println!("  Trees:      {}", model.n_trees());
        println!("  Nodes:      {}", model.total_nodes());
        println!("  Features:   {}", model.n_features());
        println!("  Seed:       {}", params.random_state);
        println!("  Bootstrap:  {}", params.bootstrap);
        match params.tree.max_depth {
            Some(d) => println!("  Max depth:  {}", d),
            None => println!("  Max depth:  unlimited"),
        }

        println!("\nFeature importance");
        println!("───────────────────────────────");
        for (name, importance) in ranked_importances(&model) {
            println!("  {:<22} {:>6.2}%", name, importance * 100.0);
        }

        Ok(())
    }
}
