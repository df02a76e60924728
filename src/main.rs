use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tourism_package_predictor::{
    config::{PrepConfig, RegistryConfig, ServerConfig, TrainConfig},
    dashboard::run_server,
    data::load_csv_file,
    deploy::{collect_deploy_files, deploy},
    open_store,
    prep::{prepare, run_prep},
    ModelArtifacts, Predictor, RepoId, TrainingJob,
};
use tracing::info;

// Steps
// 1. prep: raw tourism.csv -> cleaned, encoded, stratified train/test split
// 2. train: random forest on the train split -> model repo
// 3. deploy: Dockerfile + sources -> docker space
// 4. serve: dashboard over the published model

#[derive(Parser)]
#[command(name = "tourism-package-predictor", version, about = "Wellness tourism package purchase predictor")]
struct Cli {
    /// Use a local directory as the registry instead of the Hugging Face Hub
    #[arg(long, global = true)]
    local_dir: Option<PathBuf>,

    /// Owner of the dataset, model and space repos
    #[arg(long, global = true)]
    username: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean, encode and split the raw dataset, then publish it
    Prep {
        /// Read the raw CSV from disk instead of the dataset repo
        #[arg(long)]
        raw: Option<PathBuf>,
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Train the random forest on the published split and publish the model
    Train {
        #[arg(long, default_value_t = 150)]
        n_estimators: usize,
        #[arg(long, default_value_t = 15)]
        max_depth: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Upload the dashboard sources to the hosting space
    Deploy {
        /// Project root holding Dockerfile, Cargo.toml and src/
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Run the dashboard
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tourism_package_predictor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut registry = RegistryConfig::default();
    if let Some(dir) = cli.local_dir {
        registry.local_dir = Some(dir);
    }
    if let Some(username) = cli.username {
        registry.username = username;
    }
    let store = open_store(&registry)?;

    match cli.command {
        Commands::Prep { raw, test_size, seed } => {
            let config = PrepConfig {
                test_size,
                seed,
                ..PrepConfig::default()
            };
            let repo = RepoId::dataset(registry.dataset_repo());
            match raw {
                Some(path) => {
                    let mut prepared = prepare(load_csv_file(&path)?, &config)?;
                    store.create_repo(&repo, None)?;
                    prepared.publish(&*store, &repo)?;
                }
                None => {
                    run_prep(&*store, &repo, &config)?;
                }
            }
        }
        Commands::Train {
            n_estimators,
            max_depth,
            seed,
        } => {
            let mut config = TrainConfig::default();
            config.forest = config
                .forest
                .with_n_estimators(n_estimators)
                .with_max_depth(Some(max_depth))
                .with_seed(seed);
            TrainingJob::new(config).run(
                &*store,
                &RepoId::dataset(registry.dataset_repo()),
                &RepoId::model(registry.model_repo()),
            )?;
        }
        Commands::Deploy { root } => {
            let files = collect_deploy_files(&root)?;
            deploy(&*store, &RepoId::space(registry.space_repo()), &files)?;
        }
        Commands::Serve { host, port } => {
            let mut config = ServerConfig::default();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            // blocking registry client: load before the async runtime starts
            let artifacts = ModelArtifacts::fetch(&*store, &RepoId::model(registry.model_repo()))?;
            let predictor = Predictor::new(artifacts);

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run_server(config, predictor))?;
        }
    }

    info!("Done");
    Ok(())
}
