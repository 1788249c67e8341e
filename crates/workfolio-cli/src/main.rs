use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workfolio_api::GitHubClient;
use workfolio_core::{
    providers::{GitHubRepositorySource, LocalArticleRepository, LocalCertificationRepository},
    Config, Locale, Logger, PublicWorkService, Shuffler, TracingLogger, WorkItem,
    WorkItemsService,
};

#[derive(Parser)]
#[command(name = "workfolio")]
#[command(version, about = "Aggregates projects, articles and certifications into one feed", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "WORKFOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List every public work item for a locale
    List {
        /// Locale tag, e.g. "en" or "pt-br"
        #[arg(short, long, default_value = "en")]
        locale: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Fetch this many times through the cache
        #[arg(long, default_value_t = 1)]
        repeat: u32,

        /// Seed the shuffle for a reproducible order
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workfolio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::List {
            locale,
            format,
            repeat,
            seed,
        }) => {
            let locale: Locale = locale.parse()?;
            let service = build_service(&config, seed)?;

            let mut items = Vec::new();
            for _ in 0..repeat.max(1) {
                items = service.get_all(locale).await;
            }
            tracing::info!("Listing {} items for {}", items.len(), locale);

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
                OutputFormat::Table => print_table(&items),
            }
        }
        Some(Commands::Config) => {
            print!("{}", config.to_toml_string()?);
        }
        None => {
            println!("No command specified. Try --help");
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            let mut config = Config::from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok())?;
            Ok(config)
        }
        None => Ok(Config::load()?),
    }
}

fn build_service(config: &Config, seed: Option<u64>) -> anyhow::Result<PublicWorkService> {
    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);

    let client = GitHubClient::with_base_url(
        config.github.token.clone(),
        config.github.api_url.clone(),
        config.github.timeout(),
    )
    .context("Failed to create GitHub client")?
    .with_retry_config(config.github.retry_config());

    let code_hosting =
        GitHubRepositorySource::new(client, config.github.username.clone(), logger.clone());
    let articles = LocalArticleRepository::new(&config.content.data_dir);
    let certifications = LocalCertificationRepository::new(&config.content.data_dir);

    let shuffler = seed.map(Shuffler::seeded).unwrap_or_default();
    let work_items = WorkItemsService::new(
        Arc::new(code_hosting),
        Arc::new(articles),
        Arc::new(certifications),
        logger.clone(),
    )
    .with_archived_policy(config.work.archived)
    .with_shuffler(shuffler);

    Ok(PublicWorkService::from_config(
        work_items,
        &config.cache,
        logger,
    ))
}

fn print_table(items: &[WorkItem]) {
    if items.is_empty() {
        println!("No public work found.");
        return;
    }

    println!("{:<14} {:<40} {:<30} {}", "TYPE", "TITLE", "TAGS", "LINK");
    for item in items {
        println!(
            "{:<14} {:<40} {:<30} {}",
            item.kind().to_string(),
            truncate(item.title(), 40),
            truncate(&item.tags().join(", "), 30),
            item.link()
        );
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max - 3).collect();
        format!("{}...", cut)
    }
}
