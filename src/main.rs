use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forum_store::{
    cache::QueryCache,
    config::Config,
    database::{
        Database,
        repositories::{ForumSeaOrmRepository, GroupSeaOrmRepository, Repository},
    },
    models::Group,
};

#[derive(Parser)]
#[command(name = "forum-store")]
#[command(version)]
#[command(about = "Administration tool for the forum store database")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path, defaults to `$CONFIG_FILE` or `config.toml`
    #[arg(short, long)]
    config: Option<String>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// List forums in display order with their counters
    Forums,
    /// List a page of topics of a forum
    Topics {
        #[arg(long)]
        forum: i32,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Page size, defaults to `forum.topics_per_page`
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Board statistics, optionally limited to the members of some groups
    Stats {
        #[arg(long = "group", value_name = "GROUP_ID")]
        groups: Vec<i32>,
    },
    /// Topics with activity since an RFC 3339 timestamp
    NewMessages {
        #[arg(long)]
        since: DateTime<Utc>,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Serialize)]
struct ForumSummary {
    #[serde(flatten)]
    forum: forum_store::models::Forum,
    total_posts: u64,
    total_topics: u64,
    last_post_id: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = format!("forum_store={}", cli.log_level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_filter.into());
    // Logs go to stderr so command output stays parseable
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Config::load_from_file(path)?
        }
        None => Config::load()?,
    };

    if let Some(database_url) = cli.database_url {
        config.database.url = database_url;
    }

    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    let cache = QueryCache::from_config(&config.cache);
    let forums = ForumSeaOrmRepository::new(database.connection())
        .with_cache(cache.clone())
        .with_config(config.forum.clone());

    match cli.command {
        Command::Migrate => {
            info!("Database is up to date");
        }
        Command::Forums => {
            let mut summaries = Vec::new();
            for forum in forums.find_all().await? {
                let total_posts = forums.get_total_posts(&forum).await?;
                let total_topics = forums.get_total_topics(&forum).await?;
                let last_post_id = forums.get_last_post(&forum).await?.map(|post| post.id);
                summaries.push(ForumSummary {
                    forum,
                    total_posts,
                    total_topics,
                    last_post_id,
                });
            }
            print_json(&summaries)?;
        }
        Command::Topics {
            forum,
            offset,
            limit,
        } => {
            let forum = forums
                .get(forum)
                .await?
                .with_context(|| format!("Forum {forum} does not exist"))?;
            let limit = limit.unwrap_or(config.forum.topics_per_page);
            print_json(&forums.get_topics(&forum, offset, limit).await?)?;
        }
        Command::Stats { groups } => {
            let stats = if groups.is_empty() {
                forums.get_forum_stats().await?
            } else {
                let repository = GroupSeaOrmRepository::new(database.connection());
                let mut resolved: Vec<Group> = Vec::with_capacity(groups.len());
                for id in groups {
                    let group = repository
                        .get(id)
                        .await?
                        .with_context(|| format!("Group {id} does not exist"))?;
                    resolved.push(group);
                }
                forums.get_forum_stats_for_groups(&resolved).await?
            };
            print_json(&stats)?;
        }
        Command::NewMessages {
            since,
            offset,
            limit,
        } => {
            let limit = limit.unwrap_or(config.forum.topics_per_page);
            let page = forums.get_new_messages(since, offset, limit).await?;
            info!(
                "{} topic(s) with new messages, {} page(s)",
                page.total,
                page.total_pages(limit)
            );
            print_json(&page)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
