use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::{User, UserId, VideoCatalog, VideoId};
use feed::{FeedItem, FeedOrchestrator};
use ranking::{RankingWeights, RecommendationEngine, SeededJitter, Timeframe};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// vidrank - Video Ranking Engine
#[derive(Parser)]
#[command(name = "vidrank")]
#[command(about = "Rank home, trending, related and shorts feeds", long_about = None)]
struct Cli {
    /// Directory containing videos.json and users.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// JSON file overriding the default ranking weights
    #[arg(short, long)]
    weights: Option<PathBuf>,

    /// Seed the jitter source for reproducible rankings
    #[arg(long)]
    seed: Option<u64>,

    /// Print results as JSON instead of a colored list
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Personalized home feed for a user
    Feed {
        /// User ID to build the feed for
        #[arg(long)]
        user_id: UserId,

        /// Number of videos to return
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Video IDs to leave out (comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<VideoId>,

        /// Show score and reasons for each video
        #[arg(long)]
        explain: bool,
    },

    /// Fastest-rising uploads in a time window
    Trending {
        /// Window: day, week or month
        #[arg(long, default_value = "week")]
        timeframe: Timeframe,

        /// Number of videos to return
        #[arg(long, default_value = "20")]
        limit: usize,

        /// Show score for each video
        #[arg(long)]
        explain: bool,
    },

    /// Videos related to a given video
    Similar {
        /// Reference video ID
        #[arg(long)]
        video_id: VideoId,

        /// Number of videos to return
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Show score for each video
        #[arg(long)]
        explain: bool,
    },

    /// Personalized shorts feed for a user
    Shorts {
        /// User ID to build the feed for
        #[arg(long)]
        user_id: UserId,

        /// Number of shorts to return
        #[arg(long, default_value = "30")]
        limit: usize,

        /// Show score and reasons for each short
        #[arg(long)]
        explain: bool,
    },

    /// Show user profile and watch history
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Run concurrent feed-bundle requests and report latency
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    println!("Loading catalog from {}...", cli.data_dir.display());
    let start = Instant::now();
    let catalog = Arc::new(
        VideoCatalog::load_from_files(&cli.data_dir).context("Failed to load video catalog")?,
    );
    let (users, videos, shorts) = catalog.counts();
    println!(
        "{} Loaded {} videos ({} shorts) and {} users in {:?}",
        "✓".green(),
        videos,
        shorts,
        users,
        start.elapsed()
    );

    let engine = build_engine(cli.weights.as_deref(), cli.seed)?;
    let orchestrator = FeedOrchestrator::new(catalog.clone(), engine);

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Feed {
            user_id,
            limit,
            exclude,
            explain,
        } => {
            let items = orchestrator.home_feed(&user_id, exclude, limit).await?;
            render(&format!("Home feed for {}", user_id), &items, explain, cli.json)?;
        }
        Commands::Trending {
            timeframe,
            limit,
            explain,
        } => {
            let items = orchestrator.trending(timeframe, limit).await?;
            render(&format!("Trending this {}", timeframe), &items, explain, cli.json)?;
        }
        Commands::Similar {
            video_id,
            limit,
            explain,
        } => {
            let items = orchestrator.up_next(&video_id, limit).await?;
            render(&format!("Up next after {}", video_id), &items, explain, cli.json)?;
        }
        Commands::Shorts {
            user_id,
            limit,
            explain,
        } => {
            let items = orchestrator.shorts_feed(&user_id, limit).await?;
            render(&format!("Shorts for {}", user_id), &items, explain, cli.json)?;
        }
        Commands::User { user_id } => handle_user(&catalog, &user_id)?,
        Commands::Benchmark { requests } => handle_benchmark(&orchestrator, requests).await?,
    }

    Ok(())
}

/// Build the engine from the optional weights file and seed
fn build_engine(weights: Option<&Path>, seed: Option<u64>) -> Result<RecommendationEngine> {
    let mut engine = RecommendationEngine::new();

    if let Some(path) = weights {
        let weights = RankingWeights::from_json_file(path)
            .with_context(|| format!("Failed to load weights from {}", path.display()))?;
        info!("Using ranking weights from {}", path.display());
        engine = engine.with_weights(weights);
    }

    if let Some(seed) = seed {
        info!("Seeding jitter with {}", seed);
        engine = engine.with_jitter(SeededJitter::new(seed));
    }

    Ok(engine)
}

/// Handle the 'user' command
fn handle_user(catalog: &VideoCatalog, user_id: &str) -> Result<()> {
    let user = catalog
        .get_user(user_id)
        .ok_or_else(|| anyhow!("User {} not found", user_id))?;

    println!("{}", format!("User {}", user.id).bold().blue());
    if !user.name.is_empty() {
        println!("{}Name: {}", "• ".green(), user.name);
    }
    println!("{}Subscriptions: {}", "• ".green(), user.subscriptions.len());
    println!("{}Liked videos: {}", "• ".green(), user.liked_videos.len());
    println!("{}Videos watched: {}", "• ".cyan(), user.watch_history.len());

    println!("Recently watched:");
    for record in user.watch_history_detailed.iter().take(5) {
        let title = catalog
            .get_video(&record.video_id)
            .map(|v| v.title.as_str())
            .unwrap_or("<removed>");
        println!(
            "  - {} ({:.0}% watched, {})",
            title,
            record.completion() * 100.0,
            record.watched_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("Top categories:");
    for (category, count) in top_categories(catalog, user).into_iter().take(5) {
        println!("  - {}: {} views", category, count);
    }

    Ok(())
}

/// Categories of the detailed history, most watched first
fn top_categories<'c>(catalog: &'c VideoCatalog, user: &User) -> Vec<(&'c str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in &user.watch_history_detailed {
        if let Some(video) = catalog.get_video(&record.video_id) {
            *counts.entry(video.category.as_str()).or_insert(0) += 1;
        }
    }

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
}

/// Handle the 'benchmark' command
async fn handle_benchmark(orchestrator: &FeedOrchestrator, requests: usize) -> Result<()> {
    let user_ids: Vec<UserId> = orchestrator
        .catalog()
        .users()
        .map(|u| u.id.clone())
        .collect();
    if user_ids.is_empty() {
        return Err(anyhow!("Catalog has no users to benchmark"));
    }
    if requests == 0 {
        return Err(anyhow!("Benchmark needs at least one request"));
    }

    let wall_clock = Instant::now();

    // Use tokio::spawn to make concurrent requests
    let mut handles = vec![];
    for _ in 0..requests {
        let user_id = user_ids[rand::random_range(0..user_ids.len())].clone();
        let orchestrator = orchestrator.clone();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            orchestrator.feed_bundle(&user_id).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let summed: Duration = timings.iter().sum();
    let avg_latency = summed / timings.len() as u32;
    let p50 = timings[timings.len() / 2];
    let p95 = timings[percentile_index(timings.len(), 0.95)];
    let p99 = timings[percentile_index(timings.len(), 0.99)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {}", requests);
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", p50);
    println!("P95 latency: {:?}", p95);
    println!("P99 latency: {:?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn percentile_index(len: usize, percentile: f64) -> usize {
    ((len as f64 * percentile) as usize).min(len - 1)
}

/// Print a ranked list, either as JSON or as a colored table
fn render(title: &str, items: &[FeedItem], explain: bool, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(items).context("Failed to serialize feed")?
        );
        return Ok(());
    }

    println!("{}", title.bold().blue());
    if items.is_empty() {
        println!("  (nothing to show)");
        return Ok(());
    }

    for (rank, item) in items.iter().enumerate() {
        let badge = if item.is_short { " [short]".yellow() } else { "".normal() };
        println!(
            "{}. {}{} ({}) - {}",
            (rank + 1).to_string().green(),
            item.title,
            badge,
            item.video_id,
            item.channel_id.dimmed()
        );
        if explain {
            let reasons = item
                .reasons
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("   Score: {:.2}", item.score);
            if !reasons.is_empty() {
                println!("   Why: {}", reasons);
            }
        }
    }

    Ok(())
}
