use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use data_loader::{DataIndex, InteractionStore, MovieId, UserId};
use pipeline::hybrid::DEFAULT_QUOTA;
use pipeline::{MergePolicy, RecommendationResult};
use rand::Rng;
use serde_json::json;
use server::{EngineConfig, RecommendationEngine};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Hybrid movie recommender: latent factors plus popularity", long_about = None)]
struct Cli {
    /// Path to the watchlist export directory
    #[arg(short, long, default_value = "data/cinetrack")]
    data_dir: PathBuf,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// How personalized and popular movies are merged
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Personalized slots for the quota policy
    #[arg(long)]
    quota: Option<usize>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// A fixed number of personalized movies, popularity for the rest
    Quota,
    /// Personalized movies for every slot they can fill
    Full,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long)]
        count: Option<usize>,

        /// Show predicted and popularity scores for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show the most popular movies
    Popular {
        /// Number of movies to return
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show a user's watchlist with interaction scores
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// Show dataset and model statistics
    Stats,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
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
    let config = build_config(&cli)?;

    info!("Loading watchlist export from {}", cli.data_dir.display());
    let start = Instant::now();
    let data_index = Arc::new(
        DataIndex::load_from_files(&cli.data_dir).context("Failed to load watchlist export")?,
    );

    let store: Arc<dyn InteractionStore> = data_index.clone();
    let engine = Arc::new(RecommendationEngine::new(store, config)?);
    engine.refresh().context("Failed to build recommendation model")?;
    if !cli.json {
        println!("{} Loaded dataset and model in {:.2?}", "✓".green(), start.elapsed());
    }

    let default_count = engine.config().default_count;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            count,
            explain,
        } => handle_recommend(
            &engine,
            &data_index,
            user_id,
            count.unwrap_or(default_count),
            explain,
            cli.json,
        )?,
        Commands::Popular { count } => {
            handle_popular(&engine, &data_index, count.unwrap_or(default_count), cli.json)?
        }
        Commands::User { user_id } => handle_user(&engine, &data_index, user_id, cli.json)?,
        Commands::Stats => handle_stats(&engine, &data_index, cli.json)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(engine, requests, concurrent, cli.json).await?,
    }

    Ok(())
}

/// Defaults, then the config file, then flags
fn build_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    let quota = cli.quota.unwrap_or(match config.merge_policy {
        MergePolicy::Quota(q) => q,
        MergePolicy::FullPersonalized => DEFAULT_QUOTA,
    });
    let policy = match (cli.policy, cli.quota) {
        (Some(PolicyArg::Full), _) => MergePolicy::FullPersonalized,
        (Some(PolicyArg::Quota), _) | (None, Some(_)) => MergePolicy::Quota(quota),
        (None, None) => config.merge_policy,
    };
    config = config.with_merge_policy(policy);
    Ok(config)
}

/// Handle the 'recommend' command
fn handle_recommend(
    engine: &RecommendationEngine,
    data_index: &DataIndex,
    user_id: UserId,
    count: usize,
    explain: bool,
    as_json: bool,
) -> Result<()> {
    let result = engine.recommend(user_id, count)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_recommendations(&result, data_index);

    if explain {
        let snapshot = engine.snapshot();
        println!("{}", "Why:".bold());
        for movie_id in &result.recommendations {
            let predicted = snapshot
                .predicted
                .get(user_id, *movie_id)
                .map(|p| format!("predicted {:.3}", p))
                .unwrap_or_else(|| "no prediction".to_string());
            let popularity = snapshot
                .popularity
                .stats(*movie_id)
                .map(|s| {
                    format!(
                        "popularity {:.1} ({} interactions, avg {:.2})",
                        s.popularity_score, s.interaction_count, s.avg_score
                    )
                })
                .unwrap_or_else(|| "catalog filler".to_string());
            println!("  {}: {}, {}", movie_id, predicted, popularity);
        }
    }
    Ok(())
}

/// Handle the 'popular' command
fn handle_popular(
    engine: &RecommendationEngine,
    data_index: &DataIndex,
    count: usize,
    as_json: bool,
) -> Result<()> {
    let popular = engine.popular(count);

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "recommendations": popular }))?
        );
        return Ok(());
    }

    println!("{}", "Most Popular:".bold().blue());
    print_titles(&popular, data_index);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(
    engine: &RecommendationEngine,
    data_index: &DataIndex,
    user_id: UserId,
    as_json: bool,
) -> Result<()> {
    let snapshot = engine.snapshot();
    let history = snapshot.user_history(user_id);
    let context = snapshot.user_context(user_id);

    if as_json {
        let rows: Vec<_> = history
            .iter()
            .map(|i| {
                json!({
                    "movie_id": i.movie_id,
                    "status": i.status,
                    "rating": i.rating,
                    "score": i.score,
                })
            })
            .collect();
        let value = json!({
            "user_id": user_id,
            "interactions": rows,
            "avg_score": context.avg_score,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    if history.is_empty() {
        println!("{}No interactions (cold start)", "• ".yellow());
        return Ok(());
    }
    println!("{}Interactions: {}", "• ".cyan(), context.interaction_count);
    println!("{}Distinct movies: {}", "• ".cyan(), context.interacted_movies.len());
    println!("{}Average score: {:.2}", "• ".cyan(), context.avg_score);

    let mut rows = history;
    rows.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.movie_id.cmp(&b.movie_id)));
    println!("Watchlist:");
    for row in &rows {
        let title = data_index
            .get_movie(row.movie_id)
            .map(|m| m.title.as_str())
            .unwrap_or("<not in catalog>");
        let rating = row
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  - {} [{}] rating {} -> score {:.1}",
            title, row.status, rating, row.score
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(engine: &RecommendationEngine, data_index: &DataIndex, as_json: bool) -> Result<()> {
    let snapshot = engine.snapshot();
    let (users, movies, interactions) = data_index.counts();
    let (rows, cols) = snapshot.utility.shape();

    if as_json {
        let value = json!({
            "users": users,
            "movies": movies,
            "interactions": interactions,
            "utility_matrix": [rows, cols],
            "rank": snapshot.rank,
            "snapshot_version": snapshot.version,
            "merge_policy": engine.config().merge_policy,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Dataset:".bold().blue());
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Movies: {}", "• ".green(), movies);
    println!("{}Interactions: {}", "• ".green(), interactions);
    println!("{}", "Model:".bold().blue());
    println!("{}Utility matrix: {} x {}", "• ".cyan(), rows, cols);
    match snapshot.rank {
        Some(rank) => println!("{}Factorization rank: {}", "• ".cyan(), rank),
        None => println!("{}Factorization skipped (too little data)", "• ".yellow()),
    }
    println!("{}Merge policy: {:?}", "• ".cyan(), engine.config().merge_policy);
    println!("{}Snapshot version: {}", "• ".cyan(), snapshot.version);
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    engine: Arc<RecommendationEngine>,
    requests: usize,
    concurrent: usize,
    as_json: bool,
) -> Result<()> {
    anyhow::ensure!(requests > 0, "--requests must be at least 1");
    let concurrent = concurrent.clamp(1, requests);

    let max_user = sample_user_ceiling(
        engine
            .snapshot()
            .interactions
            .iter()
            .map(|i| i.user_id)
            .max(),
    );
    let user_ids: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests).map(|_| rng.random_range(1..=max_user)).collect()
    };
    let count = engine.config().default_count;

    // Split the requests over `concurrent` blocking workers
    let start = Instant::now();
    let mut handles = vec![];
    for chunk in user_ids.chunks(requests.div_ceil(concurrent)) {
        let engine = Arc::clone(&engine);
        let chunk = chunk.to_vec();
        handles.push(tokio::task::spawn_blocking(move || {
            let mut timings = Vec::with_capacity(chunk.len());
            for user_id in chunk {
                let request_start = Instant::now();
                engine.recommend(user_id, count)?;
                timings.push(request_start.elapsed());
            }
            Ok::<_, anyhow::Error>(timings)
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        timings.extend(handle.await.context("Benchmark worker panicked")??);
    }
    let wall_time = start.elapsed();

    timings.sort();
    let avg_latency = timings.iter().sum::<Duration>() / timings.len() as u32;
    let percentile = |p: f64| timings[((timings.len() - 1) as f64 * p).round() as usize];
    let (p50, p95, p99) = (percentile(0.50), percentile(0.95), percentile(0.99));
    let throughput = requests as f64 / wall_time.as_secs_f64();

    if as_json {
        let value = json!({
            "requests": requests,
            "concurrent": concurrent,
            "wall_time_ms": wall_time.as_secs_f64() * 1000.0,
            "avg_us": avg_latency.as_micros(),
            "p50_us": p50.as_micros(),
            "p95_us": p95.as_micros(),
            "p99_us": p99.as_micros(),
            "throughput_rps": throughput,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} workers)", requests, concurrent);
    println!("Total time: {:.2?}", wall_time);
    println!("Average latency: {:.2?}", avg_latency);
    println!("P50 latency: {:.2?}", p50);
    println!("P95 latency: {:.2?}", p95);
    println!("P99 latency: {:.2?}", p99);
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Highest user id the benchmark samples: known users plus a margin of
/// unknown ids, so cold start is exercised too
fn sample_user_ceiling(max_known: Option<UserId>) -> UserId {
    max_known.unwrap_or(0).saturating_add(10)
}

/// Print a recommendation list with titles and its provenance
fn print_recommendations(result: &RecommendationResult, data_index: &DataIndex) {
    println!(
        "{} {}",
        format!("Movie Recommendations for user {}:", result.user_id)
            .bold()
            .blue(),
        format!("[{}]", result.kind.as_str()).dimmed()
    );
    if result.is_empty() {
        println!("  (nothing to recommend)");
        return;
    }
    print_titles(&result.recommendations, data_index);
}

/// Ranked titles; ids missing from the catalog are not shown
fn print_titles(movie_ids: &[MovieId], data_index: &DataIndex) {
    let movies = movie_ids.iter().filter_map(|id| data_index.get_movie(*id));
    for (rank, movie) in movies.enumerate() {
        println!(
            "{}. {} {}",
            (rank + 1).to_string().green(),
            movie.title,
            format!("(id {})", movie.id).dimmed()
        );
    }
}
