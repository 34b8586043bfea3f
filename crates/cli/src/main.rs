//! Operations CLI for the rappelscope recall pipeline.
//!
//! Usage:
//!     rappelscope recent --query "chocolat" --limit 20
//!     rappelscope stats --year 2024 --risk critical
//!     rappelscope sync
//!     rappelscope health
//!     rappelscope cache --clear

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rappelscope_backend_supabase::{
    sync_latest, RecallStore, SupabaseConfig, SupabaseStore, UpstreamClient, UpstreamConfig,
};
use rappelscope_cache::{CacheConfig, FileCache};
use rappelscope_model::{CompressedRecall, Recall, RecallQuery, RiskLevel, StatsFilter};
use rappelscope_normalize::normalize_all;
use rappelscope_stats::{apply_filter, dashboard, Dashboard};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rappelscope")]
#[command(about = "Browse and analyze French product-recall notices")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Supabase project URL
    #[arg(long, default_value = "http://127.0.0.1:54321")]
    supabase_url: String,

    /// Supabase API key
    #[arg(long, default_value = "")]
    supabase_key: String,

    /// Cache directory
    #[arg(long, default_value = ".rappelscope-cache")]
    cache_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// List recent recalls
    Recent {
        /// Free-text search (brand, model, reason)
        #[arg(short, long)]
        query: Option<String>,

        /// Exact category filter
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum results
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Aggregate statistics over the full history
    Stats {
        /// Calendar year filter
        #[arg(long)]
        year: Option<i32>,

        /// Exact category filter
        #[arg(long)]
        category: Option<String>,

        /// Risk tier filter (critical, high, medium, low)
        #[arg(long)]
        risk: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Pull the newest records from the open-data API into the store
    Sync,

    /// Check store health
    Health,

    /// Show or clear the local cache
    Cache {
        /// Remove all cached entries
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rappelscope=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let store = SupabaseStore::new(SupabaseConfig {
        base_url: cli.supabase_url,
        api_key: cli.supabase_key,
        ..Default::default()
    });
    let cache = FileCache::new(cli.cache_dir);

    match cli.command {
        Commands::Recent {
            query,
            category,
            limit,
            format,
        } => {
            run_recent(&store, &cache, query, category, limit, &format).await?;
        }
        Commands::Stats {
            year,
            category,
            risk,
            format,
        } => {
            run_stats(&store, &cache, year, category, risk, &format).await?;
        }
        Commands::Sync => {
            run_sync(&store).await?;
        }
        Commands::Health => {
            run_health(&store).await?;
        }
        Commands::Cache { clear } => {
            run_cache(&cache, clear);
        }
    }

    Ok(())
}

fn parse_risk(value: &str) -> Result<RiskLevel> {
    match value.to_lowercase().as_str() {
        "critical" => Ok(RiskLevel::Critical),
        "high" => Ok(RiskLevel::High),
        "medium" => Ok(RiskLevel::Medium),
        "low" => Ok(RiskLevel::Low),
        other => anyhow::bail!("Unknown risk tier: {other} (expected critical/high/medium/low)"),
    }
}

async fn run_recent(
    store: &SupabaseStore,
    cache: &FileCache,
    search: Option<String>,
    category: Option<String>,
    limit: usize,
    format: &str,
) -> Result<()> {
    // Only the default view goes through the 30-minute cache
    let cacheable = search.is_none() && category.is_none();
    let cache_config = CacheConfig::recent();

    let (recalls, total): (Vec<Recall>, u64) = if let Some(cached) =
        cacheable.then(|| cache.get::<(Vec<Recall>, u64)>(&cache_config)).flatten()
    {
        tracing::info!(count = cached.0.len(), "Recent recalls served from cache");
        cached
    } else {
        let mut query = RecallQuery::new().with_limit(limit);
        if let Some(text) = search {
            query = query.with_search(text);
        }
        if let Some(cat) = category {
            query = query.with_category(cat);
        }

        match store.search(&query).await {
            Ok((rows, total)) => {
                let recalls = normalize_all(&rows);
                if cacheable {
                    if let Err(e) = cache.put(&cache_config, &(&recalls, total)) {
                        tracing::warn!(error = %e, "Failed to cache recent recalls");
                    }
                }
                (recalls, total)
            }
            Err(e) => {
                // Query failures degrade to an empty listing
                tracing::warn!(error = %e, "Recall query failed");
                (Vec::new(), 0)
            }
        }
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&recalls)?);
        return Ok(());
    }

    for (i, recall) in recalls.iter().enumerate() {
        println!("\n{}. {} — {}", i + 1, recall.title, recall.brand);
        println!("   Catégorie: {}", recall.category);
        println!("   Risque: {}", recall.risk_level.label());
        println!("   Motif: {}", recall.reason);
        if let Some(batch) = &recall.batch_number {
            println!("   Lot: {}", batch);
        }
        if !recall.recall_date.is_empty() {
            println!("   Publié le: {}", recall.recall_date);
        }
    }

    println!("\n---");
    println!("{} affichés sur {} rappels", recalls.len(), total);

    Ok(())
}

async fn run_stats(
    store: &SupabaseStore,
    cache: &FileCache,
    year: Option<i32>,
    category: Option<String>,
    risk: Option<String>,
    format: &str,
) -> Result<()> {
    let filter = StatsFilter {
        year,
        category,
        risk_level: risk.as_deref().map(parse_risk).transpose()?,
    };

    let cache_config = CacheConfig::historical();
    let all_recalls: Vec<Recall> =
        if let Some(compressed) = cache.get::<Vec<CompressedRecall>>(&cache_config) {
            tracing::info!(count = compressed.len(), "Historical data served from cache");
            compressed.into_iter().map(CompressedRecall::into_recall).collect()
        } else {
            match store.load_all().await {
                Ok(rows) => {
                    let recalls = normalize_all(&rows);
                    if !recalls.is_empty() {
                        let compressed: Vec<CompressedRecall> =
                            recalls.iter().map(CompressedRecall::from).collect();
                        if let Err(e) = cache.put(&cache_config, &compressed) {
                            tracing::warn!(error = %e, "Failed to cache historical data");
                        }
                    }
                    recalls
                }
                Err(e) => {
                    // Store failures degrade to an empty dashboard
                    tracing::warn!(error = %e, "Historical load failed");
                    Vec::new()
                }
            }
        };

    let filtered = apply_filter(&all_recalls, &filter);
    let stats = dashboard(&filtered, Utc::now());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_dashboard(&stats, all_recalls.len(), filtered.len());
    Ok(())
}

fn print_dashboard(stats: &Dashboard, total_loaded: usize, total_filtered: usize) {
    println!("Tableau de bord — {} rappels", total_loaded);
    if total_filtered < total_loaded {
        println!("({} retenus après filtrage)", total_filtered);
    }
    println!("---");

    match &stats.kpis {
        Some(kpis) => {
            println!("Total rappels:        {}", kpis.total);
            println!(
                "30 derniers jours:    {} ({:+.1}% vs période précédente)",
                kpis.last_30_days, kpis.trend_pct
            );
            println!("Taux critique:        {:.1}%", kpis.critical_pct);
            println!("Moyenne mensuelle:    {:.0}", kpis.avg_per_month);
            println!(
                "Catégorie dominante:  {} ({} rappels)",
                kpis.top_category, kpis.top_category_count
            );
        }
        None => println!("Aucune donnée pour ce filtre."),
    }

    println!("\nRappels par mois (12 derniers):");
    for point in &stats.monthly {
        println!("  {:<12} {}", point.month, point.count);
    }

    println!("\nRépartition par niveau de risque:");
    for slice in &stats.risk_distribution {
        println!("  {:<16} {:>6} ({:.1}%)", slice.label, slice.count, slice.pct);
    }

    println!("\nTop catégories:");
    for rank in &stats.top_categories {
        println!("  {:<30} {:>6} ({:.1}%)", rank.category, rank.count, rank.pct);
    }

    println!("\nTop marques:");
    for rank in &stats.top_brands {
        println!("  {:<25} {:>6}", rank.brand, rank.count);
    }

    println!("\nAlimentaire vs non-alimentaire:");
    println!(
        "  Alimentaire      {:>6} ({:.1}%)",
        stats.food_split.food, stats.food_split.food_pct
    );
    println!(
        "  Non-alimentaire  {:>6} ({:.1}%)",
        stats.food_split.non_food, stats.food_split.non_food_pct
    );

    println!("\nComparaison annuelle:");
    for year in &stats.yearly {
        println!("  {}  {}", year.year, year.count);
    }

    println!("\nTaux critique par mois:");
    for point in &stats.critical_rate {
        println!("  {:<12} {:.1}%", point.month, point.rate_pct);
    }

    println!("\nRisques par catégorie (Top 6):");
    for row in &stats.category_risk {
        println!(
            "  {:<30} critique={} élevé={} moyen={} faible={}",
            row.category, row.critical, row.high, row.medium, row.low
        );
    }
}

async fn run_sync(store: &SupabaseStore) -> Result<()> {
    let upstream = UpstreamClient::new(UpstreamConfig::default());

    println!("Synchronisation depuis l'API RappelConso...");
    let processed = sync_latest(&upstream, store).await?;
    println!("{} rappels traités", processed);

    Ok(())
}

async fn run_health(store: &SupabaseStore) -> Result<()> {
    print!("Checking {} store... ", store.name());

    match store.health_check().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_cache(cache: &FileCache, clear: bool) {
    let slots = [CacheConfig::recent(), CacheConfig::historical()];

    if clear {
        cache.clear_all();
        println!("Cache vidé");
        return;
    }

    for slot in &slots {
        match cache.info(slot) {
            Some(info) => println!(
                "{:<30} {:>8} octets, âge {} min",
                info.key,
                info.size_bytes,
                info.age_secs / 60
            ),
            None => println!("{:<30} (vide)", slot.key),
        }
    }
}
