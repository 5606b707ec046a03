mod category;
mod db;
mod error;
mod export;
mod fetcher;
mod listing;
mod parser;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use category::Category;
use fetcher::HttpFetcher;
use parser::fields::FieldSchema;
use settings::Settings;

#[derive(Parser)]
#[command(name = "ggzy_scraper", about = "Guangxi public-resource award notice scraper")]
struct Cli {
    /// SQLite database path (overrides GGZY_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List announcements of a category into the queue
    Init {
        /// Category code: 1-5, 001-005, 9 or 12 digits
        #[arg(short, long)]
        category: String,
        /// Listing size (default: GGZY_PAGE_SIZE or 5000)
        #[arg(long)]
        page_size: Option<usize>,
        /// Keep failed tenders and other non-award bulletins
        #[arg(long)]
        include_failed: bool,
    },
    /// Fetch unvisited detail pages
    Scrape {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract bid results from fetched pages
    Process {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Init + scrape + process in one go
    Run {
        #[arg(short, long)]
        category: String,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        include_failed: bool,
        /// Max pages to fetch before processing
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Write all results as a tab-separated file
    Export {
        /// Output path (default: data/ggzy-YYYYMMDD.tsv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the extractor on a saved detail page and print the rows
    Parse {
        file: PathBuf,
        /// Listing title, used when the page has no project name
        #[arg(long, default_value = "")]
        title: String,
    },
    /// Show queue statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Init { category, page_size, include_failed } => {
            let category = Category::parse(&category)?;
            if let Some(n) = page_size {
                settings.page_size = n;
            }
            init(&settings, &category, include_failed).await
        }
        Commands::Scrape { limit } => {
            let conn = open(&settings)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited announcements. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} pages...", pages.len());
            let http = HttpFetcher::new(&settings)?;
            let stats = fetcher::scrape_pages(&conn, &http, pages, &settings).await?;
            println!("Done: {} fetched ({} ok, {} errors).", stats.total, stats.ok, stats.errors);
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = open(&settings)?;
            process(&conn, limit)
        }
        Commands::Run { category, page_size, include_failed, limit } => {
            let category = Category::parse(&category)?;
            if let Some(n) = page_size {
                settings.page_size = n;
            }
            init(&settings, &category, include_failed).await?;

            let conn = open(&settings)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited announcements.");
                return Ok(());
            }

            // Phase 1: fetch (each page saved as it arrives)
            let t_scrape = Instant::now();
            println!("Pipeline: fetching {} pages...", pages.len());
            let http = HttpFetcher::new(&settings)?;
            let stats = fetcher::scrape_pages(&conn, &http, pages, &settings).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_scrape.elapsed().as_secs_f64()
            );

            // Phase 2: extract
            process(&conn, None)
        }
        Commands::Export { output } => {
            let conn = open(&settings)?;
            let rows = db::fetch_results(&conn)?;
            if rows.is_empty() {
                println!("No results yet. Run 'process' first.");
                return Ok(());
            }
            let path = output.unwrap_or_else(export::default_path);
            export::write_file(&path, &rows)?;
            println!("Wrote {} rows to {}", rows.len(), path.display());
            Ok(())
        }
        Commands::Parse { file, title } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let announcement = listing::Announcement {
                info_id: String::new(),
                project_type: String::new(),
                region: String::new(),
                title,
                info_date: String::new(),
                url: file.display().to_string(),
            };
            let rows = parser::process_page(&announcement, &html, FieldSchema::builtin());
            export::write_tsv(std::io::stdout().lock(), &rows)
        }
        Commands::Stats => {
            let conn = open(&settings)?;
            let s = db::get_stats(&conn)?;
            println!("Total:     {}", s.total);
            println!("Visited:   {}", s.visited);
            println!("Unvisited: {}", s.unvisited);
            println!("Fetched:   {}", s.scraped);
            println!("Errors:    {}", s.errors);
            println!("Processed: {}", s.processed);
            println!("Rows:      {}", s.result_rows);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn open(settings: &Settings) -> anyhow::Result<rusqlite::Connection> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    Ok(conn)
}

async fn init(settings: &Settings, category: &Category, include_failed: bool) -> anyhow::Result<()> {
    let conn = open(settings)?;
    let client = fetcher::build_client(settings)?;
    let list = listing::fetch_announcements(&client, settings, category, include_failed).await?;
    let inserted = db::insert_announcements(&conn, category.code(), &list)?;
    println!("Queued {} new announcements ({} listed)", inserted, list.len());
    Ok(())
}

fn process(conn: &rusqlite::Connection, limit: Option<usize>) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pages = db::fetch_unprocessed(conn, limit)?;
    if pages.is_empty() {
        println!("No unprocessed pages. Run 'scrape' first.");
        return Ok(());
    }
    println!("Processing {} pages...", pages.len());

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let schema = FieldSchema::builtin();
    let mut missing = 0usize;
    let mut rows = 0usize;
    for chunk in pages.chunks(500) {
        let results: Vec<_> = chunk
            .iter()
            .map(|page| {
                let out = parser::process_page(&page.announcement, &page.html, schema);
                if out.iter().any(|r| r.status == "N") {
                    missing += 1;
                }
                (page.announcement_id, out)
            })
            .collect();
        rows += db::save_results(conn, &results)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    info!("Processed {} pages into {} rows ({} without content)", pages.len(), rows, missing);
    println!("Saved {} rows from {} pages ({} without content).", rows, pages.len(), missing);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
