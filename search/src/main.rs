use anyhow::Result;
use clap::Parser;
use search::SearchEngine;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Query a built search index", long_about = None)]
struct Args {
    /// Index directory produced by the indexer
    #[arg(long, default_value = "./indices")]
    index: String,
    /// Number of results to print
    #[arg(long, default_value_t = search::DEFAULT_RESULTS)]
    top: usize,
    /// One-shot query; omit for an interactive prompt
    query: Vec<String>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let engine = SearchEngine::open(&args.index)?;

    if !args.query.is_empty() {
        return print_results(&engine, &args.query.join(" "), args.top);
    }

    let stdin = io::stdin();
    loop {
        print!("query> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        print_results(&engine, query, args.top)?;
    }
}

fn print_results(engine: &SearchEngine, query: &str, top: usize) -> Result<()> {
    let start = std::time::Instant::now();
    let hits = engine.search_top(query, top)?;
    if hits.is_empty() {
        println!("no matching documents");
    }
    for (rank, hit) in hits.iter().enumerate() {
        let label = if hit.title.is_empty() { &hit.url } else { &hit.title };
        println!("{}. {} ({:.3})", rank + 1, label, hit.score);
        println!("   {}", hit.url);
    }
    println!("took {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}
