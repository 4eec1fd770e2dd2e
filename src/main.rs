use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use scholar_cli::{
    Command, Session, display_banner, handle_input_with_history, parse_command,
    print_analysis_report, print_help, print_papers, print_progress, print_transcript,
};
use scholar_openai::{OpenAIClient, OpenAIConfig};
use scholar_rag::{DEFAULT_DOWNLOAD_DIR, DEFAULT_INDEX_DIR, LocalVectorStore, PdfFetcher, RagSystem};
use scholar_search::ScholarSource;

#[derive(Parser)]
#[command(name = "scholar")]
#[command(about = "Search academic papers, ingest their PDFs and chat with them", long_about = None)]
struct Cli {
    /// OpenAI API key used for embeddings and answers
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Directory holding the vector index
    #[arg(long, default_value = DEFAULT_INDEX_DIR)]
    index_dir: PathBuf,

    /// Directory downloaded PDFs are stored in
    #[arg(long, default_value = DEFAULT_DOWNLOAD_DIR)]
    download_dir: PathBuf,

    /// Ask one question against the existing index and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Show progress logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match OpenAIConfig::from_env_with_key(cli.api_key.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "❌".red(), e);
            eprintln!("Set OPENAI_API_KEY in the environment or a .env file, or pass --api-key.");
            return Err(e.into());
        }
    };

    // Initialize components
    let client = OpenAIClient::new(config.clone())?;
    let store = LocalVectorStore::open(cli.index_dir.clone())?;
    let rag = RagSystem::new(client.clone(), client, store);
    let fetcher = PdfFetcher::new(cli.download_dir.clone())?;
    let source = ScholarSource::new()?;
    let mut session = Session::new(source, rag, fetcher);

    // One-shot question against the existing index
    if let Some(question) = cli.question {
        let answer = session.ask(&question).await?;
        println!("{}", answer);
        return Ok(());
    }

    // Interactive mode
    display_banner();

    let mut history = Vec::new();

    loop {
        let input = handle_input_with_history(&mut history).await?;

        let command = match parse_command(&input) {
            Ok(command) => command,
            Err(e) => {
                println!("{} {}", "⚠️".yellow(), e);
                continue;
            }
        };

        match command {
            Command::Empty => continue,
            Command::Exit => {
                println!("{}", "👋 Goodbye!".green());
                break;
            }
            Command::Help => print_help(),
            Command::Search { topic, limit } => {
                println!("{} Searching for '{}'...", "🔍".blue(), topic);
                match session.search(&topic, limit).await {
                    Ok(papers) if papers.is_empty() => {
                        println!("{} No papers found. Try another topic.", "⚠️".yellow());
                    }
                    Ok(papers) => {
                        println!("{} Found {} paper(s)", "✅".green(), papers.len());
                        println!();
                        print_papers(papers, |_| false);
                        println!("{}", "💡 Use 'select <number>' to pick papers, then 'analyze'".dimmed());
                    }
                    Err(e) => println!("{} Search failed: {}", "❌".red(), e),
                }
            }
            Command::Papers => print_papers(session.papers(), |i| session.is_selected(i)),
            Command::Select(indices) => {
                for index in indices {
                    match session.toggle_selection(index) {
                        Ok(true) => println!("{} Selected paper {}", "✅".green(), index + 1),
                        Ok(false) => println!("{} Deselected paper {}", "➖".cyan(), index + 1),
                        Err(e) => println!("{} {}", "⚠️".yellow(), e),
                    }
                }
                println!("{} paper(s) selected", session.selected().len());
            }
            Command::Analyze => {
                let count = session.selected().len();
                if count > 0 {
                    println!("{} Analyzing {} paper(s)...", "🤖".blue(), count);
                }
                match session.analyze(print_progress).await {
                    Ok(report) => print_analysis_report(&report),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => println!("{} {}", "❌".red(), e),
                }
            }
            Command::Ask(question) => {
                println!("{} Thinking...", "🤖".blue());
                match session.ask(&question).await {
                    Ok(answer) => println!("{} {}", "Assistant:".green().bold(), answer),
                    Err(e) if e.is_fatal() => return Err(e.into()),
                    Err(e) => println!("{} Could not answer: {}", "❌".red(), e),
                }
            }
            Command::History => print_transcript(session.transcript()),
            Command::Clear => match session.clear_index().await {
                Ok(()) => println!("{} Database cleared", "🗑️".green()),
                Err(e) => println!("{} Could not clear the database: {}", "❌".red(), e),
            },
            Command::Check => {
                let entries = session.rag().count().await;
                print_check(&config, &cli.index_dir, session.fetcher().download_dir(), entries);
            }
        }
    }

    session.end();
    Ok(())
}

/// Report whether the assistant is ready to search, ingest and answer
fn print_check(
    config: &OpenAIConfig,
    index_dir: &Path,
    download_dir: &Path,
    entries: scholar_core::Result<usize>,
) {
    println!("{}", "Setup check:".bold());

    match config.validate() {
        Ok(()) => println!(
            "  {} API key set (chat: {}, embeddings: {})",
            "✅".green(),
            config.chat_model,
            config.embedding_model
        ),
        Err(e) => println!("  {} {}", "❌".red(), e),
    }

    match entries {
        Ok(count) => println!(
            "  {} Index at {} holds {} chunk(s)",
            "✅".green(),
            index_dir.display(),
            count
        ),
        Err(e) => println!("  {} Index at {}: {}", "❌".red(), index_dir.display(), e),
    }

    match std::fs::read_dir(download_dir) {
        Ok(files) => {
            let pdfs = files
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "pdf"))
                .count();
            println!(
                "  {} Download directory {} holds {} PDF(s)",
                "✅".green(),
                download_dir.display(),
                pdfs
            );
        }
        Err(_) => println!(
            "  {} Download directory {} will be created on first analysis",
            "ℹ️".cyan(),
            download_dir.display()
        ),
    }
}
