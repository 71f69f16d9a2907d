//! CLI entry point for the folio reader.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use folio_core::{
    AppConfig, CatalogClient, FetchChain, JsonFileStore, ListingQuery, ListingSession,
    ProgressStore, ReaderSession, RecentBooks, SessionState, fetch, format, store,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (warn)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config = match args.config.as_deref() {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };

    let http_client = fetch::build_http_client(&config)?;
    let catalog = CatalogClient::new(http_client.clone(), config.catalog_base_url.clone());

    match args.command {
        Command::Search { term, topic, page } => {
            run_search(&catalog, term, topic, page).await?;
        }
        Command::Read { id, out } => {
            let state_store = Arc::new(JsonFileStore::new(&args.state_file));
            let fetcher = FetchChain::with_client(http_client, &config);
            let session = ReaderSession::new(
                catalog,
                fetcher,
                ProgressStore::new(state_store.clone()),
                RecentBooks::new(state_store),
            )
            .with_viewport_height(config.viewport_height);
            run_read(session, id, out.as_deref()).await?;
        }
        Command::Recent => {
            let state_store = Arc::new(JsonFileStore::new(&args.state_file));
            run_recent(&RecentBooks::new(state_store));
        }
        Command::Resume { out } => {
            let state_store = Arc::new(JsonFileStore::new(&args.state_file));
            let recents = RecentBooks::new(state_store.clone());
            let Some(last) = recents.list().into_iter().next() else {
                println!("No recently opened books.");
                return Ok(());
            };
            let fetcher = FetchChain::with_client(http_client, &config);
            let session = ReaderSession::new(
                catalog,
                fetcher,
                ProgressStore::new(state_store),
                recents,
            )
            .with_viewport_height(config.viewport_height);
            run_read(session, last.id, out.as_deref()).await?;
        }
    }

    Ok(())
}

async fn run_search(
    catalog: &CatalogClient,
    term: Option<String>,
    topic: Option<String>,
    page: u32,
) -> Result<()> {
    let session = ListingSession::new(catalog.clone());
    let query = ListingQuery {
        page,
        search: term.unwrap_or_default(),
        topic: topic.unwrap_or_default(),
    };

    let listing = session.search(&query).await?;
    info!(results = listing.results.len(), page, "Listing fetched");

    let mut stdout = io::stdout().lock();
    for entry in &listing.results {
        writeln!(
            stdout,
            "{:>6}  {} — {}  [{}]",
            entry.id,
            entry.title,
            entry.primary_author(),
            format::resolve_cover(entry)
        )?;
    }
    if listing.results.is_empty() {
        writeln!(stdout, "No results.")?;
    } else if listing.next.is_some() {
        writeln!(stdout, "More results: rerun with --page {}", page + 1)?;
    }
    Ok(())
}

async fn run_read(
    mut session: ReaderSession,
    id: u64,
    out: Option<&std::path::Path>,
) -> Result<()> {
    let spinner = if io::stderr().is_terminal() {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| {
            ProgressStyle::default_spinner()
        }));
        bar.set_message(format!("Opening book {id}"));
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    } else {
        None
    };

    session.open(id).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match session.state() {
        SessionState::Open(book) => {
            info!(
                book_id = id,
                title = %book.entry.title,
                offset = book.viewport.offset,
                "Book ready"
            );
            if book.viewport.offset > 0 {
                eprintln!(
                    "Resuming \"{}\" at saved position {}.",
                    book.entry.title, book.viewport.offset
                );
            }
            match out {
                Some(path) => fs::write(path, &book.document.html)
                    .with_context(|| format!("writing document to {}", path.display()))?,
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(book.document.html.as_bytes())?;
                    writeln!(stdout)?;
                }
            }
            Ok(())
        }
        SessionState::Error { error, .. } => bail!("could not open book {id}: {error}"),
        // open() always lands in Open or Error.
        _ => bail!("could not open book {id}"),
    }
}

fn run_recent(recents: &RecentBooks) {
    let list = recents.list();
    if list.is_empty() {
        println!("No recently opened books.");
        return;
    }
    for (index, book) in list.iter().enumerate() {
        println!(
            "{:>2}. {} — {} (id {})",
            index + 1,
            book.title,
            book.author,
            book.id
        );
    }
    debug!(count = list.len(), bound = store::MAX_RECENT_BOOKS, "Recent list printed");
}
