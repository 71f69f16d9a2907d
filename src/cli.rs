//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browse and read public-domain e-books from a remote catalog.
///
/// Folio searches a Gutendex-style catalog, fetches book content through a
/// fallback chain of proxies, and renders it as a clean reader document
/// with saved reading positions.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a JSON config file (catalog URL, proxy chain, timeouts)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Path to the persisted state file (progress, recent books)
    #[arg(long, default_value = "folio-state.json")]
    pub state_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the catalog listing
    Search {
        /// Free-text search term
        term: Option<String>,

        /// Category/topic filter
        #[arg(long)]
        topic: Option<String>,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Open a book and write its rendered document
    Read {
        /// Catalog book identifier
        id: u64,

        /// Write the rendered document to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the recently opened books
    Recent,

    /// Re-open the most recently read book
    Resume {
        /// Write the rendered document to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_search_parses_term_and_filters() {
        let args = Args::try_parse_from([
            "folio", "search", "whale", "--topic", "fiction", "--page", "2",
        ])
        .unwrap();
        match args.command {
            Command::Search { term, topic, page } => {
                assert_eq!(term.as_deref(), Some("whale"));
                assert_eq!(topic.as_deref(), Some("fiction"));
                assert_eq!(page, 2);
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_search_defaults() {
        let args = Args::try_parse_from(["folio", "search"]).unwrap();
        match args.command {
            Command::Search { term, topic, page } => {
                assert!(term.is_none());
                assert!(topic.is_none());
                assert_eq!(page, 1);
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_read_parses_id_and_out() {
        let args = Args::try_parse_from(["folio", "read", "84", "--out", "book.html"]).unwrap();
        match args.command {
            Command::Read { id, out } => {
                assert_eq!(id, 84);
                assert_eq!(out, Some(PathBuf::from("book.html")));
            }
            other => panic!("expected read command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_read_requires_numeric_id() {
        let result = Args::try_parse_from(["folio", "read", "not-a-number"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_resume_parses_with_optional_out() {
        let args = Args::try_parse_from(["folio", "resume"]).unwrap();
        match args.command {
            Command::Resume { out } => assert!(out.is_none()),
            other => panic!("expected resume command, got {other:?}"),
        }

        let args = Args::try_parse_from(["folio", "resume", "--out", "book.html"]).unwrap();
        match args.command {
            Command::Resume { out } => assert_eq!(out, Some(PathBuf::from("book.html"))),
            other => panic!("expected resume command, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["folio", "-vv", "recent"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["folio", "--quiet", "recent"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_state_file_default() {
        let args = Args::try_parse_from(["folio", "recent"]).unwrap();
        assert_eq!(args.state_file, PathBuf::from("folio-state.json"));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        // --help causes early exit, so we check it returns an error with Help kind
        let result = Args::try_parse_from(["folio", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let result = Args::try_parse_from(["folio"]);
        assert!(result.is_err());
    }
}
