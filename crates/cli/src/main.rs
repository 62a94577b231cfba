mod echo;

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use feedscope_core::{
    EntrySnapshot, FeedLinkSet, FeedSnapshot, FetchConfig, FileCache, ImportedDocument, Reader,
    ReaderConfig, ReqwestClient,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::echo::{
    format_links, format_size, print_banner, print_detail, print_feed_summary, print_info, print_step, print_success,
    print_warning,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for imported feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Read RSS, RDF and Atom feeds and print them as text or JSON
#[derive(Parser, Debug)]
#[command(name = "feedscope")]
#[command(author = "feedscope Contributors")]
#[command(version)]
#[command(about = "Inspect RSS, RDF and Atom feeds", long_about = None)]
struct Args {
    /// URL to fetch, local feed file, or "-" for stdin
    #[arg(value_name = "INPUT", required_unless_present = "completions")]
    input: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Only print the detected feed type
    #[arg(long, conflicts_with = "discover")]
    detect: bool,

    /// Treat the input as an HTML page and list the feeds it links to
    #[arg(long)]
    discover: bool,

    /// Base URI for resolving links when discovering from a file or stdin
    #[arg(long, value_name = "URI")]
    base: Option<String>,

    /// Omit entries from the output
    #[arg(long)]
    no_entries: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Cache fetched feeds in this directory
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Revalidate cached feeds with a conditional GET
    #[arg(long, requires = "cache_dir")]
    conditional_get: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Args {
    fn is_remote(input: &str) -> bool {
        input.starts_with("http://") || input.starts_with("https://")
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "feedscope_core=debug" } else { "feedscope_core=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn build_reader(args: &Args) -> anyhow::Result<Reader> {
    let config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };
    let client = ReqwestClient::new(config).context("Failed to build HTTP client")?;

    let mut builder = Reader::builder()
        .config(ReaderConfig::builder().http_conditional_get(args.conditional_get).build())
        .http_client(client);
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache(FileCache::new(dir));
    }

    Ok(builder.build())
}

fn read_local(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn render(document: &ImportedDocument, args: &Args) -> anyhow::Result<String> {
    match document {
        ImportedDocument::Feed(feed) => {
            let snapshot = FeedSnapshot::capture(feed.as_ref(), !args.no_entries);
            match args.format {
                OutputFormat::Json => snapshot.to_json(true).context("Failed to serialize feed"),
                OutputFormat::Text => Ok(snapshot.to_text()),
            }
        }
        ImportedDocument::Entry(entry) => {
            let snapshot = EntrySnapshot::capture(entry.as_ref());
            match args.format {
                OutputFormat::Json => snapshot.to_json(true).context("Failed to serialize entry"),
                OutputFormat::Text => Ok(snapshot.to_text()),
            }
        }
    }
}

fn run(args: &Args, input: &str) -> anyhow::Result<String> {
    let remote = Args::is_remote(input);
    let total = 3;

    if args.discover {
        if args.verbose {
            print_step(1, total, &format!("Discovering feeds in {}", input.bright_white()));
        }
        let links = if remote {
            build_reader(args)?.find_feed_links(input).context("Failed to discover feeds")?
        } else {
            let html = read_local(input)?;
            FeedLinkSet::from_html(&html, args.base.as_deref().unwrap_or(input))
        };
        if links.is_empty() {
            print_warning("No feed links found");
        }

        return match args.format {
            OutputFormat::Json => links.to_json(true).context("Failed to serialize feed links"),
            OutputFormat::Text => Ok(format_links(&links)),
        };
    }

    let reader = if remote { build_reader(args)? } else { Reader::new() };

    let document = if remote {
        if args.verbose {
            print_step(1, total, &format!("Fetching from {}", input.bright_white().underline()));
        }
        if args.detect {
            let response = reader
                .http_client()
                .context("No HTTP client configured")?
                .get(input, &[])
                .context("Failed to fetch URL")?;
            return Ok(reader.detect_type(&response.body).context("Failed to detect feed type")?.to_string());
        }
        reader.import(input).context("Failed to import feed")?
    } else {
        if args.verbose {
            let source = if input == "-" { "stdin".to_string() } else { format!("file {}", input) };
            print_step(1, total, &format!("Reading from {}", source.bright_white()));
        }
        let text = read_local(input)?;
        if args.verbose {
            print_detail("Size", &format_size(text.len()));
        }
        if args.detect {
            return Ok(reader.detect_type(&text).context("Failed to detect feed type")?.to_string());
        }
        reader.import_string(&text).context("Failed to import feed")?
    };

    if args.verbose {
        print_step(2, total, "Reading feed");
        if let Some(feed) = document.as_feed() {
            print_feed_summary(feed);
        }
        print_step(3, total, "Rendering output");
        print_detail("Format", &format!("{:?}", args.format));
    }

    render(&document, args)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        clap_complete::generate(shell, &mut cmd, "feedscope", &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }

    let input = args.input.clone().context("No input given")?;
    let output = run(&args, &input)?;

    match &args.output {
        Some(path) => {
            fs::write(path, format!("{}\n", output))
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_remote_inputs() {
        assert!(Args::is_remote("https://example.com/feed"));
        assert!(!Args::is_remote("feed.xml"));
        assert!(!Args::is_remote("-"));
    }

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }
}
