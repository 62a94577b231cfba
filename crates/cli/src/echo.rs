use feedscope_core::{Feed, FeedLinkSet};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "feedscope".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Inspect RSS, RDF and Atom feeds\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled value under the current step
pub fn print_detail(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print a short summary of an imported feed
pub fn print_feed_summary(feed: &dyn Feed) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Feed Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    print_detail("Type", feed.feed_type().code());
    print_detail("Encoding", &feed.encoding());
    print_detail("Entries", &feed.count().to_string());
    print_detail("Extensions", &feed.extensions().names().join(", "));
    let hubs = feed.hubs();
    if !hubs.is_empty() {
        print_detail("Hubs", &hubs.join(", "));
    }
    eprintln!();
}

/// Format discovered feed links, one per line
pub fn format_links(links: &FeedLinkSet) -> String {
    links
        .iter()
        .map(|link| match &link.title {
            Some(title) => format!("{}\t{}\t{}", link.media_type, link.href, title),
            None => format!("{}\t{}", link.media_type, link.href),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
