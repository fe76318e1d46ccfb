//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download the files a web page links to.
///
/// Fetches URL, collects every `<a href>` and `<img src>` whose value ends
/// with one of the selected formats, and saves each file into the output
/// folder under its original name, overwriting files of the same name.
#[derive(Parser, Debug)]
#[command(name = "site-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Page to scan for downloadable files
    pub url: String,

    /// Existing folder to save files into (falls back to `output_dir` in the config file)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// File format to download, e.g. `.mp3` or `jpg` (repeatable or comma-separated; default: .mp3,.jpg)
    #[arg(short = 'f', long = "format", value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Print run events as JSON lines on stdout instead of a progress bar
    #[arg(long)]
    pub json: bool,

    /// Connect timeout in seconds (1-3600; default: none)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Whole-request timeout in seconds (1-3600; default: none)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
