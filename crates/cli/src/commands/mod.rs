//! CLI command definitions and execution
//!
//! Each command lives in its own module with a clap `Args` struct and
//! an `execute` function that returns an [`ExitCode`]. Errors are
//! reported through the [`Formatter`], never propagated to main.

use clap::{Parser, Subcommand};

use osc_core::{Error, ProfileStore, Result};
use osc_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod cp;
mod download;
mod ls;
mod mkdir;
mod mv;
mod profile;
mod rm;
mod rmdir;
mod search;
mod stat;
mod upload;
mod versions;

/// osc - object storage client
///
/// A command-line client for S3-compatible object storage with its own
/// Signature V4 signing and chunked parallel transfers.
#[derive(Parser, Debug)]
#[command(name = "osc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Profile holding the endpoint and credentials to use
    #[arg(short, long, global = true, default_value = "default")]
    pub profile: String,

    /// Output format: human-readable or JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage connection profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List buckets and objects
    Ls(ls::LsArgs),

    /// Show object metadata
    Stat(stat::StatArgs),

    /// Upload a local file
    Upload(upload::UploadArgs),

    /// Download an object
    Download(download::DownloadArgs),

    /// Copy an object server-side
    Cp(cp::CpArgs),

    /// Move an object server-side (copy + delete source)
    Mv(mv::MvArgs),

    /// Remove an object or one of its versions
    Rm(rm::RmArgs),

    /// Create a folder placeholder
    Mkdir(mkdir::MkdirArgs),

    /// Remove a folder and everything under it
    Rmdir(rmdir::RmdirArgs),

    /// List object versions and delete markers
    Versions(versions::VersionsArgs),

    /// Search object keys by pattern
    Search(search::SearchArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };
    let profile_name = cli.profile;

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, &profile_name, output_config).await,
        Commands::Stat(args) => stat::execute(args, &profile_name, output_config).await,
        Commands::Upload(args) => upload::execute(args, &profile_name, output_config).await,
        Commands::Download(args) => download::execute(args, &profile_name, output_config).await,
        Commands::Cp(args) => cp::execute(args, &profile_name, output_config).await,
        Commands::Mv(args) => mv::execute(args, &profile_name, output_config).await,
        Commands::Rm(args) => rm::execute(args, &profile_name, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, &profile_name, output_config).await,
        Commands::Rmdir(args) => rmdir::execute(args, &profile_name, output_config).await,
        Commands::Versions(args) => versions::execute(args, &profile_name, output_config).await,
        Commands::Search(args) => search::execute(args, &profile_name, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Resolve the named profile into a signing client. No network traffic
/// happens here; bad credentials surface on the first request.
fn client_for(profile: &str) -> Result<S3Client> {
    let store = ProfileStore::new()?;
    let profile = store.get(profile)?;
    S3Client::new(profile.credentials()?)
}

/// Report an error through the formatter and map it to an exit code
fn fail(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from(error)
}

/// Render a server timestamp the way listings display it. Listing XML
/// carries RFC 3339 and HEAD responses carry RFC 2822; anything else
/// is shown as received.
fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = raw.parse::<jiff::Timestamp>() {
        return ts.strftime("%Y-%m-%d %H:%M:%S").to_string();
    }
    if let Ok(ts) = jiff::fmt::rfc2822::DateTimeParser::new().parse_timestamp(raw) {
        return ts.strftime("%Y-%m-%d %H:%M:%S").to_string();
    }
    raw.to_string()
}
