//! search command - Find object keys by pattern
//!
//! Pages through ListObjectsV2 (no delimiter, so the whole subtree is
//! visible) and matches each key client-side: case-insensitive
//! substring by default, or a regular expression with `--regex`.

use clap::Args;
use serde::Serialize;

use osc_core::{Error, Result};
use osc_s3::ListOptions;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{client_for, fail, format_timestamp};

/// Search object keys by pattern
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Bucket to search
    pub bucket: String,

    /// Pattern to match against object keys
    pub pattern: String,

    /// Only search keys under this prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Treat the pattern as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Keys fetched per listing request
    #[arg(long, default_value_t = 1000)]
    pub page_size: u32,

    /// Stop after this many matches
    #[arg(long)]
    pub max_results: Option<usize>,
}

/// How keys are matched against the pattern
#[derive(Debug)]
enum Matcher {
    Substring(String),
    Regex(regex::Regex),
}

impl Matcher {
    fn new(pattern: &str, use_regex: bool) -> Result<Self> {
        if use_regex {
            let re = regex::Regex::new(pattern)
                .map_err(|e| Error::Config(format!("Invalid regex pattern: {e}")))?;
            Ok(Matcher::Regex(re))
        } else {
            Ok(Matcher::Substring(pattern.to_lowercase()))
        }
    }

    fn matches(&self, key: &str) -> bool {
        match self {
            Matcher::Substring(needle) => key.to_lowercase().contains(needle),
            Matcher::Regex(re) => re.is_match(key),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchOutput {
    matches: Vec<MatchRow>,
    scanned: usize,
    truncated: bool,
}

#[derive(Debug, Serialize)]
struct MatchRow {
    key: String,
    size_bytes: u64,
    last_modified: String,
}

/// Execute the search command
pub async fn execute(args: SearchArgs, profile: &str, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let matcher = match Matcher::new(&args.pattern, args.regex) {
        Ok(matcher) => matcher,
        Err(e) => return fail(&formatter, &e),
    };

    let client = match client_for(profile) {
        Ok(client) => client,
        Err(e) => return fail(&formatter, &e),
    };

    let limit = args.max_results.unwrap_or(usize::MAX);
    let mut matches = Vec::new();
    let mut scanned = 0;
    let mut truncated = false;
    let mut token: Option<String> = None;

    loop {
        let options = ListOptions {
            prefix: args.prefix.clone(),
            continuation_token: token.take(),
            max_keys: Some(args.page_size.max(1)),
            ..ListOptions::default()
        };

        let page = match client.list_objects(&args.bucket, options).await {
            Ok(page) => page,
            Err(e) => return fail(&formatter, &e),
        };

        scanned += page.contents.len();
        for object in page.contents {
            if !matcher.matches(&object.key) {
                continue;
            }
            if matches.len() == limit {
                truncated = true;
                break;
            }
            matches.push(MatchRow {
                key: object.key,
                size_bytes: object.size,
                last_modified: object.last_modified,
            });
        }

        if truncated {
            break;
        }
        match (page.is_truncated, page.next_continuation_token) {
            (true, Some(next)) => token = Some(next),
            _ => break,
        }
    }

    if formatter.is_json() {
        let output = SearchOutput {
            matches,
            scanned,
            truncated,
        };
        formatter.json(&output);
        return ExitCode::Success;
    }

    for row in &matches {
        formatter.println(&format!(
            "[{}] {:>10} {}",
            format_timestamp(&row.last_modified),
            humansize::format_size(row.size_bytes, humansize::BINARY),
            row.key
        ));
    }
    if matches.is_empty() {
        formatter.println(&format!("No keys matching '{}'", args.pattern));
    } else if truncated {
        formatter.println(&format!(
            "\n{} matches shown (limit reached), {scanned} keys scanned",
            matches.len()
        ));
    } else {
        formatter.println(&format!(
            "\n{} matches, {scanned} keys scanned",
            matches.len()
        ));
    }

    ExitCode::Success
}
