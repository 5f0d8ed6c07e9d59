//! profile command - Manage connection profiles
//!
//! Profiles are named endpoint-plus-credential sets stored in the
//! profile file. Secret keys are write-only from the CLI's point of
//! view: list and show never print them.

use clap::Subcommand;
use serde::Serialize;

use osc_core::{Profile, ProfileStore};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::fail;

/// Profile subcommands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Add or update a profile
    Set(SetArgs),

    /// List all configured profiles
    List,

    /// Remove a profile
    Remove(RemoveArgs),

    /// Show one profile without its secret key
    Show(ShowArgs),
}

/// Arguments for the `profile set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Profile name (e.g., "default", "minio", "prod")
    pub name: String,

    /// Access key ID
    pub access_key: String,

    /// Secret access key
    pub secret_key: String,

    /// Endpoint URL (e.g., "http://localhost:9000"); defaults to the
    /// standard AWS endpoint for the region
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Region used for signing
    #[arg(long, default_value = "us-east-1")]
    pub region: String,
}

/// Arguments for the `profile remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the profile to remove
    pub name: String,
}

/// Arguments for the `profile show` command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Name of the profile to show
    pub name: String,
}

#[derive(Debug, Serialize)]
struct ProfileRow {
    name: String,
    endpoint: String,
    region: String,
    access_key: String,
}

impl ProfileRow {
    fn new(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            endpoint: profile
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", profile.region)),
            region: profile.region.clone(),
            access_key: profile.access_key.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ProfileListOutput {
    profiles: Vec<ProfileRow>,
}

/// Execute a profile subcommand
pub async fn execute(cmd: ProfileCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let store = match ProfileStore::new() {
        Ok(store) => store,
        Err(e) => return fail(&formatter, &e),
    };

    match cmd {
        ProfileCommands::Set(args) => set(args, &store, &formatter),
        ProfileCommands::List => list(&store, &formatter),
        ProfileCommands::Remove(args) => remove(args, &store, &formatter),
        ProfileCommands::Show(args) => show(args, &store, &formatter),
    }
}

fn set(args: SetArgs, store: &ProfileStore, formatter: &Formatter) -> ExitCode {
    let mut profile =
        Profile::new(&args.name, &args.access_key, &args.secret_key).with_region(&args.region);
    if let Some(endpoint) = &args.endpoint {
        profile = profile.with_endpoint(endpoint);
    }

    // Reject endpoints the transport could never use before saving
    if let Err(e) = profile.endpoint_url() {
        return fail(formatter, &e);
    }

    if let Err(e) = store.set(profile) {
        return fail(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({ "status": "success", "profile": args.name }));
    } else {
        formatter.success(&format!("Profile '{}' saved", args.name));
    }
    ExitCode::Success
}

fn list(store: &ProfileStore, formatter: &Formatter) -> ExitCode {
    let profiles = match store.list() {
        Ok(profiles) => profiles,
        Err(e) => return fail(formatter, &e),
    };

    if formatter.is_json() {
        let output = ProfileListOutput {
            profiles: profiles.iter().map(ProfileRow::new).collect(),
        };
        formatter.json(&output);
    } else if profiles.is_empty() {
        formatter.println("No profiles configured. Add one with: osc profile set");
    } else {
        for profile in &profiles {
            let row = ProfileRow::new(profile);
            formatter.println(&format!(
                "{:<12} {} (region: {})",
                row.name, row.endpoint, row.region
            ));
        }
    }
    ExitCode::Success
}

fn remove(args: RemoveArgs, store: &ProfileStore, formatter: &Formatter) -> ExitCode {
    if let Err(e) = store.remove(&args.name) {
        return fail(formatter, &e);
    }

    if formatter.is_json() {
        formatter.json(&serde_json::json!({ "status": "success", "profile": args.name }));
    } else {
        formatter.success(&format!("Profile '{}' removed", args.name));
    }
    ExitCode::Success
}

fn show(args: ShowArgs, store: &ProfileStore, formatter: &Formatter) -> ExitCode {
    let profile = match store.get(&args.name) {
        Ok(profile) => profile,
        Err(e) => return fail(formatter, &e),
    };

    let row = ProfileRow::new(&profile);
    if formatter.is_json() {
        formatter.json(&row);
    } else {
        formatter.println(&format!("Name:       {}", row.name));
        formatter.println(&format!("Endpoint:   {}", row.endpoint));
        formatter.println(&format!("Region:     {}", row.region));
        formatter.println(&format!("Access key: {}", row.access_key));
    }
    ExitCode::Success
}
