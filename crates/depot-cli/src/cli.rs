use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use depot_core::domain::TargetGroup;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub const DEPOT_BEFORE_HELP: &str = concat!(
    "depot ",
    env!("CARGO_PKG_VERSION"),
    " – Maven artifact resolution and snapshot deployment\n\n",
    "  resolve          Find a path across local, cache and remote repositories.\n",
    "  deploy           Store an artifact or snapshot metadata in a local repository.\n",
    "  metadata         Show the snapshot metadata recorded for a version directory.\n",
);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    disable_help_subcommand = true,
    before_help = DEPOT_BEFORE_HELP
)]
pub struct DepotCli {
    #[arg(
        long,
        value_name = "FILE",
        help = "Repository configuration (overrides DEPOT_CONFIG)",
        global = true
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        help = "Treat requests as coming from a peer instance; remotes are never consulted",
        global = true
    )]
    pub peer: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)", global = true)]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v", global = true)]
    pub trace: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes", global = true)]
    pub json: bool,
    #[arg(long, help = "Disable colored human output", global = true)]
    pub no_color: bool,
    #[command(subcommand)]
    pub command: CommandCli,
}

#[derive(Subcommand, Debug)]
pub enum CommandCli {
    #[command(about = "Resolve a repository path and report which repository serves it")]
    Resolve(ResolveArgs),
    #[command(about = "Deploy a file, rewriting snapshot names per the repository's policy")]
    Deploy(DeployArgs),
    #[command(about = "Show a snapshot version directory's metadata and last build number")]
    Metadata(MetadataArgs),
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[arg(value_name = "PATH", help = "Repository-relative path, e.g. org/acme/foo/1.0/foo-1.0.jar")]
    pub path: String,
    #[arg(
        long,
        value_name = "KEY",
        default_value = TargetGroup::ANY_KEY,
        help = "Repository to target; ANY searches every configured repository"
    )]
    pub repo: TargetGroup,
    #[arg(long, help = "Only report the outcome; never copy content")]
    pub head: bool,
    #[arg(
        long,
        value_name = "RFC3339",
        value_parser = parse_rfc3339,
        help = "Report not-modified when the resolved content is not newer"
    )]
    pub if_modified_since: Option<OffsetDateTime>,
    #[arg(short, long, value_name = "FILE", help = "Copy the resolved content to FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[arg(value_name = "REPO", help = "Key of the local repository to deploy into")]
    pub repo: String,
    #[arg(value_name = "PATH", help = "Target path; maven-metadata.xml paths deploy metadata")]
    pub path: String,
    #[arg(long, value_name = "FILE", help = "File holding the content to deploy")]
    pub file: PathBuf,
    #[arg(
        long,
        value_name = "BOOL",
        help = "Whether the client used SNAPSHOT naming (inferred when omitted)"
    )]
    pub client_non_unique: Option<bool>,
}

#[derive(Args, Debug)]
pub struct MetadataArgs {
    #[arg(value_name = "REPO")]
    pub repo: String,
    #[arg(value_name = "DIR", help = "Snapshot version directory, e.g. org/acme/foo/1.0-SNAPSHOT")]
    pub dir: String,
}

fn parse_rfc3339(value: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|err| format!("invalid RFC 3339 timestamp: {err}"))
}
