use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "rocol",
    about = "Build RO-Crates and commit them to a versioned repository",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn debug(&self) -> bool {
        match &self.command {
            Command::Build(args) => args.debug,
            Command::Log(_) | Command::Show(_) => false,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Build an object from a template crate and commit it
    Build(BuildArgs),
    /// List the versions of an object
    Log(ObjectArgs),
    /// List the files of an object's head version
    Show(ObjectArgs),
}

/// Where to find the repository.
#[derive(Args, Clone, Debug)]
pub struct RepoArgs {
    /// TOML file with collector settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub repo_path: Option<PathBuf>,
    /// Scratch repository used with --scratch
    #[arg(long)]
    pub repo_scratch: Option<PathBuf>,
    /// Use the scratch repository instead of the main one
    #[arg(long)]
    pub scratch: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
    /// Name under which objects are identified in the repository
    #[arg(long)]
    pub repo_name: Option<String>,
    /// Namespace of minted identifiers
    #[arg(long)]
    pub namespace: Option<String>,
    #[arg(long)]
    pub collection_name: Option<String>,
    /// Crate directory holding the template ro-crate-metadata.json
    #[arg(long)]
    pub template: Option<PathBuf>,
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub temp_path: Option<PathBuf>,
    /// Input workbook, recorded as the provenance input
    #[arg(long)]
    pub excel: Option<PathBuf>,
    /// Check the crate against an expectation workbook directory
    #[arg(long, num_args = 0..=1, value_name = "DIR")]
    pub validate_with_excel: Option<Option<String>>,
    /// Check the crate against a mode definition (URL or file)
    #[arg(long, num_args = 0..=1, value_name = "LOCATION")]
    pub validate_with_mode: Option<Option<String>>,
    #[arg(long)]
    pub debug: bool,
    /// Build one object per --id instead of one object from all of them
    #[arg(long)]
    pub multiple: bool,
    /// Identifier path segment; repeatable
    #[arg(long = "id", required = true)]
    pub ids: Vec<String>,
    /// Extra file to commit, as SOURCE=TARGET
    #[arg(long = "extra", value_name = "SOURCE=TARGET")]
    pub extras: Vec<String>,
    /// Print receipts as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ObjectArgs {
    #[command(flatten)]
    pub repo: RepoArgs,
    /// Full object identifier, e.g. arcp://name,corpus/item
    pub object_id: String,
}
