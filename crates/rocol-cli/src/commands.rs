use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use rocol_sdk::{
    Collector, CollectorConfig, CommitReceipt, FsRepository, PathSegments, Provenance,
    ProvenanceConfig, Repository, ValidatorSetting, VersionedObject,
};
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Build(args) => cmd_build(args).await,
        Command::Log(args) => cmd_log(args),
        Command::Show(args) => cmd_show(args),
    }
}

fn load_config(repo: &RepoArgs) -> anyhow::Result<CollectorConfig> {
    let mut config = match &repo.config {
        Some(path) => CollectorConfig::from_toml_file(path)?,
        None => CollectorConfig::default(),
    };
    if let Some(p) = &repo.repo_path {
        config.repo_path = p.clone();
    }
    if let Some(p) = &repo.repo_scratch {
        config.repo_scratch = p.clone();
    }
    Ok(config)
}

fn override_setting(flag: &Option<Option<String>>, setting: &mut ValidatorSetting) {
    match flag {
        None => {}
        Some(None) => *setting = ValidatorSetting::Default,
        Some(Some(location)) => *setting = ValidatorSetting::Location(location.clone()),
    }
}

fn build_config(args: &BuildArgs) -> anyhow::Result<CollectorConfig> {
    let mut config = load_config(&args.repo)?;
    if let Some(v) = &args.repo_name {
        config.repo_name = v.clone();
    }
    if let Some(v) = &args.namespace {
        config.namespace = v.clone();
    }
    if let Some(v) = &args.collection_name {
        config.collection_name = Some(v.clone());
    }
    if let Some(v) = &args.template {
        config.template_dir = Some(v.clone());
    }
    if let Some(v) = &args.data_dir {
        config.data_dir = Some(v.clone());
    }
    if let Some(v) = &args.temp_path {
        config.temp_path = v.clone();
    }
    if let Some(v) = &args.excel {
        config.excel = Some(v.clone());
    }
    override_setting(&args.validate_with_excel, &mut config.validate_with_excel);
    override_setting(&args.validate_with_mode, &mut config.validate_with_mode);
    config.debug |= args.debug;
    config.multiple |= args.multiple;
    Ok(config)
}

/// Configured provenance, falling back to this program's own package
/// metadata for whatever is not set.
fn provenance_for(config: &CollectorConfig) -> anyhow::Result<Provenance> {
    let mut prov: ProvenanceConfig = config.resolved_provenance();
    prov.name.get_or_insert_with(|| env!("CARGO_PKG_NAME").to_string());
    prov.description
        .get_or_insert_with(|| env!("CARGO_PKG_DESCRIPTION").to_string());
    prov.repository_url
        .get_or_insert_with(|| env!("CARGO_PKG_REPOSITORY").to_string());
    Ok(Provenance::new(&prov)?)
}

fn parse_extras(raw: &[String]) -> anyhow::Result<Vec<(PathBuf, String)>> {
    raw.iter()
        .map(|s| match s.split_once('=') {
            Some((source, target)) if !target.is_empty() => {
                Ok((PathBuf::from(source), target.to_string()))
            }
            _ => bail!("--extra expects SOURCE=TARGET, got {s}"),
        })
        .collect()
}

async fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let config = build_config(&args)?;
    let extras = parse_extras(&args.extras)?;
    let provenance = provenance_for(&config)?;
    let multiple = config.multiple;
    let template = config.template_dir.clone();

    let collector = if args.repo.scratch {
        Collector::connect_scratch(config, provenance)?
    } else {
        Collector::connect(config, provenance)?
    };

    let batches: Vec<PathSegments> = if multiple {
        args.ids.iter().map(|id| PathSegments::from(id.as_str())).collect()
    } else {
        vec![PathSegments::from(args.ids.clone())]
    };

    let mut failed = 0;
    for segments in batches {
        let mut object = collector.new_object(template.as_deref())?;
        let id = object.mint_arcp_id(segments, None)?;
        match object.add_to_repo(&extras).await {
            Ok(receipt) => print_receipt(&receipt, args.json)?,
            Err(e) => {
                failed += 1;
                eprintln!("{} {}", "✗".red().bold(), id.to_string().yellow());
                for line in e.to_string().lines() {
                    eprintln!("  {line}");
                }
            }
        }
    }
    if failed > 0 {
        bail!("{failed} object(s) were not added to the repository");
    }
    Ok(())
}

fn print_receipt(receipt: &CommitReceipt, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(receipt)?);
    } else {
        println!(
            "{} {} {} ({} files)",
            "✓".green().bold(),
            receipt.object_id.to_string().cyan(),
            receipt.version.to_string().yellow(),
            receipt.files
        );
    }
    Ok(())
}

fn open_repository(repo: &RepoArgs) -> anyhow::Result<Arc<dyn Repository>> {
    let config = load_config(repo)?;
    let root = config.repository_root(repo.scratch);
    let store = FsRepository::load(root)
        .with_context(|| format!("no repository at {}", root.display()))?;
    info!(root = %root.display(), "opened repository");
    Ok(Arc::new(store))
}

fn cmd_log(args: ObjectArgs) -> anyhow::Result<()> {
    let repo = open_repository(&args.repo)?;
    let object = VersionedObject::open(repo.as_ref(), args.object_id.as_str());
    if !object.exists()? {
        bail!("object {} not found", args.object_id);
    }
    let inventory = object.inventory()?;
    for (version, record) in inventory.versions.iter().rev() {
        println!(
            "{}  {}  {} files",
            version.to_string().yellow().bold(),
            record.created.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            record.len()
        );
        println!("  {}", record.message);
    }
    Ok(())
}

fn cmd_show(args: ObjectArgs) -> anyhow::Result<()> {
    let repo = open_repository(&args.repo)?;
    let object = VersionedObject::open(repo.as_ref(), args.object_id.as_str());
    let inventory = object.inventory()?;
    let (Some(head), Some(record)) = (inventory.head, inventory.head_record()) else {
        bail!("object {} not found", args.object_id);
    };
    println!("{} {}", args.object_id.cyan().bold(), head.to_string().yellow());
    for (path, digest) in &record.state {
        let size = inventory.manifest.get(digest).copied().unwrap_or(0);
        println!("  {}  {:>10}  {}", digest.short_hex().dimmed(), size, path);
    }
    Ok(())
}
