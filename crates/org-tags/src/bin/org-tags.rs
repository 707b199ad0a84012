use std::{
	io::{self, Write},
	path::PathBuf,
	process::ExitCode,
	sync::Arc,
};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use sd_org_tags::{
	init_logging, ConfigSource, Database, EffectiveTagResolver, OrgTagsConfig, Principal,
	SqlTagStore, Tag, TagDirectory, TagError, TagNode,
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
	Human,
	Json,
}

#[derive(Parser, Debug)]
#[command(name = "org-tags", about = "Organization tag administration")]
struct Cli {
	/// Path to the configuration file, created with defaults if missing
	#[arg(long, global = true, default_value = "org-tags.toml")]
	config: PathBuf,

	/// Output format
	#[arg(long, global = true, value_enum, default_value = "json")]
	format: OutputFormat,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// List every tag
	List,
	/// Print the tag hierarchy
	Tree,
	/// Show one tag
	Show { id: String },
	/// Create a tag
	Create(TagArgs),
	/// Update a tag's name, description and parent
	Update(TagArgs),
	/// Delete a tag; refuses when it has children unless `--reparent` is given
	Delete {
		id: String,
		/// Move the children to the deleted tag's parent first
		#[arg(long, default_value_t = false)]
		reparent: bool,
	},
	/// Expand a comma-separated list of held tags into the effective tag set
	Resolve { seeds: String },
}

#[derive(Parser, Debug, Clone)]
struct TagArgs {
	id: String,
	#[arg(long)]
	name: String,
	#[arg(long, default_value = "")]
	description: String,
	/// Parent tag id; omit or leave blank for a root tag
	#[arg(long)]
	parent: Option<String>,
	/// Who is making the change
	#[arg(long, default_value = "")]
	actor: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
	let cli = Cli::parse();

	let (config, source) = OrgTagsConfig::load_or_create(&cli.config)?;
	let _guard = init_logging(&config.logging)?;

	match source {
		ConfigSource::Loaded => info!("Loaded config from {}", cli.config.display()),
		ConfigSource::Created => warn!(
			"No config found, created default at {}",
			cli.config.display()
		),
	}

	let db = match &config.database_url {
		Some(_) => Database::connect(&config.database_url(), &config.database).await?,
		None if config.database_path().exists() => {
			Database::open(&config.database_path(), &config.database).await?
		}
		None => Database::create(&config.database_path(), &config.database).await?,
	};
	db.migrate().await?;

	let store = Arc::new(SqlTagStore::new(&db));
	let directory = TagDirectory::new(store.clone()).with_system_actor(config.system_actor());
	let resolver = EffectiveTagResolver::new(store);

	let mut out = io::stdout().lock();
	match run(cli.command, &cli.format, &directory, &resolver, &mut out).await {
		Ok(()) => Ok(ExitCode::SUCCESS),
		Err(e) => {
			if let Some(tag_error) = e.downcast_ref::<TagError>() {
				error!(%tag_error, status = tag_error.status_code(), "Command failed");
				eprintln!("{}: {tag_error}", tag_error.public_message());
			} else {
				error!(?e, "Command failed");
				eprintln!("{e:#}");
			}
			Ok(ExitCode::FAILURE)
		}
	}
}

async fn run(
	command: Commands,
	format: &OutputFormat,
	directory: &TagDirectory,
	resolver: &EffectiveTagResolver,
	out: &mut impl Write,
) -> Result<()> {
	match command {
		Commands::List => print_tags(out, format, &directory.list().await?),
		Commands::Tree => print_forest(out, format, &directory.get_tree().await?),
		Commands::Show { id } => print_tags(out, format, &[directory.find_by_id(&id).await?]),
		Commands::Create(args) => {
			let tag = directory
				.create(
					&args.id,
					&args.name,
					&args.description,
					args.parent.as_deref(),
					&args.actor,
				)
				.await?;
			print_tags(out, format, &[tag])
		}
		Commands::Update(args) => {
			let tag = directory
				.update(
					&args.id,
					&args.name,
					&args.description,
					args.parent.as_deref(),
					&args.actor,
				)
				.await?;
			print_tags(out, format, &[tag])
		}
		Commands::Delete { id, reparent } => {
			if reparent {
				directory.delete_and_reparent(&id).await?;
			} else {
				directory.delete(&id).await?;
			}
			writeln!(out, "deleted {}", id.trim())?;
			Ok(())
		}
		Commands::Resolve { seeds } => {
			let effective = resolver
				.resolve_principal(&Principal::from_raw(&seeds))
				.await?;
			print_tags(out, format, &effective)
		}
	}
}

fn print_json(out: &mut impl Write, value: &impl Serialize) -> Result<()> {
	serde_json::to_writer_pretty(&mut *out, value)?;
	writeln!(out)?;
	Ok(())
}

fn print_tags(out: &mut impl Write, format: &OutputFormat, tags: &[Tag]) -> Result<()> {
	match format {
		OutputFormat::Json => print_json(out, &tags),
		OutputFormat::Human => {
			for tag in tags {
				writeln!(
					out,
					"{}\t{}\tparent={}\tupdated_by={}",
					tag.id,
					tag.name,
					tag.parent_id.as_deref().unwrap_or("-"),
					tag.updated_by
				)?;
			}
			Ok(())
		}
	}
}

fn print_forest(out: &mut impl Write, format: &OutputFormat, forest: &[TagNode]) -> Result<()> {
	match format {
		OutputFormat::Json => print_json(out, &forest),
		OutputFormat::Human => {
			let mut pending = forest.iter().rev().map(|node| (node, 0)).collect::<Vec<_>>();
			while let Some((node, depth)) = pending.pop() {
				writeln!(out, "{}{} ({})", "  ".repeat(depth), node.tag_id, node.name)?;
				pending.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
			}
			Ok(())
		}
	}
}
