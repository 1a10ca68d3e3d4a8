use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use harmoniq_interface::settings;
use harmoniq_interface::{
    add_interface_choices, register_builtin, Environment, InterfaceContext, ModuleBank,
    ADD_INTERFACE_TEXT, ADD_INTERFACE_VARIABLE,
};
use harmoniq_playlist::Playlist;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();
    match cli.command {
        Commands::Choices => list_choices(),
        Commands::Run(args) => execute_run(args),
    }
}

#[derive(Parser)]
#[command(author, version, about = "Interface host for Harmoniq Studio")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the chains offered by the "add interface" command.
    Choices,
    /// Start the configured interfaces, then shut them down.
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Interface settings file (JSON). Defaults to the user configuration.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the primary interface chain.
    #[arg(long)]
    intf: Option<String>,
    /// Additional interface chain. May be repeated.
    #[arg(long)]
    extraintf: Vec<String>,
    /// Playlist file restored on first use and saved on exit.
    #[arg(long)]
    playlist: Option<PathBuf>,
    /// URI appended to the shared playlist. May be repeated.
    #[arg(long)]
    enqueue: Vec<String>,
    /// Chain written to the first interface's add command. May be repeated.
    #[arg(long)]
    add: Vec<String>,
}

fn list_choices() -> Result<()> {
    let choices = add_interface_choices(&Environment::detect())?;
    println!("{ADD_INTERFACE_TEXT} ({ADD_INTERFACE_VARIABLE}):");
    for choice in choices {
        println!("  {:<16} {}", choice.value, choice.label);
    }
    Ok(())
}

fn execute_run(args: RunArgs) -> Result<()> {
    let mut interfaces = match &args.settings {
        Some(path) => settings::load_from(path)
            .with_context(|| format!("failed to load interface settings {}", path.display()))?,
        None => settings::load(),
    };
    if let Some(intf) = args.intf {
        interfaces.primary = Some(intf);
    }
    interfaces.extra.extend(args.extraintf);

    let bank = Arc::new(ModuleBank::new());
    register_builtin(&bank);
    let mut builder = InterfaceContext::builder(bank).name("harmoniq-cli");
    if let Some(path) = args.playlist.clone() {
        builder = builder.playlist_factory(move |owner: &str| Playlist::open(owner, &path));
    }
    let context = builder.build();

    let started = context
        .start_interfaces(&interfaces)
        .context("failed to start the primary interface")?;

    let playlist = context.playlist();
    for uri in &args.enqueue {
        let id = playlist.enqueue(uri.as_str(), None);
        tracing::debug!(item = id.0, uri = %uri, "enqueued");
    }

    if let Some(variable) = started
        .first()
        .and_then(|id| context.add_interface_variable(*id))
    {
        for chain in &args.add {
            if let Err(err) = variable.set(&context, chain) {
                eprintln!("Could not add interface {chain}: {err}");
            }
        }
    }

    println!("Interfaces on {}:", context.name());
    for id in context.interface_ids() {
        let module = context.module_name(id).unwrap_or_default();
        println!("  {id}  {module}");
    }
    println!("Playlist ({} items):", playlist.len());
    for item in playlist.items() {
        println!("  {:<24} {}", item.title, item.uri);
    }

    if let Some(path) = &args.playlist {
        playlist
            .save(path)
            .with_context(|| format!("failed to save playlist {}", path.display()))?;
    }

    let stopped = context.destroy_all();
    println!("Stopped {stopped} interface(s).");
    Ok(())
}
