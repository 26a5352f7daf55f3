use anyhow::Result;
use clap::{Parser, Subcommand};
use rimstack::config::Paths;
use rimstack::{AddOptions, Config, ModManager, ModSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rimstack")]
#[command(
    author,
    version,
    about = "A CLI mod library and load-order tool for RimWorld on Linux"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan mod installation directories and report what was found
    Scan {
        /// Restrict to one source: workshop, local, core
        #[arg(long)]
        source: Option<String>,

        /// Print the full scan result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all mods in the library
    List {
        /// Restrict to one source: workshop, local, core
        #[arg(long)]
        source: Option<String>,
    },

    /// Show the active load order from the game's ModsConfig.xml
    Order {
        /// Package ids to add to the selection
        #[arg(long = "add")]
        add: Vec<String>,

        /// Position to insert added mods at (defaults to the end)
        #[arg(long)]
        at: Option<usize>,

        /// Do not pull in dependencies of added mods
        #[arg(long)]
        no_deps: bool,
    },

    /// Show configured paths, the resolved game version, and mod counts
    Status,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "rimstack=info",
        1 => "rimstack=debug",
        2 => "rimstack=trace",
        _ => "trace",
    };

    let paths = Paths::new();
    std::fs::create_dir_all(paths.log_dir()).ok();
    let log_file = paths.log_dir().join("rimstack.log");

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .expect("Failed to open log file");

    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::sync::Arc::new(file)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Scan { source, json } => cmd_scan(&config, source.as_deref(), json),
        Commands::List { source } => cmd_list(&config, source.as_deref()),
        Commands::Order { add, at, no_deps } => cmd_order(&config, &add, at, no_deps),
        Commands::Status => cmd_status(&config),
    }
}

fn selected_sources(source: Option<&str>) -> Result<Vec<ModSource>> {
    match source {
        Some(value) => Ok(vec![ModSource::from_cli(value)?]),
        None => Ok(ModSource::all().to_vec()),
    }
}

/// Scan every requested source into the manager. A source whose root
/// cannot be read is reported and skipped; the others still load.
fn scan_into(config: &Config, manager: &mut ModManager, sources: &[ModSource]) {
    for &source in sources {
        let root = config.source_root(source);
        match manager.scan_source(&root, source) {
            Ok(diagnostics) => {
                let skipped = diagnostics.skipped();
                if skipped > 0 || !diagnostics.errors.is_empty() {
                    tracing::warn!(
                        "{}: {} mod folder(s) failed to load ({} errors)",
                        source,
                        skipped,
                        diagnostics.errors.len()
                    );
                }
            }
            Err(e) => {
                tracing::error!("Skipping {} source: {}", source, e);
            }
        }
    }
}

fn cmd_scan(config: &Config, source: Option<&str>, json: bool) -> Result<()> {
    let sources = selected_sources(source)?;

    for &src in &sources {
        let root = config.source_root(src);
        let outcome = rimstack::scan_directory(&root, src)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            continue;
        }

        let d = &outcome.diagnostics;
        println!(
            "{}: {} mods ({} folders, {} files)",
            src,
            outcome.mods.len(),
            d.folders,
            d.files
        );
        if !d.missing_about_folder.is_empty() {
            println!("  missing About folder: {}", d.missing_about_folder.join(", "));
        }
        if !d.missing_about_xml.is_empty() {
            println!("  missing About.xml: {}", d.missing_about_xml.join(", "));
        }
        if !d.invalid_xml.is_empty() {
            println!("  invalid XML: {}", d.invalid_xml.join(", "));
        }
        for err in &d.errors {
            println!("  error: {}", err);
        }
    }

    Ok(())
}

fn cmd_list(config: &Config, source: Option<&str>) -> Result<()> {
    let sources = selected_sources(source)?;
    let mut manager = ModManager::with_overrides(config.mod_source_overrides.clone());
    scan_into(config, &mut manager, &sources);

    let mut mods: Vec<_> = manager.library().iter().collect();
    mods.sort_by(|a, b| a.key().cmp(&b.key()));

    for m in mods {
        let versions = m
            .supported_versions
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:<10} {:<50} {} [{}]",
            m.source.as_str(),
            m.package_id,
            m.name,
            versions
        );
    }
    println!("{} mods total", manager.library().len());

    Ok(())
}

fn cmd_order(config: &Config, add: &[String], at: Option<usize>, no_deps: bool) -> Result<()> {
    let mods_config = rimstack::loadorder::read_mods_config(&config.mods_config_path())?;
    let version = config.resolve_version(mods_config.version.as_ref().map(|v| v.key));

    let mut manager = ModManager::with_overrides(config.mod_source_overrides.clone());
    scan_into(config, &mut manager, ModSource::all());

    // the saved list is taken as-is; expansion only applies to new adds
    manager.selection_add(
        &mods_config.active_mods,
        AddOptions {
            expand_dependencies: false,
            ..AddOptions::default()
        },
    );

    if !add.is_empty() {
        manager.selection_add(
            add,
            AddOptions {
                index: at,
                expand_dependencies: !no_deps,
                active_version: Some(version),
            },
        );
    }

    println!("Game version: {}", version);
    for (i, entry) in manager.selection().entries().enumerate() {
        match entry.resolved {
            Some(m) => println!("{:>4}  {:<50} {}", i + 1, entry.package_id, m.name),
            None => println!("{:>4}  {:<50} (not found)", i + 1, entry.package_id),
        }
    }

    Ok(())
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Config file: {}", config.paths.config_file().display());
    println!("ModsConfig:  {}", config.mods_config_path().display());

    let native = rimstack::loadorder::read_mods_config(&config.mods_config_path())
        .ok()
        .and_then(|c| c.version)
        .map(|v| v.key);
    println!("Game version: {}", config.resolve_version(native));

    let mut manager = ModManager::with_overrides(config.mod_source_overrides.clone());
    scan_into(config, &mut manager, ModSource::all());

    for &source in ModSource::all() {
        println!(
            "{:<10} {:>5} mods   {}",
            source,
            manager.library().count_by_source(source),
            config.source_root(source).display()
        );
    }

    Ok(())
}
