//! Binary entrypoint for the charcore CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `check` - load definitions and quests and compile every formula
//! - `inspect <name>` - print a stored character's sheet, stats and quests
//! - `formula <expr> [name=value...]` - evaluate an expression
//! - `migrate-quests` - rewrite stored quest columns in the current shape
//!
//! See the library crate docs for module-level details: `charcore::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::sync::Arc;

use charcore::character::{
    decode_quests, encode_quest_records, Character, CharacterId, CharacterStore, Column,
    Formula, FormulaVars, LogSession, QuestContext, SledCharacterStore, World,
};
use charcore::config::Config;

#[derive(Parser)]
#[command(name = "charcore")]
#[command(about = "Character runtime tooling for a persistent multiplayer world server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Validate configuration, definition seeds and quest catalog
    Check,
    /// Print a stored character
    Inspect {
        /// Character name
        name: String,
    },
    /// Evaluate a formula expression
    Formula {
        /// Infix expression, e.g. "10 + level * 5"
        expr: String,
        /// Variable bindings as name=value
        vars: Vec<String>,
    },
    /// Rewrite quest columns saved in older formats
    MigrateQuests,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init has no config to read yet
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            Config::create_default(&cli.config).await?;
            println!("Created default configuration at {}", cli.config);
            println!("Edit [storage] to point at your definition and quest seeds.");
        }
        Commands::Check => {
            let config = require_config(pre_config, &cli.config)?;
            let world = World::from_config(&config)?;
            println!("Configuration OK");
            println!("  items:    {}", world.tables.item_count());
            println!("  quests:   {}", world.quests.len());
            println!("  formulas: {}", world.formulas.len());
            println!("  store:    {}", config.storage.db_path().display());
        }
        Commands::Inspect { name } => {
            let config = require_config(pre_config, &cli.config)?;
            let world = Arc::new(World::from_config(&config)?);
            inspect(world, &name)?;
        }
        Commands::Formula { expr, vars } => {
            let formula = Formula::parse(&expr).map_err(|e| anyhow!("{}: {}", expr, e))?;
            let vars = parse_bindings(&vars)?;
            let value = formula.eval(&vars).map_err(|e| anyhow!("{}: {}", expr, e))?;
            println!("{}", value);
        }
        Commands::MigrateQuests => {
            let config = require_config(pre_config, &cli.config)?;
            let store = SledCharacterStore::open(config.storage.db_path())?;
            let migrated = migrate_quests(&store)?;
            println!("Migrated quest columns: {}", migrated);
        }
    }

    Ok(())
}

fn require_config(config: Option<Config>, path: &str) -> Result<Config> {
    config.ok_or_else(|| anyhow!("could not load {} (run `charcore init` first)", path))
}

fn parse_bindings(bindings: &[String]) -> Result<FormulaVars> {
    let mut vars = FormulaVars::new();
    for binding in bindings {
        let (name, value) = binding
            .split_once('=')
            .ok_or_else(|| anyhow!("expected name=value, got '{}'", binding))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| anyhow!("'{}' is not a number", value))?;
        vars.insert(name.trim().to_lowercase(), value);
    }
    Ok(vars)
}

fn inspect(world: Arc<World>, name: &str) -> Result<()> {
    let row = world.store.load_row(name)?;
    let mut character = Character::from_row(Arc::clone(&world), CharacterId(0), &row, Arc::new(LogSession))?;
    character.calculate_stats(false);

    let sheet = character.sheet();
    let derived = sheet.derived;
    println!("{} (level {}, class {}, bot: {})", sheet.name, sheet.level, sheet.class, character.is_bot());
    println!("  hp {}/{}  tp {}/{}  sp {}", sheet.hp, derived.max_hp, sheet.tp, derived.max_tp, derived.max_sp);
    println!("  weight {}/{}", derived.weight, derived.max_weight);
    println!(
        "  damage {}-{}  accuracy {}  evade {}  armor {}",
        derived.min_damage, derived.max_damage, derived.accuracy, derived.evade, derived.armor
    );
    let a = sheet.display;
    println!(
        "  str {} int {} wis {} agi {} con {} cha {}",
        a.str, a.intl, a.wis, a.agi, a.con, a.cha
    );
    println!("  inventory: {} lines, spells: {}", sheet.inventory.len(), sheet.spells.len());
    println!("  usage: {} minutes", character.usage());

    let report = character.hydrate_quests();
    println!(
        "  quests: {} resumed, {} inactive, {} dropped",
        report.resumed, report.inactive, report.dropped
    );
    let quests = character.quests();
    for id in quests.active_ids() {
        if let Some(quest) = quests.get(id) {
            println!(
                "  quest {} [{}] {}",
                id,
                quest.context.state_name(),
                quest.context.serialize_progress()
            );
        }
    }
    for record in quests.inactive() {
        println!(
            "  quest {} [{}] {} (inactive)",
            record.quest_id, record.state, record.progress
        );
    }
    Ok(())
}

fn migrate_quests(store: &SledCharacterStore) -> Result<usize> {
    let mut migrated = 0;
    for name in store.list_names()? {
        let mut row = store.load_row(&name)?;
        let Some(Column::Text(column)) = row.get("quest") else {
            warn!("{}: no quest column", name);
            continue;
        };
        let batch = decode_quests(column);
        if !batch.migrated {
            continue;
        }
        let encoded = encode_quest_records(batch.records.iter().map(|(record, _)| record));
        row.insert("quest".into(), Column::Text(encoded));
        store.update_row(&name, &row)?;
        info!("Migrated quests for {}", name);
        migrated += 1;
    }
    Ok(migrated)
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|cfg| cfg.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stdout);

        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
