use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod session;

#[derive(Parser)]
#[command(name = "workpolicyctl", version)]
struct Cli {
    /// Session file holding the world and its policies
    #[arg(
        long,
        global = true,
        env = "WORKPOLICY_SESSION",
        default_value = "workpolicies.json"
    )]
    session: PathBuf,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a session from a YAML world seed
    Init {
        /// Path to world YAML
        #[arg(long, value_name = "FILE")]
        world: PathBuf,
        /// Overwrite an existing session file
        #[arg(long)]
        force: bool,
    },
    /// Print maps, policies and stored links
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Manage policies
    Policy {
        #[command(subcommand)]
        cmd: PolicyCommands,
    },
    /// Manage maps
    Map {
        #[command(subcommand)]
        cmd: MapCommands,
    },
    /// Edit colonists
    Colonist {
        #[command(subcommand)]
        cmd: ColonistCommands,
    },
    /// Snapshot live priorities on the current map into its active policy
    Save,
    /// Apply a policy to the current map without saving first
    Load {
        /// Policy id or name
        policy: String,
    },
    /// Save the current policy, then load another one
    Switch {
        /// Policy id or name
        policy: String,
    },
    /// Replace the active policy's assignments with another policy's
    Paste {
        /// Policy to copy from (id or name)
        #[arg(long)]
        from: String,
    },
    /// Drop links of dead colonists and resolve vanished maps
    Clean,
    /// Print version and exit
    Version,
}

#[derive(Subcommand)]
enum PolicyCommands {
    List,
    Add { name: String },
    Rename { policy: String, name: String },
    Delete { policy: String },
    /// Write only the policy state to a file
    Export { file: PathBuf },
    /// Replace the policy state with one read from a file
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum MapCommands {
    Add { map: u32 },
    Switch { map: u32 },
    /// Remove a map from the world; living colonists travel to the current map
    /// (run `clean` afterwards)
    Abandon { map: u32 },
}

#[derive(Subcommand)]
enum ColonistCommands {
    Add {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        map: u32,
    },
    Set {
        id: String,
        work: String,
        priority: u8,
    },
    Move {
        id: String,
        #[arg(long)]
        map: u32,
    },
    Kill { id: String },
    Remove { id: String },
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = workpolicies::load_from_env()?;
    let path = cli.session;

    match cli.cmd {
        Commands::Init { world, force } => commands::init(&path, &world, force, &config),
        Commands::Show { json } => commands::show(&path, json, &config),
        Commands::Policy { cmd } => match cmd {
            PolicyCommands::List => commands::show_policies(&path, &config),
            PolicyCommands::Add { name } => commands::policy_add(&path, &name, &config),
            PolicyCommands::Rename { policy, name } => {
                commands::policy_rename(&path, &policy, &name, &config)
            }
            PolicyCommands::Delete { policy } => commands::policy_delete(&path, &policy, &config),
            PolicyCommands::Export { file } => commands::policy_export(&path, &file, &config),
            PolicyCommands::Import { file } => commands::policy_import(&path, &file, &config),
        },
        Commands::Map { cmd } => match cmd {
            MapCommands::Add { map } => commands::map_add(&path, map, &config),
            MapCommands::Switch { map } => commands::map_switch(&path, map, &config),
            MapCommands::Abandon { map } => commands::map_abandon(&path, map, &config),
        },
        Commands::Colonist { cmd } => match cmd {
            ColonistCommands::Add { id, name, map } => {
                commands::colonist_add(&path, &id, name.as_deref(), map, &config)
            }
            ColonistCommands::Set { id, work, priority } => {
                commands::colonist_set(&path, &id, &work, priority, &config)
            }
            ColonistCommands::Move { id, map } => {
                commands::colonist_move(&path, &id, map, &config)
            }
            ColonistCommands::Kill { id } => commands::colonist_kill(&path, &id, &config),
            ColonistCommands::Remove { id } => commands::colonist_remove(&path, &id, &config),
        },
        Commands::Save => commands::save(&path, &config),
        Commands::Load { policy } => commands::load(&path, &policy, &config),
        Commands::Switch { policy } => commands::switch(&path, &policy, &config),
        Commands::Paste { from } => commands::paste(&path, &from, &config),
        Commands::Clean => commands::clean(&path, &config),
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
