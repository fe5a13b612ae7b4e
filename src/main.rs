use anyhow::Result;
use clap::{Parser, Subcommand};
use hoopscout::commands::{
    archetype, bio_search, compare_teams, evaluate_team, find_role, list_teams, predict_parlay,
    shot_search, show_team, similar_players, smart_similarity, suggest_trade, summarize,
    team_needs, top_lists, young_bigs,
};
use hoopscout::config::{Config, run_interactive_config, show_config};
use hoopscout::reports::Role;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hoopscout")]
#[command(about = "Explore NBA rosters and find similar players, bios and shots")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Player statistics file, overriding the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and catalog settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// List team abbreviations
    Teams,
    /// Roster structure of a team
    Team { team: String },
    /// Compare the structure of two teams
    Compare { first: String, second: String },
    /// Positional and statistical gaps of a team
    Needs { team: String },
    /// Run the roster checklist for a team
    Evaluate { team: String },
    /// Suggest trade candidates for a team
    Trade {
        team: String,
        /// Number of statistical fits to show
        #[arg(long, default_value_t = 1)]
        limit: usize,
    },
    /// Seven-footers under 27
    Bigs,
    /// Players fitting a role
    Roles {
        #[arg(value_enum)]
        role: Role,
    },
    /// Closest players by raw stat distance
    Archetype {
        player: String,
        #[arg(short, default_value_t = 3)]
        k: usize,
    },
    /// Closest players by standardized stats
    Similar {
        player: String,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Closest players by cosine similarity of raw stats
    Smart {
        player: String,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Search player bios with free text
    Bio {
        query: String,
        #[arg(short)]
        k: Option<usize>,
    },
    /// Search shot descriptions with free text
    Shots {
        query: String,
        #[arg(short)]
        k: Option<usize>,
        /// Shots JSON file, overriding the configured one
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Top scorers, rebounders and tallest players
    Top,
    /// Forecast a player's next stat line
    Parlay {
        player: String,
        /// Seed for a reproducible forecast
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compare summaries from the configured models
    Summarize {
        /// Text to summarize; read from --file or stdin when absent
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::config_dir()?,
    };
    let mut config = Config::load(&config_dir)?;
    if let Some(catalog) = cli.catalog {
        config.catalog.path = Some(catalog);
    }
    let default_k = config.similarity.default_k;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Teams => list_teams(&config)?,
        Commands::Team { team } => show_team(&config, &team)?,
        Commands::Compare { first, second } => compare_teams(&config, &first, &second)?,
        Commands::Needs { team } => team_needs(&config, &team)?,
        Commands::Evaluate { team } => evaluate_team(&config, &team)?,
        Commands::Trade { team, limit } => suggest_trade(&config, &team, limit)?,
        Commands::Bigs => young_bigs(&config)?,
        Commands::Roles { role } => find_role(&config, role)?,
        Commands::Archetype { player, k } => archetype(&config, &player, k)?,
        Commands::Similar { player, k } => {
            similar_players(&config, &player, k.unwrap_or(default_k))?;
        }
        Commands::Smart { player, k } => {
            smart_similarity(&config, &player, k.unwrap_or(default_k))?;
        }
        Commands::Bio { query, k } => bio_search(&config, &query, k.unwrap_or(default_k))?,
        Commands::Shots { query, k, file } => {
            shot_search(&config, &query, k.unwrap_or(default_k), file.as_deref())?;
        }
        Commands::Top => top_lists(&config)?,
        Commands::Parlay { player, seed } => predict_parlay(&config, &player, seed)?,
        Commands::Summarize { text, file } => summarize(&config, text, file.as_deref())?,
    }

    Ok(())
}
