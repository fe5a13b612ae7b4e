use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::{Catalog, Entity};
use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::features::{BioTemplate, MissingValues, Scaling, TextExtractor, TextSource};
use crate::format::{Table, entity_row, entity_table, format_number};
use crate::index::Metric;
use crate::reports::{AGE, AST, BLK_RANK, PTS, PTS_RANK, REB, Role, RosterAnalyzer};
use crate::resolver::QueryKey;
use crate::search::{Match, SimilaritySearch};
use crate::summarize::{SummaryBounds, Summarizer, compare_summaries};

const TEAM_NOT_FOUND: &str = "Team not found.";
const PLAYER_NOT_FOUND: &str = "Player not found.";

/// Print `message` for a lookup miss, pass every other error through
fn found<T>(result: crate::Result<T>, message: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            debug!("Lookup failed: {}", e);
            println!("{}", message);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    let path = config.catalog_path();
    Catalog::load_csv(&path, &config.catalog)
        .with_context(|| format!("Failed to load player catalog from {}", path.display()))
}

/// Name, team, position and the three headline stats
fn player_columns(config: &Config) -> Vec<&str> {
    vec![
        config.catalog.id_column.as_str(),
        config.catalog.team_column.as_str(),
        config.catalog.position_column.as_str(),
        PTS,
        REB,
        AST,
    ]
}

fn match_table(matches: &[Match<'_>], columns: &[&str], id_column: &str, metric: Metric) -> Table {
    let score = if metric.is_similarity() {
        "Similarity"
    } else {
        "Distance"
    };
    let mut table = Table::new(columns.iter().copied().chain(std::iter::once(score)));
    for m in matches {
        let mut row = entity_row(m.entity, columns, id_column);
        row.push(format_number(f64::from(m.distance)));
        table.push_row(row);
    }
    table
}

fn print_table(table: &Table, empty_message: &str) {
    if table.is_empty() {
        println!("{}", empty_message);
    } else {
        println!("{}", table.to_markdown());
    }
}

/// Print every team abbreviation in the catalog
#[inline]
pub fn list_teams(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    let teams = analyzer.teams();
    if teams.is_empty() {
        println!("No teams in {}", config.catalog_path().display());
        return Ok(());
    }
    for team in teams {
        println!("{}", team);
    }
    Ok(())
}

/// Roster structure of one team as JSON
#[inline]
pub fn show_team(config: &Config, team: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    if let Some(structure) = found(analyzer.team_structure(team), TEAM_NOT_FOUND)? {
        print_json(&structure)?;
    }
    Ok(())
}

/// Two team structures side by side
#[inline]
pub fn compare_teams(config: &Config, first: &str, second: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    let Some(structures) = found(analyzer.compare_teams(first, second), TEAM_NOT_FOUND)? else {
        return Ok(());
    };

    let mut table = Table::new([
        "Team",
        "Total Players",
        "Players Under 27",
        "7-Footers",
        "Frontcourt Avg Height",
        "Top Scorers",
        "Top Rebounders",
        "Top Playmakers",
    ]);
    for structure in &structures {
        table.push_row([
            structure.team.clone(),
            structure.total_players.to_string(),
            structure.players_under_27.to_string(),
            structure.seven_footers.to_string(),
            structure
                .frontcourt_avg_height
                .map(format_number)
                .unwrap_or_default(),
            structure.top_scorers.join(", "),
            structure.top_rebounders.join(", "),
            structure.top_playmakers.join(", "),
        ]);
    }
    println!("{}", table.to_markdown());
    Ok(())
}

#[inline]
pub fn team_needs(config: &Config, team: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    if let Some(needs) = found(analyzer.team_needs(team), TEAM_NOT_FOUND)? {
        print_json(&needs)?;
    }
    Ok(())
}

#[inline]
pub fn evaluate_team(config: &Config, team: &str) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    if let Some(evaluation) = found(analyzer.evaluate_team(team), TEAM_NOT_FOUND)? {
        print!("{}", evaluation);
    }
    Ok(())
}

/// Closest statistical fits from other teams, then young tall scorers
#[inline]
pub fn suggest_trade(config: &Config, team: &str, limit: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);
    let id_column = config.catalog.id_column.as_str();

    let Some(candidates) = found(analyzer.suggest_trade(team, limit), TEAM_NOT_FOUND)? else {
        return Ok(());
    };

    let columns = [
        id_column,
        config.catalog.team_column.as_str(),
        AGE,
        PTS,
        REB,
        AST,
    ];
    let mut table = Table::new(columns.iter().copied().chain(std::iter::once("ScoreDelta")));
    for candidate in &candidates {
        let mut row = entity_row(candidate.entity, &columns, id_column);
        row.push(format_number(candidate.score_delta));
        table.push_row(row);
    }

    println!("## Best statistical fit");
    print_table(&table, "No young players on other teams have a full stat line.");

    let targets = analyzer.trade_targets(team, 5)?;
    println!();
    println!("## Young tall scorers");
    print_table(
        &entity_table(
            targets,
            &[id_column, config.catalog.team_column.as_str(), AGE],
            id_column,
        ),
        "No players under 25 at 6'9\" or taller on other teams.",
    );
    Ok(())
}

/// Seven-footers under 27 by scoring rank
#[inline]
pub fn young_bigs(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);
    let id_column = config.catalog.id_column.as_str();

    let table = entity_table(
        analyzer.young_bigs(10),
        &[
            id_column,
            AGE,
            config.catalog.height_column.as_str(),
            PTS_RANK,
            BLK_RANK,
        ],
        id_column,
    );
    print_table(&table, "No seven-footers under 27.");
    Ok(())
}

#[inline]
pub fn find_role(config: &Config, role: Role) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    let players = analyzer.role_finder(role);
    let table = entity_table(players, &player_columns(config), &config.catalog.id_column);
    print_table(&table, &format!("No players fit the {} role.", role));
    Ok(())
}

/// Manhattan distance over the archetype columns
#[inline]
pub fn archetype(config: &Config, player: &str, k: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    let result = analyzer.archetype_matches(player, &config.similarity.archetype_features, k);
    if let Some(matches) = found(result, PLAYER_NOT_FOUND)? {
        let table = match_table(
            &matches,
            &player_columns(config),
            &config.catalog.id_column,
            Metric::Manhattan,
        );
        print_table(&table, "No comparable players.");
    }
    Ok(())
}

/// Standardized stat vectors under squared euclidean distance
#[inline]
pub fn similar_players(config: &Config, player: &str, k: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let search = SimilaritySearch::stats(
        &catalog,
        &config.similarity.features,
        Scaling::Standard,
        Metric::SquaredEuclidean,
        MissingValues::Zero,
    )
    .context("Failed to build player similarity index")?;

    print_similar(config, &search, player, k)
}

/// Raw stat vectors under cosine similarity; players missing a stat are left out
#[inline]
pub fn smart_similarity(config: &Config, player: &str, k: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let search = SimilaritySearch::stats(
        &catalog,
        &config.similarity.cosine_features,
        Scaling::Raw,
        Metric::Cosine,
        MissingValues::Drop,
    )
    .context("Failed to build cosine similarity index")?;

    print_similar(config, &search, player, k)
}

fn print_similar(
    config: &Config,
    search: &SimilaritySearch<'_>,
    player: &str,
    k: usize,
) -> Result<()> {
    if let Some(matches) = found(search.similar_to(player.trim(), k), PLAYER_NOT_FOUND)? {
        let table = match_table(
            &matches,
            &player_columns(config),
            &config.catalog.id_column,
            search.metric(),
        );
        print_table(&table, "No other players in the index.");
    }
    Ok(())
}

/// Embed every player's bio sentence and search it with free text
#[inline]
pub fn bio_search(config: &Config, query: &str, k: usize) -> Result<()> {
    let catalog = load_catalog(config)?;
    let client = OllamaClient::new(config)?;
    client
        .health_check()
        .context("Ollama is not ready for bio search")?;
    let template = BioTemplate::parse(&config.catalog.bio_template, &catalog)?;

    let search = SimilaritySearch::text(
        &catalog,
        TextExtractor::new(TextSource::Template(template)),
        &client,
        Metric::SquaredEuclidean,
    )
    .context("Failed to build bio index")?;

    let key = QueryKey::parse(query, &catalog);
    info!("Bio search for {:?}", key);
    let matches = search.search(&key, k)?;

    let id_column = config.catalog.id_column.as_str();
    let table = match_table(
        &matches,
        &[id_column, config.catalog.team_column.as_str(), AGE],
        id_column,
        search.metric(),
    );
    print_table(&table, "No players in the catalog.");
    Ok(())
}

/// Free-text search over shot descriptions with precomputed embeddings
#[inline]
pub fn shot_search(config: &Config, query: &str, k: usize, file: Option<&Path>) -> Result<()> {
    let path = file.map_or_else(|| config.shots_path(), Path::to_path_buf);
    let shots = Catalog::load_embedded(&path)
        .with_context(|| format!("Failed to load shots from {}", path.display()))?;
    let client = OllamaClient::new(config)?;

    let members = (0..shots.catalog.len()).collect();
    let search =
        SimilaritySearch::from_vectors(&shots.catalog, members, shots.vectors, Metric::Cosine)
            .context("Failed to build shot index")?
            .with_text(&client, TextExtractor::new(TextSource::Description));

    let key = QueryKey::parse(query, &shots.catalog);
    if matches!(key, QueryKey::Text(_)) {
        client
            .health_check()
            .context("Ollama is not ready for shot search")?;
    }
    let matches = search.search(&key, k)?;

    let table = match_table(
        &matches,
        &["title", "description"],
        "title",
        search.metric(),
    );
    print_table(&table, "No shots in the catalog.");
    Ok(())
}

/// Young scorers, best rebounder per position and tallest player per team
#[inline]
pub fn top_lists(config: &Config) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);
    let lists = analyzer.top_lists();

    let id_column = config.catalog.id_column.as_str();
    let sections: [(&str, Vec<&Entity>, Vec<&str>); 3] = [
        (
            "Top scorers under 25",
            lists.young_scorers,
            vec![id_column, PTS],
        ),
        (
            "Top rebounder by position",
            lists.rebounders_by_position,
            vec![id_column, config.catalog.position_column.as_str(), REB],
        ),
        (
            "Tallest by team",
            lists.tallest_by_team,
            vec![
                id_column,
                config.catalog.team_column.as_str(),
                config.catalog.height_column.as_str(),
            ],
        ),
    ];

    for (i, (title, entities, columns)) in sections.into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("## {}", title);
        print_table(&entity_table(entities, &columns, id_column), "None.");
    }
    Ok(())
}

/// Jittered stat line; a seed makes the forecast reproducible
#[inline]
pub fn predict_parlay(config: &Config, player: &str, seed: Option<u64>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let analyzer = RosterAnalyzer::new(&catalog, &config.catalog);

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    if let Some(forecast) = found(analyzer.predict_parlay(player, &mut rng), PLAYER_NOT_FOUND)? {
        print_json(&forecast)?;
    }
    Ok(())
}

/// Summarize with every configured model and score each against the input
#[inline]
pub fn summarize(config: &Config, text: Option<String>, file: Option<&Path>) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read text from stdin")?;
            input
        }
    };

    let clients = config
        .summarize
        .models
        .iter()
        .map(|model| OllamaClient::new(config).map(|client| client.with_model(model)))
        .collect::<Result<Vec<_>>>()?;
    // Server reachability is shared; a missing model only fails its own summary
    if let Some(client) = clients.first() {
        client.ping().context("Ollama server is not reachable")?;
    }
    let summarizers: Vec<&dyn Summarizer> =
        clients.iter().map(|c| c as &dyn Summarizer).collect();

    let comparisons = compare_summaries(
        &text,
        &summarizers,
        SummaryBounds::from(&config.summarize),
    )?;

    for (i, comparison) in comparisons.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("## {}", comparison.model);
        match &comparison.outcome {
            Ok(scored) => {
                println!("{}", scored.summary);
                println!("Length: {} words", scored.word_count);
                println!("ROUGE-L: {:.3}", scored.rouge_l);
            }
            Err(message) => println!("{}: {}", comparison.model, message),
        }
    }

    if comparisons.iter().all(|c| c.outcome.is_err()) {
        anyhow::bail!("Every summarization model failed");
    }
    Ok(())
}
