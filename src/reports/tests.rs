use super::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const HEIGHT: &str = "Height (inches)";

struct Line {
    name: &'static str,
    team: &'static str,
    pos: &'static str,
    height: f64,
    age: f64,
    pts: f64,
    reb: f64,
    ast: f64,
}

fn player(line: Line) -> Entity {
    Entity::new(line.name)
        .with_label("TEAM_ABBREVIATION", line.team)
        .with_label("Pos", line.pos)
        .with_attribute(HEIGHT, line.height)
        .with_attribute(AGE, line.age)
        .with_attribute(PTS, line.pts)
        .with_attribute(REB, line.reb)
        .with_attribute(AST, line.ast)
}

fn with_ranks(entity: Entity, fg2: f64, pts: f64, ast: f64, stl: f64, blk: f64) -> Entity {
    entity
        .with_attribute(FG2_PCT, fg2)
        .with_attribute(PTS_RANK, pts)
        .with_attribute(AST_RANK, ast)
        .with_attribute(STL_RANK, stl)
        .with_attribute(BLK_RANK, blk)
}

#[rustfmt::skip]
fn league() -> Catalog {
    Catalog::from_entities(vec![
        with_ranks(
            player(Line { name: "Curry", team: "GSW", pos: "PG", height: 74.0, age: 36.0, pts: 26.0, reb: 4.5, ast: 5.1 }),
            0.55, 5.0, 20.0, 40.0, 300.0,
        ),
        with_ranks(
            player(Line { name: "Green", team: "GSW", pos: "PF", height: 78.0, age: 34.0, pts: 8.6, reb: 7.2, ast: 6.0 }),
            0.52, 200.0, 30.0, 50.0, 100.0,
        ),
        with_ranks(
            player(Line { name: "Kuminga", team: "GSW", pos: "SF", height: 79.0, age: 21.0, pts: 16.1, reb: 4.8, ast: 2.2 }),
            0.51, 90.0, 250.0, 200.0, 200.0,
        ),
        with_ranks(
            player(Line { name: "Looney", team: "GSW", pos: "C", height: 81.0, age: 28.0, pts: 4.5, reb: 5.7, ast: 1.8 }),
            0.60, 400.0, 300.0, 300.0, 160.0,
        ),
        player(Line { name: "James", team: "LAL", pos: "SF", height: 81.0, age: 39.0, pts: 25.7, reb: 7.3, ast: 8.3 })
            .with_attribute(FG2_PCT, 0.60),
        player(Line { name: "Davis", team: "LAL", pos: "C", height: 82.0, age: 31.0, pts: 24.7, reb: 12.6, ast: 3.5 }),
        player(Line { name: "Reaves", team: "LAL", pos: "SG", height: 77.0, age: 26.0, pts: 15.9, reb: 4.3, ast: 5.5 }),
        player(Line { name: "Knecht", team: "LAL", pos: "SG", height: 77.0, age: 23.0, pts: 9.1, reb: 2.8, ast: 1.3 }),
        player(Line { name: "Holmgren", team: "OKC", pos: "C", height: 85.0, age: 22.0, pts: 16.5, reb: 7.9, ast: 2.4 })
            .with_attribute(PTS_RANK, 60.0),
        player(Line { name: "Wembanyama", team: "SAS", pos: "C", height: 88.0, age: 20.0, pts: 21.4, reb: 10.6, ast: 3.9 })
            .with_attribute(PTS_RANK, 30.0),
    ])
}

fn names(entities: &[&Entity]) -> Vec<String> {
    entities.iter().map(|e| e.id.clone()).collect()
}

#[test]
fn teams_are_sorted_and_unique() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert_eq!(analyzer.teams(), vec!["GSW", "LAL", "OKC", "SAS"]);
}

#[test]
fn structure_of_a_team() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let structure = analyzer.team_structure("gsw").expect("GSW exists");

    assert_eq!(structure.team, "GSW");
    assert_eq!(structure.total_players, 4);
    assert_eq!(structure.players_under_27, 1);
    assert_eq!(structure.seven_footers, 0);
    assert_eq!(structure.frontcourt_avg_height, Some(79.33));
    assert_eq!(structure.top_scorers, vec!["Curry", "Kuminga", "Green"]);
    assert_eq!(structure.top_rebounders, vec!["Green", "Looney", "Kuminga"]);
    assert_eq!(structure.top_playmakers, vec!["Green", "Curry", "Kuminga"]);

    let json = serde_json::to_value(&structure).expect("serializes");
    assert_eq!(json["Total Players"], 4);
    assert_eq!(json["7-Footers"], 0);
}

#[test]
fn frontcourt_height_absent_without_bigs() {
    let catalog = Catalog::from_entities(vec![player(Line {
        name: "Guard",
        team: "AAA",
        pos: "PG",
        height: 74.0,
        age: 25.0,
        pts: 10.0,
        reb: 3.0,
        ast: 7.0,
    })]);
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let structure = analyzer.team_structure("AAA").expect("AAA exists");
    assert_eq!(structure.frontcourt_avg_height, None);
}

#[test]
fn unknown_team_is_not_found() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert!(analyzer.team_structure("XYZ").is_err_and(|e| e.is_not_found()));
    assert!(analyzer.team_needs("XYZ").is_err_and(|e| e.is_not_found()));
    assert!(analyzer.evaluate_team("XYZ").is_err_and(|e| e.is_not_found()));
    assert!(analyzer.suggest_trade("XYZ", 1).is_err_and(|e| e.is_not_found()));
    assert!(analyzer.trade_targets("XYZ", 5).is_err_and(|e| e.is_not_found()));
    assert!(analyzer.compare_teams("GSW", "XYZ").is_err_and(|e| e.is_not_found()));
}

#[test]
fn compare_two_teams() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let [gsw, lal] = analyzer.compare_teams("GSW", "LAL").expect("both exist");
    assert_eq!(gsw.team, "GSW");
    assert_eq!(lal.team, "LAL");
    assert_eq!(lal.players_under_27, 2);
    assert_eq!(lal.top_scorers, vec!["James", "Davis", "Reaves"]);
}

#[test]
fn needs_of_a_team() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert_eq!(
        analyzer.team_needs("GSW").expect("GSW exists"),
        vec!["Needs more point guards"]
    );
    assert_eq!(
        analyzer.team_needs("OKC").expect("OKC exists"),
        vec!["Needs more point guards", "Low playmaking"]
    );
}

#[rustfmt::skip]
#[test]
fn balanced_and_thin_rosters() {
    let catalog = Catalog::from_entities(vec![
        player(Line { name: "A", team: "BAL", pos: "PG", height: 75.0, age: 25.0, pts: 20.0, reb: 5.0, ast: 8.0 }),
        player(Line { name: "B", team: "BAL", pos: "PG", height: 75.0, age: 25.0, pts: 10.0, reb: 4.0, ast: 6.0 }),
        player(Line { name: "C", team: "BAL", pos: "C", height: 84.0, age: 25.0, pts: 10.0, reb: 11.0, ast: 2.0 }),
        player(Line { name: "D", team: "THN", pos: "SG", height: 76.0, age: 25.0, pts: 5.0, reb: 2.0, ast: 1.0 }),
    ]);
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert_eq!(
        analyzer.team_needs("BAL").expect("BAL exists"),
        vec!["Well-balanced roster"]
    );
    assert_eq!(
        analyzer.team_needs("THN").expect("THN exists"),
        vec![
            "Needs more point guards",
            "Needs at least 1 true center",
            "Low playmaking",
            "Low rebounding"
        ]
    );
}

#[test]
fn evaluation_checks() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let evaluation = analyzer.evaluate_team("gsw").expect("GSW exists");
    let statuses: Vec<CheckStatus> = evaluation.checks.iter().map(|c| c.status).collect();

    assert_eq!(
        statuses,
        vec![
            CheckStatus::Fail,
            CheckStatus::Pass,
            CheckStatus::Fail,
            CheckStatus::Fail,
            CheckStatus::Fail,
            CheckStatus::Pass,
            CheckStatus::Pass,
        ]
    );
    assert_eq!(evaluation.checks[1].message, "Avg frontcourt height: 79.3 in");
    assert_eq!(evaluation.checks[3].message, "2 defensive players");
    assert_eq!(evaluation.checks[4].message, "3 offensive players");

    let report = evaluation.to_string();
    assert!(report.starts_with("# Team: GSW\n❌ Has 0 7-footers\n"));
}

#[test]
fn soft_checks_warn() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let evaluation = analyzer.evaluate_team("LAL").expect("LAL exists");
    assert_eq!(evaluation.checks[5].status, CheckStatus::Warn);
    assert_eq!(evaluation.checks[5].message, "1 strong midrange shooters");
    assert_eq!(evaluation.checks[6].status, CheckStatus::Warn);
    assert_eq!(evaluation.checks[6].message, "1 confident veterans");
}

#[test]
fn trade_suggestions_by_score_delta() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let candidates = analyzer.suggest_trade("gsw", 3).expect("GSW exists");
    let ids: Vec<&str> = candidates.iter().map(|c| c.entity.id.as_str()).collect();

    // GSW averages 13.8 PTS, 5.55 REB, 3.775 AST
    assert_eq!(ids, vec!["Reaves", "Holmgren", "Knecht"]);
    assert!((candidates[0].score_delta - 5.075).abs() < 1e-9);
    assert!((candidates[1].score_delta - 6.425).abs() < 1e-9);

    let best = analyzer.suggest_trade("GSW", 1).expect("GSW exists");
    assert_eq!(best.len(), 1);
}

#[test]
fn trade_suggestions_skip_incomplete_players() {
    let mut entities = vec![
        player(Line { name: "Home", team: "HOM", pos: "PG", height: 75.0, age: 30.0, pts: 10.0, reb: 5.0, ast: 5.0 }),
        player(Line { name: "Away", team: "AWY", pos: "PG", height: 75.0, age: 22.0, pts: 12.0, reb: 5.0, ast: 5.0 }),
    ];
    entities.push(
        Entity::new("NoStats")
            .with_label("TEAM_ABBREVIATION", "AWY")
            .with_attribute(AGE, 21.0),
    );
    let catalog = Catalog::from_entities(entities);
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let candidates = analyzer.suggest_trade("HOM", 5).expect("HOM exists");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].entity.id, "Away");
    assert_eq!(candidates[0].score_delta, 2.0);
}

#[test]
fn tall_young_targets() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let targets = analyzer.trade_targets("GSW", 5).expect("GSW exists");
    assert_eq!(names(&targets), vec!["Wembanyama", "Holmgren"]);

    let none_from_own_team = analyzer.trade_targets("OKC", 5).expect("OKC exists");
    assert_eq!(names(&none_from_own_team), vec!["Wembanyama"]);
}

#[test]
fn young_bigs_by_scoring_rank() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert_eq!(
        names(&analyzer.young_bigs(10)),
        vec!["Wembanyama", "Holmgren"]
    );
    assert_eq!(names(&analyzer.young_bigs(1)), vec!["Wembanyama"]);
}

#[test]
fn roles() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    assert_eq!(
        names(&analyzer.role_finder(Role::ThreeAndDWing)),
        vec!["James", "Kuminga", "Reaves"]
    );
    assert_eq!(
        names(&analyzer.role_finder(Role::Playmaker)),
        vec!["Curry", "James", "Reaves", "Green"]
    );
    assert_eq!(
        names(&analyzer.role_finder(Role::StretchBig)),
        vec!["Davis", "Wembanyama", "Holmgren"]
    );
    assert_eq!(Role::ThreeAndDWing.to_string(), "3&D Wing");
}

#[test]
fn archetypes_by_manhattan_distance() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);
    let columns: Vec<String> = [PTS, REB, AST, AGE].iter().map(|c| c.to_string()).collect();

    let matches = analyzer
        .archetype_matches("Reaves", &columns, 3)
        .expect("Reaves exists");
    let ids: Vec<&str> = matches.iter().map(|m| m.entity.id.as_str()).collect();

    assert_eq!(ids, vec!["Kuminga", "Holmgren", "Knecht"]);
    assert!((matches[0].distance - 9.0).abs() < 1e-4);

    let missing = analyzer.archetype_matches("Nobody", &columns, 3);
    assert!(missing.is_err_and(|e| e.is_not_found()));
}

#[test]
fn top_lists() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let lists = analyzer.top_lists();
    assert_eq!(
        names(&lists.young_scorers),
        vec!["Wembanyama", "Holmgren", "Kuminga", "Knecht"]
    );
    assert_eq!(
        names(&lists.rebounders_by_position),
        vec!["Davis", "Green", "Curry", "James", "Reaves"]
    );
    assert_eq!(
        names(&lists.tallest_by_team),
        vec!["Looney", "Davis", "Holmgren", "Wembanyama"]
    );
}

#[test]
fn parlay_is_seeded_and_bounded() {
    let catalog = league();
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let first = analyzer
        .predict_parlay("Curry", &mut StdRng::seed_from_u64(7))
        .expect("Curry exists");
    let second = analyzer
        .predict_parlay("Curry", &mut StdRng::seed_from_u64(7))
        .expect("Curry exists");
    assert_eq!(first, second);

    let points = first.points.expect("Curry has points");
    let rebounds = first.rebounds.expect("Curry has rebounds");
    assert!((24.0..=28.0).contains(&points));
    assert!((3.5..=5.5).contains(&rebounds));
    assert!(((points * 10.0).round() - points * 10.0).abs() < 1e-9);

    let missing = analyzer.predict_parlay("Nobody", &mut StdRng::seed_from_u64(7));
    assert!(missing.is_err_and(|e| e.is_not_found()));
}

#[test]
fn parlay_without_a_stat() {
    let catalog = Catalog::from_entities(vec![Entity::new("Rookie").with_attribute(PTS, 4.0)]);
    let config = CatalogConfig::default();
    let analyzer = RosterAnalyzer::new(&catalog, &config);

    let forecast = analyzer
        .predict_parlay("Rookie", &mut StdRng::seed_from_u64(1))
        .expect("Rookie exists");
    assert!(forecast.points.is_some());
    assert_eq!(forecast.assists, None);

    let json = serde_json::to_value(&forecast).expect("serializes");
    assert!(json["Predicted Assists"].is_null());
}
