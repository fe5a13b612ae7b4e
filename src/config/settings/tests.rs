use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "all-minilm:latest");
    assert_eq!(config.ollama.batch_size, 64);
    assert_eq!(config.catalog.id_column, "PLAYER_NAME");
    assert_eq!(config.similarity.default_k, 5);
    assert_eq!(config.summarize.models.len(), 2);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.batch_size = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.ollama.batch_size = 1001;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn catalog_validation() {
    let mut config = Config::default();
    config.catalog.team_column = "  ".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyColumn("team_column"))
    ));

    let mut config = Config::default();
    config.catalog.bio_template = String::new();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyBioTemplate)
    ));
}

#[test]
fn similarity_validation() {
    let mut config = Config::default();
    config.similarity.features.clear();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::EmptyFeatureList("features"))
    ));

    let mut config = Config::default();
    config.similarity.archetype_features = vec!["PTS".to_string(), "PTS".to_string()];
    match config.validate() {
        Err(ConfigError::DuplicateFeature(list, column)) => {
            assert_eq!(list, "archetype_features");
            assert_eq!(column, "PTS");
        }
        other => panic!("expected duplicate feature error, got {:?}", other),
    }

    let mut config = Config::default();
    config.similarity.default_k = 0;
    assert!(config.validate().is_err());
    config.similarity.default_k = 101;
    assert!(config.validate().is_err());
}

#[test]
fn summarize_validation() {
    let mut config = Config::default();
    config.summarize.models.clear();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::NoSummaryModels)
    ));

    let mut config = Config::default();
    config.summarize.models.push(" ".to_string());
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidModel(_))
    ));

    let mut config = Config::default();
    config.summarize.min_words = 100;
    config.summarize.max_words = 100;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidSummaryBounds(100, 100))
    ));
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_batch_size(128).is_ok());
    assert!(config.set_embedding_dimension(768).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_batch_size(0).is_err());
    assert!(config.set_batch_size(1001).is_err());
    assert!(config.set_embedding_dimension(4).is_err());
}

#[test]
fn load_missing_config_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config should load defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.catalog_path(), temp_dir.path().join("players.csv"));
    assert_eq!(config.shots_path(), temp_dir.path().join("shots.json"));
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().join("nested"),
        ..Config::default()
    };
    config.ollama.host = "gpu-box".to_string();
    config.catalog.path = Some(PathBuf::from("/data/nba.csv"));
    config.similarity.default_k = 7;

    config.save().expect("config should save");
    assert!(config.config_file_path().exists());

    let loaded = Config::load(temp_dir.path().join("nested")).expect("config should reload");
    assert_eq!(loaded, config);
    assert_eq!(loaded.catalog_path(), PathBuf::from("/data/nba.csv"));
}

#[test]
fn save_rejects_invalid_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    config.ollama.port = 0;

    assert!(config.save().is_err());
    assert!(!config.config_file_path().exists());
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[similarity]\ndefault_k = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}
