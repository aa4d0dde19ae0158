// tests/config_tests.rs

use gibbot_core::config::Config;
use gibbot_core::{Database, Error};

mod test_utils;
use test_utils::test_config;

#[tokio::test]
async fn template_round_trips_through_a_file() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");

    let cfg = Config::template();
    cfg.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, cfg);
    assert_eq!(loaded.database.version, 0);

    Ok(())
}

#[test]
fn empty_required_fields_are_rejected() {
    let mut cfg = Config::template();
    cfg.prefix = String::new();
    let json = serde_json::to_string(&cfg).unwrap();

    match Config::load(&json) {
        Err(Error::Config(detail)) => assert!(detail.contains("prefix")),
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
fn unknown_fields_are_rejected() {
    let mut json: serde_json::Value =
        serde_json::from_str(&serde_json::to_string(&Config::template()).unwrap()).unwrap();
    json["surprise"] = serde_json::json!(true);

    assert!(matches!(
        Config::load(&json.to_string()),
        Err(Error::Json(_))
    ));
}

#[tokio::test]
async fn migration_rewrites_exactly_the_version_field() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.json");

    let mut cfg = test_config();
    cfg.save(&path)?;

    let db = Database::new(":memory:").await?;
    if db.migrate(&mut cfg).await? {
        cfg.save(&path)?;
    }

    let reloaded = Config::from_file(&path)?;
    assert!(reloaded.database.version > 0);

    // everything except the version survived untouched
    let mut expected = test_config();
    expected.database.version = reloaded.database.version;
    assert_eq!(reloaded, expected);

    Ok(())
}
