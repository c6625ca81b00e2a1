//! CLI command integration tests
//! Tests argument parsing and the config template used by `parkgate init`
//!
//! Run with: cargo test --test cli_tests

use clap::Parser;
use parkgate::cli::{Cli, Commands, OutputFormat, ParkingAction, PlanAction};
use parkgate::config::{load_config_from_path, Config};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_cli_init_template_parses() {
    let content = include_str!("../parkgate.toml.example");
    assert!(!content.is_empty(), "Config template should not be empty");

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("parkgate.toml");
    fs::write(&path, content).unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.api.endpoints.login_init, "/auth/login/init");
    assert_eq!(config.storage.token_key, "auth_token");
    println!("✓ CLI init config file template parses");
}

#[test]
fn test_cli_init_template_matches_defaults() {
    let content = parkgate::config::loader::default_config_content();
    let config: Config = toml::from_str(&content.replace(
        "${PARKGATE_API_URL:-http://localhost:8080/api}",
        "http://localhost:8080/api",
    ))
    .unwrap();
    let defaults = Config::default();

    assert_eq!(config.api.base_url, defaults.api.base_url);
    assert_eq!(config.api.timeout_secs, defaults.api.timeout_secs);
    assert_eq!(config.api.endpoints.parking_by_user, defaults.api.endpoints.parking_by_user);
    assert_eq!(config.storage.dir, defaults.storage.dir);
}

#[test]
fn test_cli_global_config_flag() {
    let cli = Cli::try_parse_from(["parkgate", "whoami", "--config", "/tmp/parkgate.toml"]).unwrap();
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/parkgate.toml")));
    assert!(matches!(
        cli.command,
        Commands::Whoami {
            format: OutputFormat::Table
        }
    ));
}

#[test]
fn test_cli_output_formats() {
    for (arg, expected) in [("table", "Table"), ("json", "Json"), ("yaml", "Yaml")] {
        let cli = Cli::try_parse_from(["parkgate", "whoami", "--format", arg]).unwrap();
        let Commands::Whoami { format } = cli.command else {
            panic!("expected whoami");
        };
        assert_eq!(format!("{:?}", format), expected);
        println!("✓ CLI whoami format: {}", arg);
    }

    assert!(Cli::try_parse_from(["parkgate", "whoami", "--format", "xml"]).is_err());
}

#[test]
fn test_cli_login_with_otp() {
    let cli =
        Cli::try_parse_from(["parkgate", "login", "-p", "9876543210", "-o", "123456"]).unwrap();
    let Commands::Login { phone, otp } = cli.command else {
        panic!("expected login");
    };
    assert_eq!(phone, "9876543210");
    assert_eq!(otp.as_deref(), Some("123456"));
}

#[test]
fn test_cli_login_requires_phone() {
    assert!(Cli::try_parse_from(["parkgate", "login"]).is_err());
}

#[test]
fn test_cli_check_path() {
    let cli = Cli::try_parse_from(["parkgate", "check", "/parking/42"]).unwrap();
    let Commands::Check { path } = cli.command else {
        panic!("expected check");
    };
    assert_eq!(path, "/parking/42");
}

#[test]
fn test_cli_parking_add() {
    let cli = Cli::try_parse_from([
        "parkgate",
        "parking",
        "add",
        "--name",
        "Central",
        "--address",
        "12 MG Road",
        "--city",
        "Pune",
        "--price",
        "40",
        "--pin-code",
        "411001",
    ])
    .unwrap();

    let Commands::Parking {
        action: ParkingAction::Add(fields),
    } = cli.command
    else {
        panic!("expected parking add");
    };
    assert_eq!(fields.name, "Central");
    assert_eq!(fields.pin_code, "411001");
    assert_eq!(fields.description, "");
}

#[test]
fn test_cli_parking_update_partial() {
    let cli =
        Cli::try_parse_from(["parkgate", "parking", "update", "p1", "--price", "45"]).unwrap();

    let Commands::Parking {
        action: ParkingAction::Update { id, fields },
    } = cli.command
    else {
        panic!("expected parking update");
    };
    assert_eq!(id, "p1");
    assert_eq!(fields.price.as_deref(), Some("45"));
    assert!(fields.name.is_none());
}

#[test]
fn test_cli_plan_subscribe() {
    let cli =
        Cli::try_parse_from(["parkgate", "plan", "subscribe", "p1", "--slots", "10"]).unwrap();
    let Commands::Plan {
        action: PlanAction::Subscribe { parking_id, slots },
    } = cli.command
    else {
        panic!("expected plan subscribe");
    };
    assert_eq!(parking_id, "p1");
    assert_eq!(slots, 10);
}
