//! Command-line entry point for the flood risk service.
//!
//! Usage:
//!   floodrisk_service init-db
//!   floodrisk_service ingest '<json payload>' [sensor_id]
//!   floodrisk_service analyze
//!   floodrisk_service replay
//!
//! Environment (`.env` is honored):
//!   DATABASE_URL      PostgreSQL connection string (required)
//!   FLOODRISK_CONFIG  threshold file, default ./floodrisk.toml
//!   LOG_LEVEL         debug | info | warn | error (default info)
//!   LOG_FILE          optional file to append log lines to

use std::env;
use std::process::ExitCode;

use chrono::Local;

use floodrisk_service::alert::stalenesses::{self, DEFAULT_MAX_AGE_MINUTES};
use floodrisk_service::config::{self, ServiceConfig};
use floodrisk_service::ingest::payload::parse_payload;
use floodrisk_service::logging::{self, Component, LogLevel};
use floodrisk_service::model::TIMESTAMP_FORMAT;
use floodrisk_service::store::PostgresStore;
use floodrisk_service::{AnalysisResult, RiskAnalyzer};

const DEFAULT_SENSOR_ID: &str = "sensor_principal_01";

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|l| LogLevel::parse(&l))
        .unwrap_or(LogLevel::Info);
    let log_file = env::var("LOG_FILE").ok();
    logging::init_logger(level, log_file.as_deref(), log_file.is_some());

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("ANALYSIS UNAVAILABLE: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("analyze");

    if matches!(command, "-h" | "--help" | "help") {
        print_usage();
        return Ok(());
    }

    let config = load_config()?;
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| "DATABASE_URL must be set in .env or environment".to_string())?;
    let store = PostgresStore::connect(&database_url).map_err(|e| e.to_string())?;

    match command {
        "init-db" => {
            store.create_schema().map_err(|e| e.to_string())?;
            println!("Table sensor_readings initialized.");
            Ok(())
        }
        "ingest" => {
            let payload = args.get(1).ok_or("ingest requires a JSON payload argument")?;
            let sensor_id = args.get(2).map(String::as_str).unwrap_or(DEFAULT_SENSOR_ID);
            ingest(store, &config, payload, sensor_id)
        }
        "analyze" => analyze_latest(store, &config),
        "replay" => replay(store, &config),
        other => {
            print_usage();
            Err(format!("unknown command '{}'", other))
        }
    }
}

fn load_config() -> Result<ServiceConfig, String> {
    let path = config::config_path_from_env();
    match config::load_config(&path).map_err(|e| e.to_string())? {
        Some(config) => {
            logging::info(Component::System, None, &format!("Loaded configuration from {}", path));
            Ok(config)
        }
        None => {
            logging::info(
                Component::System,
                None,
                &format!("No configuration at {}, using default thresholds", path),
            );
            Ok(ServiceConfig::default())
        }
    }
}

fn ingest(
    store: PostgresStore,
    config: &ServiceConfig,
    payload: &str,
    sensor_id: &str,
) -> Result<(), String> {
    let reading = parse_payload(payload, sensor_id, Local::now().naive_local()).map_err(|e| {
        logging::error(Component::Ingest, Some(sensor_id), &e.to_string());
        e.to_string()
    })?;
    store.insert_reading(&reading).map_err(|e| e.to_string())?;
    logging::info(
        Component::Ingest,
        Some(sensor_id),
        &format!("Stored reading at {}", reading.timestamp.format(TIMESTAMP_FORMAT)),
    );

    let analyzer = RiskAnalyzer::from_config(store, config);
    let result = analyzer.analyze(&reading).map_err(|e| e.to_string())?;
    print_result(&result)
}

fn analyze_latest(store: PostgresStore, config: &ServiceConfig) -> Result<(), String> {
    let latest = store
        .latest_reading()
        .map_err(|e| e.to_string())?
        .ok_or("no readings stored yet; ingest data first")?;

    if stalenesses::is_stale(&latest, DEFAULT_MAX_AGE_MINUTES) {
        logging::warn(
            Component::Analyzer,
            Some(&latest.sensor_id),
            &format!(
                "Latest reading is from {} ({} minutes old); the feed may be down",
                latest.timestamp.format(TIMESTAMP_FORMAT),
                stalenesses::age_minutes_at(&latest, Local::now().naive_local())
            ),
        );
    }

    let analyzer = RiskAnalyzer::from_config(store, config);
    let result = analyzer.analyze(&latest).map_err(|e| e.to_string())?;
    print_result(&result)
}

fn replay(store: PostgresStore, config: &ServiceConfig) -> Result<(), String> {
    use floodrisk_service::store::ReadingStore;

    let analyzer = RiskAnalyzer::from_config(store, config);
    let history = analyzer.store().all_readings().map_err(|e| e.to_string())?;
    if history.is_empty() {
        println!("No stored readings to replay.");
        return Ok(());
    }

    println!("Replaying analysis over {} stored readings", history.len());
    for reading in &history {
        let result = analyzer.analyze(reading).map_err(|e| e.to_string())?;
        println!(
            "{}  level {:>6.1}cm | rain {:>5.1}mm/h -> {}",
            reading.timestamp.format(TIMESTAMP_FORMAT),
            reading.water_level_cm,
            reading.rain_rate_mm_per_h,
            result.status
        );
    }
    if let Some(accuracy) = analyzer.model().holdout_accuracy() {
        println!("Model held-out accuracy: {:.2}%", accuracy * 100.0);
    }
    Ok(())
}

fn print_result(result: &AnalysisResult) -> Result<(), String> {
    let json = serde_json::to_string_pretty(result).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn print_usage() {
    println!("Usage: floodrisk_service <init-db | ingest <json> [sensor_id] | analyze | replay>");
}
