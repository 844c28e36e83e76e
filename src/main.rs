use std::fs;
use std::sync::Arc;

use clap::Parser;
use fire_forecast::api::{AppState, run_http_server};
use fire_forecast::cli::{Cli, Command, ProjectArgs, ServeArgs};
use fire_forecast::core::MIN_SNAPSHOTS;
use fire_forecast::logging::init_logging;
use fire_forecast::service::{ForecastService, GenerateOutcome};
use fire_forecast::store::{LocalStore, UserHistory};

const LOCAL_USER: &str = "local";

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Project(args) => project(&args),
    };
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(args: ServeArgs) -> Result<(), String> {
    let settings = args.simulation.settings()?;
    let store = match &args.data_file {
        Some(path) => LocalStore::open(path).map_err(|e| e.to_string())?,
        None => LocalStore::in_memory(),
    };
    let store = Arc::new(store);
    let service =
        ForecastService::new(store.clone(), store.clone(), settings).map_err(|e| e.to_string())?;
    let state = Arc::new(AppState { service, store });

    run_http_server(args.port, state)
        .await
        .map_err(|e| format!("Server error: {e}"))
}

fn project(args: &ProjectArgs) -> Result<(), String> {
    let settings = args.simulation.settings()?;
    let request = args.request()?;
    let raw = fs::read_to_string(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;
    let history = serde_json::from_str::<UserHistory>(&raw)
        .map_err(|e| format!("invalid history JSON in {}: {e}", args.input.display()))?;

    let store = LocalStore::in_memory();
    store
        .record_history(LOCAL_USER, history)
        .map_err(|e| e.to_string())?;
    let service = ForecastService::new(&store, &store, settings).map_err(|e| e.to_string())?;

    match service
        .generate(LOCAL_USER, &request)
        .map_err(|e| e.to_string())?
    {
        GenerateOutcome::Generated(_) => {}
        GenerateOutcome::InsufficientData { found } => {
            return Err(format!(
                "need at least {MIN_SNAPSHOTS} net worth snapshots to forecast, found {found}"
            ));
        }
    }

    let snapshot = service
        .latest(LOCAL_USER, request.horizon_months)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "forecast was not stored".to_string())?;
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
