mod activity;
mod app;
mod config;
mod domain;
mod github;
mod languages;
mod logging;
mod preferences;
mod repos;
mod search;
mod section;
mod storage;

use std::process::ExitCode;

use app::{APP_NAME, DashboardApp};
use config::Config;
use eframe::NativeOptions;

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            logging::enable_logging("info");
            tracing::error!(error = %err, "invalid configuration");
            return ExitCode::from(2);
        }
    };
    logging::enable_logging(&config.log_level);
    tracing::info!(api = %config.api_url, "starting {APP_NAME}");

    let options = NativeOptions::default();
    let result = eframe::run_native(
        APP_NAME,
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "dashboard window failed");
            ExitCode::FAILURE
        }
    }
}
