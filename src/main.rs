#[macro_use]
extern crate rocket;

use std::env;

use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use rocket::{
    figment::{
        providers::{Format, Toml},
        Figment, Profile,
    },
    Build, Config, Rocket,
};

use imgserve::api;
use imgserve::config::AppConfig;

#[launch]
async fn rocket() -> Rocket<Build> {
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    // Load config
    let mut figment = Figment::from(Config::default()).merge(Toml::file("App.toml").nested());

    if let Ok(root) = env::var("SOURCE_ROOT") {
        figment = figment.merge(("source_root", root));
    }
    if let Ok(origin) = env::var("SOURCE_ORIGIN") {
        figment = figment.merge(("source_origin", origin));
    }

    figment = figment.select(Profile::from_env_or("APP_PROFILE", "default"));

    let config = match figment.extract::<AppConfig>() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded successfully");

    let registry = match config.build_registry().await {
        Ok(registry) => registry,
        Err(err) => {
            error!("Failed to set up handlers: {}", err);
            std::process::exit(1);
        }
    };

    info!(
        "Starting image server on {}:{} with {} handler(s)",
        config.address,
        config.port,
        registry.len()
    );

    api::server(figment, registry)
}
