//! Main application entry point.

use tortoise_app::{App, AppConfig};

fn main() {
    env_logger::init();
    log::info!("Starting tortoise");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = App::new(config).run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
