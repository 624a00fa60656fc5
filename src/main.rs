mod activity;
mod app;
mod cat;
mod config;
mod daynight;
mod error;
mod host;
mod timers;

fn main() {
    env_logger::init();
    log::info!("Commit Cat starting up");

    let config = config::load_or_default();
    if let Err(e) = app::run(config) {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
