mod config;
mod data;
mod decode;
mod error;
mod model;
mod pipeline;
mod server;
mod solver;
mod validation;

use clap::Parser;
use log::error;

#[tokio::main]
async fn main() {
    let config = config::Config::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();


    if let Err(e) = server::run_server(&config).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }


}
