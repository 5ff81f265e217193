#[macro_use]
extern crate log;

use std::process;

use clap::Parser;
use iron::Iron;

use posts_backend::config::Config;
use posts_backend::database::Database;
use posts_backend::handlers;

// RUST_LOG=debug posts_backend --posts-file posts.json
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();

    let database = Database::new(&config.posts_file);
    info!(
        "serving {} posts from {}",
        database.load().len(),
        database.path().display()
    );

    let address = config.address();
    match Iron::new(handlers::chain(database)).http(address.as_str()) {
        Ok(_) => info!("listening on {}", address),
        Err(e) => {
            error!("could not listen on {}: {}", address, e);
            process::exit(1);
        }
    }
}
