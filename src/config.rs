use std::path::PathBuf;

use clap::Parser;

/// Command line and environment configuration for the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "posts_backend", version, about = "JSON file backed blog posts API")]
pub struct Config {
    /// JSON file holding the post collection
    #[arg(long, env = "BLOG_POSTS_FILE", default_value = "posts.json")]
    pub posts_file: PathBuf,

    /// Interface to listen on
    #[arg(long, env = "BLOG_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "BLOG_PORT", default_value_t = 5002)]
    pub port: u16,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
