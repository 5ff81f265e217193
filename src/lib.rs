//! Blog posts API backed by a single JSON file.

#[macro_use]
extern crate log;

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod model;
pub mod query;

pub use crate::database::Database;
pub use crate::error::{BlogError, Result};
pub use crate::model::{NewPost, Post, PostUpdate};
