pub mod aggregate;
pub mod builder;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod embed;
pub mod engine;
pub mod error;
pub mod index;
pub mod metrics;
pub mod rebuild;
mod server;
pub mod store;
pub mod utils;

pub use config::Opts;
pub use engine::{ArticleMatch, Engine, EngineBuilder, IndexStats};
pub use error::{Error, Result};
