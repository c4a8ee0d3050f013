mod article;
mod build;
mod images;
mod meta;
mod search;
pub mod server;
mod settings;

pub use article::*;
pub use build::*;
pub use images::*;
pub use meta::*;
pub use search::*;
pub use server::*;
pub use settings::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
