use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::{EngineBuilder, Opts};

#[derive(Parser, Debug, Clone)]
pub struct BuildCommand {
    /// 不显示进度条
    #[arg(long)]
    pub quiet: bool,
}

impl SubCommandExtend for BuildCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let engine = EngineBuilder::new(opts.dataset.clone()).progress(!self.quiet).open();
        let summary = block_in_place(|| engine.rebuild())?;

        for warning in &summary.warnings {
            warn!("{}", warning);
        }
        info!("构建索引成功");
        println!(
            "articles: {}\timages: {}\tdimensions: {}\twarnings: {}",
            summary.stats.articles,
            summary.stats.images,
            summary.stats.dimensions,
            summary.warnings.len()
        );
        Ok(())
    }
}
