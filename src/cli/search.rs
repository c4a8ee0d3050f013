use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::task::block_in_place;

use crate::cli::SubCommandExtend;
use crate::config::{Opts, OutputFormat, SearchOptions};
use crate::engine::ArticleMatch;
use crate::store::ArticleUrls;
use crate::utils::ellipsis;
use crate::EngineBuilder;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: String,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

#[derive(Serialize)]
struct SearchRow {
    #[serde(flatten)]
    article: ArticleMatch,
    #[serde(flatten)]
    urls: ArticleUrls,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let engine = EngineBuilder::new(opts.dataset.clone())
            .over_fetch(self.search.over_fetch)
            .progress(true)
            .open();
        let count = match self.search.count {
            Some(count) => count as usize,
            None => engine.num_results(),
        };

        let result = block_in_place(|| engine.search_file(&self.image, count))?;
        let rows = result
            .into_iter()
            .map(|article| {
                let urls = engine.get_urls(&article.article_id);
                SearchRow { article, urls }
            })
            .collect::<Vec<_>>();

        print_result(&rows, self.output_format)
    }
}

fn print_result(rows: &[SearchRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?)
        }
        OutputFormat::Table => {
            for row in rows {
                println!(
                    "{:.4}\t{:.2}%\t{}\t{}\t{}",
                    row.article.distance,
                    row.article.similarity * 100.,
                    row.article.article_id,
                    ellipsis(&row.urls.url_roulette, 60),
                    ellipsis(&row.urls.url_kit, 60),
                );
            }
        }
    }
    Ok(())
}
