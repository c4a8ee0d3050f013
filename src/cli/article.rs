use anyhow::Result;
use clap::Subcommand;
use log::info;

use crate::cli::SubCommandExtend;
use crate::dataset::FsDataset;
use crate::Opts;

#[derive(Subcommand, Debug, Clone)]
pub enum ArticleCommand {
    /// 创建文章目录
    Add {
        /// 文章 ID
        id: String,
    },
    /// 删除文章及其所有图片
    Remove {
        /// 文章 ID
        id: String,
    },
    /// 列出所有文章及图片
    List,
}

impl SubCommandExtend for ArticleCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let dataset = FsDataset::new(opts.dataset.path());
        match self {
            Self::Add { id } => match dataset.create_article(id)? {
                true => info!("已创建文章 {}", id),
                false => info!("文章 {} 已存在", id),
            },
            Self::Remove { id } => match dataset.delete_article(id)? {
                true => info!("已删除文章 {}", id),
                false => anyhow::bail!("文章不存在: {}", id),
            },
            Self::List => {
                for (id, images) in dataset.structure()? {
                    println!("{}\t{}", id, images.join(", "));
                }
            }
        }
        Ok(())
    }
}
