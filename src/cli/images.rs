use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;
use log::info;

use crate::cli::SubCommandExtend;
use crate::dataset::FsDataset;
use crate::Opts;

#[derive(Subcommand, Debug, Clone)]
pub enum ImageCommand {
    /// 将图片复制到文章目录
    Add {
        /// 文章 ID
        id: String,
        /// 图片路径
        file: PathBuf,
        /// 保存的文件名，默认与原文件同名
        #[arg(long)]
        name: Option<String>,
    },
    /// 删除文章中的一张图片
    Remove {
        /// 文章 ID
        id: String,
        /// 图片文件名
        name: String,
    },
}

impl SubCommandExtend for ImageCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let dataset = FsDataset::new(opts.dataset.path());
        match self {
            Self::Add { id, file, name } => {
                let name = match name {
                    Some(name) => name.clone(),
                    None => file
                        .file_name()
                        .map(|s| s.to_string_lossy().into_owned())
                        .context("无法获取文件名")?,
                };
                let data = std::fs::read(file)
                    .with_context(|| format!("无法读取 {}", file.display()))?;
                let path = dataset.add_image(id, &name, &data)?;
                info!("已添加图片 {}", path.display());
            }
            Self::Remove { id, name } => match dataset.delete_image(id, name)? {
                true => info!("已删除图片 {}/{}", id, name),
                false => anyhow::bail!("图片不存在: {}/{}", id, name),
            },
        }
        Ok(())
    }
}
