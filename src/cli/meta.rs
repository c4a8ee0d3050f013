use anyhow::Result;
use clap::Subcommand;
use log::info;

use crate::cli::SubCommandExtend;
use crate::store::{MetadataEntry, MetadataStore, NOT_FOUND};
use crate::Opts;

#[derive(Subcommand, Debug, Clone)]
pub enum MetaCommand {
    /// 列出所有链接
    List,
    /// 添加或更新文章的链接
    Set {
        /// 文章 ID
        label: String,
        /// 配件购买链接
        #[arg(long, value_name = "URL")]
        roulette: Option<String>,
        /// 维修套件链接
        #[arg(long, value_name = "URL")]
        kit: Option<String>,
    },
    /// 修改条目的文章 ID
    Rename { old: String, new: String },
    /// 删除文章的链接
    Remove { label: String },
    /// 查询文章的链接
    Urls { label: String },
}

impl SubCommandExtend for MetaCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = MetadataStore::new(opts.dataset.metadata());
        match self {
            Self::List => {
                for entry in store.load() {
                    println!(
                        "{}\t{}\t{}",
                        entry.label,
                        entry.url_roulette.as_deref().unwrap_or(NOT_FOUND),
                        entry.url_kit.as_deref().unwrap_or(NOT_FOUND)
                    );
                }
            }
            Self::Set { label, roulette, kit } => {
                let old = store.load().into_iter().find(|e| &e.label == label);
                let entry = MetadataEntry {
                    label: label.clone(),
                    url_roulette: roulette.clone().or_else(|| old.as_ref()?.url_roulette.clone()),
                    url_kit: kit.clone().or_else(|| old.as_ref()?.url_kit.clone()),
                };
                store.upsert(entry)?;
                info!("已保存 {} 的链接", label);
            }
            Self::Rename { old, new } => {
                let Some(mut entry) = store.load().into_iter().find(|e| &e.label == old) else {
                    anyhow::bail!("没有找到 {} 的链接", old);
                };
                entry.label = new.clone();
                store.update(old, entry)?;
                info!("已将 {} 重命名为 {}", old, new);
            }
            Self::Remove { label } => match store.remove(label)? {
                true => info!("已删除 {} 的链接", label),
                false => anyhow::bail!("没有找到 {} 的链接", label),
            },
            Self::Urls { label } => {
                let urls = store.get_urls(label);
                println!("{}\t{}", urls.url_roulette, urls.url_kit);
            }
        }
        Ok(())
    }
}
