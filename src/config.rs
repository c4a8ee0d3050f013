use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;

use crate::aggregate::DEFAULT_OVER_FETCH;
use crate::cli::*;

static DATASET_DIR: LazyLock<String> = LazyLock::new(|| {
    ProjectDirs::from("", "", "luggage-match")
        .map(|dirs| dirs.data_dir().join("dataset"))
        .unwrap_or_else(|| PathBuf::from("dataset"))
        .to_string_lossy()
        .into_owned()
});

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 返回的文章数量，不填则使用 app_config.json 中的设置
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u16).range(1..))]
    pub count: Option<u16>,
    /// 按文章去重前搜索的最大近邻数量
    /// 如果单篇文章的图片数量超过该值，结果可能少于 COUNT
    #[arg(long, value_name = "K", default_value_t = DEFAULT_OVER_FETCH, verbatim_doc_comment)]
    pub over_fetch: usize,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "luggage-match", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 数据集目录，每个子目录为一篇文章
    #[arg(short, long, global = true, default_value = DATASET_DIR.as_str())]
    pub dataset: DatasetDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 从数据集构建索引，检查所有图片
    Build(BuildCommand),
    /// 搜索与图片最相似的文章
    Search(SearchCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
    /// 管理文章目录
    #[command(subcommand)]
    Article(ArticleCommand),
    /// 管理文章图片
    #[command(subcommand)]
    Image(ImageCommand),
    /// 管理文章链接
    #[command(subcommand)]
    Meta(MetaCommand),
    /// 管理应用设置
    #[command(subcommand)]
    Settings(SettingsCommand),
}

/// 数据集目录，同时存放 `metadata.json` 和 `app_config.json`
#[derive(Debug, Clone)]
pub struct DatasetDir {
    path: PathBuf,
}

impl DatasetDir {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回文章链接文件的路径
    pub fn metadata(&self) -> PathBuf {
        self.path.join("metadata.json")
    }

    /// 返回应用设置文件的路径
    pub fn app_config(&self) -> PathBuf {
        self.path.join("app_config.json")
    }
}

impl FromStr for DatasetDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
