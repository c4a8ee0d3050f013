use std::path::PathBuf;

use thiserror::Error;

/// 索引、数据集与配置文件相关的错误
#[derive(Debug, Error)]
pub enum Error {
    /// 向量维数与索引维数不一致，不会截断或填充
    #[error("向量维数不匹配: 索引维数 {expected}, 实际 {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 构建完成后没有得到任何向量
    #[error("数据集中没有可用的图片")]
    EmptyDataset,

    /// 图片无法读取或解码
    #[error("无法解码图片 {name}: {source}")]
    ImageDecode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// 特征提取失败，与提取出全零向量不同
    #[error("特征提取失败: {0}")]
    Embedding(String),

    /// 配置文件或元数据文件读写失败
    #[error("无法保存 {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文章 ID 或图片名不是合法的单级路径
    #[error("无效的名称: {0:?}")]
    InvalidName(String),

    #[error("参数无效: {0}")]
    InvalidArgument(String),

    #[error("文章不存在: {0}")]
    ArticleNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
