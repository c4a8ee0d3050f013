use crate::error::Result;
use crate::index::{Embedding, FlatL2Index, Neighbor};

/// 一张图片对应的索引条目
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// 文章 ID，即数据集中的目录名
    pub article_id: String,
    /// 图片文件名
    pub image_name: String,
    pub vector: Embedding,
}

/// 向量索引及其标签
///
/// 向量和标签只通过位置关联，所以二者只能一起构建、一起替换，不提供单独修改的接口。
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    index: FlatL2Index,
    labels: Vec<String>,
    images: Vec<String>,
}

impl CatalogIndex {
    /// 按顺序从条目构建索引
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = FlatL2Index::new();
        let mut vectors = Vec::with_capacity(entries.len());
        let mut labels = Vec::with_capacity(entries.len());
        let mut images = Vec::with_capacity(entries.len());
        for entry in entries {
            vectors.push(entry.vector);
            labels.push(entry.article_id);
            images.push(entry.image_name);
        }
        index.add(&vectors)?;
        Ok(Self { index, labels, images })
    }

    pub fn index(&self) -> &FlatL2Index {
        &self.index
    }

    /// 与索引向量一一对应的文章 ID 序列
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, position: usize) -> Option<&str> {
        self.labels.get(position).map(String::as_str)
    }

    pub fn image_name(&self, position: usize) -> Option<&str> {
        self.images.get(position).map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.index.size()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.index.dimensions()
    }

    /// 不重复的文章数量
    pub fn article_count(&self) -> usize {
        let mut labels = self.labels.iter().collect::<Vec<_>>();
        labels.sort_unstable();
        labels.dedup();
        labels.len()
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.index.search(query, k)
    }
}
