use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::error::Result;

/// 找不到链接时返回的占位值
pub const NOT_FOUND: &str = "Non trouvé";

/// 文章的购买和维修链接，对应 `metadata.json` 中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// 文章 ID
    pub label: String,
    /// 轮子等配件的购买链接
    #[serde(rename = "url-roulette", default, skip_serializing_if = "Option::is_none")]
    pub url_roulette: Option<String>,
    /// 维修套件链接
    #[serde(rename = "url-kit", default, skip_serializing_if = "Option::is_none")]
    pub url_kit: Option<String>,
}

impl MetadataEntry {
    pub fn new<S: Into<String>>(label: S, url_roulette: S, url_kit: S) -> Self {
        Self {
            label: label.into(),
            url_roulette: Some(url_roulette.into()),
            url_kit: Some(url_kit.into()),
        }
    }
}

/// 文章链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleUrls {
    pub url_roulette: String,
    pub url_kit: String,
}

impl Default for ArticleUrls {
    fn default() -> Self {
        Self { url_roulette: NOT_FOUND.to_owned(), url_kit: NOT_FOUND.to_owned() }
    }
}

/// `metadata.json` 的读写
///
/// 每次操作都重新读取文件，管理端的修改无需重启即可生效。
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取所有条目，文件不存在或无法解析时返回空列表
    pub fn load(&self) -> Vec<MetadataEntry> {
        read_json(&self.path).unwrap_or_default()
    }

    pub fn save(&self, entries: &[MetadataEntry]) -> Result<()> {
        write_json(&self.path, entries)
    }

    /// 查找文章的链接，缺失的字段用 [`NOT_FOUND`] 代替
    pub fn get_urls(&self, label: &str) -> ArticleUrls {
        self.load()
            .into_iter()
            .find(|entry| entry.label == label)
            .map(|entry| ArticleUrls {
                url_roulette: entry.url_roulette.unwrap_or_else(|| NOT_FOUND.to_owned()),
                url_kit: entry.url_kit.unwrap_or_else(|| NOT_FOUND.to_owned()),
            })
            .unwrap_or_default()
    }

    /// 追加一个条目，不检查重复
    pub fn add(&self, entry: MetadataEntry) -> Result<()> {
        let mut entries = self.load();
        entries.push(entry);
        self.save(&entries)
    }

    /// 替换第一个标签为 `label` 的条目，没有找到时返回 false
    pub fn update(&self, label: &str, entry: MetadataEntry) -> Result<bool> {
        let mut entries = self.load();
        let Some(old) = entries.iter_mut().find(|e| e.label == label) else {
            return Ok(false);
        };
        *old = entry;
        self.save(&entries)?;
        Ok(true)
    }

    /// 添加或更新条目
    pub fn upsert(&self, entry: MetadataEntry) -> Result<()> {
        let label = entry.label.clone();
        if !self.update(&label, entry.clone())? {
            self.add(entry)?;
        }
        Ok(())
    }

    /// 删除第一个标签为 `label` 的条目
    pub fn remove(&self, label: &str) -> Result<bool> {
        let mut entries = self.load();
        let Some(index) = entries.iter().position(|e| e.label == label) else {
            return Ok(false);
        };
        entries.remove(index);
        self.save(&entries)?;
        Ok(true)
    }

    /// 按位置删除条目
    pub fn remove_at(&self, index: usize) -> Result<bool> {
        let mut entries = self.load();
        if index >= entries.len() {
            return Ok(false);
        }
        entries.remove(index);
        self.save(&entries)?;
        Ok(true)
    }
}
