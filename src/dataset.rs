use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// 可被索引的图片后缀名，不区分大小写
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff"];

/// 按文章分组的图片数据集
///
/// 每篇文章对应一组图片，构建索引时只会通过这里读取数据，测试中可以替换为内存实现。
pub trait Dataset {
    /// 列出所有文章 ID
    fn list_articles(&self) -> Result<Vec<String>>;

    /// 列出文章下的所有图片文件名
    fn list_images(&self, article_id: &str) -> Result<Vec<String>>;

    /// 读取图片的原始字节
    fn read_image(&self, article_id: &str, image_name: &str) -> Result<Vec<u8>>;
}

/// 判断文件名是否为支持的图片格式
pub fn is_image_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            IMAGE_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s))
        })
        .unwrap_or(false)
}

/// 检查名称是否为单级路径，避免通过 `..` 或分隔符访问数据集以外的文件
pub fn check_name(name: &str) -> Result<&str> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if c == name && !name.contains(['/', '\\']) => Ok(name),
        _ => Err(Error::InvalidName(name.to_owned())),
    }
}

/// 取出路径最后一级的 UTF-8 名称，无法转换时记录警告并跳过
fn utf8_name(path: &Path) -> Option<String> {
    match path.file_name()?.to_str() {
        Some(name) => Some(name.to_owned()),
        None => {
            warn!("跳过名称不是 UTF-8 的文件: {}", path.display());
            None
        }
    }
}

/// 基于文件系统的数据集，根目录下每个子目录是一篇文章
#[derive(Debug, Clone)]
pub struct FsDataset {
    root: PathBuf,
}

impl FsDataset {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn article_path(&self, article_id: &str) -> Result<PathBuf> {
        Ok(self.root.join(check_name(article_id)?))
    }

    fn image_path(&self, article_id: &str, image_name: &str) -> Result<PathBuf> {
        Ok(self.article_path(article_id)?.join(check_name(image_name)?))
    }

    /// 列出目录下的直接子项，按文件名排序
    fn entries(dir: &Path) -> impl Iterator<Item = Result<walkdir::DirEntry>> {
        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.map_err(|e| Error::Io(io::Error::from(e))))
    }

    /// 创建文章目录，已存在时返回 false
    pub fn create_article(&self, article_id: &str) -> Result<bool> {
        let path = self.article_path(article_id)?;
        if path.is_dir() {
            return Ok(false);
        }
        std::fs::create_dir_all(&path)?;
        info!("创建文章: {}", article_id);
        Ok(true)
    }

    /// 删除文章目录及其中的所有图片，不存在时返回 false
    pub fn delete_article(&self, article_id: &str) -> Result<bool> {
        let path = self.article_path(article_id)?;
        if !path.is_dir() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&path)?;
        info!("删除文章: {}", article_id);
        Ok(true)
    }

    /// 保存图片到文章目录，目录不存在时自动创建，同名文件会被覆盖
    pub fn add_image(&self, article_id: &str, image_name: &str, data: &[u8]) -> Result<PathBuf> {
        let path = self.image_path(article_id, image_name)?;
        if !is_image_file(&path) {
            return Err(Error::InvalidName(image_name.to_owned()));
        }
        std::fs::create_dir_all(self.article_path(article_id)?)?;
        std::fs::write(&path, data)?;
        info!("添加图片: {}", path.display());
        Ok(path)
    }

    /// 删除图片，不存在时返回 false
    pub fn delete_image(&self, article_id: &str, image_name: &str) -> Result<bool> {
        let path = self.image_path(article_id, image_name)?;
        if !path.is_file() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        info!("删除图片: {}", path.display());
        Ok(true)
    }

    /// 返回数据集结构，即每篇文章下的图片列表
    pub fn structure(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut structure = BTreeMap::new();
        for article in self.list_articles()? {
            let images = self.list_images(&article)?;
            structure.insert(article, images);
        }
        Ok(structure)
    }
}

impl Dataset for FsDataset {
    fn list_articles(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(vec![]);
        }
        let mut articles = vec![];
        for entry in Self::entries(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(name) = utf8_name(entry.path()) {
                articles.push(name);
            }
        }
        Ok(articles)
    }

    fn list_images(&self, article_id: &str) -> Result<Vec<String>> {
        let path = self.article_path(article_id)?;
        if !path.is_dir() {
            return Err(Error::ArticleNotFound(article_id.to_owned()));
        }
        let mut images = vec![];
        for entry in Self::entries(&path) {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_image_file(entry.path()) {
                continue;
            }
            if let Some(name) = utf8_name(entry.path()) {
                images.push(name);
            }
        }
        Ok(images)
    }

    fn read_image(&self, article_id: &str, image_name: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.image_path(article_id, image_name)?)?)
    }
}
