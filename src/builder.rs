use std::time::Instant;

use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::catalog::{CatalogEntry, CatalogIndex};
use crate::dataset::Dataset;
use crate::embed::{Embedder, decode_image};
use crate::error::{Error, Result};

/// 构建过程中被跳过的图片或文章
#[derive(Debug)]
pub struct BuildWarning {
    pub article_id: String,
    /// 为 None 时表示整篇文章无法列出
    pub image_name: Option<String>,
    pub error: Error,
}

impl std::fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.image_name {
            Some(name) => write!(f, "{}/{}: {}", self.article_id, name, self.error),
            None => write!(f, "{}: {}", self.article_id, self.error),
        }
    }
}

/// 一次构建的结果
#[derive(Debug)]
pub struct BuildReport {
    pub catalog: CatalogIndex,
    pub warnings: Vec<BuildWarning>,
}

/// 从数据集构建索引
///
/// 文章和图片都按名称排序后再处理，相同的数据集总是得到相同顺序的索引。
/// 单张图片失败只会记录警告，只有全部图片都不可用时才会返回 `Error::EmptyDataset`。
pub struct IndexBuilder<'a> {
    dataset: &'a dyn Dataset,
    embedder: &'a dyn Embedder,
    pb: ProgressBar,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(dataset: &'a dyn Dataset, embedder: &'a dyn Embedder) -> Self {
        Self { dataset, embedder, pb: ProgressBar::hidden() }
    }

    /// 设置进度条，默认不显示
    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    pub fn build(&self) -> Result<BuildReport> {
        let start = Instant::now();
        let mut articles = self.dataset.list_articles()?;
        articles.sort_unstable();

        info!("开始构建索引，共 {} 篇文章", articles.len());
        self.pb.set_length(articles.len() as u64);

        let mut entries = vec![];
        let mut warnings = vec![];

        for article_id in articles {
            self.pb.set_message(article_id.clone());

            let mut images = match self.dataset.list_images(&article_id) {
                Ok(images) => images,
                Err(error) => {
                    warn!("无法列出文章 {} 的图片: {}", article_id, error);
                    warnings.push(BuildWarning { article_id, image_name: None, error });
                    self.pb.inc(1);
                    continue;
                }
            };
            images.sort_unstable();

            for image_name in images {
                match self.embed_one(&article_id, &image_name) {
                    Ok(vector) => entries.push(CatalogEntry {
                        article_id: article_id.clone(),
                        image_name,
                        vector,
                    }),
                    Err(error) => {
                        warn!("跳过图片 {}/{}: {}", article_id, image_name, error);
                        warnings.push(BuildWarning {
                            article_id: article_id.clone(),
                            image_name: Some(image_name),
                            error,
                        });
                    }
                }
            }
            self.pb.inc(1);
        }
        self.pb.finish_and_clear();

        if entries.is_empty() {
            return Err(Error::EmptyDataset);
        }

        let catalog = CatalogIndex::from_entries(entries)?;
        info!(
            "索引构建完成: {} 篇文章, {} 张图片, {} 张跳过",
            catalog.article_count(),
            catalog.size(),
            warnings.len()
        );
        debug!("build time: {:.2}s", start.elapsed().as_secs_f32());

        Ok(BuildReport { catalog, warnings })
    }

    fn embed_one(&self, article_id: &str, image_name: &str) -> Result<Vec<f32>> {
        let bytes = self.dataset.read_image(article_id, image_name)?;
        let image = decode_image(image_name, &bytes)?;
        self.embedder.embed(&image)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use image::DynamicImage;

    use super::*;

    /// 以第一个字节作为向量的内存数据集，字节为 0 表示损坏的图片
    #[derive(Default)]
    struct FakeDataset(BTreeMap<String, Vec<(String, u8)>>);

    impl FakeDataset {
        fn with(mut self, article: &str, images: &[(&str, u8)]) -> Self {
            let images = images.iter().map(|(n, v)| (n.to_string(), *v)).collect();
            self.0.insert(article.to_owned(), images);
            self
        }
    }

    impl Dataset for FakeDataset {
        fn list_articles(&self) -> Result<Vec<String>> {
            // 故意倒序返回
            Ok(self.0.keys().rev().cloned().collect())
        }

        fn list_images(&self, article_id: &str) -> Result<Vec<String>> {
            let images = self.0.get(article_id).ok_or(Error::ArticleNotFound(article_id.into()))?;
            Ok(images.iter().rev().map(|(n, _)| n.clone()).collect())
        }

        fn read_image(&self, article_id: &str, image_name: &str) -> Result<Vec<u8>> {
            let images = &self.0[article_id];
            let (_, v) = images.iter().find(|(n, _)| n == image_name).unwrap();
            Ok(vec![*v])
        }
    }

    /// 跳过真正的解码，直接读取 1x1 灰度图的像素值
    struct PixelEmbedder;

    impl Embedder for PixelEmbedder {
        fn dimensions(&self) -> usize {
            1
        }

        fn embed(&self, image: &DynamicImage) -> Result<Vec<f32>> {
            Ok(vec![image.to_luma8().get_pixel(0, 0).0[0] as f32])
        }
    }

    // FakeDataset 返回的是单字节，需要包装成真正的图片
    struct PngDataset(FakeDataset);

    impl Dataset for PngDataset {
        fn list_articles(&self) -> Result<Vec<String>> {
            self.0.list_articles()
        }

        fn list_images(&self, article_id: &str) -> Result<Vec<String>> {
            self.0.list_images(article_id)
        }

        fn read_image(&self, article_id: &str, image_name: &str) -> Result<Vec<u8>> {
            let v = self.0.read_image(article_id, image_name)?[0];
            if v == 0 {
                return Ok(b"corrupted".to_vec());
            }
            let image = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(1, 1, image::Luma([v])));
            let mut buf = std::io::Cursor::new(vec![]);
            image.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            Ok(buf.into_inner())
        }
    }

    fn dataset() -> PngDataset {
        PngDataset(
            FakeDataset::default()
                .with("R200", &[("c.png", 30)])
                .with("R100", &[("b.png", 20), ("a.png", 10), ("bad.png", 0)]),
        )
    }

    #[test]
    fn test_deterministic_order() {
        let dataset = dataset();
        let report = IndexBuilder::new(&dataset, &PixelEmbedder).build().unwrap();
        let catalog = report.catalog;
        assert_eq!(catalog.labels(), &["R100", "R100", "R200"]);
        assert_eq!(catalog.image_name(0), Some("a.png"));
        assert_eq!(catalog.image_name(1), Some("b.png"));
        assert_eq!(catalog.index().vector(0), Some(&[10.][..]));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let dataset = dataset();
        let first = IndexBuilder::new(&dataset, &PixelEmbedder).build().unwrap();
        let second = IndexBuilder::new(&dataset, &PixelEmbedder).build().unwrap();
        assert_eq!(first.catalog.labels(), second.catalog.labels());
    }

    #[test]
    fn test_bad_image_is_skipped() {
        let dataset = dataset();
        let report = IndexBuilder::new(&dataset, &PixelEmbedder).build().unwrap();
        assert_eq!(report.catalog.size(), 3);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].image_name.as_deref(), Some("bad.png"));
        assert!(matches!(report.warnings[0].error, Error::ImageDecode { .. }));
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = PngDataset(FakeDataset::default().with("R1", &[("bad.png", 0)]).with("R2", &[]));
        let result = IndexBuilder::new(&dataset, &PixelEmbedder).build();
        assert!(matches!(result, Err(Error::EmptyDataset)));

        let dataset = PngDataset(FakeDataset::default());
        let result = IndexBuilder::new(&dataset, &PixelEmbedder).build();
        assert!(matches!(result, Err(Error::EmptyDataset)));
    }
}
