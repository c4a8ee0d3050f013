use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use log::{debug, info};
use serde::Serialize;

use crate::aggregate::{DEFAULT_OVER_FETCH, rank_articles, search_k, similarity_scores};
use crate::builder::{BuildWarning, IndexBuilder};
use crate::catalog::CatalogIndex;
use crate::config::DatasetDir;
use crate::dataset::{Dataset, FsDataset};
use crate::embed::{Embedder, ThumbnailEmbedder, decode_image, open_image};
use crate::error::{Error, Result};
use crate::metrics;
use crate::rebuild::LiveIndex;
use crate::store::{ArticleUrls, MetadataStore, SettingsStore};
use crate::utils::progress_bar;

/// 一篇匹配的文章
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleMatch {
    pub article_id: String,
    /// 该文章所有图片中的最小平方 L2 距离
    pub distance: f32,
    /// 本次结果内归一化后的相似度，只用于展示
    pub similarity: f32,
}

/// 索引统计信息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub articles: usize,
    pub images: usize,
    pub dimensions: usize,
}

impl From<&CatalogIndex> for IndexStats {
    fn from(catalog: &CatalogIndex) -> Self {
        Self {
            articles: catalog.article_count(),
            images: catalog.size(),
            dimensions: catalog.dimensions().unwrap_or(0),
        }
    }
}

/// 一次完整构建的结果
#[derive(Debug)]
pub struct BuildSummary {
    pub stats: IndexStats,
    pub warnings: Vec<BuildWarning>,
}

pub struct EngineBuilder {
    dir: DatasetDir,
    dataset: Option<Box<dyn Dataset + Send + Sync>>,
    embedder: Box<dyn Embedder>,
    over_fetch: usize,
    progress: bool,
}

impl EngineBuilder {
    pub fn new(dir: DatasetDir) -> Self {
        Self {
            dir,
            dataset: None,
            embedder: Box::new(ThumbnailEmbedder::default()),
            over_fetch: DEFAULT_OVER_FETCH,
            progress: false,
        }
    }

    /// 去重前搜索的最大近邻数量
    pub fn over_fetch(mut self, over_fetch: usize) -> Self {
        self.over_fetch = over_fetch;
        self
    }

    pub fn embedder<E: Embedder + 'static>(mut self, embedder: E) -> Self {
        self.embedder = Box::new(embedder);
        self
    }

    /// 替换数据集实现，默认使用数据集目录
    pub fn dataset<D: Dataset + Send + Sync + 'static>(mut self, dataset: D) -> Self {
        self.dataset = Some(Box::new(dataset));
        self
    }

    /// 构建索引时是否显示进度条
    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn open(self) -> Engine {
        let dataset = self.dataset.unwrap_or_else(|| Box::new(FsDataset::new(self.dir.path())));
        Engine {
            settings: SettingsStore::new(self.dir.app_config()),
            metadata: MetadataStore::new(self.dir.metadata()),
            dataset,
            embedder: self.embedder,
            live: LiveIndex::new(),
            over_fetch: self.over_fetch,
            progress: self.progress,
        }
    }
}

/// 图片搜索的入口
///
/// 索引在第一次搜索时才构建，之后每次搜索前都会检查重建标志。
pub struct Engine {
    settings: SettingsStore,
    metadata: MetadataStore,
    dataset: Box<dyn Dataset + Send + Sync>,
    embedder: Box<dyn Embedder>,
    live: LiveIndex,
    over_fetch: usize,
    progress: bool,
}

impl Engine {
    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// 设置中的默认结果数量
    pub fn num_results(&self) -> usize {
        self.settings.load().num_results
    }

    fn build_report(&self) -> Result<(CatalogIndex, Vec<BuildWarning>)> {
        let start = Instant::now();
        let result = IndexBuilder::new(self.dataset.as_ref(), self.embedder.as_ref())
            .progress(progress_bar(self.progress))
            .build();
        metrics::inc_build(result.is_ok(), start.elapsed().as_secs_f32());

        let report = result?;
        metrics::set_index_size(report.catalog.article_count(), report.catalog.size());
        Ok((report.catalog, report.warnings))
    }

    fn build_catalog(&self) -> Result<CatalogIndex> {
        self.build_report().map(|(catalog, _)| catalog)
    }

    /// 立即重建索引，失败时保留旧索引
    pub fn rebuild(&self) -> Result<BuildSummary> {
        let mut warnings = vec![];
        let catalog = self.live.rebuild(|| {
            let (catalog, w) = self.build_report()?;
            warnings = w;
            Ok(catalog)
        })?;
        Ok(BuildSummary { stats: IndexStats::from(catalog.as_ref()), warnings })
    }

    /// 消费重建标志，返回是否进行了重建
    pub fn refresh(&self) -> Result<bool> {
        self.live.consume_rebuild(&self.settings, || self.build_catalog())
    }

    /// 请求重建并立即消费
    pub fn request_rebuild(&self) -> Result<IndexStats> {
        self.settings.request_rebuild()?;
        self.refresh()?;
        self.stats().ok_or(Error::EmptyDataset)
    }

    /// 返回可用的索引，需要时先重建或首次构建
    pub fn ensure_index(&self) -> Result<Arc<CatalogIndex>> {
        self.refresh()?;
        self.live.get_or_build(|| self.build_catalog())
    }

    /// 当前索引的统计信息，尚未构建时为 None
    pub fn stats(&self) -> Option<IndexStats> {
        self.live.current().map(|catalog| IndexStats::from(catalog.as_ref()))
    }

    /// 搜索上传的图片
    pub fn search(&self, bytes: &[u8], num_results: usize) -> Result<Vec<ArticleMatch>> {
        let image = decode_image("upload", bytes)?;
        self.search_decoded(&image, num_results)
    }

    /// 搜索本地图片文件
    pub fn search_file<P: AsRef<Path>>(&self, path: P, num_results: usize) -> Result<Vec<ArticleMatch>> {
        let image = open_image(path)?;
        self.search_decoded(&image, num_results)
    }

    fn search_decoded(&self, image: &DynamicImage, num_results: usize) -> Result<Vec<ArticleMatch>> {
        let embedding = self.embedder.embed(image)?;
        self.search_embedding(&embedding, num_results)
    }

    /// 用特征向量搜索，返回按距离升序排列的不同文章
    pub fn search_embedding(&self, query: &[f32], num_results: usize) -> Result<Vec<ArticleMatch>> {
        let catalog = self.ensure_index()?;
        let start = Instant::now();

        let k = search_k(catalog.size(), self.over_fetch, num_results);
        debug!("searching {} nearest neighbors", k);
        let neighbors = catalog.search(query, k)?;
        let ranked = rank_articles(&neighbors, catalog.labels(), num_results);

        let distances = ranked.iter().map(|(_, d)| *d).collect::<Vec<_>>();
        let result = ranked
            .into_iter()
            .zip(similarity_scores(&distances))
            .map(|((article_id, distance), similarity)| ArticleMatch { article_id, distance, similarity })
            .collect::<Vec<_>>();

        let elapsed = start.elapsed().as_secs_f32();
        metrics::inc_search(elapsed, result.first().map(|m| m.distance));
        info!("搜索完成: {} 个结果, 耗时 {:.2}ms", result.len(), elapsed * 1000.);

        Ok(result)
    }

    /// 查找文章的购买和维修链接
    pub fn get_urls(&self, article_id: &str) -> ArticleUrls {
        self.metadata.get_urls(article_id)
    }
}
