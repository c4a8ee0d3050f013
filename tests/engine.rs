use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use luggage_match::config::DatasetDir;
use luggage_match::dataset::{Dataset, FsDataset};
use luggage_match::embed::{Embedder, ThumbnailEmbedder, decode_image};
use luggage_match::store::{MetadataEntry, NOT_FOUND};
use luggage_match::{Engine, EngineBuilder, Error};
use rstest::*;
use tempfile::TempDir;

fn png(color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb(color)));
    let mut buf = Cursor::new(vec![]);
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

const RED: [u8; 3] = [200, 30, 30];
const DARK_RED: [u8; 3] = [150, 20, 20];
const BLUE: [u8; 3] = [30, 30, 200];
const GREEN: [u8; 3] = [30, 200, 30];

#[derive(Default)]
struct MemDataset(BTreeMap<String, Vec<(String, Vec<u8>)>>);

impl MemDataset {
    fn with(mut self, article: &str, images: &[(&str, [u8; 3])]) -> Self {
        let images = images.iter().map(|(name, color)| (name.to_string(), png(*color))).collect();
        self.0.insert(article.to_owned(), images);
        self
    }
}

impl Dataset for MemDataset {
    fn list_articles(&self) -> luggage_match::Result<Vec<String>> {
        Ok(self.0.keys().cloned().collect())
    }

    fn list_images(&self, article_id: &str) -> luggage_match::Result<Vec<String>> {
        let images = self.0.get(article_id).ok_or(Error::ArticleNotFound(article_id.into()))?;
        Ok(images.iter().map(|(name, _)| name.clone()).collect())
    }

    fn read_image(&self, article_id: &str, image_name: &str) -> luggage_match::Result<Vec<u8>> {
        let images = self.0.get(article_id).ok_or(Error::ArticleNotFound(article_id.into()))?;
        images
            .iter()
            .find(|(name, _)| name == image_name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| Error::InvalidName(image_name.into()))
    }
}

/// 用左上角像素的 RGB 作为向量，打开 `slow` 后每张图片耗时 500ms
#[derive(Default)]
struct SlowEmbedder {
    slow: Arc<AtomicBool>,
    started: Arc<AtomicBool>,
}

impl Embedder for SlowEmbedder {
    fn dimensions(&self) -> usize {
        3
    }

    fn embed(&self, image: &DynamicImage) -> luggage_match::Result<Vec<f32>> {
        if self.slow.load(Ordering::SeqCst) {
            self.started.store(true, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(500));
        }
        Ok(image.to_rgb8().get_pixel(0, 0).0.map(|c| c as f32 / 255.).to_vec())
    }
}

fn embedding(color: [u8; 3]) -> Vec<f32> {
    let image = decode_image("query", &png(color)).unwrap();
    ThumbnailEmbedder::default().embed(&image).unwrap()
}

#[fixture]
fn dir() -> TempDir {
    TempDir::new().unwrap()
}

fn memory_engine(dir: &TempDir, dataset: MemDataset) -> Engine {
    EngineBuilder::new(DatasetDir::new(dir.path())).dataset(dataset).open()
}

/// 使用真实目录的引擎，R100 有两张红色图片，R200 有一张蓝色图片
fn fs_engine(dir: &TempDir) -> Result<(Engine, FsDataset)> {
    let dataset = FsDataset::new(dir.path());
    dataset.add_image("R100", "a.png", &png(RED))?;
    dataset.add_image("R100", "b.png", &png(DARK_RED))?;
    dataset.add_image("R200", "c.png", &png(BLUE))?;
    let engine = EngineBuilder::new(DatasetDir::new(dir.path())).open();
    Ok((engine, dataset))
}

#[rstest]
fn end_to_end_scenario(dir: TempDir) -> Result<()> {
    let dataset = MemDataset::default()
        .with("R100", &[("a.png", RED), ("b.png", DARK_RED)])
        .with("R200", &[("c.png", BLUE)]);
    let engine = memory_engine(&dir, dataset);

    let result = engine.search_embedding(&embedding(RED), 2)?;
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].article_id, "R100");
    assert_eq!(result[0].distance, 0.0);
    assert_eq!(result[1].article_id, "R200");
    assert!(result[1].distance > 0.0);

    let stats = engine.stats().unwrap();
    assert_eq!((stats.articles, stats.images, stats.dimensions), (2, 3, 256));
    Ok(())
}

#[rstest]
fn similarity_is_presentation_only(dir: TempDir) -> Result<()> {
    let dataset = MemDataset::default()
        .with("R100", &[("a.png", RED)])
        .with("R200", &[("b.png", BLUE)])
        .with("R300", &[("c.png", GREEN)]);
    let engine = memory_engine(&dir, dataset);

    let result = engine.search(&png(RED), 3)?;
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].similarity, 1.0);
    assert_eq!(result[2].similarity, 0.0);
    assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));
    Ok(())
}

#[rstest]
fn result_has_distinct_articles(dir: TempDir) -> Result<()> {
    let dataset = MemDataset::default()
        .with("R100", &[("a.png", RED), ("b.png", RED), ("c.png", DARK_RED)])
        .with("R200", &[("d.png", BLUE)]);
    let engine = memory_engine(&dir, dataset);

    let result = engine.search(&png(RED), 10)?;
    let ids = result.iter().map(|m| m.article_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, &["R100", "R200"]);
    Ok(())
}

#[rstest]
fn small_over_fetch_may_return_fewer_articles(dir: TempDir) -> Result<()> {
    let dataset = MemDataset::default()
        .with("R100", &[("a.png", RED), ("b.png", RED), ("c.png", RED)])
        .with("R200", &[("d.png", BLUE)]);
    let engine = EngineBuilder::new(DatasetDir::new(dir.path()))
        .dataset(dataset)
        .over_fetch(1)
        .open();

    // 只取回 max(1, 2) = 2 个近邻，都属于 R100
    let result = engine.search(&png(RED), 2)?;
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].article_id, "R100");
    Ok(())
}

#[rstest]
fn corrupted_upload_is_rejected(dir: TempDir) {
    let engine = memory_engine(&dir, MemDataset::default().with("R100", &[("a.png", RED)]));
    let result = engine.search(b"not an image", 3);
    assert!(matches!(result, Err(Error::ImageDecode { .. })));
}

#[rstest]
fn empty_dataset(dir: TempDir) {
    let engine = memory_engine(&dir, MemDataset::default());
    assert!(matches!(engine.search(&png(RED), 3), Err(Error::EmptyDataset)));
    assert!(engine.stats().is_none());
}

#[rstest]
fn dimension_mismatch(dir: TempDir) {
    let engine = memory_engine(&dir, MemDataset::default().with("R100", &[("a.png", RED)]));
    let result = engine.search_embedding(&[0.5; 3], 3);
    assert!(matches!(result, Err(Error::DimensionMismatch { expected: 256, actual: 3 })));
}

#[rstest]
fn get_urls_falls_back_to_sentinel(dir: TempDir) -> Result<()> {
    let engine = memory_engine(&dir, MemDataset::default());
    engine.metadata().add(MetadataEntry::new("R100", "https://r/100", "https://k/100"))?;

    let urls = engine.get_urls("R100");
    assert_eq!(urls.url_roulette, "https://r/100");
    assert_eq!(urls.url_kit, "https://k/100");

    let urls = engine.get_urls("R999");
    assert_eq!(urls.url_roulette, NOT_FOUND);
    assert_eq!(urls.url_kit, NOT_FOUND);
    Ok(())
}

#[rstest]
fn num_results_follows_settings(dir: TempDir) -> Result<()> {
    let engine = memory_engine(&dir, MemDataset::default());
    assert_eq!(engine.num_results(), 3);
    engine.settings().set_num_results(5)?;
    assert_eq!(engine.num_results(), 5);
    Ok(())
}

#[rstest]
fn rebuild_flag_is_one_shot(dir: TempDir) -> Result<()> {
    let (engine, dataset) = fs_engine(&dir)?;
    assert_eq!(engine.search(&png(GREEN), 10)?.len(), 2);

    // 数据集变化后，没有重建请求时继续使用旧索引
    dataset.add_image("R300", "d.png", &png(GREEN))?;
    assert_eq!(engine.search(&png(GREEN), 10)?.len(), 2);

    engine.settings().request_rebuild()?;
    let result = engine.search(&png(GREEN), 10)?;
    assert_eq!(result.len(), 3);
    assert_eq!(result[0].article_id, "R300");
    assert!(!engine.settings().load().rebuild_index);

    assert!(!engine.refresh()?);
    Ok(())
}

#[rstest]
fn failed_trigger_rebuild_discards_index(dir: TempDir) -> Result<()> {
    let (engine, dataset) = fs_engine(&dir)?;
    engine.ensure_index()?;

    dataset.delete_article("R100")?;
    dataset.delete_article("R200")?;
    engine.settings().request_rebuild()?;

    assert!(matches!(engine.search(&png(RED), 3), Err(Error::EmptyDataset)));
    assert!(!engine.settings().load().rebuild_index);
    assert!(engine.stats().is_none());

    // 重新添加图片后，下一次搜索会重新构建
    dataset.add_image("R400", "e.png", &png(RED))?;
    let result = engine.search(&png(RED), 3)?;
    assert_eq!(result[0].article_id, "R400");
    Ok(())
}

#[rstest]
fn failed_explicit_rebuild_keeps_index(dir: TempDir) -> Result<()> {
    let (engine, dataset) = fs_engine(&dir)?;
    let summary = engine.rebuild()?;
    assert_eq!(summary.stats.images, 3);
    assert!(summary.warnings.is_empty());

    dataset.delete_article("R100")?;
    dataset.delete_article("R200")?;
    assert!(matches!(engine.rebuild(), Err(Error::EmptyDataset)));
    assert_eq!(engine.stats().unwrap().images, 3);
    Ok(())
}

#[rstest]
fn rebuild_reports_unreadable_images(dir: TempDir) -> Result<()> {
    let (engine, _) = fs_engine(&dir)?;
    std::fs::write(dir.path().join("R200").join("broken.jpg"), b"garbage")?;

    let summary = engine.rebuild()?;
    assert_eq!(summary.stats.images, 3);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(summary.warnings[0].image_name.as_deref(), Some("broken.jpg"));
    Ok(())
}

#[rstest]
#[case::explicit(false)]
#[case::triggered(true)]
fn search_uses_old_index_during_rebuild(dir: TempDir, #[case] triggered: bool) -> Result<()> {
    let embedder = SlowEmbedder::default();
    let (slow, started) = (embedder.slow.clone(), embedder.started.clone());
    let dataset = MemDataset::default()
        .with("R100", &[("a.png", RED), ("b.png", DARK_RED)])
        .with("R200", &[("c.png", BLUE)]);
    let engine = Arc::new(
        EngineBuilder::new(DatasetDir::new(dir.path())).dataset(dataset).embedder(embedder).open(),
    );
    engine.ensure_index()?;

    slow.store(true, Ordering::SeqCst);
    if triggered {
        engine.settings().request_rebuild()?;
    }
    let builder = {
        let engine = engine.clone();
        thread::spawn(move || match triggered {
            true => engine.refresh().map(|rebuilt| assert!(rebuilt)),
            false => engine.rebuild().map(|_| ()),
        })
    };

    let deadline = Instant::now() + Duration::from_secs(5);
    while !started.load(Ordering::SeqCst) {
        assert!(Instant::now() < deadline, "rebuild did not start");
        thread::sleep(Duration::from_millis(10));
    }

    let start = Instant::now();
    let query = RED.map(|c| c as f32 / 255.);
    let result = engine.search_embedding(&query, 1)?;
    let elapsed = start.elapsed();

    assert!(!builder.is_finished(), "search waited for the rebuild");
    assert!(elapsed < Duration::from_millis(400), "search took {elapsed:?}");
    assert_eq!(result[0].article_id, "R100");
    assert_eq!(result[0].distance, 0.0);

    builder.join().unwrap()?;
    assert_eq!(engine.stats().unwrap().images, 3);
    Ok(())
}
