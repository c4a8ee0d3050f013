use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::error::{Error, Result};
use crate::index::Embedding;

/// 特征提取器
///
/// 对同一张图片和同一组参数，结果必须是确定的。提取失败需要返回 `Error::Embedding`，
/// 不能用全零向量代替。
pub trait Embedder: Send + Sync {
    /// 输出向量的维数
    fn dimensions(&self) -> usize;

    fn embed(&self, image: &DynamicImage) -> Result<Embedding>;
}

/// 从内存中解码图片，自动识别格式
pub fn decode_image(name: &str, bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| Error::ImageDecode { name: name.to_owned(), source: e.into() })?;
    reader.decode().map_err(|e| Error::ImageDecode { name: name.to_owned(), source: e })
}

/// 读取并解码图片文件
pub fn open_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let path = path.as_ref();
    image::open(path).map_err(|e| Error::ImageDecode { name: path.display().to_string(), source: e })
}

/// 基于缩略图和颜色直方图的特征提取器
///
/// 向量由两部分组成：
/// - `thumbnail_size`² 个像素的 RGB 缩略图，描述大致形状和布局
/// - `bins`³ 个桶的 RGB 颜色直方图，描述整体配色
///
/// 最终结果经过 L2 归一化，因此平方 L2 距离落在 `[0, 4]` 之间。
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailEmbedder {
    thumbnail_size: u32,
    bins: u32,
}

impl Default for ThumbnailEmbedder {
    fn default() -> Self {
        Self { thumbnail_size: 8, bins: 4 }
    }
}

/// 缩略图边长的取值范围
pub const THUMBNAIL_SIZE_RANGE: std::ops::RangeInclusive<u32> = 1..=64;

/// 直方图每个通道桶数的取值范围
pub const BINS_RANGE: std::ops::RangeInclusive<u32> = 1..=16;

impl ThumbnailEmbedder {
    pub fn new(thumbnail_size: u32, bins: u32) -> Result<Self> {
        if !THUMBNAIL_SIZE_RANGE.contains(&thumbnail_size) {
            return Err(Error::InvalidArgument(format!(
                "thumbnail_size 必须在 {} 到 {} 之间",
                THUMBNAIL_SIZE_RANGE.start(),
                THUMBNAIL_SIZE_RANGE.end()
            )));
        }
        if !BINS_RANGE.contains(&bins) {
            return Err(Error::InvalidArgument(format!(
                "bins 必须在 {} 到 {} 之间",
                BINS_RANGE.start(),
                BINS_RANGE.end()
            )));
        }
        Ok(Self { thumbnail_size, bins })
    }
}

impl Embedder for ThumbnailEmbedder {
    fn dimensions(&self) -> usize {
        let size = self.thumbnail_size as usize;
        size * size * 3 + (self.bins as usize).pow(3)
    }

    fn embed(&self, image: &DynamicImage) -> Result<Embedding> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::Embedding("图片尺寸为 0".to_owned()));
        }
        let rgb = image.to_rgb8();
        let mut v = Vec::with_capacity(self.dimensions());

        let thumbnail = image::imageops::resize(
            &rgb,
            self.thumbnail_size,
            self.thumbnail_size,
            FilterType::Triangle,
        );
        v.extend(thumbnail.pixels().flat_map(|p| p.0).map(|c| c as f32 / 255.));

        let bins = self.bins as usize;
        let mut histogram = vec![0f32; bins.pow(3)];
        for p in rgb.pixels() {
            let [r, g, b] = p.0.map(|c| c as usize * bins / 256);
            histogram[(r * bins + g) * bins + b] += 1.;
        }
        let total = (rgb.width() as u64 * rgb.height() as u64) as f32;
        v.extend(histogram.into_iter().map(|n| n / total));

        normalize(&mut v);
        Ok(v)
    }
}

/// L2 归一化，零向量保持不变
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0. {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
