use axum::body::Bytes;
use axum_typed_multipart::TryFromMultipart;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::{ArticleMatch, IndexStats};
use crate::store::ArticleUrls;

/// 搜索请求参数
#[derive(TryFromMultipart)]
pub struct SearchRequest {
    pub file: Bytes,
    pub count: Option<usize>,
}

/// 搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchForm {
    /// 上传的图片文件
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 返回的文章数量，不填则使用设置中的值
    pub count: Option<usize>,
}

/// 一篇匹配的文章及其链接
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHit {
    pub article_id: String,
    /// 平方 L2 距离，越小越相似
    pub distance: f32,
    /// 本次结果内归一化后的相似度，取值 0 到 1
    pub similarity: f32,
    pub url_roulette: String,
    pub url_kit: String,
}

impl SearchHit {
    pub fn new(article: ArticleMatch, urls: ArticleUrls) -> Self {
        Self {
            article_id: article.article_id,
            distance: article.distance,
            similarity: article.similarity,
            url_roulette: urls.url_roulette,
            url_kit: urls.url_kit,
        }
    }
}

/// 搜索响应
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 按距离升序排列的文章
    pub result: Vec<SearchHit>,
}

/// 文章链接，找不到时为 "Non trouvé"
#[derive(Debug, Serialize, ToSchema)]
pub struct UrlsResponse {
    pub url_roulette: String,
    pub url_kit: String,
}

impl From<ArticleUrls> for UrlsResponse {
    fn from(urls: ArticleUrls) -> Self {
        Self { url_roulette: urls.url_roulette, url_kit: urls.url_kit }
    }
}

/// 索引统计信息
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct StatsResponse {
    /// 索引是否已经构建
    pub loaded: bool,
    pub articles: usize,
    pub images: usize,
    pub dimensions: usize,
}

impl From<Option<IndexStats>> for StatsResponse {
    fn from(stats: Option<IndexStats>) -> Self {
        match stats {
            Some(stats) => Self {
                loaded: true,
                articles: stats.articles,
                images: stats.images,
                dimensions: stats.dimensions,
            },
            None => Self::default(),
        }
    }
}
