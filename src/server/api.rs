use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_auth::AuthBearer;
use axum_typed_multipart::TypedMultipart;
use log::info;
use tokio::task::block_in_place;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::error::Error;
use crate::metrics;

/// 搜索一张图片
#[utoipa::path(
    post,
    path = "/search",
    request_body(content = SearchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = SearchResponse),
        (status = 400, description = "图片无法解码"),
        (status = 503, description = "数据集中没有可用的图片"),
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let count = data.count.unwrap_or_else(|| state.default_count());
    if count == 0 {
        return Err(Error::InvalidArgument("count 必须大于 0".to_owned()).into());
    }

    let start = Instant::now();

    info!("正在搜索上传图片");

    let engine = &state.engine;
    let result = block_in_place(|| engine.search(&data.file, count))?;
    let result = result
        .into_iter()
        .map(|article| {
            let urls = engine.get_urls(&article.article_id);
            SearchHit::new(article, urls)
        })
        .collect();

    Ok(Json(SearchResponse { time: start.elapsed().as_millis() as u64, result }))
}

/// 获取文章的购买和维修链接
#[utoipa::path(
    get,
    path = "/articles/{id}/urls",
    params(("id" = String, Path, description = "文章 ID")),
    responses(
        (status = 200, body = UrlsResponse),
    )
)]
pub async fn urls_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<UrlsResponse> {
    Json(state.engine.get_urls(&id).into())
}

/// 获取当前索引的统计信息
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, body = StatsResponse),
    )
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(state.engine.stats().into())
}

/// 请求重建索引并立即执行
///
/// 设置了管理员密码时需要以 Bearer token 的形式提供密码。
#[utoipa::path(
    post,
    path = "/rebuild",
    responses(
        (status = 200, body = StatsResponse),
        (status = 401, description = "密码错误"),
        (status = 503, description = "数据集中没有可用的图片"),
    )
)]
pub async fn rebuild_handler(
    State(state): State<Arc<AppState>>,
    auth: std::result::Result<AuthBearer, (StatusCode, &'static str)>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let token = auth.map(|AuthBearer(token)| token).unwrap_or_default();
    if !state.engine.settings().check_password(&token) {
        return Err((StatusCode::UNAUTHORIZED, "密码错误".to_owned()));
    }

    let engine = &state.engine;
    match block_in_place(|| engine.request_rebuild()) {
        Ok(stats) => {
            info!("索引重建完成: {} 篇文章, {} 张图片", stats.articles, stats.images);
            Ok(Json(Some(stats).into()))
        }
        Err(e) => {
            let status = match e {
                Error::EmptyDataset => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, e.to_string()))
        }
    }
}

/// 以 prometheus 文本格式导出指标
#[utoipa::path(get, path = "/metrics")]
pub async fn metrics_handler() -> Result<String> {
    Ok(metrics::gather()?)
}
