use std::sync::LazyLock;

use prometheus::*;

static METRIC_SEARCH_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("luggage_search_count", "count of the image to search").unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("luggage_search_duration", "duration of the per-image search in seconds")
        .unwrap()
});

static METRIC_SEARCH_BEST_DISTANCE: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "luggage_search_best_distance",
        "distance of the best matching article",
        (1..=20).map(|x| x as f64 * 0.1).collect()
    )
    .unwrap()
});

static METRIC_BUILD_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!("luggage_build_count", "count of index builds", &["result"]).unwrap()
});

static METRIC_BUILD_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "luggage_build_duration",
        "duration of the index build in seconds",
        exponential_buckets(0.5, 2., 12).unwrap()
    )
    .unwrap()
});

static METRIC_INDEX_SIZE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    register_int_gauge_vec!("luggage_index_size", "size of the live index", &["kind"]).unwrap()
});

/// 记录一次搜索
pub fn inc_search(duration: f32, best_distance: Option<f32>) {
    METRIC_SEARCH_COUNT.inc();
    METRIC_SEARCH_DURATION.observe(duration as f64);
    if let Some(d) = best_distance {
        METRIC_SEARCH_BEST_DISTANCE.observe(d as f64);
    }
}

/// 记录一次索引构建
pub fn inc_build(ok: bool, duration: f32) {
    let result = if ok { "ok" } else { "error" };
    METRIC_BUILD_COUNT.with_label_values(&[result]).inc();
    METRIC_BUILD_DURATION.observe(duration as f64);
}

/// 更新当前索引的文章和图片数量
pub fn set_index_size(articles: usize, images: usize) {
    METRIC_INDEX_SIZE.with_label_values(&["articles"]).set(articles as i64);
    METRIC_INDEX_SIZE.with_label_values(&["images"]).set(images as i64);
}

/// 以 prometheus 文本格式导出所有指标
pub fn gather() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&prometheus::gather())?)
}
