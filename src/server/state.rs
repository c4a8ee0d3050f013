use std::sync::Arc;

use crate::Engine;

/// 应用状态
pub struct AppState {
    /// 搜索引擎
    pub engine: Engine,
    /// 命令行指定的默认结果数量，优先于 app_config.json
    pub count: Option<usize>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(engine: Engine, count: Option<usize>) -> Arc<Self> {
        Arc::new(AppState { engine, count })
    }

    /// 请求未指定数量时使用的结果数量
    pub fn default_count(&self) -> usize {
        self.count.unwrap_or_else(|| self.engine.num_results())
    }
}
