use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{info, warn};

use crate::catalog::CatalogIndex;
use crate::error::Result;
use crate::metrics;
use crate::store::{AppConfig, SettingsStore};

/// 重建标志的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    Clean,
    RebuildRequested,
}

impl From<&AppConfig> for RebuildState {
    fn from(config: &AppConfig) -> Self {
        match config.rebuild_index {
            true => Self::RebuildRequested,
            false => Self::Clean,
        }
    }
}

impl RebuildState {
    /// 读取持久化的重建标志
    pub fn load(settings: &SettingsStore) -> Self {
        Self::from(&settings.load())
    }
}

/// 当前使用中的索引
///
/// 索引和标签总是作为一个 `Arc<CatalogIndex>` 整体替换。构建期间读取方继续使用旧索引，
/// 构建由 `build_lock` 串行化。
#[derive(Debug, Default)]
pub struct LiveIndex {
    slot: RwLock<Option<Arc<CatalogIndex>>>,
    build_lock: Mutex<()>,
}

impl LiveIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前索引，尚未构建时为 None
    pub fn current(&self) -> Option<Arc<CatalogIndex>> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// 替换索引，返回旧索引
    pub fn swap(&self, catalog: CatalogIndex) -> Option<Arc<CatalogIndex>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(Arc::new(catalog))
    }

    /// 丢弃当前索引
    pub fn discard(&self) -> Option<Arc<CatalogIndex>> {
        let old = self.slot.write().unwrap_or_else(PoisonError::into_inner).take();
        metrics::set_index_size(0, 0);
        old
    }

    /// 返回当前索引，没有索引时先构建
    pub fn get_or_build<F>(&self, build: F) -> Result<Arc<CatalogIndex>>
    where
        F: FnOnce() -> Result<CatalogIndex>,
    {
        if let Some(catalog) = self.current() {
            return Ok(catalog);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // 等待锁期间可能已经有其他调用方构建完成
        if let Some(catalog) = self.current() {
            return Ok(catalog);
        }
        let catalog = Arc::new(build()?);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(catalog.clone());
        Ok(catalog)
    }

    /// 无条件重建，失败时保留旧索引
    pub fn rebuild<F>(&self, build: F) -> Result<Arc<CatalogIndex>>
    where
        F: FnOnce() -> Result<CatalogIndex>,
    {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let catalog = Arc::new(build()?);
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(catalog.clone());
        Ok(catalog)
    }

    /// 检查并消费重建标志
    ///
    /// 标志会在构建开始前写回 `false`，无论构建成功与否都不会再次触发。
    /// 构建失败时不保留任何索引，错误返回给调用方。没有重建请求时返回 `Ok(false)`，
    /// 此时不会等待正在进行的构建。
    pub fn consume_rebuild<F>(&self, settings: &SettingsStore, build: F) -> Result<bool>
    where
        F: FnOnce() -> Result<CatalogIndex>,
    {
        if RebuildState::load(settings) == RebuildState::Clean {
            return Ok(false);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // 等待锁期间标志可能已被其他调用方消费
        if RebuildState::load(settings) == RebuildState::Clean {
            return Ok(false);
        }

        settings.update(|config| config.rebuild_index = false)?;
        info!("收到重建索引请求，重建标志已清除");

        match build() {
            Ok(catalog) => {
                *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(catalog));
                Ok(true)
            }
            Err(e) => {
                warn!("重建索引失败，已丢弃旧索引: {}", e);
                self.discard();
                Err(e)
            }
        }
    }
}
