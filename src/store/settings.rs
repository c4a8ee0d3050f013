use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::error::{Error, Result};

/// 允许设置的结果数量范围
pub const NUM_RESULTS_RANGE: std::ops::RangeInclusive<usize> = 1..=10;

/// 持久化的应用设置，对应 `app_config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 每次搜索返回的文章数量
    pub num_results: usize,
    /// 一次性的重建索引请求，被消费后立即清除
    pub rebuild_index: bool,
    /// 管理员密码，为空表示不设密码
    pub admin_password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { num_results: 3, rebuild_index: false, admin_password: String::new() }
    }
}

/// `app_config.json` 的读写
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取设置，文件不存在或无法解析时返回默认值
    pub fn load(&self) -> AppConfig {
        read_json(&self.path).unwrap_or_default()
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        write_json(&self.path, config)
    }

    /// 读取、修改并保存设置
    pub fn update<F: FnOnce(&mut AppConfig)>(&self, f: F) -> Result<AppConfig> {
        let mut config = self.load();
        f(&mut config);
        self.save(&config)?;
        Ok(config)
    }

    /// 请求在下一次检查时重建索引
    pub fn request_rebuild(&self) -> Result<()> {
        self.update(|config| config.rebuild_index = true)?;
        info!("已请求重建索引");
        Ok(())
    }

    pub fn set_num_results(&self, num_results: usize) -> Result<()> {
        if !NUM_RESULTS_RANGE.contains(&num_results) {
            return Err(Error::InvalidArgument(format!(
                "结果数量必须在 {} 到 {} 之间",
                NUM_RESULTS_RANGE.start(),
                NUM_RESULTS_RANGE.end()
            )));
        }
        self.update(|config| config.num_results = num_results)?;
        Ok(())
    }

    pub fn set_password(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(Error::InvalidArgument("密码不能为空".to_owned()));
        }
        self.update(|config| config.admin_password = password.to_owned())?;
        Ok(())
    }

    pub fn clear_password(&self) -> Result<()> {
        self.update(|config| config.admin_password.clear())?;
        Ok(())
    }

    /// 检查管理员密码，未设置密码时总是通过
    pub fn check_password(&self, password: &str) -> bool {
        let config = self.load();
        config.admin_password.is_empty() || config.admin_password == password
    }
}
