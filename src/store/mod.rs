//! 数据集目录下的 JSON 文件
//!
//! 读取时文件不存在或内容损坏都会退回默认值，写入失败则必须返回错误。

mod metadata;
mod settings;

use std::io;
use std::path::Path;

use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use self::metadata::*;
pub use self::settings::*;
use crate::error::{Error, Result};

/// 读取 JSON 文件，失败时返回 None 并记录警告
fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("无法读取 {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("无法解析 {}: {}", path.display(), e);
            None
        }
    }
}

/// 先写入临时文件再重命名，避免写到一半时留下损坏的文件
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let persistence = |source| Error::Persistence { path: path.to_path_buf(), source };

    let data = serde_json::to_string_pretty(value).map_err(|e| persistence(io::Error::other(e)))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(persistence)?;
    }
    let mut tmp_file = path.to_path_buf();
    tmp_file.set_extension("json.tmp");
    std::fs::write(&tmp_file, data).map_err(persistence)?;
    std::fs::rename(&tmp_file, path).map_err(persistence)?;
    Ok(())
}
