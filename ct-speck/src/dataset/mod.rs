//! 扫描文件的默认位置.

use std::env;
use std::path::{Path, PathBuf};

/// 指定体模扫描路径的环境变量.
pub const PHANTOM_ENV: &str = "SPECK_PHANTOM";

/// 默认的体模扫描文件名, 位于 `{用户主目录}/dataset` 下.
pub const PHANTOM_FILE: &str = "phantom.nii.gz";

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 获取体模扫描路径.
///
/// 1. 若环境变量 `$SPECK_PHANTOM` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/phantom.nii.gz`;
/// 3. 无法确定用户主目录时返回 `None`.
pub fn phantom_path_from_env_or_home() -> Option<PathBuf> {
    match env::var(PHANTOM_ENV) {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => home_dataset_dir_with([PHANTOM_FILE]),
    }
}
