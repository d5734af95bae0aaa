#![warn(missing_docs)]
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 对六点标记体模的 3D 扫描进行定位, 选取焦平面, 检测并归位六个标记,
//! 最后在焦平面附近的多层切片上测量各标记的最大强度与背景强度.
//!
//! 该 crate 只提供 `safe` 接口.
//!
//! # 流水线
//!
//! 1. 方向检查: 右下方条带为空气时, 将体数据旋转 180°.
//!   实现位于 `ct-speck/src/locate/orientation.rs`.
//! 2. 象限裁剪: 保留右下方的 `(w/3, h/3)` 区域.
//! 3. 边缘定位: 在 34 mm 深处的切片上, 以水平和垂直剖面的最小值确定两条材料边缘.
//! 4. 标记组裁剪: 以边缘为基准裁出 20 mm × 20 mm 的窗口.
//!   实现位于 `ct-speck/src/locate/*`.
//! 5. 焦平面选取: 最大强度最高的切片 (不考虑第 1 层).
//! 6. 标记检测: 按显著度检测局部极大值, 自适应调整阈值, 直到恰好检出六个点.
//!   实现位于 `ct-speck/src/landmark/*`.
//! 7. 归位: 按纵坐标排序, 得到中心和 12, 2, 5, 7, 10 点钟位置, 并生成背景采样点.
//! 8. 多切片统计: 焦平面两侧各 `nn` 层, 得到 `2nn + 1` 行测量结果.
//!   实现位于 `ct-speck/src/aggregate.rs`.
//!
//! 整条流水线由 [`pipeline::Pipeline`] 串联.
//!
//! # 注意
//!
//! 1. 坐标约定: 数组索引一律为 `(z, h, w)` / `(h, w)`, 几何点一律为 `(x, y)`.
//! 2. 所有长度参数以毫米为单位, 按体素分辨率换算为像素.
//! 3. 对于不合法的输入, 库函数返回 [`SpeckError`], 不会 panic.
//!   文档中明确标注会 panic 的索引函数除外.

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 3D 扫描基础数据结构.
pub mod data;

pub use data::{
    CtWindow, Ellipse, Line, MetadataSource, OwnedScanSlice, Overlay, OverlayKind, Point, Rect,
    Region, ScanSlice, ScanSliceMut, Spacing, Volume,
};

pub mod consts;

mod config;
pub use config::SpeckConfig;

mod error;
pub use error::{SpeckError, SpeckResult, Stage};

pub mod locate;

pub mod landmark;

pub mod aggregate;

pub mod dataset;

pub mod pipeline;
pub use pipeline::{Pipeline, SpeckReport};

pub mod prelude;

#[cfg(test)]
mod test_utils;
