//! 运行时错误.

use std::fmt;

/// 流水线阶段. 用于在致命错误中指明出错位置.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    /// 加载体数据与元数据.
    Load,

    /// 方向检查.
    Orientation,

    /// 象限裁剪.
    RegionCrop,

    /// 边缘定位.
    EdgeLocate,

    /// 标记组裁剪.
    GroupCrop,

    /// 焦平面选取.
    Focus,

    /// 自适应标记搜索与排序.
    Landmarks,

    /// 多切片统计.
    Aggregate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Load => "load",
            Stage::Orientation => "orientation",
            Stage::RegionCrop => "region-crop",
            Stage::EdgeLocate => "edge-locate",
            Stage::GroupCrop => "group-crop",
            Stage::Focus => "focus",
            Stage::Landmarks => "landmarks",
            Stage::Aggregate => "aggregate",
        };
        f.write_str(s)
    }
}

/// 流水线运行时错误. 除自适应搜索的格式歧义 (在内部恢复) 之外, 所有错误都是致命的.
#[derive(Debug, thiserror::Error)]
pub enum SpeckError {
    /// 元数据标签缺失或无法解析.
    #[error("[{}] 元数据 `{tag}` 无效: {reason}", Stage::Load)]
    Metadata {
        /// 元数据标签.
        tag: &'static str,
        /// 具体原因.
        reason: String,
    },

    /// 读取 nifti 文件失败.
    #[error("[{}] 无法读取 nifti 文件: {0}", Stage::Load)]
    Nifti(#[from] nifti::NiftiError),

    /// 写出图像失败.
    #[error("无法写出图像: {0}")]
    Image(#[from] image::ImageError),

    /// 写出表格失败.
    #[error("无法写出表格: {0}")]
    Io(#[from] std::io::Error),

    /// 配置参数不合法.
    #[error("配置参数 `{0}` 不合法")]
    InvalidConfig(&'static str),

    /// 体数据过小, 无法执行某阶段.
    ///
    /// 第二个参数为当时的形状 `(z, h, w)`.
    #[error("[{0}] 体数据过小: {1:?}")]
    Degenerate(Stage, (usize, usize, usize)),

    /// 矩形超出体数据范围.
    #[error("[{stage}] 区域 {rect:?} 超出切片范围 (h = {height}, w = {width})")]
    OutOfBounds {
        /// 出错阶段.
        stage: Stage,
        /// 越界矩形 `(x, y, width, height)`, 可能为负.
        rect: (i64, i64, i64, i64),
        /// 切片高.
        height: usize,
        /// 切片宽.
        width: usize,
    },

    /// 由层厚推算出的切片超出体数据范围.
    #[error("[{}] 深度 {depth_mm} mm 对应第 {number} 层, 但体数据只有 {len} 层", Stage::EdgeLocate)]
    FocusDepthOutOfRange {
        /// 物理深度.
        depth_mm: f64,
        /// 推算出的切片序号 (从 1 开始).
        number: usize,
        /// 切片总数.
        len: usize,
    },

    /// 除第 1 层外没有可用切片.
    #[error("[{}] 没有可用切片 (共 {0} 层)", Stage::Focus)]
    NoUsableSlices(usize),

    /// 自适应阈值搜索未能收敛到恰好六个标记.
    #[error(
        "[{}] 无法收敛到六个标记: 尝试 {iterations} 次, 最终阈值 {threshold}, 最后一次 {last}",
        Stage::Landmarks
    )]
    NotConverged {
        /// 已尝试次数.
        iterations: u32,
        /// 最后使用的阈值.
        threshold: f64,
        /// 最后一次的分类描述.
        last: String,
    },

    /// 统计窗口越出体数据范围.
    #[error(
        "[{}] 焦平面 {focal} 的窗口 ±{half_window} 越出 0..{len}",
        Stage::Aggregate
    )]
    WindowOutOfRange {
        /// 焦平面索引, 从 0 开始.
        focal: usize,
        /// 半窗口.
        half_window: usize,
        /// 切片总数.
        len: usize,
    },

    /// 统计区域与切片没有交集.
    #[error("[{0}] 区域 {1} 不含任何像素")]
    EmptyRegion(Stage, String),
}

/// 流水线运行时结果.
pub type SpeckResult<T> = Result<T, SpeckError>;
