//! 流水线参数.

use crate::consts::*;
use crate::error::{SpeckError, SpeckResult};

/// 流水线的全部可调参数. 长度类参数以毫米为单位.
///
/// 默认值即体模的标准布局, 一般情况下无需修改.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeckConfig {
    /// 焦平面两侧各统计的切片数.
    pub half_window: usize,

    /// 方向检查的空区阈值.
    pub empty_space_threshold: f64,

    /// 方向检查的边缘条带宽度 (像素).
    pub edge_strip_width: usize,

    /// 边缘定位所用切片的物理深度.
    pub focus_depth_mm: f64,

    /// 剖面线远端的留白 (像素).
    pub profile_margin: usize,

    /// 标记组窗口边长.
    pub group_size_mm: f64,

    /// 标记组窗口相对于水平边缘的偏移.
    pub group_offset_x_mm: f64,

    /// 标记组窗口相对于垂直边缘的偏移.
    pub group_offset_y_mm: f64,

    /// 初始显著度阈值.
    pub initial_prominence: f64,

    /// 阈值调整步长.
    pub prominence_step: f64,

    /// 阈值搜索的最大尝试次数.
    pub max_iterations: u32,

    /// 标记区域半径.
    pub marker_radius_mm: f64,

    /// 背景采样点的偏移.
    pub background_offset_mm: f64,
}

impl Default for SpeckConfig {
    fn default() -> Self {
        Self {
            half_window: DEFAULT_HALF_WINDOW,
            empty_space_threshold: EMPTY_SPACE_THRESHOLD,
            edge_strip_width: EDGE_STRIP_WIDTH,
            focus_depth_mm: FOCUS_DEPTH_MM,
            profile_margin: PROFILE_MARGIN,
            group_size_mm: GROUP_SIZE_MM,
            group_offset_x_mm: GROUP_OFFSET_X_MM,
            group_offset_y_mm: GROUP_OFFSET_Y_MM,
            initial_prominence: INITIAL_PROMINENCE,
            prominence_step: PROMINENCE_STEP,
            max_iterations: MAX_THRESHOLD_ITERATIONS,
            marker_radius_mm: MARKER_RADIUS_MM,
            background_offset_mm: BACKGROUND_OFFSET_MM,
        }
    }
}

impl SpeckConfig {
    /// 检查参数. 返回第一个不合法参数的名称.
    pub fn validate(&self) -> SpeckResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let checks: [(&'static str, bool); 10] = [
            ("edge_strip_width", self.edge_strip_width > 0),
            ("empty_space_threshold", self.empty_space_threshold.is_finite()),
            ("focus_depth_mm", self.focus_depth_mm.is_finite() && self.focus_depth_mm >= 0.0),
            ("group_size_mm", positive(self.group_size_mm)),
            (
                "group_offset_mm",
                self.group_offset_x_mm.is_finite() && self.group_offset_y_mm.is_finite(),
            ),
            (
                "initial_prominence",
                self.initial_prominence.is_finite() && self.initial_prominence >= 0.0,
            ),
            ("prominence_step", positive(self.prominence_step)),
            ("max_iterations", self.max_iterations > 0),
            ("marker_radius_mm", positive(self.marker_radius_mm)),
            (
                "background_offset_mm",
                self.background_offset_mm.is_finite() && self.background_offset_mm >= 0.0,
            ),
        ];
        match checks.into_iter().find(|(_, ok)| !ok) {
            Some((name, _)) => Err(SpeckError::InvalidConfig(name)),
            None => Ok(()),
        }
    }

    /// 覆盖半窗口, 便于链式构建.
    #[inline]
    pub fn with_half_window(mut self, half_window: usize) -> Self {
        self.half_window = half_window;
        self
    }
}
