//! 通用常量.
//!
//! 长度类常量均以毫米为单位, 运行时按照体素分辨率换算为像素.

/// 单通道/三通道颜色.
pub mod color {
    /// 单通道黑色.
    pub const BLACK: u8 = 0b_0000_0000;

    /// 叠加层中标记区域的轮廓颜色 (RGB).
    pub const MARKER_RGB: [u8; 3] = [255, 64, 64];

    /// 叠加层中背景区域的轮廓颜色 (RGB).
    pub const BACKGROUND_RGB: [u8; 3] = [64, 224, 64];
}

/// 体模上标记的个数. 该值固定, 不支持其它布局.
pub const LANDMARK_COUNT: usize = 6;

/// 多切片统计中, 焦平面两侧各取的切片数.
pub const DEFAULT_HALF_WINDOW: usize = 3;

/// 方向检查: 边缘条带的平均值低于该值时, 认为实体材料缺失 (体模被倒置).
pub const EMPTY_SPACE_THRESHOLD: f64 = 50.0;

/// 方向检查: 右侧边缘条带的宽度 (像素).
pub const EDGE_STRIP_WIDTH: usize = 5;

/// 边缘定位: 预期焦平面到扫描起点的物理深度.
pub const FOCUS_DEPTH_MM: f64 = 34.0;

/// 边缘定位: 剖面线在远端提前停止的像素数, 以避开零填充和错位伪影.
pub const PROFILE_MARGIN: usize = 10;

/// 标记组窗口的边长.
pub const GROUP_SIZE_MM: f64 = 20.0;

/// 标记组窗口左上角相对于水平方向边缘的偏移.
pub const GROUP_OFFSET_X_MM: f64 = 45.0;

/// 标记组窗口左上角相对于垂直方向边缘的偏移.
pub const GROUP_OFFSET_Y_MM: f64 = 26.0;

/// 局部极大值检测的初始显著度 (prominence) 阈值.
pub const INITIAL_PROMINENCE: f64 = 150.0;

/// 每次调整显著度阈值的步长.
pub const PROMINENCE_STEP: f64 = 25.0;

/// 自适应阈值搜索的最大尝试次数.
pub const MAX_THRESHOLD_ITERATIONS: u32 = 50;

/// 标记区域半径.
pub const MARKER_RADIUS_MM: f64 = 1.25;

/// 背景采样点相对于标记坐标最小值的偏移.
pub const BACKGROUND_OFFSET_MM: f64 = 0.5;

/// 元数据标签: 像素间距, 两个值以反斜杠分隔 (水平在前).
pub const TAG_PIXEL_SPACING: &str = "0028,0030";

/// 元数据标签: 层厚.
pub const TAG_SLICE_THICKNESS: &str = "0018,0050";
