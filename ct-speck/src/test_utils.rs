//! 测试用的合成数据与脚本化检测器.

use std::sync::Once;

use ndarray::Array3;

use crate::data::{Point, ScanSlice, Spacing, Volume};
use crate::landmark::{ClockPosition, MaximaFinder, TokenShape};

/// 合成体模的背景强度.
pub const BACKGROUND: f32 = 100.0;

/// 合成体模: 7 层, 每层 240 × 360, 分辨率 0.5 mm × 0.5 mm × 10 mm.
pub const SHAPE: (usize, usize, usize) = (7, 240, 360);

/// 合成体模中强度最高的切片索引, 即第 4 层.
pub const PEAK_SLICE: usize = 3;

/// 标记组窗口左上角在原始切片上的位置 `(x, y)`: 象限起点 (240, 120) 加上组窗口起点 (10, 8).
const GROUP_ORIGIN: (usize, usize) = (250, 128);

/// 象限坐标系下的两条材料边缘.
const EDGES: (usize, usize) = (100, 60);

/// 各标记在标记组窗口内的像素位置 `(x, y)`, 按 [`ClockPosition::ALL`] 顺序.
const MARKERS: [(usize, usize); 6] = [(20, 21), (20, 4), (32, 10), (10, 31), (30, 36), (8, 20)];

/// 只初始化一次日志.
pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = simple_logger::SimpleLogger::new()
            .with_level(log::LevelFilter::Debug)
            .init();
    });
}

/// 各向同性的平面分辨率.
pub fn spacing(mm: f64, z_mm: f64) -> Spacing {
    Spacing::new(mm, mm, z_mm).unwrap()
}

/// 标记在标记组窗口内的位置.
pub fn marker_point(pos: ClockPosition) -> Point {
    let (x, y) = MARKERS[pos.index()];
    Point::new(x as f64, y as f64)
}

/// 标记在第 `z` 层的强度. 在 [`PEAK_SLICE`] 处最高, 向两侧每层衰减 10%.
pub fn marker_intensity(pos: ClockPosition, z: usize) -> f32 {
    let k = pos.index() as f32;
    let dz = z.abs_diff(PEAK_SLICE) as f32;
    1000.0 * (1.0 + k / 10.0) * (1.0 - 0.1 * dz)
}

/// 构建合成体模.
///
/// 背景为 [`BACKGROUND`], 左侧 20 列为空气. 象限内有一暗列和一暗行作为材料边缘,
/// 标记组窗口内有六个单像素标记. `upside_down` 为 `true` 时整体旋转 180°.
pub fn phantom(upside_down: bool) -> Volume {
    let (len_z, height, width) = SHAPE;
    let (ex, ey) = (240 + EDGES.0, 120 + EDGES.1);
    let mut data = Array3::from_shape_fn(SHAPE, |(_, h, w)| {
        if w < 20 || w == ex || h == ey {
            0.0
        } else {
            BACKGROUND
        }
    });
    for z in 0..len_z {
        for pos in ClockPosition::ALL {
            let (x, y) = MARKERS[pos.index()];
            data[(z, GROUP_ORIGIN.1 + y, GROUP_ORIGIN.0 + x)] = marker_intensity(pos, z);
        }
    }
    if upside_down {
        data = Array3::from_shape_fn(SHAPE, |(z, h, w)| {
            data[(z, height - 1 - h, width - 1 - w)]
        });
    }
    Volume::from_array(data, spacing(0.5, 10.0))
}

/// 以 `shape` 排布输出标记组内六个标记的记号.
pub fn marker_tokens(shape: TokenShape) -> Vec<String> {
    format_tokens(shape, &MARKERS)
}

/// 按形状格式化点列.
pub fn format_tokens(shape: TokenShape, points: &[(usize, usize)]) -> Vec<String> {
    let mut out = Vec::new();
    if shape.has_header() {
        out.extend(["X".to_string(), "Y".to_string()]);
    }
    for (i, (x, y)) in points.iter().enumerate() {
        if shape.has_index() {
            out.push((i + 1).to_string());
        }
        out.push(x.to_string());
        out.push(y.to_string());
    }
    out
}

/// 按预设脚本返回记号的检测器, 并记录每次调用所用的阈值.
///
/// 脚本用尽后重复最后一条; 设置为循环时从头开始.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFinder {
    script: Vec<Vec<String>>,
    cycle: bool,
    calls: Vec<f64>,
}

impl ScriptedFinder {
    /// 以脚本构建.
    pub fn new(script: Vec<Vec<String>>) -> Self {
        Self {
            script,
            cycle: false,
            calls: Vec::new(),
        }
    }

    /// 前 `k` 次给出过多的点, 之后以 `shape` 给出恰好六个点.
    pub fn exact_after(k: usize, shape: TokenShape) -> Self {
        let mut script = vec![Self::plain(k + 7); k];
        script.push(marker_tokens(shape));
        Self::new(script)
    }

    /// 循环使用脚本.
    pub fn cycling(mut self) -> Self {
        self.cycle = true;
        self
    }

    /// 不带表头和行号的 `n` 个点.
    pub fn plain(n: usize) -> Vec<String> {
        let points: Vec<_> = (0..n).map(|i| (3 * i + 1, 5 * i + 2)).collect();
        format_tokens(TokenShape::Plain, &points)
    }

    /// 历次调用所用的阈值.
    pub fn calls(&self) -> Vec<f64> {
        self.calls.clone()
    }
}

impl MaximaFinder for ScriptedFinder {
    fn find_maxima(&mut self, _slice: &ScanSlice<'_>, prominence: f64) -> Vec<String> {
        let n = self.calls.len();
        self.calls.push(prominence);
        let i = if self.cycle {
            n % self.script.len().max(1)
        } else {
            n.min(self.script.len().saturating_sub(1))
        };
        self.script.get(i).cloned().unwrap_or_default()
    }
}
