//! 将六个无序的标记点归位到表盘位置.

use std::fmt;
use std::ops::Index;

use crate::consts::LANDMARK_COUNT;
use crate::data::{Point, Spacing};

/// 标记在体模上的表盘位置.
///
/// 声明顺序即输出顺序: 中心, 12 点, 2 点, 5 点, 7 点, 10 点.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClockPosition {
    /// 中心.
    Center,
    /// 12 点.
    Twelve,
    /// 2 点.
    Two,
    /// 5 点.
    Five,
    /// 7 点.
    Seven,
    /// 10 点.
    Ten,
}

impl ClockPosition {
    /// 按输出顺序排列的全部位置.
    pub const ALL: [ClockPosition; LANDMARK_COUNT] = [
        ClockPosition::Center,
        ClockPosition::Twelve,
        ClockPosition::Two,
        ClockPosition::Five,
        ClockPosition::Seven,
        ClockPosition::Ten,
    ];

    /// 在输出顺序中的下标.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 表头中使用的短标签.
    pub const fn label(self) -> &'static str {
        match self {
            ClockPosition::Center => "center",
            ClockPosition::Twelve => "12",
            ClockPosition::Two => "2",
            ClockPosition::Five => "5",
            ClockPosition::Seven => "7",
            ClockPosition::Ten => "10",
        }
    }
}

impl fmt::Display for ClockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 归位后的标记点, 以及背景采样点.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Landmarks {
    markers: [Point; LANDMARK_COUNT],
    background: Point,
}

impl Index<ClockPosition> for Landmarks {
    type Output = Point;

    #[inline]
    fn index(&self, pos: ClockPosition) -> &Self::Output {
        &self.markers[pos.index()]
    }
}

impl Landmarks {
    /// 按 [`ClockPosition::ALL`] 顺序排列的标记点.
    #[inline]
    pub fn markers(&self) -> &[Point; LANDMARK_COUNT] {
        &self.markers
    }

    /// 背景采样点.
    #[inline]
    pub fn background(&self) -> Point {
        self.background
    }

    /// 以 `(位置, 点)` 的形式按输出顺序迭代.
    pub fn iter(&self) -> impl Iterator<Item = (ClockPosition, Point)> + '_ {
        ClockPosition::ALL.into_iter().zip(self.markers.iter().copied())
    }
}

/// 将检测器给出的六个点归位.
///
/// 先按 `y` 升序稳定排序, 名次 0 为 12 点, 名次 1 为 2 点, 名次 4 为 5 点, 名次 5 为 7 点;
/// 名次 2 与 3 中 `x` 较小者为 10 点, 另一个为中心 (`x` 相等时名次 2 为 10 点).
///
/// 背景点位于所有点的最小 `x` 左侧、最小 `y` 下方 `offset_mm` 处, 按各轴分辨率换算为像素.
pub fn canonicalize(
    points: &[Point; LANDMARK_COUNT],
    spacing: Spacing,
    offset_mm: f64,
) -> Landmarks {
    let mut ranked = *points;
    ranked.sort_by(|a, b| a.y.total_cmp(&b.y));

    let (ten, center) = if ranked[3].x < ranked[2].x {
        (ranked[3], ranked[2])
    } else {
        (ranked[2], ranked[3])
    };
    let markers = [center, ranked[0], ranked[1], ranked[4], ranked[5], ten];

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let background = Point::new(
        min_x - spacing.x_px(offset_mm),
        min_y + spacing.y_px(offset_mm),
    );
    log::debug!("center {}, background {}", center, background);

    Landmarks {
        markers,
        background,
    }
}
