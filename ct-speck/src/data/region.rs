//! 切片上的几何区域: 矩形, 椭圆和线段.
//!
//! 坐标约定为 `(x, y)`, 其中 `x` 为水平方向 (列, width), `y` 为垂直方向 (行, height).
//! 这与 [`crate::Idx2d`] 的 `(h, w)` 顺序相反, 转换时务必注意.

use std::fmt;

use crate::Idx2d;

/// 像素坐标系上的点. 坐标可以是小数, 像素 `(w, h)` 的中心即 `(w as f64, h as f64)`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// 水平坐标.
    pub x: f64,

    /// 垂直坐标.
    pub y: f64,
}

impl Point {
    /// 直接构建.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// 切片上的一个区域, 能够给出它所覆盖的所有像素.
pub trait Region {
    /// 以行优先顺序给出区域与 `(height, width)` 大小切片相交的所有像素索引 `(h, w)`.
    fn pixels(&self, shape: Idx2d) -> Vec<Idx2d>;
}

/// 轴对齐矩形, 左上角为 `(x, y)`. 左上角可以为负, 用于表达越界情况.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// 左上角水平坐标.
    pub x: i64,
    /// 左上角垂直坐标.
    pub y: i64,
    /// 宽.
    pub width: i64,
    /// 高.
    pub height: i64,
}

impl Rect {
    /// 直接构建.
    #[inline]
    pub const fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 是否为空矩形.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// 矩形是否完全位于 `(height, width)` 大小的切片之内 (且非空).
    pub fn fits_in(&self, (height, width): Idx2d) -> bool {
        !self.is_empty()
            && self.x >= 0
            && self.y >= 0
            && self.x + self.width <= width as i64
            && self.y + self.height <= height as i64
    }

    /// 与 `(height, width)` 大小的切片求交, 得到水平和垂直方向的索引范围.
    fn clip(&self, (height, width): Idx2d) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let clamp = |v: i64, hi: usize| v.clamp(0, hi as i64) as usize;
        let ws = clamp(self.x, width)..clamp(self.x + self.width.max(0), width);
        let hs = clamp(self.y, height)..clamp(self.y + self.height.max(0), height);
        (ws, hs)
    }

    /// 转换为 `(x, y, width, height)` 元组.
    #[inline]
    pub fn as_tuple(&self) -> (i64, i64, i64, i64) {
        (self.x, self.y, self.width, self.height)
    }
}

impl Region for Rect {
    fn pixels(&self, shape: Idx2d) -> Vec<Idx2d> {
        let (ws, hs) = self.clip(shape);
        hs.flat_map(|h| ws.clone().map(move |w| (h, w))).collect()
    }
}

/// 轴对齐椭圆, 中心为 `center`, 两个半轴分别为 `rx` (水平) 和 `ry` (垂直).
///
/// 像素 `(w, h)` 属于该椭圆, 当且仅当 `((w - cx) / rx)^2 + ((h - cy) / ry)^2 <= 1`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ellipse {
    /// 中心.
    pub center: Point,
    /// 水平半轴.
    pub rx: f64,
    /// 垂直半轴.
    pub ry: f64,
}

impl Ellipse {
    /// 直接构建. 半轴必须为正, 否则返回 `None`.
    pub fn new(center: Point, rx: f64, ry: f64) -> Option<Self> {
        (rx > 0.0 && ry > 0.0 && rx.is_finite() && ry.is_finite()).then_some(Self {
            center,
            rx,
            ry,
        })
    }

    /// 按比例放大两个半轴.
    #[inline]
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            center: self.center,
            rx: self.rx * k,
            ry: self.ry * k,
        }
    }

    /// 判断像素 `(h, w)` 是否属于该椭圆.
    #[inline]
    pub fn contains(&self, (h, w): Idx2d) -> bool {
        let dx = (w as f64 - self.center.x) / self.rx;
        let dy = (h as f64 - self.center.y) / self.ry;
        dx * dx + dy * dy <= 1.0
    }

    /// 外接矩形 (按整数像素向外取整).
    pub fn bounding_rect(&self) -> Rect {
        let x0 = (self.center.x - self.rx).floor() as i64;
        let y0 = (self.center.y - self.ry).floor() as i64;
        let x1 = (self.center.x + self.rx).ceil() as i64;
        let y1 = (self.center.y + self.ry).ceil() as i64;
        Rect::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1)
    }
}

impl fmt::Display for Ellipse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ellipse{} r=({:.2}, {:.2})", self.center, self.rx, self.ry)
    }
}

impl Region for Ellipse {
    fn pixels(&self, shape: Idx2d) -> Vec<Idx2d> {
        self.bounding_rect()
            .pixels(shape)
            .into_iter()
            .filter(|p| self.contains(*p))
            .collect()
    }
}

/// 线段, 从 `start` 到 `end`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line {
    /// 起点.
    pub start: Point,
    /// 终点.
    pub end: Point,
}

impl Line {
    /// 直接构建.
    #[inline]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// 线段上的第 `i` 个等距采样点 (共 `n` 个, 两端点均包含).
    #[inline]
    pub fn sample_point(&self, i: usize, n: usize) -> Point {
        if n <= 1 {
            return self.start;
        }
        // 先乘后除, 使轴对齐的整数线段得到精确的整数采样点.
        let (i, d) = (i as f64, (n - 1) as f64);
        Point::new(
            self.start.x + (self.end.x - self.start.x) * i / d,
            self.start.y + (self.end.y - self.start.y) * i / d,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clip_and_fit() {
        let r = Rect::new(-1, 1, 3, 2);
        assert!(!r.fits_in((4, 4)));
        assert_eq!(r.pixels((4, 4)), vec![(1, 0), (1, 1), (2, 0), (2, 1)]);
        assert!(Rect::new(0, 0, 4, 4).fits_in((4, 4)));
        assert!(!Rect::new(1, 0, 4, 4).fits_in((4, 4)));
        assert!(Rect::new(0, 0, 0, 4).pixels((4, 4)).is_empty());
    }

    #[test]
    fn test_ellipse_pixels() {
        let e = Ellipse::new(Point::new(2.0, 2.0), 1.0, 1.0).unwrap();
        let px = e.pixels((5, 5));
        assert_eq!(px, vec![(1, 2), (2, 1), (2, 2), (2, 3), (3, 2)]);

        // 贴边时被裁剪.
        let e = Ellipse::new(Point::new(0.0, 0.0), 1.5, 1.5).unwrap();
        assert_eq!(e.pixels((5, 5)), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        assert!(Ellipse::new(Point::default(), 0.0, 1.0).is_none());
    }

    #[test]
    fn test_line_sampling() {
        let l = Line::new(Point::new(0.0, 3.0), Point::new(9.0, 3.0));
        assert_eq!(l.sample_point(0, 10), Point::new(0.0, 3.0));
        assert_eq!(l.sample_point(4, 10), Point::new(4.0, 3.0));
        assert_eq!(l.sample_point(9, 10), Point::new(9.0, 3.0));
    }
}
