//! 焦平面上测量区域的可视化叠加层, 及其持久化存储.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::consts::color::{BACKGROUND_RGB, BLACK, MARKER_RGB};
use crate::data::region::{Ellipse, Region};
use crate::data::slice::ScanSlice;
use crate::data::window::CtWindow;
use crate::error::SpeckResult;
use crate::Idx2d;

/// 叠加区域的类别. 两种类别使用两种颜色.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverlayKind {
    /// 标记区域.
    Marker,

    /// 背景区域.
    Background,
}

impl OverlayKind {
    /// 该类别的轮廓颜色.
    #[inline]
    pub fn rgb(&self) -> [u8; 3] {
        match self {
            OverlayKind::Marker => MARKER_RGB,
            OverlayKind::Background => BACKGROUND_RGB,
        }
    }
}

/// 一组带类别的椭圆区域, 由多切片统计在焦平面上记录, 供渲染使用.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Overlay {
    entries: Vec<(Ellipse, OverlayKind)>,
}

impl Overlay {
    /// 空叠加层.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个区域.
    #[inline]
    pub fn push(&mut self, region: Ellipse, kind: OverlayKind) {
        self.entries.push((region, kind));
    }

    /// 所有区域.
    #[inline]
    pub fn entries(&self) -> &[(Ellipse, OverlayKind)] {
        &self.entries
    }

    /// 类别为 `kind` 的区域个数.
    pub fn count(&self, kind: OverlayKind) -> usize {
        self.entries.iter().filter(|(_, k)| *k == kind).count()
    }

    /// 将 `slice` 以其自身取值范围为窗口渲染为灰度, 再按类别颜色绘制各区域的轮廓.
    pub fn render(&self, slice: &ScanSlice<'_>) -> RgbImage {
        let (height, width) = slice.shape();
        let window = CtWindow::from_values(slice.iter().copied());
        let mut buf = RgbImage::new(width as u32, height as u32);
        for ((h, w), &v) in slice.indexed_iter() {
            let g = window.and_then(|win| win.eval(v)).unwrap_or(BLACK);
            buf.put_pixel(w as u32, h as u32, Rgb([g, g, g]));
        }

        for (region, kind) in self.entries.iter() {
            for (h, w) in outline(region, (height, width)) {
                buf.put_pixel(w as u32, h as u32, Rgb(kind.rgb()));
            }
        }
        buf
    }

    /// 渲染后保存到 `path`. 图像格式由扩展名决定.
    pub fn save<P: AsRef<Path>>(&self, slice: &ScanSlice<'_>, path: P) -> SpeckResult<()> {
        self.render(slice).save(path)?;
        Ok(())
    }
}

/// 区域的轮廓: 属于区域, 但 4-邻域中至少一个像素不属于区域 (或越出图像) 的像素.
fn outline(region: &Ellipse, shape: Idx2d) -> Vec<Idx2d> {
    let (height, width) = shape;
    let inside = |h: Option<usize>, w: Option<usize>| match (h, w) {
        (Some(h), Some(w)) if h < height && w < width => region.contains((h, w)),
        _ => false,
    };
    region
        .pixels(shape)
        .into_iter()
        .filter(|&(h, w)| {
            !inside(h.checked_sub(1), Some(w))
                || !inside(h.checked_add(1), Some(w))
                || !inside(Some(h), w.checked_sub(1))
                || !inside(Some(h), w.checked_add(1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::region::Point;
    use crate::data::slice::OwnedScanSlice;
    use ndarray::Array2;

    #[test]
    fn test_render_outline_colors() {
        let slice = OwnedScanSlice::from_raw(Array2::from_elem((9, 9), 10.0f32));
        let mut ov = Overlay::new();
        let e = Ellipse::new(Point::new(4.0, 4.0), 2.0, 2.0).unwrap();
        ov.push(e, OverlayKind::Marker);
        ov.push(e.scaled(2.0), OverlayKind::Background);
        assert_eq!(ov.count(OverlayKind::Marker), 1);
        assert_eq!(ov.count(OverlayKind::Background), 1);

        let img = ov.render(&slice.as_immutable());
        assert_eq!(img.dimensions(), (9, 9));
        // 中心不在轮廓上, 保持灰度.
        let c = img.get_pixel(4, 4);
        assert_eq!(c[0], c[1]);
        assert_eq!(*img.get_pixel(4, 2), Rgb(MARKER_RGB));
        assert_eq!(*img.get_pixel(4, 0), Rgb(BACKGROUND_RGB));
    }
}
