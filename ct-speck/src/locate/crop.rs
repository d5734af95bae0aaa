use super::EdgePositions;
use crate::data::{Rect, Spacing, Volume};
use crate::error::{SpeckError, SpeckResult, Stage};

/// 标记组与两条材料边缘所在的象限: 起点 `(2w/3, h/2)`, 大小 `(w/3, h/3)`.
#[inline]
pub fn region_rect((height, width): (usize, usize)) -> Rect {
    Rect::new(
        (2 * width / 3) as i64,
        (height / 2) as i64,
        (width / 3) as i64,
        (height / 3) as i64,
    )
}

/// 将体数据就地裁剪到 [`region_rect`] 给出的象限.
///
/// 切片太小 (裁剪后为空) 时返回 `Err(SpeckError::Degenerate)`.
pub fn crop_region(volume: &mut Volume) -> SpeckResult<Rect> {
    let rect = region_rect(volume.slice_shape());
    if rect.is_empty() || volume.len_z() == 0 {
        return Err(SpeckError::Degenerate(Stage::RegionCrop, volume.shape()));
    }
    volume.crop(rect, Stage::RegionCrop)?;
    log::debug!("region crop {:?} -> {:?}", rect, volume.shape());
    Ok(rect)
}

/// 标记组窗口: 边长 `size_mm`, 左上角位于两条边缘内侧 `(offset_x_mm, offset_y_mm)` 处.
///
/// 毫米按各轴分辨率换算为像素并四舍五入.
pub fn group_rect(
    edges: EdgePositions,
    spacing: Spacing,
    size_mm: f64,
    (offset_x_mm, offset_y_mm): (f64, f64),
) -> Rect {
    let px = |v: f64| v.round() as i64;
    Rect::new(
        edges.x as i64 - px(spacing.x_px(offset_x_mm)),
        edges.y as i64 - px(spacing.y_px(offset_y_mm)),
        px(spacing.x_px(size_mm)),
        px(spacing.y_px(size_mm)),
    )
}

/// 将体数据就地裁剪为只包含六点标记组的窗口.
///
/// 正确性完全依赖于上游边缘定位的精度. 窗口越出当前切片时不做截断,
/// 而是返回 `Err(SpeckError::OutOfBounds)`.
pub fn crop_group(
    volume: &mut Volume,
    edges: EdgePositions,
    size_mm: f64,
    offset_mm: (f64, f64),
) -> SpeckResult<Rect> {
    let rect = group_rect(edges, volume.spacing(), size_mm, offset_mm);
    volume.crop(rect, Stage::GroupCrop)?;
    log::debug!("group crop {:?} from edges {:?}", rect, edges);
    Ok(rect)
}
