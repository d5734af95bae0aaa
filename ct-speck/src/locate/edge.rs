use crate::data::{Line, Point, Profile, ScanSlice, Volume};
use crate::error::{SpeckError, SpeckResult, Stage};

/// 两条材料边缘的位置, 各为一个轴上的像素索引.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgePositions {
    /// 水平剖面最小值所在的列.
    pub x: usize,

    /// 垂直剖面最小值所在的行.
    pub y: usize,
}

/// 水平剖面: 沿第 `h / 2` 行, 从第 0 列到第 `w - 1 - margin` 列, 每像素一个采样点.
fn horizontal_profile(slice: &ScanSlice<'_>, margin: usize) -> Option<Profile> {
    let (h, w) = slice.shape();
    let n = w.checked_sub(margin).filter(|n| *n > 0)?;
    let y = (h / 2) as f64;
    let line = Line::new(Point::new(0.0, y), Point::new((n - 1) as f64, y));
    Some(slice.profile(line, n))
}

/// 垂直剖面: 沿第 `w / 3` 列, 从第 0 行到第 `h - 1 - margin` 行, 每像素一个采样点.
fn vertical_profile(slice: &ScanSlice<'_>, margin: usize) -> Option<Profile> {
    let (h, w) = slice.shape();
    let n = h.checked_sub(margin).filter(|n| *n > 0)?;
    let x = (w / 3) as f64;
    let line = Line::new(Point::new(x, 0.0), Point::new(x, (n - 1) as f64));
    Some(slice.profile(line, n))
}

/// 边缘定位.
///
/// 在深度 `depth_mm` 对应的切片上分别采样水平和垂直剖面, 以剖面最小值的位置作为边缘.
/// 深度换算为从 1 开始的切片序号, 即 `round(depth_mm / z_mm)` 号切片, 其索引为序号减 1.
/// 剖面在远端留出 `margin` 个像素, 以避开零填充和错位伪影.
///
/// 多个位置同时取到最小值时取 **最后一个**.
pub fn locate_edges(volume: &Volume, depth_mm: f64, margin: usize) -> SpeckResult<EdgePositions> {
    let len = volume.len_z();
    let number = volume.spacing().slice_number(depth_mm);
    let slice = number
        .checked_sub(1)
        .and_then(|index| volume.get_slice(index))
        .ok_or(SpeckError::FocusDepthOutOfRange {
            depth_mm,
            number,
            len,
        })?;

    let degenerate = || SpeckError::Degenerate(Stage::EdgeLocate, volume.shape());
    let x = horizontal_profile(&slice, margin)
        .and_then(|p| p.last_argmin())
        .ok_or_else(degenerate)?;
    let y = vertical_profile(&slice, margin)
        .and_then(|p| p.last_argmin())
        .ok_or_else(degenerate)?;

    log::debug!("edges at x = {x}, y = {y} on slice #{number}");
    Ok(EdgePositions { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Spacing;
    use ndarray::Array3;

    fn with_dark_lines(z_mm: f64, col: usize, row: usize) -> Volume {
        let data = Array3::from_shape_fn((5, 30, 40), |(_, i, j)| {
            if j == col || i == row {
                0.0
            } else {
                100.0
            }
        });
        Volume::from_array(data, Spacing::new(0.5, 0.5, z_mm).unwrap())
    }

    #[test]
    fn test_locate_dark_lines() {
        let v = with_dark_lines(10.0, 25, 12);
        let e = locate_edges(&v, 34.0, 10).unwrap();
        assert_eq!(e, EdgePositions { x: 25, y: 12 });
    }

    #[test]
    fn test_margin_hides_far_edge() {
        // 第 35 列落在留白之内, 水平剖面是常数, 因此取最后一个采样点.
        let v = with_dark_lines(10.0, 35, 12);
        let e = locate_edges(&v, 34.0, 10).unwrap();
        assert_eq!(e.x, 29);
    }

    #[test]
    fn test_last_minimum_wins() {
        let mut v = with_dark_lines(10.0, 5, 12);
        for z in 0..5 {
            for h in 0..30 {
                v[(z, h, 20)] = 0.0;
            }
        }
        assert_eq!(locate_edges(&v, 34.0, 10).unwrap().x, 20);
    }

    #[test]
    fn test_depth_out_of_range() {
        let v = with_dark_lines(1.0, 25, 12);
        assert!(matches!(
            locate_edges(&v, 34.0, 10),
            Err(SpeckError::FocusDepthOutOfRange { number: 34, len: 5, .. })
        ));
        // 深度不足半层时序号为 0, 不存在对应切片.
        let v = with_dark_lines(100.0, 25, 12);
        assert!(matches!(
            locate_edges(&v, 34.0, 10),
            Err(SpeckError::FocusDepthOutOfRange { number: 0, len: 5, .. })
        ));
    }

    #[test]
    fn test_depth_names_one_based_slice() {
        // 34 / 8.5 = 4, 即第 4 层 (索引 3). 只有该层带有暗线.
        let mut v = with_dark_lines(8.5, 25, 12);
        for z in [0, 1, 2, 4] {
            for h in 0..30 {
                for w in 0..40 {
                    v[(z, h, w)] = 100.0;
                }
            }
        }
        assert_eq!(
            locate_edges(&v, 34.0, 10).unwrap(),
            EdgePositions { x: 25, y: 12 }
        );
        // 34 / 34 = 1, 即第 1 层.
        let v = with_dark_lines(34.0, 7, 3);
        assert_eq!(locate_edges(&v, 34.0, 10).unwrap(), EdgePositions { x: 7, y: 3 });
    }

    #[test]
    fn test_margin_swallows_slice() {
        let v = with_dark_lines(10.0, 5, 5);
        assert!(matches!(
            locate_edges(&v, 34.0, 40),
            Err(SpeckError::Degenerate(Stage::EdgeLocate, _))
        ));
    }
}
