use crate::data::{Rect, Volume};
use crate::error::{SpeckError, SpeckResult, Stage};

/// 右侧边缘, 覆盖下半高度的细条带. 宽度会被裁剪到切片宽度之内.
pub fn edge_strip((height, width): (usize, usize), strip_width: usize) -> Rect {
    let sw = strip_width.min(width);
    Rect::new(
        (width - sw) as i64,
        (height / 2) as i64,
        sw as i64,
        (height - height / 2) as i64,
    )
}

/// 方向检查.
///
/// 体模被倒置时, 右下方本应是实体材料的条带只剩空气. 若条带在所有切片上的平均值低于
/// `threshold`, 则将整个体数据在平面内旋转 180°. 返回是否发生了旋转.
///
/// 该检查只处理倒置这一种已知失效模式, 不做一般意义上的配准.
pub fn check_orientation(
    volume: &mut Volume,
    strip_width: usize,
    threshold: f64,
) -> SpeckResult<bool> {
    let strip = edge_strip(volume.slice_shape(), strip_width);
    let mean = volume
        .mean_in(&strip)
        .ok_or(SpeckError::Degenerate(Stage::Orientation, volume.shape()))?;

    let flip = mean < threshold;
    if flip {
        log::info!("edge strip mean {mean:.2} < {threshold}: rotating volume by 180 degrees");
        volume.rotate_180();
    } else {
        log::debug!("edge strip mean {mean:.2} >= {threshold}: orientation kept");
    }
    Ok(flip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Spacing;
    use ndarray::Array3;

    /// 右下角为实体材料 (100), 其余为空气 (0) 的体数据.
    fn phantom(upside_down: bool) -> Volume {
        let (z, h, w) = (3, 20, 30);
        let data = Array3::from_shape_fn((z, h, w), |(_, i, j)| {
            let solid = i >= h / 2 && j >= w / 2;
            let solid = if upside_down { !solid && i < h / 2 && j < w / 2 } else { solid };
            if solid {
                100.0
            } else {
                0.0
            }
        });
        Volume::from_array(data, Spacing::new(0.5, 0.5, 1.0).unwrap())
    }

    #[test]
    fn test_edge_strip_geometry() {
        assert_eq!(edge_strip((20, 30), 5), Rect::new(25, 10, 5, 10));
        assert_eq!(edge_strip((21, 3), 5), Rect::new(0, 10, 3, 11));
    }

    #[test]
    fn test_upright_volume_is_kept() {
        let mut v = phantom(false);
        let before = v.clone();
        assert!(!check_orientation(&mut v, 5, 50.0).unwrap());
        assert_eq!(v.data(), before.data());
    }

    #[test]
    fn test_flip_then_idempotent() {
        let mut v = phantom(true);
        assert!(check_orientation(&mut v, 5, 50.0).unwrap());
        assert_eq!(v.data(), phantom(false).data());

        // 第二次检查不再旋转.
        assert!(!check_orientation(&mut v, 5, 50.0).unwrap());
        assert_eq!(v.data(), phantom(false).data());
    }

    #[test]
    fn test_empty_volume_is_degenerate() {
        let mut v = Volume::from_array(
            Array3::zeros((0, 4, 4)),
            Spacing::new(1.0, 1.0, 1.0).unwrap(),
        );
        assert!(matches!(
            check_orientation(&mut v, 5, 50.0),
            Err(SpeckError::Degenerate(Stage::Orientation, _))
        ));
    }
}
