use crate::data::Volume;
use crate::error::{SpeckError, SpeckResult};

/// 焦平面选取结果.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FocalSlice {
    /// 焦平面的切片序号, 从 1 开始. 第 `number` 层的索引为 `number - 1`.
    pub number: usize,

    /// 该切片的最大强度.
    pub max: f32,
}

impl FocalSlice {
    /// 焦平面的切片索引, 从 0 开始.
    #[inline]
    pub fn index(&self) -> usize {
        self.number.saturating_sub(1)
    }
}

/// 在已按切片求得的最大值中选取焦平面.
///
/// 索引 0 (第 1 层) 不参与比较. 只有严格更大的值才会替换当前结果, 因此并列时最靠前者胜出.
fn select_from_maxima(maxima: &[f32]) -> Option<FocalSlice> {
    let mut best: Option<FocalSlice> = None;
    for (index, &max) in maxima.iter().enumerate().skip(1) {
        match best {
            Some(b) if max <= b.max => {}
            _ if max.is_nan() => {}
            _ => {
                best = Some(FocalSlice {
                    number: index + 1,
                    max,
                })
            }
        }
    }
    best
}

/// 选取最大像素值最高的切片作为焦平面.
///
/// 启用 `rayon` 特性时, 各切片最大值并行计算, 选取规则不变.
/// 除第 1 层外没有可用切片时返回 `Err(SpeckError::NoUsableSlices)`.
pub fn select_focal_slice(volume: &Volume) -> SpeckResult<FocalSlice> {
    #[cfg(feature = "rayon")]
    let maxima = volume.par_slice_maxima();
    #[cfg(not(feature = "rayon"))]
    let maxima = volume.slice_maxima();

    let focal = select_from_maxima(&maxima).ok_or(SpeckError::NoUsableSlices(volume.len_z()))?;
    log::info!("focal slice #{} (max {})", focal.number, focal.max);
    Ok(focal)
}
