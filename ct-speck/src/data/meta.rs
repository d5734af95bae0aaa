//! 体数据元信息: 像素间距和层厚.

use std::collections::HashMap;

use nifti::NiftiHeader;

use crate::consts::{TAG_PIXEL_SPACING, TAG_SLICE_THICKNESS};
use crate::error::{SpeckError, SpeckResult};

/// 可按标签查询字符串元数据的对象.
pub trait MetadataSource {
    /// 获取标签 `tag` 对应的原始字符串. 不存在时返回 `None`.
    fn metadata(&self, tag: &str) -> Option<String>;
}

impl MetadataSource for HashMap<String, String> {
    #[inline]
    fn metadata(&self, tag: &str) -> Option<String> {
        self.get(tag).cloned()
    }
}

/// nifti 没有 DICOM 标签, 这里由 `pixdim` 按 DICOM 的字符串格式还原.
impl MetadataSource for NiftiHeader {
    fn metadata(&self, tag: &str) -> Option<String> {
        let [_, w, h, z, ..] = self.pixdim;
        match tag {
            TAG_PIXEL_SPACING => Some(format!("{w}\\{h}")),
            TAG_SLICE_THICKNESS => Some(format!("{z}")),
            _ => None,
        }
    }
}

/// 体素分辨率, 以毫米为单位. 在体数据生命周期内只读.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spacing {
    width_mm: f64,
    height_mm: f64,
    z_mm: f64,
}

impl Spacing {
    /// 构建分辨率. 任一分量非有限或不为正时返回 `None`.
    pub fn new(width_mm: f64, height_mm: f64, z_mm: f64) -> Option<Self> {
        let ok = |v: f64| v.is_finite() && v > 0.0;
        (ok(width_mm) && ok(height_mm) && ok(z_mm)).then_some(Self {
            width_mm,
            height_mm,
            z_mm,
        })
    }

    /// 由两个元数据字符串解析. `pixel_spacing` 形如 `"0.125\0.125"` (水平在前),
    /// `slice_thickness` 形如 `"0.125"`.
    pub fn parse(pixel_spacing: &str, slice_thickness: &str) -> SpeckResult<Self> {
        let bad = |tag: &'static str, reason: String| SpeckError::Metadata { tag, reason };

        let mut parts = pixel_spacing.split('\\').map(str::trim);
        let mut next_value = |axis: &str| -> SpeckResult<f64> {
            let raw = parts
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| bad(TAG_PIXEL_SPACING, format!("缺少{axis}分量")))?;
            raw.parse::<f64>()
                .map_err(|e| bad(TAG_PIXEL_SPACING, format!("`{raw}`: {e}")))
        };
        let width_mm = next_value("水平")?;
        let height_mm = next_value("垂直")?;

        let raw = slice_thickness.trim();
        let z_mm = raw
            .parse::<f64>()
            .map_err(|e| bad(TAG_SLICE_THICKNESS, format!("`{raw}`: {e}")))?;

        Self::new(width_mm, height_mm, z_mm).ok_or_else(|| {
            bad(
                TAG_PIXEL_SPACING,
                format!("分辨率必须为正: ({width_mm}, {height_mm}, {z_mm})"),
            )
        })
    }

    /// 从元数据源读取并解析.
    pub fn from_source<S: MetadataSource + ?Sized>(source: &S) -> SpeckResult<Self> {
        let missing = |tag: &'static str| SpeckError::Metadata {
            tag,
            reason: "标签不存在".to_string(),
        };
        let spacing = source
            .metadata(TAG_PIXEL_SPACING)
            .ok_or_else(|| missing(TAG_PIXEL_SPACING))?;
        let thickness = source
            .metadata(TAG_SLICE_THICKNESS)
            .ok_or_else(|| missing(TAG_SLICE_THICKNESS))?;
        Self::parse(&spacing, &thickness)
    }

    /// width 方向 (自然 2D 图像的水平方向) 像素分辨率.
    #[inline]
    pub fn width_mm(&self) -> f64 {
        self.width_mm
    }

    /// height 方向 (自然 2D 图像的垂直方向) 像素分辨率.
    #[inline]
    pub fn height_mm(&self) -> f64 {
        self.height_mm
    }

    /// 层厚.
    #[inline]
    pub fn z_mm(&self) -> f64 {
        self.z_mm
    }

    /// 将水平方向长度 `mm` 换算为像素数 (浮点).
    #[inline]
    pub fn x_px(&self, mm: f64) -> f64 {
        mm / self.width_mm
    }

    /// 将垂直方向长度 `mm` 换算为像素数 (浮点).
    #[inline]
    pub fn y_px(&self, mm: f64) -> f64 {
        mm / self.height_mm
    }

    /// 将 z 方向深度 `mm` 换算为最近的切片序号. 序号从 1 开始, 第 1 层的索引为 0.
    #[inline]
    pub fn slice_number(&self, mm: f64) -> usize {
        num::ToPrimitive::to_usize(&(mm / self.z_mm).round()).unwrap_or(usize::MAX)
    }
}
