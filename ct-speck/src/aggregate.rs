//! 多切片统计.
//!
//! 在焦平面两侧各 `half_window` 层切片上, 以固定的椭圆区域测量每个标记的最大值,
//! 以及背景区域的平均值. 区域位置在所有切片上保持不变.

use std::io::Write;

use itertools::Itertools;

use crate::consts::LANDMARK_COUNT;
use crate::data::{Ellipse, Overlay, OverlayKind, ScanSlice, Spacing, Volume};
use crate::error::{SpeckError, SpeckResult, Stage};
use crate::landmark::{ClockPosition, Landmarks};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 每行的列数: 切片, 偏移, 最大值均值, 六个最大值, 背景均值.
pub const SLOT_COUNT: usize = 3 + LANDMARK_COUNT + 1;

/// 一层切片的测量结果.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceRow {
    /// 切片序号, 从 1 开始.
    pub slice: usize,

    /// 相对焦平面的偏移.
    pub offset: i64,

    /// 六个最大值的算术平均.
    pub mean_of_maxima: f64,

    /// 各标记区域内的最大值, 按 [`ClockPosition::ALL`] 顺序.
    pub maxima: [f64; LANDMARK_COUNT],

    /// 背景区域的平均值.
    pub background_mean: f64,
}

impl SliceRow {
    /// 位置 `pos` 处标记的最大值.
    #[inline]
    pub fn marker(&self, pos: ClockPosition) -> f64 {
        self.maxima[pos.index()]
    }

    /// 展开为一行定长数值.
    pub fn to_slots(&self) -> [f64; SLOT_COUNT] {
        let mut slots = [0.0; SLOT_COUNT];
        slots[0] = self.slice as f64;
        slots[1] = self.offset as f64;
        slots[2] = self.mean_of_maxima;
        slots[3..3 + LANDMARK_COUNT].copy_from_slice(&self.maxima);
        slots[SLOT_COUNT - 1] = self.background_mean;
        slots
    }
}

/// 测量表. 行按偏移升序排列, 共 `2 * half_window + 1` 行.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResultsTable {
    focal_slice: usize,
    half_window: usize,
    rows: Vec<SliceRow>,
}

impl ResultsTable {
    /// 焦平面的切片序号, 从 1 开始.
    #[inline]
    pub fn focal_number(&self) -> usize {
        self.focal_slice
    }

    /// 半窗口.
    #[inline]
    pub fn half_window(&self) -> usize {
        self.half_window
    }

    /// 所有行.
    #[inline]
    pub fn rows(&self) -> &[SliceRow] {
        &self.rows
    }

    /// 行数.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空. 由 [`aggregate`] 得到的表不会为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 偏移为 `offset` 的行.
    pub fn row_at_offset(&self, offset: i64) -> Option<&SliceRow> {
        self.rows.iter().find(|r| r.offset == offset)
    }

    /// 焦平面所在的行.
    #[inline]
    pub fn focal_row(&self) -> Option<&SliceRow> {
        self.row_at_offset(0)
    }

    /// 表头.
    pub fn header() -> String {
        let markers = ClockPosition::ALL.iter().map(|c| c.label()).join("\t");
        format!("slice\toffset\tmean_max\t{markers}\tbackground")
    }

    /// 以制表符分隔的文本形式写出, 首行为表头.
    pub fn write_tsv<W: Write>(&self, mut out: W) -> SpeckResult<()> {
        writeln!(out, "{}", Self::header())?;
        for row in self.rows.iter() {
            let values = row.to_slots()[2..].iter().map(|v| format!("{v:.3}")).join("\t");
            writeln!(out, "{}\t{}\t{}", row.slice, row.offset, values)?;
        }
        Ok(())
    }
}

/// 多切片统计的输出: 测量表, 以及焦平面上的区域叠加层.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    /// 测量表.
    pub table: ResultsTable,

    /// 焦平面上的测量区域.
    pub overlay: Overlay,
}

/// 固定的测量区域.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MeasurementRegions {
    markers: [Ellipse; LANDMARK_COUNT],
    background: Ellipse,
}

impl MeasurementRegions {
    /// 以各标记点为中心、半径 `radius_mm` 构建标记区域, 背景区域半径加倍.
    pub fn new(landmarks: &Landmarks, spacing: Spacing, radius_mm: f64) -> SpeckResult<Self> {
        let (rx, ry) = (spacing.x_px(radius_mm), spacing.y_px(radius_mm));
        let ellipse = |p| {
            Ellipse::new(p, rx, ry).ok_or(SpeckError::InvalidConfig("marker_radius_mm"))
        };
        let mut markers = Vec::with_capacity(LANDMARK_COUNT);
        for p in landmarks.markers().iter() {
            markers.push(ellipse(*p)?);
        }
        let background = ellipse(landmarks.background())?.scaled(2.0);
        let markers = markers
            .try_into()
            .map_err(|_| SpeckError::InvalidConfig("marker_radius_mm"))?;
        Ok(Self {
            markers,
            background,
        })
    }

    /// 标记区域, 按 [`ClockPosition::ALL`] 顺序.
    #[inline]
    pub fn markers(&self) -> &[Ellipse; LANDMARK_COUNT] {
        &self.markers
    }

    /// 背景区域.
    #[inline]
    pub fn background(&self) -> Ellipse {
        self.background
    }

    /// 在 `slice` 上测量一行. `index` 为该切片从 0 开始的索引, 行中记录的是序号 `index + 1`.
    pub fn measure(
        &self,
        slice: &ScanSlice<'_>,
        index: usize,
        offset: i64,
    ) -> SpeckResult<SliceRow> {
        let mut maxima = [0.0; LANDMARK_COUNT];
        for ((pos, region), m) in ClockPosition::ALL
            .iter()
            .zip(self.markers.iter())
            .zip(maxima.iter_mut())
        {
            *m = slice
                .region_stats(region)
                .ok_or_else(|| {
                    SpeckError::EmptyRegion(Stage::Aggregate, format!("{pos} {region}"))
                })?
                .max;
        }
        let background_mean = slice
            .region_stats(&self.background)
            .ok_or_else(|| {
                SpeckError::EmptyRegion(Stage::Aggregate, format!("background {}", self.background))
            })?
            .mean;

        Ok(SliceRow {
            slice: index + 1,
            offset,
            mean_of_maxima: maxima.iter().sum::<f64>() / LANDMARK_COUNT as f64,
            maxima,
            background_mean,
        })
    }

    /// 焦平面上的叠加层.
    pub fn overlay(&self) -> Overlay {
        let mut overlay = Overlay::new();
        for region in self.markers.iter() {
            overlay.push(*region, OverlayKind::Marker);
        }
        overlay.push(self.background, OverlayKind::Background);
        overlay
    }
}

/// 在 `focal ± half_window` 范围内的每层切片上测量. `focal` 为从 0 开始的索引,
/// 表中记录的均为从 1 开始的切片序号.
///
/// 窗口必须完全位于体数据内, 否则返回 `Err(SpeckError::WindowOutOfRange)`.
/// 任一区域与切片无交集时返回 `Err(SpeckError::EmptyRegion)`.
pub fn aggregate(
    volume: &Volume,
    focal: usize,
    half_window: usize,
    landmarks: &Landmarks,
    radius_mm: f64,
) -> SpeckResult<Aggregation> {
    let len = volume.len_z();
    if focal < half_window || focal + half_window >= len {
        return Err(SpeckError::WindowOutOfRange {
            focal,
            half_window,
            len,
        });
    }
    let regions = MeasurementRegions::new(landmarks, volume.spacing(), radius_mm)?;
    let first = focal - half_window;
    let measure = |z: usize| regions.measure(&volume.slice_at(z), z, z as i64 - focal as i64);

    #[cfg(feature = "rayon")]
    let rows = (first..=focal + half_window)
        .into_par_iter()
        .map(measure)
        .collect::<SpeckResult<Vec<_>>>()?;
    #[cfg(not(feature = "rayon"))]
    let rows = (first..=focal + half_window)
        .map(measure)
        .collect::<SpeckResult<Vec<_>>>()?;

    log::info!("measured {} slices around focal slice #{}", rows.len(), focal + 1);
    Ok(Aggregation {
        table: ResultsTable {
            focal_slice: focal + 1,
            half_window,
            rows,
        },
        overlay: regions.overlay(),
    })
}
