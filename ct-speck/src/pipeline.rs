//! 完整的分析流水线.
//!
//! 方向检查 -> 象限裁剪 -> 边缘定位 -> 标记组裁剪 -> 焦平面选取 -> 标记检测与归位 -> 多切片统计.
//! 前四步就地修改体数据, 之后的步骤只读取标记组窗口.

use std::io::Write;

use image::RgbImage;

use crate::aggregate::{aggregate, ResultsTable};
use crate::config::SpeckConfig;
use crate::data::{Overlay, Rect, Volume};
use crate::error::SpeckResult;
use crate::landmark::{
    canonicalize, find_landmarks, LandmarkSearch, Landmarks, MaximaFinder, ProminenceMaxima,
};
use crate::locate::{
    check_orientation, crop_group, crop_region, locate_edges, select_focal_slice, EdgePositions,
    FocalSlice,
};

/// 定位阶段的结果.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Located {
    /// 是否进行了 180° 旋转.
    pub flipped: bool,

    /// 象限裁剪窗口, 位于原始切片坐标系.
    pub region: Rect,

    /// 材料边缘, 位于象限坐标系.
    pub edges: EdgePositions,

    /// 标记组窗口, 位于象限坐标系.
    pub group: Rect,
}

/// 标记组上的分析结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// 焦平面.
    pub focal: FocalSlice,

    /// 阈值搜索结果.
    pub search: LandmarkSearch,

    /// 归位后的标记点.
    pub landmarks: Landmarks,

    /// 测量表.
    pub table: ResultsTable,

    /// 焦平面上的测量区域.
    pub overlay: Overlay,
}

impl Analysis {
    /// 在焦平面上渲染测量区域. `group` 应为产生该结果的标记组体数据.
    pub fn render_overlay(&self, group: &Volume) -> RgbImage {
        self.overlay.render(&group.slice_at(self.focal.index()))
    }

    /// 写出测量表, 并在末尾附上最终阈值及其是否为初始值.
    pub fn write_report<W: Write>(&self, mut out: W) -> SpeckResult<()> {
        self.table.write_tsv(&mut out)?;
        writeln!(out, "# threshold\t{}", self.search.threshold)?;
        writeln!(
            out,
            "# default_threshold\t{}",
            self.search.used_default_threshold()
        )?;
        Ok(())
    }
}

/// 一次完整运行的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpeckReport {
    /// 定位阶段.
    pub located: Located,

    /// 分析阶段.
    pub analysis: Analysis,
}

/// 流水线. 持有参数和局部极大值检测器.
#[derive(Debug)]
pub struct Pipeline<F> {
    config: SpeckConfig,
    finder: F,
}

impl Pipeline<ProminenceMaxima> {
    /// 使用默认检测器.
    pub fn new(config: SpeckConfig) -> SpeckResult<Self> {
        Self::with_finder(config, ProminenceMaxima::default())
    }
}

impl<F: MaximaFinder> Pipeline<F> {
    /// 使用指定的检测器. 参数不合法时返回 `Err(SpeckError::InvalidConfig)`.
    pub fn with_finder(config: SpeckConfig, finder: F) -> SpeckResult<Self> {
        config.validate()?;
        Ok(Self { config, finder })
    }

    /// 参数.
    #[inline]
    pub fn config(&self) -> &SpeckConfig {
        &self.config
    }

    /// 检测器.
    #[inline]
    pub fn finder(&self) -> &F {
        &self.finder
    }

    /// 定位阶段. 结束后 `volume` 只剩标记组窗口.
    pub fn locate(&self, volume: &mut Volume) -> SpeckResult<Located> {
        let c = &self.config;
        let flipped = check_orientation(volume, c.edge_strip_width, c.empty_space_threshold)?;
        let region = crop_region(volume)?;
        let edges = locate_edges(volume, c.focus_depth_mm, c.profile_margin)?;
        let group = crop_group(
            volume,
            edges,
            c.group_size_mm,
            (c.group_offset_x_mm, c.group_offset_y_mm),
        )?;
        log::info!("marker group located at {:?} in region {:?}", group, region);
        Ok(Located {
            flipped,
            region,
            edges,
            group,
        })
    }

    /// 分析阶段. `group` 为只包含标记组窗口的体数据.
    pub fn analyze(&mut self, group: &Volume) -> SpeckResult<Analysis> {
        let c = self.config;
        let focal = select_focal_slice(group)?;
        let search = find_landmarks(&mut self.finder, &group.slice_at(focal.index()), &c)?;
        if search.used_default_threshold() {
            log::debug!("landmarks found with the initial threshold");
        } else {
            log::info!(
                "landmarks found with threshold {} after {} attempts",
                search.threshold,
                search.iterations
            );
        }

        let landmarks = canonicalize(&search.points, group.spacing(), c.background_offset_mm);
        let aggregation = aggregate(
            group,
            focal.index(),
            c.half_window,
            &landmarks,
            c.marker_radius_mm,
        )?;
        Ok(Analysis {
            focal,
            search,
            landmarks,
            table: aggregation.table,
            overlay: aggregation.overlay,
        })
    }

    /// 依次运行两个阶段.
    pub fn run(&mut self, volume: &mut Volume) -> SpeckResult<SpeckReport> {
        let located = self.locate(volume)?;
        let analysis = self.analyze(volume)?;
        Ok(SpeckReport { located, analysis })
    }
}
