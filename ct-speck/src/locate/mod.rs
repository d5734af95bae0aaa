//! 体模定位: 方向检查, 象限裁剪, 边缘定位, 标记组裁剪, 焦平面选取.
//!
//! 各函数按流水线顺序排列, 每一步只消费上一步的输出与体数据的分辨率.

mod crop;
mod edge;
mod focus;
mod orientation;

pub use crop::{crop_group, crop_region, group_rect, region_rect};
pub use edge::{locate_edges, EdgePositions};
pub use focus::{select_focal_slice, FocalSlice};
pub use orientation::{check_orientation, edge_strip};
