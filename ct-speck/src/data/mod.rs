use std::ops::{Index, IndexMut};
use std::path::Path;

use ndarray::{s, Array3, ArrayD, ArrayView, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::error::{SpeckError, SpeckResult, Stage};
use crate::{Idx2d, Idx3d};

pub mod meta;
pub mod overlay;
pub mod region;
pub mod slice;
pub mod window;

pub use meta::{MetadataSource, Spacing};
pub use overlay::{Overlay, OverlayKind};
pub use region::{Ellipse, Line, Point, Rect, Region};
pub use slice::{OwnedScanSlice, Profile, RegionStats, ScanSlice, ScanSliceMut};
pub use window::CtWindow;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 体模 3D 扫描, 包括体素分辨率和强度数据. 强度以 `f32` 保存, 按 `(z, H, W)` 组织.
///
/// 裁剪和旋转操作就地修改数据; 分辨率在整个生命周期内保持不变.
#[derive(Debug, Clone)]
pub struct Volume {
    spacing: Spacing,
    data: Array3<f32>,
}

impl Index<Idx3d> for Volume {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx3d> for Volume {
    #[inline]
    fn index_mut(&mut self, index: Idx3d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl Volume {
    /// 打开 nii 文件格式的 3D 扫描. `path` 为 nii 文件的本地路径.
    ///
    /// 分辨率经由 [`MetadataSource`] 从 header 中读取, 非正的分辨率视为元数据错误.
    pub fn open<P: AsRef<Path>>(path: P) -> SpeckResult<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = obj.header().clone();
        let raw = obj.into_volume().into_ndarray::<f32>()?;
        Self::from_nifti_parts(raw, &header)
    }

    /// 由 nifti 给出的 `[W, H, z]` 数组和对应 header 构建.
    fn from_nifti_parts(raw: ArrayD<f32>, header: &NiftiHeader) -> SpeckResult<Self> {
        let spacing = Spacing::from_source(header)?;

        // [W, H, z] -> [z, H, W].
        // hint: 原第一维向右增长, 原第二维向下增长.
        let data = raw.permuted_axes([2, 1, 0].as_slice());
        let data = data.as_standard_layout().to_owned();
        let shape = get_shape_from_header(header);

        let data = data
            .into_shape(shape)
            .map_err(|e| SpeckError::Metadata {
                tag: "dim",
                reason: e.to_string(),
            })?;
        log::debug!("opened volume {:?} with {:?}", shape, spacing);
        Ok(Self { spacing, data })
    }

    /// 由 `(z, H, W)` 组织的数组和分辨率直接构建.
    #[inline]
    pub fn from_array(data: Array3<f32>, spacing: Spacing) -> Self {
        Self { spacing, data }
    }

    /// 体素分辨率.
    #[inline]
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// 获取数据形状大小 `(z, h, w)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取数据水平切片形状大小 `(h, w)`.
    #[inline]
    pub fn slice_shape(&self) -> Idx2d {
        let (_, h, w) = self.shape();
        (h, w)
    }

    /// 获取水平切片个数.
    #[inline]
    pub fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 切片宽.
    #[inline]
    pub fn width(&self) -> usize {
        self.shape().2
    }

    /// 切片高.
    #[inline]
    pub fn height(&self) -> usize {
        self.shape().1
    }

    /// 获取 z 空间的第 `z_index` 层切片视图.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ScanSlice<'_> {
        ScanSlice::new(self.data.index_axis(Axis(0), z_index))
    }

    /// 获取 z 空间的第 `z_index` 层切片视图. 越界时返回 `None`.
    #[inline]
    pub fn get_slice(&self, z_index: usize) -> Option<ScanSlice<'_>> {
        (z_index < self.len_z()).then(|| self.slice_at(z_index))
    }

    /// 获取能按升序迭代水平不可变切片的迭代器.
    #[inline]
    pub fn slice_iter(&self) -> impl ExactSizeIterator<Item = ScanSlice> {
        self.data.axis_iter(Axis(0)).map(ScanSlice::new)
    }

    /// 获取能按升序迭代水平可变切片的迭代器.
    #[inline]
    pub fn slice_iter_mut(&mut self) -> impl ExactSizeIterator<Item = ScanSliceMut> {
        self.data.axis_iter_mut(Axis(0)).map(ScanSliceMut::new)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, f32, Ix3> {
        self.data.view()
    }

    /// 将所有切片就地裁剪为矩形 `rect`. 矩形必须非空且完全位于切片内,
    /// 否则返回 `Err(SpeckError::OutOfBounds)`, 原数据不变.
    pub fn crop(&mut self, rect: Rect, stage: Stage) -> SpeckResult<()> {
        let (height, width) = self.slice_shape();
        if !rect.fits_in((height, width)) {
            return Err(SpeckError::OutOfBounds {
                stage,
                rect: rect.as_tuple(),
                height,
                width,
            });
        }
        let (x, y) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        self.data = self.data.slice(s![.., y..y + h, x..x + w]).to_owned();
        Ok(())
    }

    /// 所有切片在平面内就地旋转 180°. 启用 `rayon` 特性时各切片并行处理.
    pub fn rotate_180(&mut self) {
        #[cfg(feature = "rayon")]
        self.par_for_each_slice_mut(|mut s| s.rotate_180());
        #[cfg(not(feature = "rayon"))]
        self.slice_iter_mut().for_each(|mut s| s.rotate_180());
    }

    /// 计算区域 `region` 在所有切片上的平均值. 区域与切片无交集或没有切片时返回 `None`.
    pub fn mean_in<R: Region + ?Sized>(&self, region: &R) -> Option<f64> {
        let pixels = region.pixels(self.slice_shape());
        if pixels.is_empty() || self.len_z() == 0 {
            return None;
        }
        let mut count = 0u64;
        let mut sum = 0.0;
        for sli in self.slice_iter() {
            for &pos in pixels.iter() {
                count += 1;
                sum += sli[pos] as f64;
            }
        }
        Some(sum / count as f64)
    }

    /// 依次计算每层切片的最大值. 空切片记为 `f32::NEG_INFINITY`.
    pub fn slice_maxima(&self) -> Vec<f32> {
        self.slice_iter()
            .map(|s| s.max().unwrap_or(f32::NEG_INFINITY))
            .collect()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl Volume {
    /// 借助 `rayon`, 并行地计算每层切片的最大值. 结果顺序与 [`Self::slice_maxima`] 一致.
    pub fn par_slice_maxima(&self) -> Vec<f32> {
        self.data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|v| ScanSlice::new(v).max().unwrap_or(f32::NEG_INFINITY))
            .collect()
    }

    /// 借助 `rayon`, 并行地对每个水平可变切片实施 `op` 操作.
    pub fn par_for_each_slice_mut<F>(&mut self, op: F)
    where
        F: Fn(ScanSliceMut) + Sync + Send,
    {
        self.data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .for_each(|v| op(ScanSliceMut::new(v)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array3, IxDyn};

    fn header() -> NiftiHeader {
        NiftiHeader {
            dim: [3, 4, 5, 6, 1, 1, 1, 1],
            pixdim: [1.0, 0.5, 0.25, 2.0, 0.0, 0.0, 0.0, 0.0],
            ..Default::default()
        }
    }

    #[test]
    fn test_shape_from_header() {
        assert_eq!(get_shape_from_header(&header()), (6, 5, 4));
    }

    #[test]
    fn test_spacing_from_header() {
        let s = Spacing::from_source(&header()).unwrap();
        assert_eq!(s, Spacing::new(0.5, 0.25, 2.0).unwrap());
    }

    #[test]
    fn test_nifti_axes_permuted() {
        // nifti 数组按 [W, H, z] 索引.
        let raw = ArrayD::from_shape_fn(IxDyn(&[4, 5, 6]), |ix| {
            (ix[2] * 100 + ix[1] * 10 + ix[0]) as f32
        });
        let v = Volume::from_nifti_parts(raw, &header()).unwrap();
        assert_eq!(v.shape(), (6, 5, 4));
        assert_eq!((v.len_z(), v.height(), v.width()), (6, 5, 4));
        assert_eq!(v[(0, 0, 3)], 3.0);
        assert_eq!(v[(2, 4, 1)], 241.0);
        assert_eq!(v[(5, 1, 0)], 510.0);
        assert_eq!(v.spacing().z_mm(), 2.0);
    }

    #[test]
    fn test_nifti_shape_mismatch_is_metadata_error() {
        let raw = ArrayD::zeros(IxDyn(&[4, 5, 5]));
        assert!(matches!(
            Volume::from_nifti_parts(raw, &header()),
            Err(SpeckError::Metadata { tag: "dim", .. })
        ));
    }

    fn ramp(z: usize, h: usize, w: usize) -> Volume {
        let data = Array3::from_shape_fn((z, h, w), |(k, i, j)| (k * 100 + i * 10 + j) as f32);
        Volume::from_array(data, Spacing::new(0.5, 0.5, 1.0).unwrap())
    }

    #[test]
    fn test_crop_in_place() {
        let mut v = ramp(2, 4, 5);
        v.crop(Rect::new(1, 2, 3, 2), Stage::RegionCrop).unwrap();
        assert_eq!(v.shape(), (2, 2, 3));
        assert_eq!(v[(0, 0, 0)], 21.0);
        assert_eq!(v[(1, 1, 2)], 133.0);
        assert_eq!(v.spacing(), Spacing::new(0.5, 0.5, 1.0).unwrap());
    }

    #[test]
    fn test_crop_out_of_bounds_keeps_data() {
        let mut v = ramp(1, 4, 4);
        let err = v.crop(Rect::new(2, 0, 3, 2), Stage::GroupCrop).unwrap_err();
        assert!(matches!(
            err,
            SpeckError::OutOfBounds {
                stage: Stage::GroupCrop,
                ..
            }
        ));
        assert_eq!(v.shape(), (1, 4, 4));
    }

    #[test]
    fn test_rotate_and_mean() {
        let mut v = ramp(2, 2, 2);
        v.rotate_180();
        assert_eq!(v[(0, 0, 0)], 11.0);
        assert_eq!(v[(1, 1, 1)], 100.0);
        // (0 + 1 + 10 + 11 + 100 + 101 + 110 + 111) / 8
        assert_eq!(v.mean_in(&Rect::new(0, 0, 2, 2)), Some(55.5));
        assert_eq!(v.mean_in(&Rect::new(5, 5, 1, 1)), None);
        assert_eq!(v.slice_maxima(), vec![11.0, 111.0]);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_slice_maxima_order() {
        let v = ramp(6, 3, 3);
        assert_eq!(v.par_slice_maxima(), v.slice_maxima());
    }
}
