use super::iter::PosIter;
use crate::data::region::{Line, Point, Region};
use crate::Idx2d;
use ndarray::iter::Iter;
use ndarray::{Array2, ArrayView2, ArrayViewMut2, Ix2};
use std::ops::{Index, IndexMut};

/// 区域统计量.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionStats {
    /// 像素个数.
    pub area: usize,
    /// 平均值.
    pub mean: f64,
    /// 最小值.
    pub min: f64,
    /// 最大值.
    pub max: f64,
}

impl RegionStats {
    /// 统计 `values` 中的数值. 若 `values` 为空则返回 `None`.
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut area = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            area += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (area > 0).then(|| Self {
            area,
            mean: sum / area as f64,
            min,
            max,
        })
    }
}

/// 沿线段等距采样得到的强度剖面.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile(Vec<f64>);

impl Profile {
    /// 直接由采样值构建.
    #[inline]
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// 采样值.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// 采样点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否没有任何采样点.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 剖面最小值所在的索引. 有多个最小值时返回 **最后一个**. 空剖面返回 `None`.
    ///
    /// NaN 不参与比较.
    pub fn last_argmin(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.0.iter().enumerate() {
            if v.is_nan() {
                continue;
            }
            match best {
                Some((_, m)) if v > m => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// 不可变、借用的二维水平 CT 扫描切片.
pub struct ScanSlice<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Volume`].
    data: ArrayView2<'a, f32>,
}

impl Index<Idx2d> for ScanSlice<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

/// 可变、借用的二维水平 CT 扫描切片.
pub struct ScanSliceMut<'a> {
    /// 底层数据的轻量级视图, 借用于 [`crate::Volume`].
    data: ArrayViewMut2<'a, f32>,
}

/// 可变方法集合.
impl<'a> ScanSliceMut<'a> {
    /// 平面内就地旋转 180°.
    ///
    /// 行优先序列反转即等价于旋转 180°.
    pub fn rotate_180(&mut self) {
        let (h, w) = self.shape();
        let total = h * w;
        for k in 0..total / 2 {
            let a = (k / w, k % w);
            let r = total - 1 - k;
            let b = (r / w, r % w);
            self.data.swap(a, b);
        }
    }
}

impl Index<Idx2d> for ScanSliceMut<'_> {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx2d) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<Idx2d> for ScanSliceMut<'_> {
    #[inline]
    fn index_mut(&mut self, index: Idx2d) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// scan 不可变方法集合.
macro_rules! impl_scan_slice_immut {
    ($life: lifetime, $scan: ty, $array: ty) => {
        /// 不可变方法集合.
        impl<$life> $scan {
            /// 直接初始化.
            #[inline]
            pub(crate) fn new(data: $array) -> Self {
                Self { data }
            }

            /// 获得数据的一份不可变 shallow copy.
            #[inline]
            pub fn data(&self) -> ArrayView2<f32> {
                self.data.view()
            }

            /// 获取可以迭代图像像素的迭代器.
            #[inline]
            pub fn iter(&self) -> Iter<'_, f32, Ix2> {
                self.data.iter()
            }

            /// 获取给定位置 (高, 宽) 的像素值. 越界时返回 `None`.
            #[inline]
            pub fn get(&self, pos: Idx2d) -> Option<&f32> {
                self.data.get(pos)
            }

            /// 图像的分辨率 (高, 宽).
            #[inline]
            pub fn shape(&self) -> Idx2d {
                let &[h, w] = self.data.shape() else {
                    unreachable!()
                };
                (h, w)
            }

            /// 图像的像素个数.
            #[inline]
            pub fn size(&self) -> usize {
                let (h, w) = self.shape();
                h * w
            }

            /// 获得图像的高.
            #[inline]
            pub fn height(&self) -> usize {
                self.shape().0
            }

            /// 获得图像的宽.
            #[inline]
            pub fn width(&self) -> usize {
                self.shape().1
            }

            /// 克隆自己, 获得一个拥有所有权的切片对象.
            pub fn to_owned(&self) -> OwnedScanSlice {
                OwnedScanSlice {
                    data: self.data.to_owned(),
                }
            }

            /// 以行优先规则, 获取能迭代图像所有 `(索引, 强度值)` 的迭代器.
            #[inline]
            pub fn indexed_iter(&self) -> impl Iterator<Item = (Idx2d, &f32)> {
                self.data.indexed_iter()
            }

            /// 以行优先规则, 获取能迭代图像所有索引的迭代器.
            #[inline]
            pub fn pos_iter(&self) -> impl Iterator<Item = Idx2d> {
                PosIter::new(self.shape())
            }

            /// 整个切片的最大值. 空切片或全为 NaN 时返回 `None`.
            pub fn max(&self) -> Option<f32> {
                self.data
                    .iter()
                    .copied()
                    .filter(|v| !v.is_nan())
                    .reduce(f32::max)
            }

            /// 计算区域 `region` 与本切片相交部分的统计量. 交集为空时返回 `None`.
            pub fn region_stats<R: Region + ?Sized>(&self, region: &R) -> Option<RegionStats> {
                RegionStats::from_values(
                    region
                        .pixels(self.shape())
                        .into_iter()
                        .map(|p| self.data[p] as f64),
                )
            }

            /// 双线性插值采样. 越界的邻居按最近边缘像素取值.
            /// 空切片时行为未定义 (程序 panic).
            pub fn sample_bilinear(&self, p: Point) -> f64 {
                let (h, w) = self.shape();
                let clamp = |v: i64, len: usize| v.clamp(0, len as i64 - 1) as usize;
                let x0 = p.x.floor();
                let y0 = p.y.floor();
                let (dx, dy) = (p.x - x0, p.y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let at = |xx: i64, yy: i64| self.data[(clamp(yy, h), clamp(xx, w))] as f64;

                let top = at(x0, y0) * (1.0 - dx) + at(x0 + 1, y0) * dx;
                let bottom = at(x0, y0 + 1) * (1.0 - dx) + at(x0 + 1, y0 + 1) * dx;
                top * (1.0 - dy) + bottom * dy
            }

            /// 沿线段 `line` 等距采样 `samples` 个点, 得到强度剖面.
            pub fn profile(&self, line: Line, samples: usize) -> Profile {
                Profile::new(
                    (0..samples)
                        .map(|i| self.sample_bilinear(line.sample_point(i, samples)))
                        .collect(),
                )
            }
        }
    };
}

impl_scan_slice_immut!('a, ScanSlice<'a>, ArrayView2<'a, f32>);
impl_scan_slice_immut!('a, ScanSliceMut<'a>, ArrayViewMut2<'a, f32>);

/// 拥有所有权的二维水平 CT 扫描切片.
///
/// `OwnedScanSlice` 仅提供到 `ScanSlice` 和 `ScanSliceMut`
/// 的轻量转换和底层数据移动, 不提供任何其它方法.
#[derive(Clone, Debug)]
pub struct OwnedScanSlice {
    data: Array2<f32>,
}

impl OwnedScanSlice {
    /// 由 `(h, w)` 形状的数组直接构建.
    #[inline]
    pub fn from_raw(data: Array2<f32>) -> Self {
        Self { data }
    }

    /// 获得不可变切片引用.
    #[inline]
    pub fn as_immutable(&self) -> ScanSlice<'_> {
        ScanSlice::new(self.data.view())
    }

    /// 获得可变切片引用.
    #[inline]
    pub fn as_mutable(&mut self) -> ScanSliceMut<'_> {
        ScanSliceMut::new(self.data.view_mut())
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array2<f32> {
        self.data
    }
}
