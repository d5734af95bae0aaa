//! 局部极大值检测.
//!
//! 检测器只负责给出原始记号序列, 解析由 [`super::tokens`] 完成. 这样外部检测器
//! (或测试中的脚本化检测器) 可以直接替换默认实现.

use std::cmp::Reverse;
use std::collections::VecDeque;

use ordered_float::OrderedFloat;

use crate::data::ScanSlice;
use crate::Idx2d;

/// 按显著度寻找局部极大值的检测器.
pub trait MaximaFinder {
    /// 以显著度阈值 `prominence` 检测 `slice` 上的局部极大值,
    /// 返回扁平的记号序列 (可能带表头和行号, 见 [`super::TokenShape`]).
    fn find_maxima(&mut self, slice: &ScanSlice<'_>, prominence: f64) -> Vec<String>;
}

impl<F: MaximaFinder + ?Sized> MaximaFinder for &mut F {
    #[inline]
    fn find_maxima(&mut self, slice: &ScanSlice<'_>, prominence: f64) -> Vec<String> {
        (**self).find_maxima(slice, prominence)
    }
}

impl<F: MaximaFinder + ?Sized> MaximaFinder for Box<F> {
    #[inline]
    fn find_maxima(&mut self, slice: &ScanSlice<'_>, prominence: f64) -> Vec<String> {
        (**self).find_maxima(slice, prominence)
    }
}

/// 输出记号的排布方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenLayout {
    /// 是否输出 `X Y` 表头.
    pub header: bool,

    /// 是否在每行前输出从 1 开始的行号.
    pub index: bool,
}

impl Default for TokenLayout {
    fn default() -> Self {
        Self {
            header: true,
            index: true,
        }
    }
}

/// 一个被接受的局部极大值.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Maximum {
    /// 像素位置 `(h, w)`.
    pub pos: Idx2d,

    /// 峰值.
    pub value: f32,
}

/// 默认检测器: 基于显著度的局部极大值检测.
///
/// 峰 `p` 被接受, 当且仅当从 `p` 出发、经由值严格高于 `p - prominence` 的
/// 8-连通像素所能到达的区域中, 既没有比 `p` 更高的像素, 也没有已被其它峰占据的像素.
/// 候选峰按高度降序处理, 同高时按行优先顺序. 输出按峰高降序排列.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProminenceMaxima {
    layout: TokenLayout,
}

static NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl ProminenceMaxima {
    /// 以指定排布构建.
    #[inline]
    pub fn new(layout: TokenLayout) -> Self {
        Self { layout }
    }

    /// 记号排布.
    #[inline]
    pub fn layout(&self) -> TokenLayout {
        self.layout
    }

    /// 检测所有显著的局部极大值, 按峰高降序返回.
    pub fn find(&self, slice: &ScanSlice<'_>, prominence: f64) -> Vec<Maximum> {
        let (height, width) = slice.shape();
        let at = |(h, w): Idx2d| h * width + w;
        // NaN 视为无穷低, 不参与任何区域.
        let value = |pos: Idx2d| -> f64 {
            let v = slice[pos] as f64;
            if v.is_nan() {
                f64::NEG_INFINITY
            } else {
                v
            }
        };
        let neighbors = move |(h, w): Idx2d| {
            NEIGHBORS.iter().filter_map(move |&(dh, dw)| {
                let nh = h.checked_add_signed(dh)?;
                let nw = w.checked_add_signed(dw)?;
                (nh < height && nw < width).then_some((nh, nw))
            })
        };

        let mut candidates: Vec<(Idx2d, f64)> = slice
            .pos_iter()
            .map(|p| (p, value(p)))
            .filter(|&(p, v)| v.is_finite() && neighbors(p).all(|q| value(q) <= v))
            .collect();
        // 稳定排序, 同高保持行优先顺序.
        candidates.sort_by_key(|&(_, v)| Reverse(OrderedFloat(v)));

        let mut owned = vec![false; height * width];
        let mut settled = vec![false; height * width];
        let mut visited = vec![false; height * width];
        let mut found = Vec::new();

        for (peak_pos, peak) in candidates {
            if owned[at(peak_pos)] || settled[at(peak_pos)] {
                continue;
            }
            let floor = peak - prominence;

            let mut region = vec![peak_pos];
            let mut queue = VecDeque::from([peak_pos]);
            visited[at(peak_pos)] = true;
            let mut rejected = false;
            while let Some(p) = queue.pop_front() {
                for q in neighbors(p) {
                    if visited[at(q)] {
                        continue;
                    }
                    let v = value(q);
                    if v <= floor {
                        continue;
                    }
                    if v > peak || owned[at(q)] {
                        rejected = true;
                        break;
                    }
                    visited[at(q)] = true;
                    region.push(q);
                    queue.push_back(q);
                }
                if rejected {
                    break;
                }
            }
            for &p in region.iter() {
                visited[at(p)] = false;
            }

            if rejected {
                // 同高的平台不会再成为更好的峰.
                settle_plateau(peak_pos, peak, &mut settled, width, &value, &neighbors);
            } else {
                for &p in region.iter() {
                    owned[at(p)] = true;
                }
                found.push(Maximum {
                    pos: peak_pos,
                    value: peak as f32,
                });
            }
        }
        found
    }

    /// 按照 [`TokenLayout`] 将检测结果格式化为记号序列.
    pub fn tokens(&self, maxima: &[Maximum]) -> Vec<String> {
        let mut out = Vec::with_capacity(2 + maxima.len() * 3);
        if self.layout.header {
            out.push("X".to_string());
            out.push("Y".to_string());
        }
        for (i, m) in maxima.iter().enumerate() {
            let (h, w) = m.pos;
            if self.layout.index {
                out.push((i + 1).to_string());
            }
            out.push(w.to_string());
            out.push(h.to_string());
        }
        out
    }
}

impl MaximaFinder for ProminenceMaxima {
    fn find_maxima(&mut self, slice: &ScanSlice<'_>, prominence: f64) -> Vec<String> {
        let maxima = self.find(slice, prominence);
        log::trace!("prominence {}: {} maxima", prominence, maxima.len());
        self.tokens(&maxima)
    }
}

/// 将与 `start` 等高且 8-连通的所有像素标记为已处理.
fn settle_plateau<V, N, I>(
    start: Idx2d,
    level: f64,
    settled: &mut [bool],
    width: usize,
    value: &V,
    neighbors: &N,
) where
    V: Fn(Idx2d) -> f64,
    N: Fn(Idx2d) -> I,
    I: Iterator<Item = Idx2d>,
{
    let at = |(h, w): Idx2d| h * width + w;
    settled[at(start)] = true;
    let mut queue = VecDeque::from([start]);
    while let Some(p) = queue.pop_front() {
        for q in neighbors(p) {
            if !settled[at(q)] && value(q) == level {
                settled[at(q)] = true;
                queue.push_back(q);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::OwnedScanSlice;
    use crate::landmark::{classify, Classification, TokenShape};
    use ndarray::Array2;

    fn field() -> OwnedScanSlice {
        let mut a = Array2::from_elem((12, 12), 100.0f32);
        a[(2, 3)] = 1000.0;
        a[(6, 9)] = 800.0;
        a[(9, 2)] = 300.0;
        // 低矮的隆起, 显著度不足.
        a[(9, 8)] = 180.0;
        OwnedScanSlice::from_raw(a)
    }

    #[test]
    fn test_prominent_peaks_sorted_descending() {
        let s = field();
        let f = ProminenceMaxima::default();
        let found = f.find(&s.as_immutable(), 150.0);
        let pos: Vec<_> = found.iter().map(|m| m.pos).collect();
        assert_eq!(pos, vec![(2, 3), (6, 9), (9, 2)]);

        let found = f.find(&s.as_immutable(), 50.0);
        assert_eq!(found.len(), 4);
        assert_eq!(found[3].pos, (9, 8));

        let found = f.find(&s.as_immutable(), 500.0);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_uniform_slice_has_one_maximum() {
        let s = OwnedScanSlice::from_raw(Array2::from_elem((5, 5), 7.0f32));
        let found = ProminenceMaxima::default().find(&s.as_immutable(), 10.0);
        assert_eq!(found, vec![Maximum { pos: (0, 0), value: 7.0 }]);
    }

    #[test]
    fn test_broad_peak_counts_once() {
        let mut a = Array2::from_elem((8, 8), 0.0f32);
        for h in 2..5 {
            for w in 2..5 {
                a[(h, w)] = 500.0;
            }
        }
        a[(3, 3)] = 520.0;
        let s = OwnedScanSlice::from_raw(a);
        let found = ProminenceMaxima::default().find(&s.as_immutable(), 100.0);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].pos, (3, 3));
    }

    #[test]
    fn test_token_layouts_classify() {
        let mut a = Array2::from_elem((20, 20), 0.0f32);
        let peaks = [(1, 5), (4, 12), (9, 3), (10, 15), (16, 6), (18, 14)];
        for (i, &p) in peaks.iter().enumerate() {
            a[p] = 1000.0 - i as f32;
        }
        let s = OwnedScanSlice::from_raw(a);
        for (header, index) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut f = ProminenceMaxima::new(TokenLayout { header, index });
            let t = f.find_maxima(&s.as_immutable(), 150.0);
            let shape = TokenShape::from_flags(header, index);
            assert_eq!(t.len(), shape.token_count());
            match classify(&t) {
                Classification::Exact { shape: got, points } => {
                    assert_eq!(got, shape);
                    assert_eq!((points[0].x, points[0].y), (5.0, 1.0));
                    assert_eq!((points[5].x, points[5].y), (14.0, 18.0));
                }
                c => panic!("unexpected {c:?}"),
            }
        }
    }
}
