use crate::Idx2d;

/// 行优先索引迭代器.
///
/// 与 `(0..h).flat_map(|y| (0..w).map(move |x| (y, x)))` 等价,
/// 但对象更小, 且能直接作为结构体字段保存.
#[derive(Debug, Clone)]
pub struct PosIter {
    cur_h: usize,
    cur_w: usize,
    h: usize,
    w: usize,
}

impl PosIter {
    #[inline]
    pub fn new((h, w): Idx2d) -> Self {
        Self {
            cur_h: 0,
            cur_w: 0,
            h,
            w,
        }
    }
}

impl Iterator for PosIter {
    type Item = Idx2d;

    fn next(&mut self) -> Option<Self::Item> {
        if self.w == 0 || self.cur_h >= self.h {
            return None;
        }
        let ret_pos = (self.cur_h, self.cur_w);
        self.cur_w += 1;
        if self.cur_w == self.w {
            self.cur_w = 0;
            self.cur_h += 1;
        }
        Some(ret_pos)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = if self.w == 0 || self.cur_h >= self.h {
            0
        } else {
            (self.h - self.cur_h) * self.w - self.cur_w
        };
        (left, Some(left))
    }
}

impl ExactSizeIterator for PosIter {}
