//! 局部极大值检测输出的解析.
//!
//! 检测器的输出是一个扁平的记号序列, 其具体形状取决于外部的输出格式设置:
//! 可能带有 `X Y` 表头, 也可能每行带有从 1 开始的行号. 这里将四种合法形状显式列举,
//! 无法识别的输出一律按 "过多" 或 "过少" 处理, 绝不猜测着解析.

use std::fmt;

use crate::consts::LANDMARK_COUNT;
use crate::data::Point;

/// 表头所占的记号数 (`X`, `Y`).
const HEADER_LEN: usize = 2;

/// 四种可识别的输出形状.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenShape {
    /// `x y` × 6, 共 12 个记号.
    Plain,

    /// `X Y` 表头 + `x y` × 6, 共 14 个记号.
    Headed,

    /// `i x y` × 6, 共 18 个记号.
    Indexed,

    /// `X Y` 表头 + `i x y` × 6, 共 20 个记号.
    HeadedIndexed,
}

impl TokenShape {
    /// 由是否带表头、是否带行号确定形状.
    #[inline]
    pub const fn from_flags(header: bool, index: bool) -> Self {
        match (header, index) {
            (false, false) => TokenShape::Plain,
            (true, false) => TokenShape::Headed,
            (false, true) => TokenShape::Indexed,
            (true, true) => TokenShape::HeadedIndexed,
        }
    }

    /// 是否带表头.
    #[inline]
    pub const fn has_header(&self) -> bool {
        matches!(self, TokenShape::Headed | TokenShape::HeadedIndexed)
    }

    /// 是否带行号列.
    #[inline]
    pub const fn has_index(&self) -> bool {
        matches!(self, TokenShape::Indexed | TokenShape::HeadedIndexed)
    }

    /// 每个点所占的记号数.
    #[inline]
    pub const fn stride(&self) -> usize {
        if self.has_index() {
            3
        } else {
            2
        }
    }

    /// 第一个点的 `x` 所在的记号位置.
    #[inline]
    pub const fn offset(&self) -> usize {
        let header = if self.has_header() { HEADER_LEN } else { 0 };
        header + self.stride() - 2
    }

    /// 恰好六个点时的记号总数: 12, 14, 18 或 20.
    #[inline]
    pub const fn token_count(&self) -> usize {
        let header = if self.has_header() { HEADER_LEN } else { 0 };
        header + self.stride() * LANDMARK_COUNT
    }
}

impl fmt::Display for TokenShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenShape::Plain => "plain",
            TokenShape::Headed => "headed",
            TokenShape::Indexed => "indexed",
            TokenShape::HeadedIndexed => "headed+indexed",
        };
        f.write_str(s)
    }
}

/// 一次检测输出的分类结果.
#[derive(Clone, Debug, PartialEq)]
pub enum Classification {
    /// 恰好六个点.
    Exact {
        /// 识别出的形状.
        shape: TokenShape,
        /// 六个点, 保持检测器给出的顺序.
        points: [Point; LANDMARK_COUNT],
    },

    /// 点太多, 应提高显著度阈值.
    TooMany {
        /// 推算出的点数.
        points: usize,
    },

    /// 点太少, 应降低显著度阈值.
    TooFew {
        /// 推算出的点数.
        points: usize,
    },
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Exact { shape, .. } => write!(f, "exact ({shape})"),
            Classification::TooMany { points } => write!(f, "too many (~{points} points)"),
            Classification::TooFew { points } => write!(f, "too few (~{points} points)"),
        }
    }
}

/// 数值记号是否构成从 1 开始连续递增的行号列.
///
/// 恰好 12 个记号时总是按无行号的六个点解读, 因为六个点的坐标本身可能恰好排成行号列.
fn is_index_column(body: &[Option<f64>]) -> bool {
    body.len() >= 3
        && body.len() % 3 == 0
        && body.len() != TokenShape::Plain.token_count()
        && body
            .chunks_exact(3)
            .enumerate()
            .all(|(k, row)| row[0] == Some((k + 1) as f64))
}

/// 对检测器的原始记号序列进行分类.
///
/// 1. 首个记号不是数值时, 视为带表头, 跳过 2 个表头记号;
/// 2. 其余记号逐一尝试解析为数值;
/// 3. 若数值列构成 `1, 2, 3, ...` 的行号列, 视为带行号 (恰好 12 个记号时除外);
/// 4. 数值记号恰好为 12 (无行号) 或 18 (带行号) 个时按步长提取六个点,
///    否则与该目标值比较, 得出 "过多" 或 "过少".
pub fn classify<S: AsRef<str>>(tokens: &[S]) -> Classification {
    let header = tokens
        .first()
        .is_some_and(|t| t.as_ref().trim().parse::<f64>().is_err());
    let body = if header {
        &tokens[HEADER_LEN.min(tokens.len())..]
    } else {
        tokens
    };

    let parsed: Vec<Option<f64>> = body
        .iter()
        .map(|t| t.as_ref().trim().parse::<f64>().ok())
        .collect();
    let numeric = parsed.iter().filter(|v| v.is_some()).count();
    let index = is_index_column(&parsed);
    let shape = TokenShape::from_flags(header, index);
    let stride = shape.stride();
    let target = stride * LANDMARK_COUNT;

    if numeric == target && parsed.len() == target {
        let mut points = [Point::default(); LANDMARK_COUNT];
        for (p, row) in points.iter_mut().zip(parsed.chunks_exact(stride)) {
            // 全部记号均已确认为数值.
            let (x, y) = (row[stride - 2], row[stride - 1]);
            *p = Point::new(x.unwrap_or(f64::NAN), y.unwrap_or(f64::NAN));
        }
        return Classification::Exact { shape, points };
    }

    let points = numeric / stride;
    if numeric >= target {
        Classification::TooMany { points }
    } else {
        Classification::TooFew { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XS: [(i32, i32); 6] = [(10, 0), (15, 3), (8, 20), (14, 20), (5, 35), (18, 38)];

    fn tokens(shape: TokenShape, n: usize) -> Vec<String> {
        let mut out = Vec::new();
        if shape.has_header() {
            out.extend(["X".to_string(), "Y".to_string()]);
        }
        for k in 0..n {
            let (x, y) = XS[k % XS.len()];
            if shape.has_index() {
                out.push((k + 1).to_string());
            }
            out.push(x.to_string());
            out.push(y.to_string());
        }
        out
    }

    fn expected() -> [Point; 6] {
        XS.map(|(x, y)| Point::new(x as f64, y as f64))
    }

    #[test]
    fn test_shape_strides() {
        use TokenShape::*;
        assert_eq!(
            [Plain, Headed, Indexed, HeadedIndexed].map(|s| s.token_count()),
            [12, 14, 18, 20]
        );
        assert_eq!(
            [Plain, Headed, Indexed, HeadedIndexed].map(|s| s.offset()),
            [0, 2, 1, 3]
        );
    }

    #[test]
    fn test_all_four_shapes() {
        use TokenShape::*;
        for shape in [Plain, Headed, Indexed, HeadedIndexed] {
            let t = tokens(shape, 6);
            assert_eq!(t.len(), shape.token_count());
            assert_eq!(
                classify(&t),
                Classification::Exact {
                    shape,
                    points: expected()
                },
                "{shape}"
            );
            // 偏移处即第一个点的 x.
            assert_eq!(t[shape.offset()], "10");
        }
    }

    #[test]
    fn test_too_many_and_too_few() {
        use TokenShape::*;
        for shape in [Plain, Headed, Indexed, HeadedIndexed] {
            assert_eq!(
                classify(&tokens(shape, 7)),
                Classification::TooMany { points: 7 },
                "{shape}"
            );
            assert_eq!(
                classify(&tokens(shape, 5)),
                Classification::TooFew { points: 5 },
                "{shape}"
            );
        }
        assert_eq!(
            classify::<&str>(&[]),
            Classification::TooFew { points: 0 }
        );
        assert_eq!(classify(&["X", "Y"]), Classification::TooFew { points: 0 });
    }

    #[test]
    fn test_nine_plain_points_are_not_indexed() {
        // 18 个记号, 但首值不是行号: 九个点.
        let t = tokens(TokenShape::Plain, 9);
        assert_eq!(t.len(), 18);
        assert_eq!(classify(&t), Classification::TooMany { points: 9 });
    }

    #[test]
    fn test_twelve_tokens_read_as_plain_points() {
        // 每隔两个记号恰为 1, 2, 3, 4, 但这是六个无行号的点.
        let body = ["1", "40", "30", "2", "25", "33", "3", "50", "20", "4", "12", "44"];
        let points = [
            (1.0, 40.0),
            (30.0, 2.0),
            (25.0, 33.0),
            (3.0, 50.0),
            (20.0, 4.0),
            (12.0, 44.0),
        ]
        .map(|(x, y)| Point::new(x, y));
        assert_eq!(
            classify(&body),
            Classification::Exact {
                shape: TokenShape::Plain,
                points
            }
        );

        let mut headed = vec!["X", "Y"];
        headed.extend(body);
        assert_eq!(
            classify(&headed),
            Classification::Exact {
                shape: TokenShape::Headed,
                points
            }
        );
    }

    #[test]
    fn test_ragged_or_garbage_fails_closed() {
        let mut t = tokens(TokenShape::Plain, 6);
        t.push("17".to_string());
        assert_eq!(classify(&t), Classification::TooMany { points: 6 });

        let mut t = tokens(TokenShape::Plain, 6);
        t[5] = "n/a".to_string();
        assert_eq!(classify(&t), Classification::TooFew { points: 5 });

        let mut t = tokens(TokenShape::Plain, 6);
        t.push("junk".to_string());
        assert_eq!(classify(&t), Classification::TooMany { points: 6 });
    }
}
