/// 显示窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 体模扫描的强度单位随设备而变, 因此窗口通常由切片自身的取值范围构建.
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 构建窗口.
    ///
    /// `level` 必须有限, `width` 必须为正且有限, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<CtWindow> {
        if level.is_finite() && width.is_finite() && width > 0.0 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 构建恰好覆盖 `[lo, hi]` 的窗口. 当 `lo == hi` 时窗宽取 1.
    pub fn from_range(lo: f32, hi: f32) -> Option<CtWindow> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return None;
        }
        let width = (hi - lo).max(1.0);
        Self::new(lo + width / 2.0, width)
    }

    /// 构建覆盖 `values` 中所有有限值的窗口. 没有有限值时返回 `None`.
    pub fn from_values<I: IntoIterator<Item = f32>>(values: I) -> Option<CtWindow> {
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Self::from_range(lo, hi)
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前窗口设置下, 强度 `v` 对应的灰度图像素整数值 (0 <= value <= 255)
    ///
    /// 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval(&self, v: f32) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if v <= lb {
            Some(u8::MIN)
        } else if v >= self.upper_bound() {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some((((v - lb) / self.width()) * 255.0) as u8)
        }
    }
}
