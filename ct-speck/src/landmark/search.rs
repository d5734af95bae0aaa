//! 显著度阈值的自适应搜索.
//!
//! 从初始阈值出发, 点太多则提高阈值, 点太少则降低阈值, 直到恰好检测出六个点.
//! 搜索有明确的终止条件: 尝试次数达到上限, 或阈值无法继续降低.

use crate::config::SpeckConfig;
use crate::consts::LANDMARK_COUNT;
use crate::data::{Point, ScanSlice};
use crate::error::{SpeckError, SpeckResult};
use crate::landmark::maxima::MaximaFinder;
use crate::landmark::tokens::{classify, Classification, TokenShape};

/// 对阈值的一次调整.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transition {
    /// 点太多, 提高阈值.
    Raise,

    /// 点太少, 降低阈值.
    Lower,

    /// 恰好六个点, 搜索结束.
    Done,
}

/// 阈值搜索的状态机. 只维护阈值与尝试次数, 不涉及检测本身.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdSearch {
    threshold: f64,
    initial: f64,
    step: f64,
    iterations: u32,
    max_iterations: u32,
    last: Option<Transition>,
    oscillating: bool,
}

impl ThresholdSearch {
    /// 以初始阈值, 步长和最大尝试次数构建.
    pub fn new(initial: f64, step: f64, max_iterations: u32) -> Self {
        Self {
            threshold: initial,
            initial,
            step,
            iterations: 0,
            max_iterations,
            last: None,
            oscillating: false,
        }
    }

    /// 由配置构建.
    #[inline]
    pub fn from_config(config: &SpeckConfig) -> Self {
        Self::new(
            config.initial_prominence,
            config.prominence_step,
            config.max_iterations,
        )
    }

    /// 下一次尝试应使用的阈值.
    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 已完成的尝试次数.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// 是否曾在提高和降低之间来回切换.
    #[inline]
    pub fn is_oscillating(&self) -> bool {
        self.oscillating
    }

    /// 记录一次尝试的分类结果, 并据此调整阈值.
    ///
    /// 恰好六个点时返回 [`Transition::Done`], 阈值保持为本次所用的值.
    /// 尝试次数达到上限, 或需要降低而阈值已为 0 时, 返回 `Err(SpeckError::NotConverged)`.
    pub fn observe(&mut self, classification: &Classification) -> SpeckResult<Transition> {
        self.iterations += 1;
        let transition = match classification {
            Classification::Exact { .. } => return Ok(Transition::Done),
            Classification::TooMany { .. } => Transition::Raise,
            Classification::TooFew { .. } => Transition::Lower,
        };

        let stuck = transition == Transition::Lower && self.threshold <= 0.0;
        if self.iterations >= self.max_iterations || stuck {
            return Err(SpeckError::NotConverged {
                iterations: self.iterations,
                threshold: self.threshold,
                last: classification.to_string(),
            });
        }

        if self.last.is_some_and(|t| t != transition) && !self.oscillating {
            self.oscillating = true;
            log::warn!(
                "prominence search oscillates around {} (step {})",
                self.threshold,
                self.step
            );
        }
        self.last = Some(transition);
        self.threshold = match transition {
            Transition::Raise => self.threshold + self.step,
            _ => (self.threshold - self.step).max(0.0),
        };
        Ok(transition)
    }
}

/// 阈值搜索的结果.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LandmarkSearch {
    /// 检测到的六个点, 保持检测器给出的顺序.
    pub points: [Point; LANDMARK_COUNT],

    /// 最终使用的阈值.
    pub threshold: f64,

    /// 初始阈值.
    pub initial_threshold: f64,

    /// 检测次数.
    pub iterations: u32,

    /// 最后一次检测输出的形状.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub shape: TokenShape,
}

impl LandmarkSearch {
    /// 初始阈值即可检出六个点时为 `true`.
    #[inline]
    pub fn used_default_threshold(&self) -> bool {
        self.threshold == self.initial_threshold
    }
}

/// 在焦平面 `slice` 上反复调用 `finder`, 直到恰好检出六个点.
pub fn find_landmarks<F: MaximaFinder + ?Sized>(
    finder: &mut F,
    slice: &ScanSlice<'_>,
    config: &SpeckConfig,
) -> SpeckResult<LandmarkSearch> {
    let mut search = ThresholdSearch::from_config(config);
    loop {
        let threshold = search.threshold();
        let tokens = finder.find_maxima(slice, threshold);
        let classification = classify(&tokens);
        log::debug!(
            "attempt {}: prominence {} gives {} tokens, {}",
            search.iterations() + 1,
            threshold,
            tokens.len(),
            classification
        );

        if search.observe(&classification)? == Transition::Done {
            if let Classification::Exact { shape, points } = classification {
                return Ok(LandmarkSearch {
                    points,
                    threshold,
                    initial_threshold: config.initial_prominence,
                    iterations: search.iterations(),
                    shape,
                });
            }
        }
    }
}
