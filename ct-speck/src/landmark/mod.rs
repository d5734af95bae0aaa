//! 焦平面上六个标记点的检测与归位.

mod canonical;
mod maxima;
mod search;
mod tokens;

pub use canonical::{canonicalize, ClockPosition, Landmarks};
pub use maxima::{MaximaFinder, Maximum, ProminenceMaxima, TokenLayout};
pub use search::{find_landmarks, LandmarkSearch, ThresholdSearch, Transition};
pub use tokens::{classify, Classification, TokenShape};
