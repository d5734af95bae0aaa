//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx2d, Idx3d};

pub use crate::data::{
    CtWindow, Ellipse, MetadataSource, Overlay, OverlayKind, Point, Rect, Region, ScanSlice,
    Spacing, Volume,
};

pub use crate::aggregate::{aggregate, ResultsTable, SliceRow};
pub use crate::landmark::{
    ClockPosition, LandmarkSearch, Landmarks, MaximaFinder, ProminenceMaxima, TokenLayout,
};
pub use crate::locate::{EdgePositions, FocalSlice};
pub use crate::pipeline::{Analysis, Located, Pipeline, SpeckReport};
pub use crate::{SpeckConfig, SpeckError, SpeckResult};
