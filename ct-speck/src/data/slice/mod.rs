//! CT 扫描切片对象的操作.

mod core;
mod iter;

pub use core::{OwnedScanSlice, Profile, RegionStats, ScanSlice, ScanSliceMut};

pub(crate) use iter::PosIter;
