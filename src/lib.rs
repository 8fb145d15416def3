pub mod bitmap;
pub mod blk;
pub mod error;
pub mod tags;
pub mod touch;
pub mod trace;

pub use bitmap::TouchBitmap;
pub use blk::{Addr, BlkStatus, CacheBlk, Tick};
pub use error::TraceError;
pub use tags::TagStore;
pub use touch::serialize::TouchStats;
pub use touch::{Direction, TouchTracker};
