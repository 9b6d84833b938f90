pub mod interval;
pub mod timer;

pub use interval::{IntervalTimer, TimerId, TimerIds};
pub use timer::{FrameStats, HighPrecisionTimer, ManualTimer, Timer};
