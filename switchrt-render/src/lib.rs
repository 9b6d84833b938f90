pub mod digits;
pub mod render;

pub use digits::{DigitCell, SegmentRect, layout_number};
pub use render::{RenderStats, SkiaRenderer, caption};
