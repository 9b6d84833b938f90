pub mod phase;
pub mod screen;
pub mod stimulus;
pub mod trial;

pub use phase::{Phase, TaskPhase};
pub use screen::Screen;
pub use stimulus::{ColorCategory, NO_RESPONSE, NEUTRAL_RGBA, ResponseKey, Stimulus};
pub use trial::{SessionKind, SessionSummary, Trial};
