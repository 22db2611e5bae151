pub mod clock;
pub mod model;
pub mod tracker;

pub use clock::{format_duration, format_elapsed, resolve_start_time};
pub use model::{ActiveShift, ActiveView, ShiftState, ShiftView, StartShiftPayload, SummaryView, UpdateSessionNotesPayload};
pub use tracker::ShiftSession;
