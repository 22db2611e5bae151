// Static reference data shared by the tracker, the store and the reports
pub mod model;

pub use model::*;
