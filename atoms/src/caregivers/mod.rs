pub mod model;

pub use model::{resolve_caregiver_name, OnCallCaregiver};
