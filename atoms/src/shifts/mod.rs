// Re-export model types and store functions
pub mod model;
pub mod service;
pub mod memory;
pub mod http;

pub use model::{Shift, CreateShiftPayload, UpdateNotesPayload, DeleteAllResponse};
pub use service::*;
pub use memory::MemoryShiftStore;
pub use http::*;
