pub mod matrix;
pub mod pdf;
pub mod reports;
pub mod types;
pub mod weeks;
