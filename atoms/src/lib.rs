pub mod caregivers;
pub mod catalog;
pub mod respond;
pub mod session;
pub mod shifts;
