pub mod availability;
pub mod form;
