pub mod registration;
pub mod roster;
pub mod workshops;

pub use registration::Registration;
pub use roster::{Institution, RosterEntry};
pub use workshops::{Day, Workshop, WorkshopAvailability, WorkshopCatalog};
