pub mod availability_service;
pub mod form_flow_service;
pub mod registration_service;
pub mod registrations_cache;
pub mod roster_service;
pub mod sheets_service;
