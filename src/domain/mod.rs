pub mod model;
pub mod registration;
pub mod verify;
