pub mod inventory;
pub mod search;
pub mod segment;
pub mod status;
