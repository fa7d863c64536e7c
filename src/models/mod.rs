pub mod exception;
pub mod order;
pub mod types;
