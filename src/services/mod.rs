pub mod exception_service;
pub mod executor;
pub mod numeric;
pub mod order_service;
pub mod signature;
