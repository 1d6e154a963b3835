pub mod check_service;
pub mod order_service;
