pub mod callback_service;
pub mod mpesa_service;
pub mod password;
