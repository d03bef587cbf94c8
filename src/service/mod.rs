pub mod booking_service;
pub mod chat_service;
pub mod openai_service;
pub mod session_service;
pub mod tools;
