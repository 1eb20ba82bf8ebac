pub mod image_service;
pub mod transfer_service;
