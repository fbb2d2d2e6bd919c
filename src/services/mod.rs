pub mod content_types;
pub mod storage_service;
