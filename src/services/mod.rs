pub mod naming;
pub mod record_service;
pub mod routing;
pub mod storage_service;
