pub mod crm_service;
pub mod delivery_service;
pub mod document_service;
pub mod export_service;
pub mod job_service;
pub mod messaging_service;
pub mod quote_service;
