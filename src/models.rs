pub mod crm;
pub mod integrations;
pub mod job;
pub mod quote;
