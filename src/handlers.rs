pub mod customers;
pub mod documents;
pub mod jobs;
pub mod quotes;
