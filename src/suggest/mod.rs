pub mod ai_client;
pub mod matcher;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod suggestion_model;
