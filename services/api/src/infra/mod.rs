pub mod cache;
pub mod chat_hub;
pub mod db;
pub mod google;
pub mod llm;
pub mod mail;
pub mod messaging;
