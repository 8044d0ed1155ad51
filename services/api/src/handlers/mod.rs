pub mod advisory;
pub mod alerts;
pub mod auth;
pub mod chat;
pub mod contract;
pub mod extract;
pub mod profile;
pub mod session;
pub mod weather;
pub mod whatsapp;
