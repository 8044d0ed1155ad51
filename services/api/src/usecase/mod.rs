pub mod account;
pub mod advisory;
pub mod chat;
pub mod contract;
pub mod notify;
pub mod otp;
pub mod session;
pub mod weather;
pub mod whatsapp;
