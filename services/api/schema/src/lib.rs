//! sea-orm entities for the AgriGuru API database.

pub mod chat_messages;
pub mod contract_applications;
pub mod otp_codes;
pub mod users;
