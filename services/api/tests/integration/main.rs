
mod account_test;
mod chat_test;
mod contract_test;
mod notify_test;
mod otp_test;
mod router_test;
mod whatsapp_test;
