pub mod gateway_relay;
pub mod health;
pub mod notification_relay;
pub mod oauth2_client;
pub mod pcf;
pub mod policy_db;
pub mod sbi_mapping;
pub mod session_controller;
pub mod usage_update;
