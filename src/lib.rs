pub mod config;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod practicum;
pub mod status;
