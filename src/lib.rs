pub mod auth;
#[cfg(feature = "browser")]
pub mod browser;
pub mod chat;
pub mod config;
pub mod console;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod export;
pub mod format;
pub mod page;
