//! Mediaconv Telegram bot
//!
//! Menus, callback tokens and per-user sessions are plain Rust; the
//! [`telegram`] module is the only part that talks to Telegram.

pub mod callback;
pub mod menu;
pub mod service;
pub mod session;
pub mod telegram;

pub use callback::{CallbackAction, ConversionChoice};
pub use menu::Menu;
pub use service::{BotService, Delivery, ServiceError, Upload, UploadReply};
pub use session::{Session, SessionStore};
