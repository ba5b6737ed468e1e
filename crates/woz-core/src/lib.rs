pub mod classify;
pub mod commands;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod form;
pub mod message;
pub mod payload;
pub mod selection;
pub mod session;
pub mod transcript;

pub use classify::*;
pub use engine::*;
pub use message::*;
pub use payload::*;
pub use selection::*;

pub use config::ProtocolConfig;
pub use error::WozError;
