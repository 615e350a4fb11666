mod config;
pub use self::config::{Config, Host};

pub mod globals;

mod start;
pub use self::start::{UploadArgs, get_config_path, start};

mod commands;
mod dispatch;
pub use self::dispatch::dispatch;
