pub mod config;
pub mod error;
pub mod text;
pub mod types;

pub use config::Config;
pub use error::{BriefwireError, Result};
pub use text::{truncate_to_char_boundary, url_hash};
pub use types::*;
