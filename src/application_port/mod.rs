mod session_service;
mod token_codec;
mod token_manager;

pub use session_service::*;
pub use token_codec::*;
pub use token_manager::*;
