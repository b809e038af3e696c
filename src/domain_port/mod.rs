mod key_store;
mod refresh_session_store;

pub use key_store::*;
pub use refresh_session_store::*;
