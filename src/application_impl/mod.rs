mod jwt_token_codec;
mod refresh_session_store_impl;
mod session_service_impl;
mod token_manager_impl;

pub use jwt_token_codec::*;
pub use refresh_session_store_impl::*;
pub use session_service_impl::*;
pub use token_manager_impl::*;
