mod error;
mod filter;

pub use error::*;
pub use filter::*;
