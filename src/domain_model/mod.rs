mod namespace;
mod policy;
mod principal;
mod token;

pub use namespace::*;
pub use policy::*;
pub use principal::*;
pub use token::*;
