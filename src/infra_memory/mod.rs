mod key_store_memory;

pub use key_store_memory::*;
