mod key_store_redis;

pub use key_store_redis::*;
