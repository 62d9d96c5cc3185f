pub mod actor;
pub mod seen_cache;
