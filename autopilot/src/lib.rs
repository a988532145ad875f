pub mod arena;
pub mod benchmark;
pub mod config;
pub mod driver;
pub mod search;
pub mod util;
