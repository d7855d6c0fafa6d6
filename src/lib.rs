pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod paths;
pub mod process;
