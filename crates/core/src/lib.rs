pub mod config;
pub mod review;
