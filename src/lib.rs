pub mod cli;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod history;
pub mod media;
pub mod thumbnail;
pub mod workflow;
