// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod config;
pub mod core;

pub mod cache;
pub mod cli;
pub mod csv;
pub mod export;
pub mod manager;
pub mod player;
pub mod progress;
pub mod scheduler;
pub mod source;
pub mod transfermarkt;
