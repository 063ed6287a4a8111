// src/swehockey/mod.rs
pub mod client;
pub mod leagues;

pub use client::Page;
pub use leagues::League;
