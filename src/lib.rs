//! FitTrack Library
//!
//! Ingredient and recipe nutrition, daily intake logging, body metrics,
//! workout plans and habits, served over MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
