//! Personal timesheet for logging work sessions against courses. Sessions and hourly rates live in
//! two json documents, statistics are derived from them on every read. Everything is available
//! through the cli and a small http api.
//!

pub mod cli;
pub mod fs;
pub mod server;
pub mod stats;
pub mod storage;
pub mod utils;
