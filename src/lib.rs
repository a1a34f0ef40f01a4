//! filedb - documents stored as files, one directory per collection
//!
//! The storage driver in [`driver`] is the core. [`http_server`] and [`cli`]
//! are thin front ends over it.

pub mod cli;
pub mod crash_point;
pub mod driver;
pub mod http_server;
pub mod observability;
