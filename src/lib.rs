#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod util;
