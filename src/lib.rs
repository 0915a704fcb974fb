pub mod api;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod liveness;
pub mod logging;
pub mod model;
pub mod poller;
