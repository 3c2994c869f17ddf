pub mod config;
pub mod decimal;
pub mod logging;
pub mod middleware;
