pub mod config;
pub mod db;
pub mod error;
pub mod payments;
pub mod routes;

pub use config::PaymentsMode;
