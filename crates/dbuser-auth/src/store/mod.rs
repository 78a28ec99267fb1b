//! Database user store.

mod config;
mod users;


pub use config::QueryConfig;
pub use users::DbUserStore;
