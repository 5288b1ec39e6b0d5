pub mod check;
pub mod config;
pub mod migrate;
pub mod status;

pub use check::run_check;
pub use migrate::{list_migrations, run_migrate};
pub use status::show_status;
