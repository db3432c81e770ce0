mod health;
mod url;

pub use health::{health_handler, root_handler};
pub use url::{create_link_handler, redirect_handler, stats_handler};
