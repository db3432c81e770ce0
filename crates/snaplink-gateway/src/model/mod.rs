mod health;
mod url;

pub use health::{HealthResponse, WelcomeResponse};
pub use url::{CreateLinkRequest, ErrorResponse, LinkResponse};
