pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use error::*;
pub use middleware::*;
pub use routes::*;
