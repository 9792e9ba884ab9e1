pub mod logging;
pub mod routes;

pub use routes::router;
