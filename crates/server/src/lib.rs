pub mod errors;
pub mod openapi;
pub mod responses;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{app, run};
