pub mod detail_client;
pub mod types;

pub use detail_client::{DetailClient, DetailClientError};
