//! Amazon ECS adapter.

pub mod client;
pub mod models;
pub mod signing;

pub use client::{default_endpoint, EcsClient};
pub use signing::{AwsCredentials, RequestSigner};
