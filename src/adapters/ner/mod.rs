//! NER service integration

pub mod client;
pub mod models;

pub use client::NerClient;
pub use models::{NerEntity, NerRequest, NerResponse};
