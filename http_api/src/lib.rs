pub use crate::{http_api_config::HttpApiConfig, task::HttpApi};

mod endpoints;
mod error;
mod extractors;
mod http_api_config;
mod routing;
mod task;
