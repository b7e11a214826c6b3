pub use helpers::extend_router_with_middleware;
pub use middleware::RequestSummary;
pub use traits::ApiError;

pub mod logging;
pub mod middleware;

mod helpers;
mod traits;
