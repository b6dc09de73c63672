pub mod metrics;
pub mod session;

pub use self::metrics::metrics_middleware;
pub use self::session::{AuthUser, XeroSession};
