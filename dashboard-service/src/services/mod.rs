pub mod filter;
pub mod identity;
pub mod metrics;
pub mod session_registry;
pub mod token_manager;
pub mod xero_client;

pub use identity::IdentityClient;
pub use session_registry::SessionRegistry;
pub use token_manager::TokenManager;
pub use xero_client::XeroClient;
