pub mod contact;
pub mod invoice;
pub mod organization;
pub mod token;
pub mod user;
pub mod xero_date;

pub use contact::{Contact, ContactDraft};
pub use invoice::{Invoice, InvoiceStatus, InvoiceUpdate};
pub use organization::Organization;
pub use token::TokenPair;
pub use user::SessionUser;
