//! Vendor HTTP clients
//!
//! Each client covers one vendor's documented REST surface: typed request
//! parameters in, typed responses out, with non-2xx responses mapped to
//! structured errors for the dispatcher to wrap.

pub mod config;
pub mod design;
pub mod mail;

pub use config::{AdapterConfig, VendorEndpoint};
pub use design::{DesignClient, DesignError, ExportJob};
pub use mail::{MailClient, MailError};
