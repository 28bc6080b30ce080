pub mod audit_client;

pub use audit_client::{HttpAuditClient, RemoteTaskClient};
