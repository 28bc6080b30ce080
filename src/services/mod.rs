pub mod audit_state;
pub mod invocation_tracker;
pub mod report_writer;
pub mod result_store;
pub mod slot_registry;

pub use audit_state::{AuditState, SharedState};
pub use invocation_tracker::{InFlightTracker, InvocationToken, InvocationTokens};
pub use report_writer::{ReportSink, ReportWriter};
pub use result_store::{ResultStore, SlotResults};
pub use slot_registry::SlotRegistry;
