pub mod document;
pub mod loaders;
pub mod report;
pub mod result;
pub mod task;
pub mod verdict;

pub use document::{DocumentSlot, FileFormat, UploadedDocument};
pub use loaders::{load_manifest, AuditManifest, ReportRequest};
pub use report::{report_file_name, ReportAction, ReportArtifact};
pub use result::{RunStats, TaskResult, TaskStatus};
pub use task::{GroupingStrategy, TaskId, REPORT_ENDPOINT};
pub use verdict::{ResponseShape, Signal};
