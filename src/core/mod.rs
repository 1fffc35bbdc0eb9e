mod field;
mod finding;
mod property;
mod report;
mod severity;

pub use field::{FieldDescriptor, FieldKind};
pub use finding::{EndpointFinding, EndpointStatus, ExtraField, MissingField, UnionIssue};
pub use property::PropertyDescriptor;
pub use report::{ReportInputs, ReportSummary, ValidationReport};
pub use severity::Severity;
