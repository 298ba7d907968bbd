pub mod core;
pub mod export;
pub mod lines;
pub mod parser;
pub mod pipeline;
pub mod report;

pub use crate::core::model::{Annotation, AnnotationKind, PageContent};
pub use lines::{LineConfig, LineSource};
pub use report::{Report, ReportEntry};
