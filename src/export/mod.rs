pub mod text_export;

use anyhow::Result;

use crate::report::Report;

pub use text_export::TextExporter;

pub trait Exporter {
    fn export(&self, report: &Report) -> Result<()>;
}
