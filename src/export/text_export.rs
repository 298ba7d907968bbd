use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

use crate::export::Exporter;
use crate::report::Report;

/// Writes the rendered report to a single text file. The file is written next to its final
/// location and renamed into place once complete.
#[derive(Debug, Clone)]
pub struct TextExporter {
    path: PathBuf,
}

impl TextExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Exporter for TextExporter {
    fn export(&self, report: &Report) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let mut file = NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
        file.write_all(report.render().as_bytes())?;
        file.flush()?;
        file.persist(&self.path)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_report_and_creates_directories() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("paper_annotations.txt");

        let mut report = Report::new();
        report.extend_page(vec![ReportEntry {
            page_number: 1,
            text: "Page 1, line 3, \"...x...\": fix".to_string(),
        }]);
        TextExporter::new(path.clone()).export(&report)?;

        assert_eq!(
            fs::read_to_string(&path)?,
            "Comments to the Author\n\nPage 1, line 3, \"...x...\": fix\n"
        );
        Ok(())
    }

    #[test]
    fn overwrites_existing_report() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("out.txt");
        fs::write(&path, "stale contents that are much longer than the new report")?;

        TextExporter::new(path.clone()).export(&Report::new())?;
        assert_eq!(fs::read_to_string(&path)?, "Comments to the Author\n\n");
        Ok(())
    }
}
