pub mod format;

pub use format::{format_entry, normalize_text, with_ellipsis};

pub const REPORT_TITLE: &str = "Comments to the Author";

/// One formatted report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub page_number: usize,
    pub text: String,
}

/// Entries in page order, then annotation order within each page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_page(&mut self, entries: Vec<ReportEntry>) {
        self.entries.extend(entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The title, a blank line, then one line per entry.
    pub fn lines(&self) -> Vec<&str> {
        let mut lines = Vec::with_capacity(self.entries.len() + 2);
        lines.push(REPORT_TITLE);
        lines.push("");
        lines.extend(self.entries.iter().map(|entry| entry.text.as_str()));
        lines
    }

    /// Full file contents, every line newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
