//! Post-processing of raw model text before it is returned to a caller.

/// Turns raw model output into text that is safe to surface.
///
/// The filter borrows the output and returns a new string; the raw text is
/// left untouched for review and scoring.
pub trait OutputFilter: Send + Sync {
    fn filter(&self, model_output: &str) -> String;
}

/// Trims the output, drops control characters and marks it as checked.
#[derive(Debug, Clone)]
pub struct TrustworthinessFilter {
    marker: String,
}

impl TrustworthinessFilter {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for TrustworthinessFilter {
    fn default() -> Self {
        Self::new("Checked: ")
    }
}

impl OutputFilter for TrustworthinessFilter {
    fn filter(&self, model_output: &str) -> String {
        let cleaned: String = model_output
            .trim()
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();
        format!("{}{}", self.marker, cleaned)
    }
}
