use serde::{Deserialize, Serialize};

/// Machine-readable outcome of a validation pass.
///
/// Errors are structurally invalid values; warnings are plausible but
/// unusual ones. Neither stops processing; callers decide what blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// True when no errors were recorded (warnings are allowed)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_invalidate() {
        let mut report = ValidationReport::new();
        report.warn("unusual mileage");
        assert!(report.is_valid());

        report.error("bad plate");
        assert!(!report.is_valid());
        assert_eq!(report.errors, vec!["bad plate".to_string()]);
    }
}
