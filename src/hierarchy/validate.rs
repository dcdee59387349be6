//! Linkage validation and health checking utilities.
//!
//! Verifies the structural invariants of a merge history:
//! - exactly n-1 merges over n records
//! - merge distances are finite and non-decreasing
//! - every id refers to an existing cluster and is consumed exactly once
//! - each merge size equals the sum of its children's sizes
//!
//! # Example
//!
//! ```rust
//! use mixclust::hierarchy::{validate_linkage, LinkageMatrix};
//!
//! let z = LinkageMatrix::from_rows(3, &[(0, 1, 0.1, 2), (2, 3, 0.4, 3)]).unwrap();
//! let report = validate_linkage(&z);
//! assert!(report.is_healthy(), "{report}");
//! ```

use std::collections::HashMap;

use super::linkage::LinkageMatrix;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A problem that should be fixed.
    Error,
    /// A critical issue that may cause failures.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Merge step involved, if any.
    pub step: Option<usize>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            step: None,
        }
    }

    /// Attach the merge step.
    pub fn at_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(step) = self.step {
            write!(f, " (step {})", step)?;
        }
        Ok(())
    }
}

/// Report from a validation/health check.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Check if the report contains no errors or critical issues.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// Check if there are any issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Get issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Health report with summary statistics.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Validation issues.
    pub validation: ValidationReport,
    /// Number of records.
    pub n_items: usize,
    /// Number of merges.
    pub n_merges: usize,
    /// Largest merge distance.
    pub max_distance: f64,
    /// Merges that were clamped for monotonicity.
    pub n_clamped: usize,
}

impl HealthReport {
    /// Check if the linkage is healthy (no errors or critical issues).
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Linkage Health Report")?;
        writeln!(f, "=====================")?;
        writeln!(f, "Records: {} ({} merges)", self.n_items, self.n_merges)?;
        writeln!(f, "Max distance: {:.4}", self.max_distance)?;
        writeln!(f, "Clamped merges: {}", self.n_clamped)?;
        writeln!(f)?;
        write!(f, "{}", self.validation)
    }
}

/// Trait for types that can be health-checked.
pub trait HealthCheck {
    /// Perform a health check and return a report.
    fn health_check(&self) -> HealthReport;

    /// Quick check: returns true if healthy.
    fn is_healthy(&self) -> bool {
        self.health_check().is_healthy()
    }
}

impl HealthCheck for LinkageMatrix {
    fn health_check(&self) -> HealthReport {
        let mut validation = validate_linkage(self);
        if !self.clamped_steps().is_empty() {
            validation.add(ValidationIssue::new(
                Severity::Info,
                format!(
                    "{} merge distance(s) clamped to stay monotonic",
                    self.clamped_steps().len()
                ),
            ));
        }
        HealthReport {
            validation,
            n_items: self.n_items(),
            n_merges: self.n_merges(),
            max_distance: self
                .merges()
                .iter()
                .map(|m| m.distance)
                .fold(0.0, f64::max),
            n_clamped: self.clamped_steps().len(),
        }
    }
}

/// Check the structural invariants of a merge history.
pub fn validate_linkage(linkage: &LinkageMatrix) -> ValidationReport {
    let mut report = ValidationReport::new();
    let n = linkage.n_items();

    if n == 0 {
        report.add(ValidationIssue::new(Severity::Critical, "linkage has no records"));
        return report;
    }
    if linkage.n_merges() != n - 1 {
        report.add(ValidationIssue::new(
            Severity::Error,
            format!("expected {} merges, found {}", n - 1, linkage.n_merges()),
        ));
    }

    let mut consumed = vec![false; n + linkage.n_merges()];
    let mut previous = f64::NEG_INFINITY;

    for (step, m) in linkage.merges().iter().enumerate() {
        if !m.distance.is_finite() {
            report.add(
                ValidationIssue::new(Severity::Critical, "merge distance is not finite")
                    .at_step(step),
            );
        } else if m.distance < previous {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("distance {} below previous {}", m.distance, previous),
                )
                .at_step(step),
            );
        } else if !(0.0..=1.0).contains(&m.distance) {
            report.add(
                ValidationIssue::new(
                    Severity::Warning,
                    format!("distance {} outside the Gower range [0, 1]", m.distance),
                )
                .at_step(step),
            );
        }
        previous = previous.max(m.distance);

        for id in [m.left, m.right] {
            if id >= n + step {
                report.add(
                    ValidationIssue::new(
                        Severity::Critical,
                        format!("cluster {} does not exist yet", id),
                    )
                    .at_step(step),
                );
            } else if std::mem::replace(&mut consumed[id], true) {
                report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        format!("cluster {} merged more than once", id),
                    )
                    .at_step(step),
                );
            }
        }

        let expected = linkage.size_of(m.left) + linkage.size_of(m.right);
        if m.left < n + step && m.right < n + step && m.size != expected {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("size {} but children hold {}", m.size, expected),
                )
                .at_step(step),
            );
        }
    }

    report
}
