use thiserror::Error;

/// Result alias for `mixclust`.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Stage {
    /// Gower distance matrix computation.
    Distance,
    /// Condensing the distance matrix.
    Condense,
    /// Complete-linkage merge sequence.
    Linkage,
    /// Dendrogram projection.
    Dendrogram,
    /// Flat cluster assignment.
    Assign,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Stage::Distance => "distance",
            Stage::Condense => "condense",
            Stage::Linkage => "linkage",
            Stage::Dendrogram => "dendrogram",
            Stage::Assign => "assign",
        };
        f.write_str(name)
    }
}

/// Errors returned by the distance, linkage and cut primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// Matrix, vector or table has the wrong shape.
    #[error("shape error: expected {expected}, found {found}")]
    Shape {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        found: String,
    },

    /// Input data cannot be clustered as given.
    #[error("input error: {0}")]
    Input(String),

    /// A caller-supplied parameter is out of range.
    #[error("invalid argument '{name}': {message}")]
    Argument {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A merge distance dropped below its predecessor by more than the tolerance.
    #[error(
        "non-monotonic merge at step {step}: {distance} < previous {previous} (tolerance {tolerance})"
    )]
    NumericGuard {
        /// Merge index (0-based).
        step: usize,
        /// Raw merge distance.
        distance: f64,
        /// Distance of the previous merge.
        previous: f64,
        /// Allowed deviation.
        tolerance: f64,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A pipeline stage failed.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// Stage that failed.
        stage: Stage,
        /// Underlying error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn shape(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Error::Shape {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn argument(name: &'static str, message: impl Into<String>) -> Self {
        Error::Argument {
            name,
            message: message.into(),
        }
    }

    pub(crate) fn at(self, stage: Stage) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Stage the error is attributed to, if it passed through the pipeline.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Innermost error, with any stage wrapper removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// `true` for errors that leave earlier pipeline artifacts reusable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.root(), Error::Argument { .. })
    }
}
