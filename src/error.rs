use core::fmt;

/// Result alias for `fiedler`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by pipeline construction, stage transforms and fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Matrix dimension mismatch (usize).
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Shape mismatch (string description).
    ShapeMismatch {
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A stage or variant name that is not in the registry.
    UnknownVariant {
        /// Configuration field (stage name, or `stage` for unknown stage names).
        stage: &'static str,
        /// The rejected value.
        given: String,
        /// Every accepted value for this field.
        valid: &'static [&'static str],
    },

    /// A stage received an artifact it cannot consume.
    StageContract {
        /// Stage that rejected its input.
        stage: &'static str,
        /// Artifact kind the stage consumes.
        expected: &'static str,
        /// Artifact kind that arrived.
        found: &'static str,
    },

    /// An intermediate matrix contains NaN or infinite entries.
    NonFinite {
        /// Stage that produced the matrix.
        stage: &'static str,
        /// Name of the offending matrix.
        matrix: &'static str,
    },

    /// Eigensolver failure.
    Decomposition {
        /// Solver variant.
        method: &'static str,
        /// Error message.
        message: String,
    },

    /// Graph is disconnected where connected was required.
    DisconnectedGraph {
        /// Second-smallest eigenvalue that triggered the check.
        lambda2: f64,
    },

    /// Operation is not available for this configuration.
    Unsupported(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, actual {actual}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::UnknownVariant {
                stage,
                given,
                valid,
            } => {
                write!(
                    f,
                    "unknown value '{given}' for '{stage}'; valid choices: {}",
                    valid.join(", ")
                )
            }
            Error::StageContract {
                stage,
                expected,
                found,
            } => {
                write!(f, "stage '{stage}' expects {expected}, received {found}")
            }
            Error::NonFinite { stage, matrix } => {
                write!(f, "stage '{stage}' produced non-finite values in {matrix}")
            }
            Error::Decomposition { method, message } => {
                write!(f, "{method} eigendecomposition failed: {message}")
            }
            Error::DisconnectedGraph { lambda2 } => {
                write!(
                    f,
                    "graph is disconnected: second-smallest eigenvalue {lambda2:e} is not positive"
                )
            }
            Error::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_variant_lists_choices() {
        let err = Error::UnknownVariant {
            stage: "refinement",
            given: "knnn".to_string(),
            valid: &["eps", "knn"],
        };
        let msg = err.to_string();
        assert!(msg.contains("refinement"));
        assert!(msg.contains("knnn"));
        assert!(msg.contains("eps, knn"));
    }

    #[test]
    fn non_finite_names_stage_and_matrix() {
        let msg = Error::NonFinite {
            stage: "laplacian",
            matrix: "laplacian matrix",
        }
        .to_string();
        assert!(msg.contains("laplacian"));
        assert!(msg.contains("non-finite"));
    }
}
