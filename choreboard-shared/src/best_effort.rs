/// Outcome type for side-effecting writes that must not fail their parent
///
/// History entries and notifications are written alongside a task mutation,
/// but a failure to write them never rolls the mutation back. Functions doing
/// such writes return [`BestEffort`] instead of `Result`: the failure has
/// already been logged by the time the caller sees it, and the caller is free
/// to drop the value.

/// Result of a best-effort write
#[derive(Debug)]
pub enum BestEffort<T> {
    /// The write went through
    Written(T),

    /// Nothing needed writing (e.g. an empty diff, or the actor is the only recipient)
    Skipped,

    /// The write failed; the error has been logged
    Failed(String),
}

impl<T> BestEffort<T> {
    /// Wraps a store result, logging a failure under `what`
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>, what: &str) -> Self {
        match result {
            Ok(value) => BestEffort::Written(value),
            Err(e) => {
                tracing::warn!(error = %e, "{} failed; continuing without it", what);
                BestEffort::Failed(e.to_string())
            }
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, BestEffort::Written(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BestEffort::Failed(_))
    }

    /// The written value, if any
    pub fn written(self) -> Option<T> {
        match self {
            BestEffort::Written(value) => Some(value),
            BestEffort::Skipped | BestEffort::Failed(_) => None,
        }
    }
}
