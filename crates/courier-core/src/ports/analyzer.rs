use crate::domain::Finding;
use crate::error::ProcessingError;

/// Content analyzer. Synchronous and CPU-bound; callers run it on the
/// blocking pool.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<Vec<Finding>, ProcessingError>;
}
