//! Repository factory trait
//!
//! Lets callers build repositories without naming their concrete configuration.

/// A trait for database repository factories
///
/// Generic over the repository type and the value it is built from.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}
