use crate::BoxError;

/// A source for the cluster id or the machine id of a generator.
///
/// Providers are invoked exactly once, when a generator is constructed. Their
/// values must be unique per running instance across everything that shares
/// a layout; the generator does not verify this.
///
/// Any closure `Fn() -> Result<u64, E>` where `E` converts into [`BoxError`]
/// is a provider:
///
/// ```
/// use kubeflake::{BoxError, IdProvider};
///
/// let provider = || -> Result<u64, BoxError> { Ok(7) };
/// assert_eq!(provider.id().unwrap(), 7);
/// ```
pub trait IdProvider: Send + Sync {
    /// Resolves the id.
    ///
    /// # Errors
    ///
    /// Any failure is surfaced unchanged as
    /// [`Error::ProviderFailure`](crate::Error::ProviderFailure) by the
    /// generator constructor.
    fn id(&self) -> Result<u64, BoxError>;
}

/// A provider that always yields the same value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StaticId(pub u64);

impl IdProvider for StaticId {
    fn id(&self) -> Result<u64, BoxError> {
        Ok(self.0)
    }
}

impl<F, E> IdProvider for F
where
    F: Fn() -> Result<u64, E> + Send + Sync,
    E: Into<BoxError>,
{
    fn id(&self) -> Result<u64, BoxError> {
        self().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_id_is_constant() {
        let p = StaticId(42);
        assert_eq!(p.id().unwrap(), 42);
        assert_eq!(p.id().unwrap(), 42);
    }

    #[test]
    fn closure_errors_are_boxed() {
        let p = || "17x".parse::<u64>();
        let err = p.id().unwrap_err();
        assert!(err.downcast_ref::<core::num::ParseIntError>().is_some());
    }
}
