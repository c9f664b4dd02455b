use std::any::type_name;
use std::sync::PoisonError;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MutexError {
    /// A lock guarding shared state was poisoned. Contains the [`type_name`] of the guard and the
    /// original error message.
    #[error("Unable to acquire lock `{0}`; the lock is poisoned. Err: {1}")]
    Poison(String, String),

    #[error(transparent)]
    Other(#[from] Box<dyn Send + Sync + std::error::Error>),
}

impl<T> From<PoisonError<T>> for crate::error::Error {
    fn from(value: PoisonError<T>) -> Self {
        MutexError::Poison(type_name::<T>().to_string(), value.to_string()).into()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::PoisonError;

    struct FooGuard;

    #[test]
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn from_poison_error() {
        let error = crate::error::Error::from(PoisonError::new(FooGuard));
        let message = error.to_string();
        assert!(message.starts_with("Unable to acquire lock `"));
        assert!(message.contains("FooGuard"));
        assert!(message.ends_with("poisoned lock: another task failed inside"));
    }
}
