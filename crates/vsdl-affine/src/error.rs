//! Error types for vsdl-affine

/// Errors seen by a submitter.
#[derive(Debug, thiserror::Error)]
pub enum ExecError<E> {
    /// The command ran and its operation failed.
    #[error("{0}")]
    Operation(E),

    /// The worker aborted. The affine state is gone for good.
    #[error("affine session aborted: {0}")]
    Fatal(String),

    #[error("executor is shut down")]
    Closed,

    /// Blocking calls from the worker thread would wait on themselves.
    #[error("blocking call issued from the executor thread")]
    WorkerThread,
}

impl<E> ExecError<E> {
    /// True for the unrecoverable category.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecError::Fatal(_))
    }

    /// Convert the operation error, keeping executor errors as they are.
    pub fn map_operation<F>(self, f: impl FnOnce(E) -> F) -> ExecError<F> {
        match self {
            ExecError::Operation(e) => ExecError::Operation(f(e)),
            ExecError::Fatal(reason) => ExecError::Fatal(reason),
            ExecError::Closed => ExecError::Closed,
            ExecError::WorkerThread => ExecError::WorkerThread,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_operation_keeps_executor_errors() {
        let err: ExecError<i32> = ExecError::Operation(7);
        assert!(matches!(err.map_operation(|n| n * 2), ExecError::Operation(14)));

        let fatal: ExecError<i32> = ExecError::Fatal("trap".to_string());
        let mapped = fatal.map_operation(|n| n.to_string());
        assert!(mapped.is_fatal());
        assert_eq!(mapped.to_string(), "affine session aborted: trap");
    }
}
