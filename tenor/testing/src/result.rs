use {
    std::fmt::{Debug, Display},
    tenor_audit::AuditError,
    tenor_ledger::LedgerError,
};

/// Expectations on the outcome of an operation run through a
/// [`TestSuite`](crate::TestSuite).
pub trait ResultExt<T, E> {
    /// Unwraps a success, panicking with the error otherwise.
    fn should_succeed(self) -> T;

    /// Unwraps a success whose value satisfies `predicate`.
    fn should_succeed_and<F>(self, predicate: F) -> T
    where
        F: FnOnce(&T) -> bool;

    /// Unwraps an error that satisfies `predicate`.
    fn should_fail_and<F>(self, predicate: F) -> E
    where
        F: FnOnce(&E) -> bool;

    /// Unwraps an error whose message contains `expect`.
    fn should_fail_with_error(self, expect: impl Display) -> E;
}

impl<T, E> ResultExt<T, E> for Result<T, E>
where
    T: Debug,
    E: Display,
{
    fn should_succeed(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => panic!("expecting ok, got error: {err}"),
        }
    }

    fn should_succeed_and<F>(self, predicate: F) -> T
    where
        F: FnOnce(&T) -> bool,
    {
        let value = self.should_succeed();
        assert!(predicate(&value), "succeeded with an unexpected value: {value:?}");
        value
    }

    fn should_fail_and<F>(self, predicate: F) -> E
    where
        F: FnOnce(&E) -> bool,
    {
        match self {
            Err(err) if predicate(&err) => err,
            Err(err) => panic!("failed with an unexpected error: {err}"),
            Ok(value) => panic!("expecting error, got ok: {value:?}"),
        }
    }

    fn should_fail_with_error(self, expect: impl Display) -> E {
        match self {
            Err(err) if err.to_string().contains(&expect.to_string()) => err,
            Err(err) => panic!("expecting error containing `{expect}`, got: {err}"),
            Ok(value) => panic!("expecting error, got ok: {value:?}"),
        }
    }
}

/// Expectations specific to ledger operations, which fail either with a
/// [`LedgerError`] or by breaking an invariant.
pub trait LedgerResultExt {
    /// Unwraps the ledger error, which must equal `expect`. An invariant
    /// violation is never an expected failure.
    fn should_fail_with_ledger_error(self, expect: LedgerError) -> LedgerError;
}

impl<T> LedgerResultExt for Result<T, AuditError>
where
    T: Debug,
{
    fn should_fail_with_ledger_error(self, expect: LedgerError) -> LedgerError {
        match self {
            Err(AuditError::Ledger(err)) => {
                assert_eq!(err, expect, "ledger failed with an unexpected error");
                err
            },
            Err(AuditError::Violation(violation)) => {
                panic!("expecting {expect}, but the operation broke an invariant: {violation}")
            },
            Ok(value) => panic!("expecting {expect}, got ok: {value:?}"),
        }
    }
}

// ----------------------------------- tests -----------------------------------
