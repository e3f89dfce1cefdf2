//! The analyser's propagation type: an opaque handle into the diagnostic
//! engine rather than a payload-carrying error, matching §7's "Parser/Sema
//! functions return a result carrying either a value or an opaque error
//! handle into the diagnostic engine; helpers auto-propagate."

/// A marker that a diagnostic has already been reported to the
/// [`lbc_common::DiagnosticEngine`] passed through the analysis call. Sema
/// functions that fail report the diagnostic themselves, then return this
/// unit error so `?` can short-circuit the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemaError;

pub type SemaResult<T> = Result<T, SemaError>;
