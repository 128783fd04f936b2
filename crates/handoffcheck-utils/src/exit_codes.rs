//! Exit code constants for handoffcheck.
//!
//! # Exit Code Table
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Payload valid (or corrected) |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `VALIDATION_FAILED` | Payload invalid, no correction attempted |
//! | 4 | `CORRECTION_FAILED` | Payload invalid after all correction attempts |
//! | 10 | `TIMEOUT` | Validation deadline exceeded |
//! | 70 | `LLM_FAILURE` | Generative backend could not be constructed or reached |

/// Exit codes matching the documented exit code table.
///
/// The numeric values are part of the public API and will not change in 1.x
/// releases.
///
/// ```rust
/// use handoffcheck_utils::exit_codes::ExitCode;
///
/// assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
/// assert_eq!(ExitCode::from_i32(3), ExitCode::VALIDATION_FAILED);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - payload accepted
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments, configuration or undetermined handoff type
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Validation failed - critical errors and correction was not requested
    pub const VALIDATION_FAILED: ExitCode = ExitCode(3);

    /// Correction failed - critical errors remained after every attempt
    pub const CORRECTION_FAILED: ExitCode = ExitCode(4);

    /// Timeout - the validation deadline expired mid-correction
    pub const TIMEOUT: ExitCode = ExitCode(10);

    /// LLM failure - backend construction or invocation failed
    pub const LLM_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values_are_stable() {
        assert_eq!(ExitCode::SUCCESS.as_i32(), 0);
        assert_eq!(ExitCode::INTERNAL.as_i32(), 1);
        assert_eq!(ExitCode::CLI_ARGS.as_i32(), 2);
        assert_eq!(ExitCode::VALIDATION_FAILED.as_i32(), 3);
        assert_eq!(ExitCode::CORRECTION_FAILED.as_i32(), 4);
        assert_eq!(ExitCode::TIMEOUT.as_i32(), 10);
        assert_eq!(ExitCode::LLM_FAILURE.as_i32(), 70);
    }

    #[test]
    fn test_round_trip_through_i32() {
        let raw: i32 = ExitCode::TIMEOUT.into();
        assert_eq!(ExitCode::from(raw), ExitCode::TIMEOUT);
    }
}
