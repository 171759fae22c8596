//! Result type alias for Argus
//!
//! This module provides a convenient Result type alias that uses ArgusError
//! as the error type.

use super::errors::ArgusError;

/// Result type alias for Argus operations
///
/// This is a convenience type alias that uses `ArgusError` as the error type.
/// Use this throughout the codebase for fallible operations.
///
/// # Examples
///
/// ```
/// use argus::domain::result::Result;
/// use argus::domain::errors::ArgusError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ArgusError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ArgusError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ArgusError;

    #[test]
    fn test_result_ok() {
        let result: Result<i32> = Ok(42);
        assert!(result.is_ok());
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(ArgusError::Validation("test error".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
