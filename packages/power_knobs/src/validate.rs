use crate::RangeError;

/// Checks that `value` lies within `[min, max]`.
///
/// # Errors
///
/// Returns a [`RangeError`] describing the accepted interval if it does not.
///
/// # Example
///
/// ```
/// use power_knobs::validate;
///
/// assert!(validate(2, 2, 8).is_ok());
/// assert!(validate(9, 2, 8).is_err());
/// ```
pub fn validate(value: i64, min: i64, max: i64) -> Result<(), RangeError> {
    if value < min || value > max {
        return Err(RangeError::new(value, min, max));
    }

    Ok(())
}
