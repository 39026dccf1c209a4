//! Form field validation shared by checkout and the admin dashboard.

/// A required form field was left blank.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Blank(&'static str),
}

impl FormError {
    /// Trim `value` and reject it if nothing is left.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::Blank`] naming `field`.
    pub fn require(field: &'static str, value: &str) -> Result<String, Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(Self::Blank(field));
        }
        Ok(trimmed.to_owned())
    }
}
