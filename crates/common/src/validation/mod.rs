// Validation Module - field-level input checks run before any network call
use std::fmt;

mod validators;

pub use validators::{EmailValidator, FieldValidator, StringValidator};

/// Type alias for validation results
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error with field-level errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a single field error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add_field_error(field, message);
        err
    }

    /// Add a field-level error
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.into(), message: message.into() });
    }

    /// Check if there are any errors
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// `Ok(())` when no errors were collected
    pub fn into_result(self) -> ValidationResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "Validation error with no specific field errors"),
            [only] => write!(f, "{}: {}", only.field, only.message),
            errors => {
                write!(f, "{} fields invalid: ", errors.len())?;
                for (i, error) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}: {}", error.field, error.message)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Individual field error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Collects field errors from several validators
///
/// ```rust
/// use clearhold_common::validation::{EmailValidator, StringValidator, Validator};
///
/// let result = Validator::new()
///     .check("email", "ada@example.com", &EmailValidator::new())
///     .check("password", "", &StringValidator::new().not_empty())
///     .finish();
///
/// assert_eq!(result.unwrap_err().errors[0].field, "password");
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationError,
}

impl Validator {
    /// Create an empty validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `validator` against `value`, recording a failure under `field`
    #[must_use]
    pub fn check<V>(mut self, field: &str, value: &str, validator: &V) -> Self
    where
        V: FieldValidator<str>,
    {
        if let Err(message) = validator.validate(value) {
            self.errors.add_field_error(field, message);
        }
        self
    }

    /// Finish and return all collected errors
    pub fn finish(self) -> ValidationResult<()> {
        self.errors.into_result()
    }
}
