//! Caller-side registration form checks.
//!
//! Run before [`crate::SessionStore::register`] so obviously bad input never
//! reaches the network. The server remains the authority; its structured
//! codes ([`crate::ErrorCode`]) cover the same password rules.

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("first name is required")]
    EmptyFirstName,
    #[error("last name is required")]
    EmptyLastName,
    #[error("invalid email")]
    InvalidEmail,
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("password must contain at least one digit")]
    MissingDigit,
}

/// Raw registration input as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
}

/// Validated arguments for `register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationParts {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
}

impl RegistrationForm {
    /// Check the form, reporting the first problem found.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`RegistrationError`] in field order.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.first_name.trim().is_empty() {
            return Err(RegistrationError::EmptyFirstName);
        }
        if self.last_name.trim().is_empty() {
            return Err(RegistrationError::EmptyLastName);
        }
        if normalize_email(&self.email).is_none() {
            return Err(RegistrationError::InvalidEmail);
        }
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        check_password(&self.password)
    }

    /// Validate and convert into trimmed `register` arguments.
    ///
    /// # Errors
    ///
    /// See [`RegistrationForm::validate`].
    pub fn into_parts(self) -> Result<RegistrationParts, RegistrationError> {
        self.validate()?;
        let email = normalize_email(&self.email).ok_or(RegistrationError::InvalidEmail)?;
        Ok(RegistrationParts {
            email,
            password: self.password,
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            display_name: self
                .display_name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
        })
    }
}

/// Password strength rules shared with the server.
///
/// # Errors
///
/// Returns the first rule the password breaks.
pub fn check_password(password: &str) -> Result<(), RegistrationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(RegistrationError::TooShort { min: MIN_PASSWORD_LEN });
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(RegistrationError::MissingUppercase);
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(RegistrationError::MissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(RegistrationError::MissingDigit);
    }
    Ok(())
}

/// Trim and lowercase an email; `None` unless it is `local@domain` with both
/// sides non-empty.
#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
