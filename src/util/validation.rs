//! Form validation for the auth and game forms.
//!
//! Each validator checks every field and returns all failures at once, in
//! field order, so a form can show one message per field. An empty vector
//! means the form may be submitted. Lengths count characters, not bytes.

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;
const QUESTION_MIN: usize = 3;
const QUESTION_MAX: usize = 500;
const GUESS_MIN: usize = 2;
const GUESS_MAX: usize = 100;

const PASSWORDS_DONT_MATCH: &str = "Passwords don't match";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

/// One failed rule, keyed by the form field it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[must_use]
pub fn validate_login(username: &str, password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if username.is_empty() {
        errors.push(FieldError::new("username", "Username is required"));
    }
    if password.is_empty() {
        errors.push(FieldError::new("password", "Password is required"));
    }
    errors
}

#[must_use]
pub fn validate_register(username: &str, email: &str, password: &str, confirm_password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let username_len = char_len(username);
    if username_len < USERNAME_MIN {
        errors.push(FieldError::new("username", "Username must be at least 3 characters"));
    } else if username_len > USERNAME_MAX {
        errors.push(FieldError::new("username", "Username must be less than 50 characters"));
    }
    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
    if char_len(password) < PASSWORD_MIN {
        errors.push(FieldError::new("password", PASSWORD_TOO_SHORT));
    }
    if password != confirm_password {
        errors.push(FieldError::new("confirmPassword", PASSWORDS_DONT_MATCH));
    }
    errors
}

#[must_use]
pub fn validate_question(question: &str) -> Vec<FieldError> {
    let len = char_len(question);
    if len < QUESTION_MIN {
        vec![FieldError::new("question", "Question must be at least 3 characters")]
    } else if len > QUESTION_MAX {
        vec![FieldError::new("question", "Question must be less than 500 characters")]
    } else {
        Vec::new()
    }
}

#[must_use]
pub fn validate_guess(character_name: &str) -> Vec<FieldError> {
    let len = char_len(character_name);
    if len < GUESS_MIN {
        vec![FieldError::new("characterName", "Character name must be at least 2 characters")]
    } else if len > GUESS_MAX {
        vec![FieldError::new("characterName", "Character name must be less than 100 characters")]
    } else {
        Vec::new()
    }
}

#[must_use]
pub fn validate_forgot_password(email: &str) -> Vec<FieldError> {
    if is_valid_email(email) {
        Vec::new()
    } else {
        vec![FieldError::new("email", "Enter a valid email address")]
    }
}

#[must_use]
pub fn validate_reset_password(token: &str, password: &str, confirm_password: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if token.is_empty() {
        errors.push(FieldError::new("token", "Reset token is required"));
    }
    if char_len(password) < PASSWORD_MIN {
        errors.push(FieldError::new("password", PASSWORD_TOO_SHORT));
    }
    if password != confirm_password {
        errors.push(FieldError::new("confirmPassword", PASSWORDS_DONT_MATCH));
    }
    errors
}

/// Loose shape check: `local@domain.tld`, no whitespace, one `@`.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.chars().count() >= 2 && !host.starts_with('.') && !host.ends_with('.')
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}
