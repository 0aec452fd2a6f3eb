use crate::errors::AppError;

pub const MAX_LABEL_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 64;

/// Resume ids are interpolated into backend paths, so only URL-safe
/// characters are accepted.
pub fn validate_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() {
        return Err(AppError::Validation("Resume id is required".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(format!("Invalid resume id: {id}")));
    }
    Ok(())
}

/// Names and slugs: 1..=64 characters.
pub fn validate_label(field: &str, value: &str) -> Result<(), AppError> {
    let len = value.chars().count();
    if len == 0 || len > MAX_LABEL_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be between 1 and {MAX_LABEL_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "Password must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
