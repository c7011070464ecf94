// src/services/access.rs

//! Load-time gate for quizzes.
//!
//! PINs are compared as plain strings. There is no hashing and no attempt
//! limit on this path.

use crate::{
    config::MIN_PIN_LENGTH,
    error::AppError,
    models::quiz::QuizAccess,
    utils::jwt::Claims,
};

/// Rejects PINs shorter than the minimum length.
pub fn validate_pin_format(pin: &str) -> Result<(), AppError> {
    if pin.chars().count() < MIN_PIN_LENGTH {
        return Err(AppError::BadRequest(format!(
            "PIN must be at least {} characters",
            MIN_PIN_LENGTH
        )));
    }
    Ok(())
}

/// Checks a submitted PIN against the stored one.
pub fn check_pin(stored: &str, submitted: &str) -> Result<(), AppError> {
    validate_pin_format(submitted)?;
    if submitted != stored {
        return Err(AppError::Forbidden("Incorrect PIN".to_string()));
    }
    Ok(())
}

/// Decides whether the caller may see (and answer) the quiz questions.
pub fn authorize_quiz(
    access: &QuizAccess,
    viewer: Option<&Claims>,
    pin: Option<&str>,
) -> Result<(), AppError> {
    match access {
        QuizAccess::Public => Ok(()),
        QuizAccess::ModuleLinked { .. } => match viewer {
            Some(_) => Ok(()),
            None => Err(AppError::AuthError(
                "Sign in to take this quiz".to_string(),
            )),
        },
        QuizAccess::PinProtected { pin: stored } => match pin {
            Some(submitted) => check_pin(stored, submitted),
            None => Err(AppError::Forbidden("This quiz requires a PIN".to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            sub: "7".to_string(),
            role: "user".to_string(),
            exp: usize::MAX,
        }
    }

    fn pin_quiz() -> QuizAccess {
        QuizAccess::PinProtected {
            pin: "1234".to_string(),
        }
    }

    #[test]
    fn short_pin_is_rejected_before_comparison() {
        let err = authorize_quiz(&pin_quiz(), None, Some("12")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn wrong_pin_is_forbidden() {
        let err = authorize_quiz(&pin_quiz(), None, Some("4321")).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn missing_pin_is_forbidden() {
        let err = authorize_quiz(&pin_quiz(), Some(&claims()), None).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn matching_pin_opens_quiz() {
        assert!(authorize_quiz(&pin_quiz(), None, Some("1234")).is_ok());
    }

    #[test]
    fn module_linked_needs_a_session() {
        let access = QuizAccess::ModuleLinked { module_id: Some(1) };
        assert!(matches!(
            authorize_quiz(&access, None, None),
            Err(AppError::AuthError(_))
        ));
        assert!(authorize_quiz(&access, Some(&claims()), None).is_ok());
    }

    #[test]
    fn public_is_open_to_anyone() {
        assert!(authorize_quiz(&QuizAccess::Public, None, None).is_ok());
    }
}
