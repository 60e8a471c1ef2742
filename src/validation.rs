use rocket::serde::json::Json;
use validator::Validate;

use crate::error::AppError;

/// Runs `validator` rules on a JSON body and unwraps it, mapping failures to
/// `AppError::Validation`.
pub trait JsonValidateExt<T> {
    fn validate_custom(self) -> Result<T, AppError>;
}

impl<T: Validate> JsonValidateExt<T> for Json<T> {
    fn validate_custom(self) -> Result<T, AppError> {
        self.validate()?;
        Ok(self.into_inner())
    }
}
