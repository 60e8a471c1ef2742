use rand::RngCore;

use crate::error::AppError;

/// bcrypt only looks at the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Truncates to at most [`MAX_PASSWORD_BYTES`], dropping a multi-byte
/// character that would otherwise be cut in half.
pub fn truncate_password(password: &str) -> &str {
    if password.len() <= MAX_PASSWORD_BYTES {
        return password;
    }

    let mut end = MAX_PASSWORD_BYTES;
    while !password.is_char_boundary(end) {
        end -= 1;
    }
    &password[..end]
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.is_empty() {
            return Err(AppError::Validation("Password cannot be empty".to_string()));
        }

        Ok(bcrypt::hash(truncate_password(password), self.cost)?)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

/// Never errors: a malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(truncate_password(password), hash).unwrap_or(false)
}

/// 256 random bits, lowercase hex.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_accented_password() -> String {
        format!("a{}", "é".repeat(40))
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        let password = long_accented_password();
        assert_eq!(password.len(), 81);

        let truncated = truncate_password(&password);
        assert_eq!(truncated.len(), 71);
        assert!(password.starts_with(truncated));
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
        assert_eq!(truncated.chars().count(), 36);
        assert!(truncated.ends_with('é'));
    }

    #[test]
    fn test_short_password_untouched() {
        assert_eq!(truncate_password("password123"), "password123");

        let exact = "x".repeat(MAX_PASSWORD_BYTES);
        assert_eq!(truncate_password(&exact), exact);
    }

    #[test]
    fn test_verify_long_multibyte_password() {
        let password = long_accented_password();
        let hasher = PasswordHasher::new(4);
        let hash = hasher.hash(&password).unwrap();

        assert!(verify_password(&password, &hash));
        assert!(verify_password(truncate_password(&password), &hash));
        assert!(!verify_password("a", &hash));
        assert!(!verify_password(&password, "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_empty_password_rejected() {
        match PasswordHasher::new(4).hash("") {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Password cannot be empty"),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn test_session_token_is_hex() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate_session_token());
    }
}
