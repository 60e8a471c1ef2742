use crate::env::AdminLogin;

/// Decides whether a caller may perform admin operations.
///
/// Installed as Rocket managed state (`Box<dyn AdminPolicy>`) so the secret
/// source and comparison can be swapped without touching the routes.
pub trait AdminPolicy: Send + Sync {
    /// `presented` is the raw `x-admin-secret` header, if any.
    fn authorize(&self, presented: Option<&str>) -> bool;

    /// Exchanges admin UI credentials for the value to send as the admin header.
    fn login(&self, email: &str, password: &str) -> Option<String>;
}

pub struct StaticSecretPolicy {
    secret: String,
    login: Option<AdminLogin>,
}

impl StaticSecretPolicy {
    pub fn new(secret: impl Into<String>, login: Option<AdminLogin>) -> Self {
        Self {
            secret: secret.into(),
            login,
        }
    }
}

impl AdminPolicy for StaticSecretPolicy {
    fn authorize(&self, presented: Option<&str>) -> bool {
        match presented {
            Some(presented) => constant_time_eq(presented.as_bytes(), self.secret.as_bytes()),
            None => false,
        }
    }

    fn login(&self, email: &str, password: &str) -> Option<String> {
        let login = self.login.as_ref()?;

        let email_ok = constant_time_eq(email.as_bytes(), login.email.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), login.password.as_bytes());

        (email_ok & password_ok).then(|| self.secret.clone())
    }
}

/// Compares without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_secret_requires_exact_match() {
        let policy = StaticSecretPolicy::new("s3cret", None);

        assert!(policy.authorize(Some("s3cret")));
        assert!(!policy.authorize(Some("s3cre")));
        assert!(!policy.authorize(Some("s3cret ")));
        assert!(!policy.authorize(Some("")));
        assert!(!policy.authorize(None));
    }

    #[test]
    fn admin_login_disabled_without_credentials() {
        let policy = StaticSecretPolicy::new("s3cret", None);

        assert_eq!(policy.login("admin@example.com", "pw"), None);
    }

    #[test]
    fn admin_login_returns_secret() {
        let policy = StaticSecretPolicy::new(
            "s3cret",
            Some(AdminLogin {
                email: "admin@example.com".to_string(),
                password: "admin123".to_string(),
            }),
        );

        assert_eq!(
            policy.login("admin@example.com", "admin123"),
            Some("s3cret".to_string())
        );
        assert_eq!(policy.login("admin@example.com", "wrong"), None);
        assert_eq!(policy.login("other@example.com", "admin123"), None);
    }
}
