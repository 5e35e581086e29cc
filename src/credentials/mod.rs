//! Account credentials for the login form.
//!
//! Supplied once per run (command line, environment, or `.env`), held in
//! memory only. The password stays wrapped in a [`SecretString`] so it never
//! shows up in `Debug` output or logs.

use secrecy::SecretString;

/// Email and password for one login.
#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("a@b.com", "hunter2");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("a@b.com"));
        assert!(!rendered.contains("hunter2"));
        assert_eq!(credentials.password().expose_secret(), "hunter2");
    }
}
