use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Collects every rule violation of a request body so they can be reported together.
#[derive(Debug, Default)]
pub struct Violations(Vec<String>);

impl Violations {
    pub fn not_empty(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.0.push(format!("{} should not be empty", field));
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !is_valid_email(value.trim()) {
            self.0.push(format!("{} must be an email", field));
        }
        self
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let n = value.chars().count();
        if n < min || n > max {
            self.0.push(format!(
                "{} must be longer than or equal to {} and shorter than or equal to {} characters",
                field, min, max
            ));
        }
        self
    }

    pub fn max_length(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.chars().count() > max {
            self.0.push(format!(
                "{} must be shorter than or equal to {} characters",
                field, max
            ));
        }
        self
    }

    pub fn at_least(&mut self, field: &str, value: i64, min: i64) -> &mut Self {
        if value < min {
            self.0.push(format!("{} must not be less than {}", field, min));
        }
        self
    }

    pub fn flag(&mut self, field: &str, value: i16) -> &mut Self {
        if value != 0 && value != 1 {
            self.0.push(format!("{} must be one of the following values: 0, 1", field));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn collects_all_violations() {
        let err = Violations::default()
            .not_empty("name", "  ")
            .email("email", "nope")
            .length("password", "abc", 6, 20)
            .at_least("established_year", 1850, 1900)
            .flag("is_active", 2)
            .finish()
            .unwrap_err();
        match err {
            AppError::Validation(v) => {
                assert_eq!(v.len(), 5);
                assert_eq!(v[0], "name should not be empty");
                assert_eq!(v[3], "established_year must not be less than 1900");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn clean_input_passes() {
        assert!(Violations::default()
            .not_empty("name", "Central Board")
            .email("email", "board@x.org")
            .length("password", "secret1", 6, 20)
            .flag("is_active", 1)
            .finish()
            .is_ok());
    }
}
