// rdsadmin/src/db/identifiers.rs
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::errors::{AppError, Result};

// sysname is nvarchar(128)
const MAX_IDENTIFIER_LEN: usize = 128;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("The identifier regex should be valid")
});

/// A SQL Server object name that is safe to splice into DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    /// Validates `raw` against the allow-list (ASCII letters, digits, underscore).
    ///
    /// `kind` names the object in the error message, e.g. "database" or "login".
    pub fn parse(kind: &str, raw: &str) -> Result<Self> {
        if raw.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::InvalidIdentifier(format!(
                "{} name is longer than {} characters",
                kind, MAX_IDENTIFIER_LEN
            )));
        }
        if !IDENTIFIER_RE.is_match(raw) {
            return Err(AppError::InvalidIdentifier(format!(
                "{} name '{}' may only contain letters, digits and underscores",
                kind,
                raw.escape_default()
            )));
        }
        Ok(Identifier(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bracketed(&self) -> String {
        format!("[{}]", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quotes a value as a T-SQL string literal for statements that cannot take
/// bound parameters.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quotes a value as a Unicode (`N'...'`) literal so characters outside the
/// server code page survive.
pub fn quote_nliteral(value: &str) -> String {
    format!("N{}", quote_literal(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_allow_listed_names() -> anyhow::Result<()> {
        let id = Identifier::parse("database", "Sales_2024")?;
        assert_eq!(id.as_str(), "Sales_2024");
        assert_eq!(id.bracketed(), "[Sales_2024]");
        Ok(())
    }

    #[test]
    fn test_rejects_injection_attempts() {
        for raw in [
            "",
            "sales; DROP DATABASE master",
            "app]user",
            "o'brien",
            "sales-db",
            "naïve",
        ] {
            let err = Identifier::parse("login", raw).unwrap_err();
            assert!(matches!(err, AppError::InvalidIdentifier(_)), "{raw}");
        }
    }

    #[test]
    fn test_rejects_overlong_names() {
        let raw = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(Identifier::parse("database", &raw).is_err());
        assert!(Identifier::parse("database", &raw[1..]).is_ok());
    }

    #[test]
    fn test_quote_literal_doubles_quotes() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("plain"), "'plain'");
    }

    #[test]
    fn test_quote_nliteral_keeps_unicode() {
        assert_eq!(quote_nliteral("it's"), "N'it''s'");
        assert_eq!(quote_nliteral("пароль密码"), "N'пароль密码'");
    }
}
