//! Field checks shared by registration, profile updates and the catalog.

use rust_decimal::Decimal;

/// Default password minimum length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// bcrypt only looks at the first 72 bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

pub const MAX_NAME_LENGTH: usize = 100;

/// Basic `local@domain.tld` shape check for login identifiers.
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    if email.chars().any(char::is_whitespace) {
        return Err("Email cannot contain whitespace".to_string());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err("Invalid email format".to_string());
    };

    if local.is_empty() || domain.contains('@') {
        return Err("Invalid email format".to_string());
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES));
    }

    Ok(())
}

/// Display names, category names and product names.
pub fn validate_name(name: &str) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(format!("Name must be at most {} characters", MAX_NAME_LENGTH));
    }

    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), String> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err("Price cannot be negative".to_string());
    }

    if price.scale() > 2 {
        return Err("Price cannot have more than two decimal places".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_emails() {
        for email in ["alice@example.com", "a.b+tag@mail.example.org", "Alice@Example.COM"] {
            assert!(validate_email_format(email).is_ok(), "{email}");
        }
    }

    #[test]
    fn rejects_bad_emails() {
        for email in ["", "alice", "@example.com", "alice@", "alice@example", "a@b@c.com", "al ice@example.com", "alice@example."] {
            assert!(validate_email_format(email).is_err(), "{email}");
        }
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough").is_ok());
        assert!(validate_password(&"x".repeat(73)).is_err());
    }

    #[test]
    fn names_are_trimmed_before_checking() {
        assert!(validate_name("   ").is_err());
        assert!(validate_name(" Bikes ").is_ok());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn prices_must_be_non_negative_cents() {
        assert!(validate_price(Decimal::new(1999, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
        assert!(validate_price(Decimal::new(1, 3)).is_err());
    }
}
