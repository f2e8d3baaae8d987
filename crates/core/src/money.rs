//! Money value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// An amount in smallest currency unit (e.g. cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount_minor: u64,
    /// ISO currency code (e.g. "USD", "EUR").
    pub currency: String,
}

impl Price {
    pub fn new(amount_minor: u64, currency: impl Into<String>) -> DomainResult<Self> {
        let currency = currency.into();
        if amount_minor == 0 {
            return Err(DomainError::validation("price must be positive"));
        }
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(DomainError::validation(format!(
                "currency must be a three-letter uppercase code, got '{currency}'"
            )));
        }
        Ok(Self { amount_minor, currency })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_amount_and_currency() {
        assert!(Price::new(0, "USD").is_err());
        assert!(Price::new(100, "usd").is_err());
        assert!(Price::new(100, "EURO").is_err());
        assert!(Price::new(100, "EUR").is_ok());
    }
}
