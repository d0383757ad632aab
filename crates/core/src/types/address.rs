//! Shipping address captured during checkout.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationErrors, Validator};

/// Delivery address stored on the user and snapshotted onto each order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

impl ShippingAddress {
    /// Check minimum field lengths.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();
        v.min_chars("full_name", &self.full_name, 3, "Name must be at least 3 characters");
        v.min_chars(
            "street_address",
            &self.street_address,
            3,
            "Address must be at least 3 characters",
        );
        v.min_chars("city", &self.city, 3, "City must be at least 3 characters");
        v.min_chars(
            "postal_code",
            &self.postal_code,
            4,
            "Postal code must be at least 4 characters",
        );
        v.min_chars("country", &self.country, 3, "Country must be at least 3 characters");
        v.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Jane Doe".into(),
            street_address: "123 Main St".into(),
            city: "Toronto".into(),
            postal_code: "M5V 2T6".into(),
            country: "Canada".into(),
            lat: None,
            lng: None,
        }
    }

    #[test]
    fn test_valid_address() {
        assert!(address().validate().is_ok());
    }

    #[test]
    fn test_short_postal_code_is_rejected() {
        let mut a = address();
        a.postal_code = "M5V".into();
        let err = a.validate().unwrap_err();
        assert_eq!(err.to_string(), "Postal code must be at least 4 characters");
    }

    #[test]
    fn test_collects_all_failures() {
        let mut a = address();
        a.city = "TO".into();
        a.country = "CA".into();
        let err = a.validate().unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err.has_field("city"));
        assert!(err.has_field("country"));
    }
}
