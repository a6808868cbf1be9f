//! Customer account DTOs: login results, shipping addresses, vouchers and
//! cart lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{AddressId, CartItemId, ProductId, UserId, VariantId, VoucherId};
use super::status::UserRole;
use crate::pricing::{LineAmount, PricingError};

/// The user part of a successful `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUser {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

impl AccountUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.email.as_str())
    }
}

/// Payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub user: AccountUser,
}

/// A saved shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    #[serde(default)]
    pub ward: Option<String>,
    pub district: String,
    pub city: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Single-line rendering for checkout and account pages.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.as_str()];
        if let Some(ward) = self.ward.as_deref().filter(|w| !w.is_empty()) {
            parts.push(ward);
        }
        parts.push(&self.district);
        parts.push(&self.city);
        parts.join(", ")
    }
}

/// Maximum length of free-text address fields.
const MAX_FIELD_LENGTH: usize = 120;

/// Address form validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be at most {MAX_FIELD_LENGTH} characters")]
    TooLong(&'static str),
    #[error("phone number must be 10 digits starting with 0")]
    InvalidPhone,
}

/// New-address form as submitted by the customer, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    #[serde(default)]
    pub ward: Option<String>,
    pub district: String,
    pub city: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Validate and normalize the form.
    ///
    /// Text fields are trimmed, an empty ward becomes `None`, and the phone
    /// number is reduced to its digits.
    ///
    /// # Errors
    ///
    /// Returns every rule the input breaks, in field order.
    pub fn validate(&self) -> Result<Self, Vec<AddressError>> {
        let mut errors = Vec::new();

        let recipient_name = required("Recipient name", &self.recipient_name, &mut errors);
        let street = required("Street", &self.street, &mut errors);
        let district = required("District", &self.district, &mut errors);
        let city = required("City", &self.city, &mut errors);

        let phone: String = self
            .phone
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.'))
            .collect();
        if phone.len() != 10
            || !phone.starts_with('0')
            || !phone.chars().all(|c| c.is_ascii_digit())
        {
            errors.push(AddressError::InvalidPhone);
        }

        let ward = self
            .ward
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(ToString::to_string);

        if errors.is_empty() {
            Ok(Self {
                recipient_name,
                phone,
                street,
                ward,
                district,
                city,
                is_default: self.is_default,
            })
        } else {
            Err(errors)
        }
    }
}

fn required(field: &'static str, value: &str, errors: &mut Vec<AddressError>) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(AddressError::Required(field));
    } else if trimmed.chars().count() > MAX_FIELD_LENGTH {
        errors.push(AddressError::TooLong(field));
    }
    trimmed.to_string()
}

/// A discount code instance assigned to a user, redeemable once within a
/// validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub used: bool,
}

/// One line of the customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    #[serde(default)]
    pub variant_label: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl CartItem {
    /// quantity × unit price.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the product does not fit.
    pub fn line_total(&self) -> Result<Decimal, PricingError> {
        LineAmount::from(self).total()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_input() -> AddressInput {
        AddressInput {
            recipient_name: "  Nguyen Van Meo ".to_string(),
            phone: "090-123 4567".to_string(),
            street: "12 Ly Thuong Kiet".to_string(),
            ward: Some("  ".to_string()),
            district: "Hoan Kiem".to_string(),
            city: "Ha Noi".to_string(),
            is_default: true,
        }
    }

    #[test]
    fn test_address_validation_normalizes() {
        let address = valid_input().validate().unwrap();
        assert_eq!(address.recipient_name, "Nguyen Van Meo");
        assert_eq!(address.phone, "0901234567");
        assert_eq!(address.ward, None);
    }

    #[test]
    fn test_address_validation_collects_errors() {
        let input = AddressInput {
            phone: "12345".to_string(),
            city: "x".repeat(121),
            ..AddressInput::default()
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![
                AddressError::Required("Recipient name"),
                AddressError::Required("Street"),
                AddressError::Required("District"),
                AddressError::TooLong("City"),
                AddressError::InvalidPhone,
            ]
        );
    }

    #[test]
    fn test_address_one_line() {
        let address = Address {
            id: AddressId::new(1),
            recipient_name: "Meo".to_string(),
            phone: "0901234567".to_string(),
            street: "5 Hang Bac".to_string(),
            ward: Some("Hang Dao".to_string()),
            district: "Hoan Kiem".to_string(),
            city: "Ha Noi".to_string(),
            is_default: false,
        };
        assert_eq!(address.one_line(), "5 Hang Bac, Hang Dao, Hoan Kiem, Ha Noi");
    }

    #[test]
    fn test_login_result_wire_format() {
        let json = r#"{
            "accessToken": "tok",
            "user": {"id": 3, "email": "Meo@PawPal.vn", "role": "MARKETING"}
        }"#;
        let result: LoginResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.user.role, UserRole::Marketing);
        assert_eq!(result.user.display_name(), "meo@pawpal.vn");
    }

    #[test]
    fn test_cart_line_total() {
        let item = CartItem {
            id: CartItemId::new(1),
            product_id: ProductId::new(1),
            variant_id: VariantId::new(1),
            product_name: "Chew toy".to_string(),
            variant_label: None,
            image: None,
            quantity: 3,
            unit_price: Decimal::from(45_000),
        };
        assert_eq!(item.line_total(), Ok(Decimal::from(135_000)));
    }
}
