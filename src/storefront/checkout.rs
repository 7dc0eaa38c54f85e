use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    dto::{auth::RegisterRequest, orders::GuestOrderRequest},
    models::DeliveryType,
    storefront::cart::Cart,
    validation, wilaya,
};

/// Field name to message for every field that failed validation.
pub type FieldErrors = BTreeMap<&'static str, String>;

#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    #[error("the cart is empty")]
    EmptyCart,

    #[error("{} field(s) need attention", .0.len())]
    Invalid(FieldErrors),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestCheckoutForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub wilaya: String,
    pub delivery_type: DeliveryType,
}

impl GuestCheckoutForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.insert("name", "Full name is required".into());
        }

        if self.phone.trim().is_empty() {
            errors.insert("phone", "Phone number is required".into());
        } else if !validation::is_valid_phone(&self.phone) {
            errors.insert(
                "phone",
                "Enter a valid Algerian phone number (e.g. 0555123456 or +213555123456)".into(),
            );
        }

        if !self.email.trim().is_empty() && !validation::is_valid_email(&self.email) {
            errors.insert("email", "Enter a valid email address".into());
        }

        if self.address.trim().is_empty() {
            errors.insert("address", "Delivery address is required".into());
        }

        if self.wilaya.trim().is_empty() {
            errors.insert("wilaya", "Select your wilaya".into());
        } else if !wilaya::is_valid(&self.wilaya) {
            errors.insert("wilaya", "Unknown wilaya".into());
        }

        errors
    }

    /// Builds the guest order for the cart contents.
    pub fn to_order_request(&self, cart: &Cart) -> Result<GuestOrderRequest, CheckoutError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let email = self.email.trim();
        Ok(GuestOrderRequest {
            guest_name: self.name.trim().to_string(),
            guest_phone: self.phone.chars().filter(|c| !c.is_whitespace()).collect(),
            guest_email: (!email.is_empty()).then(|| email.to_string()),
            delivery_address: self.address.trim().to_string(),
            wilaya: self.wilaya.trim().to_string(),
            items: cart.to_guest_items(),
            delivery_type: self.delivery_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone_number: String,
    pub era: Option<String>,
}

impl RegisterForm {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if !validation::is_valid_email(&self.email) {
            errors.insert("email", "Enter a valid email address".into());
        }
        if self.password.len() < 6 {
            errors.insert("password", "Password must be at least 6 characters".into());
        }
        if self.password != self.confirm_password {
            errors.insert("confirm_password", "Passwords do not match".into());
        }
        if self.full_name.trim().is_empty() {
            errors.insert("full_name", "Full name is required".into());
        }
        if !validation::is_valid_phone(&self.phone_number) {
            errors.insert("phone_number", "Enter a valid Algerian phone number".into());
        }

        errors
    }

    pub fn to_request(&self) -> Result<RegisterRequest, CheckoutError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }
        Ok(RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: self.full_name.trim().to_string(),
            phone_number: self.phone_number.chars().filter(|c| !c.is_whitespace()).collect(),
            era: self.era.clone().filter(|e| !e.trim().is_empty()),
        })
    }
}
