//! The `{ success, data, message }` wrapper every REST response uses.

use serde::{Deserialize, Serialize};

/// Response envelope returned by the PawPal REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

const fn default_success() -> bool {
    true
}

/// Why an envelope could not be unwrapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// The backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),
    /// `success: true` but no `data` field.
    #[error("response contained no data")]
    MissingData,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope wrapping `data`.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Take the payload out of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] with the backend's message when
    /// `success` is false, or [`EnvelopeError::MissingData`] when there is no
    /// payload.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::Rejected(
                self.message
                    .unwrap_or_else(|| "request was rejected".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Like [`into_data`](Self::into_data) but treats a missing payload as
    /// the type's default (used for list endpoints that omit empty arrays).
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is false.
    pub fn into_data_or_default(self) -> Result<T, EnvelopeError>
    where
        T: Default,
    {
        match self.into_data() {
            Err(EnvelopeError::MissingData) => Ok(T::default()),
            other => other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_envelope_surfaces_message() {
        let env: ApiEnvelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": false, "message": "Voucher expired"}"#).unwrap();
        assert_eq!(
            env.into_data(),
            Err(EnvelopeError::Rejected("Voucher expired".to_string()))
        );
    }

    #[test]
    fn test_missing_data() {
        let env: ApiEnvelope<Vec<u32>> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(env.clone().into_data(), Err(EnvelopeError::MissingData));
        assert_eq!(env.into_data_or_default(), Ok(Vec::new()));
    }

    #[derive(Debug, PartialEq, Eq, Deserialize)]
    struct Receipt {
        order_id: u32,
    }

    fn parse<T: serde::de::DeserializeOwned>(json: &str) -> ApiEnvelope<T> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_payload_type_needs_no_default() {
        let env: ApiEnvelope<Receipt> = parse(r#"{"success": true, "data": {"order_id": 77}}"#);
        assert_eq!(env.into_data(), Ok(Receipt { order_id: 77 }));

        let env: ApiEnvelope<Receipt> = parse(r#"{"success": true}"#);
        assert_eq!(env.into_data(), Err(EnvelopeError::MissingData));
    }

    #[test]
    fn test_data_unwraps() {
        let env: ApiEnvelope<u32> =
            serde_json::from_str(r#"{"success": true, "data": 4}"#).unwrap();
        assert_eq!(env.into_data(), Ok(4));
    }
}
