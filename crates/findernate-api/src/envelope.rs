//! Response envelope used by the REST backend.
//!
//! Most endpoints answer `{"success": true, "data": ...}`; a few older ones
//! return the payload bare.

use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Wrapped(Envelope<T>),
    Bare(T),
}

/// Decode a response body into its payload.
pub fn decode<T>(body: &str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    match serde_json::from_str::<Body<T>>(body) {
        Ok(Body::Bare(data)) => Ok(data),
        Ok(Body::Wrapped(envelope)) => {
            if !envelope.success {
                return Err(ApiError::Rejected(
                    envelope
                        .message
                        .unwrap_or_else(|| "request failed".to_string()),
                ));
            }
            Ok(envelope.data.unwrap_or_default())
        }
        // Re-parse as the bare payload to surface a precise serde error.
        Err(_) => Ok(serde_json::from_str::<T>(body)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_and_bare() {
        let wrapped: Vec<u32> = decode(r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert_eq!(wrapped, vec![1, 2]);

        let bare: Vec<u32> = decode("[3]").unwrap();
        assert_eq!(bare, vec![3]);

        let empty: Vec<u32> = decode(r#"{"success": true}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_rejected() {
        let err = decode::<Vec<u32>>(r#"{"success": false, "message": "nope"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "nope"));
    }

    #[test]
    fn test_garbage() {
        let err = decode::<Vec<u32>>("<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
