//! Procedure input decoding.
//!
//! Handlers take the raw body and decode it only after the access policy has
//! admitted the call, so an anonymous caller of an authenticated procedure
//! sees `Unauthorized` whatever it sent.

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use super::policy::Procedure;
use crate::errors::AppError;

pub fn parse_input<T: DeserializeOwned>(procedure: &Procedure, body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::Validation(format!("Invalid input for {}: {e}", procedure.path))
    })
}

/// Like [`parse_input`], but an empty body decodes to `T::default()`.
pub fn parse_optional_input<T: DeserializeOwned + Default>(
    procedure: &Procedure,
    body: &Bytes,
) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_input(procedure, body)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::errors::ErrorKind;

    const PROCEDURE: Procedure = Procedure::public("test/input");

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Input {
        id: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn test_valid_body_decodes() {
        let body = Bytes::from_static(br#"{"id":"r-1","tags":["rust"]}"#);
        let input: Input = parse_input(&PROCEDURE, &body).unwrap();
        assert_eq!(input.id, "r-1");
        assert_eq!(input.tags, vec!["rust".to_string()]);
    }

    #[test]
    fn test_bad_body_is_validation_error() {
        let bodies: [&[u8]; 3] = [b"", b"{\"wrong\":1}", b"not json"];
        for raw in bodies {
            let err = parse_input::<Input>(&PROCEDURE, &Bytes::copy_from_slice(raw)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadRequest);
            assert!(err.to_string().contains("test/input"));
        }
    }

    #[test]
    fn test_optional_input_defaults_only_when_absent() {
        let input: Input = parse_optional_input(&PROCEDURE, &Bytes::new()).unwrap();
        assert_eq!(input, Input::default());

        let input: Input = parse_optional_input(&PROCEDURE, &Bytes::from_static(b"  \n")).unwrap();
        assert_eq!(input, Input::default());

        let err = parse_optional_input::<Input>(&PROCEDURE, &Bytes::from_static(b"{\"tags\":7}"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
