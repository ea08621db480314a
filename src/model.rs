//! Wire-level request and response types for the HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

/// Envelope returned by `POST /api/generate`.
///
/// Exactly one of `error`, `warnings`, or `success` is populated: `error` on
/// upstream or internal failure, `warnings` on the degraded-success path
/// (code produced but flagged by the validator), `success` on a clean run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl GenerateResponse {
    pub fn success(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            success: Some(true),
            ..Self::default()
        }
    }

    pub fn degraded(code: impl Into<String>, warnings: Vec<String>) -> Self {
        Self {
            code: code.into(),
            warnings: Some(warnings),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Body of `POST /api/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub code: String,
}

/// Uniform outcome of one generation attempt.
///
/// Both fields are structurally present; a set `error` is the authoritative
/// failure signal and callers must not read `code` past it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub code: String,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn ok(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_unset_fields() {
        let json = serde_json::to_value(GenerateResponse::success("<div />")).unwrap();
        assert_eq!(json["code"], "<div />");
        assert_eq!(json["success"], true);
        assert!(json.get("error").is_none());
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn failure_envelope_carries_empty_code() {
        let json = serde_json::to_value(GenerateResponse::failure("boom")).unwrap();
        assert_eq!(json["code"], "");
        assert_eq!(json["error"], "boom");
        assert!(json.get("success").is_none());
    }

    #[test]
    fn generate_request_deserializes_from_the_wire_shape() {
        let request: GenerateRequest =
            serde_json::from_value(serde_json::json!({ "prompt": "a navbar" })).unwrap();
        assert_eq!(request.prompt, "a navbar");
        assert!(serde_json::from_value::<GenerateRequest>(serde_json::json!({})).is_err());
    }

    #[test]
    fn generation_result_failure_is_authoritative() {
        let result = GenerationResult::failure("upstream down");
        assert!(result.is_failure());
        assert!(result.code.is_empty());
        assert!(!GenerationResult::ok("code").is_failure());
    }
}
