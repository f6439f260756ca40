use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use campusdesk_core::AppError;

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    // field_errors is a HashMap; sort for stable output
    messages.sort();
    messages.join(", ")
}

/// JSON body extractor that runs `validator` rules.
///
/// Malformed bodies reject with 400; rule violations with 422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
                    return AppError::bad_request(anyhow!(
                        "Missing 'Content-Type: application/json' header"
                    ));
                }

                let error_msg = rejection.body_text();

                if error_msg.contains("missing field") {
                    let field = error_msg
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    return AppError::bad_request(anyhow!("{} is required", field));
                }

                if error_msg.contains("invalid type") || error_msg.contains("unknown variant") {
                    return AppError::bad_request(anyhow!("Invalid field type in request"));
                }

                // Value-level failures from custom deserializers (e.g. Email)
                if let JsonRejection::JsonDataError(_) = rejection {
                    return AppError::unprocessable(anyhow!("{}", error_msg));
                }

                AppError::bad_request(anyhow!("Invalid request body"))
            })?;

        value
            .validate()
            .map_err(|errors| AppError::unprocessable(anyhow!("{}", format_errors(&errors))))?;

        Ok(ValidatedJson(value))
    }
}

/// Query-string extractor whose failures use the JSON error body.
///
/// Unparseable parameters reject with 400 `validation_error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParsedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ParsedQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                let detail = rejection.body_text();
                let detail = detail
                    .strip_prefix("Failed to deserialize query string: ")
                    .unwrap_or(&detail);
                AppError::bad_request(anyhow!("Invalid query parameters: {}", detail))
            })?;

        Ok(ParsedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::header;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(length(min = 3, message = "name is too short"))]
        name: String,
    }

    fn request(body: &str, json: bool) -> Request {
        let mut builder = Request::builder().method("POST").uri("/");
        if json {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(p) = ValidatedJson::<Payload>::from_request(request(r#"{"name":"Ada"}"#, true), &())
            .await
            .unwrap();
        assert_eq!(p.name, "Ada");
    }

    #[tokio::test]
    async fn test_rule_violation_is_422() {
        let err = ValidatedJson::<Payload>::from_request(request(r#"{"name":"A"}"#, true), &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 422);
        assert_eq!(err.error.to_string(), "name is too short");
    }

    #[tokio::test]
    async fn test_missing_field_is_400() {
        let err = ValidatedJson::<Payload>::from_request(request("{}", true), &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert_eq!(err.error.to_string(), "name is required");
    }

    #[tokio::test]
    async fn test_missing_content_type_is_400() {
        let err = ValidatedJson::<Payload>::from_request(request(r#"{"name":"Ada"}"#, false), &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }

    #[derive(Debug, Deserialize)]
    struct Filter {
        id: uuid::Uuid,
        page: Option<u32>,
    }

    fn query_parts(uri: &str) -> Parts {
        let (parts, _) = axum::http::Request::builder().uri(uri).body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_query_parses() {
        let id = uuid::Uuid::new_v4();
        let mut parts = query_parts(&format!("/?id={id}&page=2"));
        let ParsedQuery(filter) = ParsedQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(filter.id, id);
        assert_eq!(filter.page, Some(2));
    }

    #[tokio::test]
    async fn test_bad_query_value_is_400_validation_error() {
        let mut parts = query_parts("/?id=nope");
        let err = ParsedQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.error.to_string().starts_with("Invalid query parameters"));
        assert_eq!(err.code(), "validation_error");
    }

    #[tokio::test]
    async fn test_missing_query_field_is_400() {
        let mut parts = query_parts("/?page=1");
        let err = ParsedQuery::<Filter>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
        assert!(err.error.to_string().contains("id"));
    }

    #[tokio::test]
    async fn test_syntax_error_is_400() {
        let err = ValidatedJson::<Payload>::from_request(request("{not json", true), &())
            .await
            .unwrap_err();
        assert_eq!(err.status.as_u16(), 400);
    }
}
