use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use docqa_application::{DocumentPayload, UploadDocsRequest};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::HttpError;

/// JSON body validated with `validator`. An absent or blank body yields `T::default()`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Default,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| HttpError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;
        let value = parse_optional_json::<T>(&body)?;
        validate(&value)?;
        Ok(Self(value))
    }
}

fn parse_optional_json<T>(body: &[u8]) -> Result<T, HttpError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| HttpError::BadRequest {
        message: format!("invalid JSON body: {err}"),
    })
}

fn validate<T: Validate>(value: &T) -> Result<(), HttpError> {
    value.validate().map_err(|err| HttpError::Validation {
        message: err.to_string(),
    })
}

/// Upload body: JSON (`{"documents": [...]}`), multipart files, or nothing at all.
pub struct UploadPayload(pub UploadDocsRequest);

impl<S> FromRequest<S> for UploadPayload
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));
        if !is_multipart {
            let ValidatedJson(request) = ValidatedJson::from_request(req, state).await?;
            return Ok(Self(request));
        }

        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| HttpError::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;
        let request = read_multipart(multipart).await?;
        validate(&request)?;
        Ok(Self(request))
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<UploadDocsRequest, HttpError> {
    let mut documents = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| HttpError::Rejected {
            status: err.status(),
            message: err.body_text(),
        })?
    {
        let name = field.name().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        if file_name.is_none() && name.as_deref() != Some("content") {
            continue;
        }

        let label = file_name
            .clone()
            .or_else(|| name.clone())
            .unwrap_or_default();
        let bytes = field.bytes().await.map_err(|err| HttpError::Rejected {
            status: err.status(),
            message: err.body_text(),
        })?;
        let content = String::from_utf8(bytes.to_vec()).map_err(|_| HttpError::Validation {
            message: format!("part `{label}` is not valid UTF-8 text"),
        })?;

        documents.push(DocumentPayload {
            title: file_name.clone(),
            source: file_name,
            content,
        });
    }
    Ok(UploadDocsRequest { documents })
}

#[cfg(test)]
mod tests {
    use docqa_application::AskRequest;

    use super::*;

    #[test]
    fn blank_body_yields_default_request() {
        let request: AskRequest = parse_optional_json(b"  \n").unwrap();
        assert!(request.question.is_none());
        assert!(request.top_k.is_none());
    }

    #[test]
    fn malformed_json_is_a_bad_request() {
        let err = parse_optional_json::<AskRequest>(b"{\"question\":").unwrap_err();
        assert!(matches!(err, HttpError::BadRequest { .. }));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let request: AskRequest =
            parse_optional_json(br#"{"question":"why","top_k":500}"#).unwrap();
        assert!(matches!(validate(&request), Err(HttpError::Validation { .. })));
    }
}
