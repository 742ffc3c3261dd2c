use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use serde::Deserialize;

use crate::error::AppError;

const POSTAL_CODE_FIELD: &str = "postalCode";

/// Body of a delivery lookup.
///
/// Accepts `application/x-www-form-urlencoded` and `multipart/form-data`, as
/// sent by a browser `FormData` POST. Any other or missing content type yields
/// no postal code, which the handler rejects as invalid input.
#[derive(Debug, Default)]
pub struct DeliveryForm {
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlEncodedFields {
    #[serde(rename = "postalCode")]
    postal_code: Option<String>,
}

impl<S> FromRequest<S> for DeliveryForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?
            {
                if field.name() != Some(POSTAL_CODE_FIELD) {
                    continue;
                }
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.body_text()))?;
                return Ok(DeliveryForm {
                    postal_code: Some(value),
                });
            }
            return Ok(DeliveryForm::default());
        }

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<UrlEncodedFields>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;
            return Ok(DeliveryForm {
                postal_code: fields.postal_code,
            });
        }

        tracing::debug!("unsupported delivery body content type: {:?}", content_type);
        Ok(DeliveryForm::default())
    }
}
