use crate::http::error::HttpError;
use axum::{
    extract::{Form, FromRequest, Multipart, Request},
    http::header,
};
use std::collections::HashMap;

/// A photo file attached to a form submission
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Web form body, either urlencoded or multipart
#[derive(Debug, Default)]
pub struct FormSubmission {
    pub fields: HashMap<String, String>,
    pub photo: Option<UploadedPhoto>,
}

impl FormSubmission {
    /// True when the "clear" checkbox next to the current photo was ticked
    pub fn clears_photo(&self) -> bool {
        self.fields
            .get("photo-clear")
            .is_some_and(|value| !value.is_empty() && value != "off")
    }
}

impl<S> FromRequest<S> for FormSubmission
where
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| HttpError::BadRequest(e.body_text()))?;
            return Ok(Self {
                fields,
                photo: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| HttpError::BadRequest(e.body_text()))?;

        let mut submission = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HttpError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "photo" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| HttpError::BadRequest(e.body_text()))?;

                // Browsers send an empty part when no file was chosen
                if !file_name.is_empty() && !bytes.is_empty() {
                    submission.photo = Some(UploadedPhoto {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| HttpError::BadRequest(e.body_text()))?;
                submission.fields.insert(name, value);
            }
        }

        Ok(submission)
    }
}
