use crate::defaults;
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::tts::AudioRef;
use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use serde::{Deserialize, Serialize};

pub(crate) const NO_AUDIO: &str = "No audio file provided";
const NO_SELECTED_FILE: &str = "No selected file";

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub original_text: String,
    pub translated_text: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_preview_language")]
    pub language: String,
}

fn default_preview_language() -> String {
    defaults::DEFAULT_PREVIEW_LANGUAGE.to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub audio_url: Option<String>,
}

struct Upload {
    file_name: String,
    data: Bytes,
}

/// `POST /translate`: multipart `audio` file plus optional `target_lang`.
pub async fn translate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::bad_request(NO_AUDIO));
    };

    let mut upload = None;
    let mut target_lang = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                // A part without a filename is a plain form value, not a file.
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let data = field.bytes().await.map_err(ApiError::from_multipart)?;
                upload = Some(Upload { file_name, data });
            }
            Some("target_lang") => {
                let value = field.text().await.map_err(ApiError::from_multipart)?;
                if !value.trim().is_empty() {
                    target_lang = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let Some(upload) = upload else {
        return Err(ApiError::bad_request(NO_AUDIO));
    };
    if upload.file_name.is_empty() {
        return Err(ApiError::bad_request(NO_SELECTED_FILE));
    }

    let target_lang = target_lang.unwrap_or_else(|| state.default_target.clone());
    tracing::debug!(
        file = %upload.file_name,
        bytes = upload.data.len(),
        target_lang = %target_lang,
        "translate request"
    );

    let output = state
        .pipeline
        .run(upload.data.to_vec(), &target_lang)
        .await?;

    Ok(Json(TranslateResponse {
        original_text: output.original_text,
        translated_text: output.translated_text,
        audio_url: output.audio.as_ref().and_then(AudioRef::url).map(str::to_string),
    }))
}

/// `POST /preview`: speak `text` in `language` into a fixed preview file.
pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let reference = state
        .pipeline
        .preview(&request.text, &request.language)
        .await?;

    Ok(Json(PreviewResponse {
        audio_url: reference.url().map(str::to_string),
    }))
}
