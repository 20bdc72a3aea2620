use crate::http::error::{HttpError, HttpResult};
use crate::http::extract::FormSubmission;
use crate::http::pages;
use crate::http::state::HttpState;
use crate::repertoire::form::RepertoireForm;
use crate::repertoire::models::{FieldErrors, ItemDraft, ListFilter};
use crate::store::UpdateOutcome;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};

const NEW_TITLE: &str = "New entry";
const EDIT_TITLE: &str = "Edit entry";

pub async fn handle_list_page(State(state): State<HttpState>) -> HttpResult<Html<String>> {
    let items = state
        .blocking(|state| state.store.list(&ListFilter::default()))
        .await?;

    Ok(Html(pages::list_page(&items)))
}

pub async fn handle_new_page() -> Html<String> {
    Html(pages::form_page(
        NEW_TITLE,
        "/new",
        &RepertoireForm::default(),
        &FieldErrors::default(),
        None,
    ))
}

pub async fn handle_create(
    State(state): State<HttpState>,
    submission: FormSubmission,
) -> HttpResult<Response> {
    let form = RepertoireForm::from_fields(&submission.fields);

    let draft = match validate_submission(&form, &submission) {
        Ok(draft) => draft,
        Err(errors) => {
            let page = pages::form_page(NEW_TITLE, "/new", &form, &errors, None);
            return Ok(Html(page).into_response());
        }
    };

    let upload = submission.photo;
    let item = state
        .blocking(move |state| {
            let mut draft = draft;
            if let Some(upload) = upload {
                draft.photo = Some(state.photos.save(&upload.file_name, &upload.bytes)?);
            }
            let photo = draft.photo.clone();
            state.store.create(draft).inspect_err(|_| {
                if let Some(photo) = &photo {
                    state.discard_photo(photo);
                }
            })
        })
        .await?;

    tracing::info!("Created item {} ({})", item.id, item.name);
    Ok(Redirect::to("/").into_response())
}

pub async fn handle_edit_page(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
) -> HttpResult<Html<String>> {
    let item = state
        .blocking(move |state| state.store.get(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    Ok(Html(pages::form_page(
        EDIT_TITLE,
        &format!("/edit/{}", id),
        &RepertoireForm::from_item(&item),
        &FieldErrors::default(),
        item.photo.as_deref(),
    )))
}

pub async fn handle_update(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
    submission: FormSubmission,
) -> HttpResult<Response> {
    let existing = state
        .blocking(move |state| state.store.get(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    let form = RepertoireForm::from_fields(&submission.fields)
        .with_current_duration(existing.duration);
    let rerender = |errors: &FieldErrors| {
        let page = pages::form_page(
            EDIT_TITLE,
            &format!("/edit/{}", id),
            &form,
            errors,
            existing.photo.as_deref(),
        );
        Html(page).into_response()
    };

    let submitted = match validate_submission(&form, &submission) {
        Ok(draft) => draft,
        Err(errors) => return Ok(rerender(&errors)),
    };

    let clears_photo = submission.clears_photo();
    let upload = submission.photo;
    let outcome = state
        .blocking(move |state| {
            let uploaded = upload
                .map(|upload| state.photos.save(&upload.file_name, &upload.bytes))
                .transpose()?;

            let result = state.store.update(id, |draft| {
                let kept = if clears_photo { None } else { draft.photo.take() };
                *draft = ItemDraft {
                    photo: uploaded.clone().or(kept),
                    ..submitted
                };
                Ok(())
            });

            match &result {
                Ok(UpdateOutcome::Updated { item, previous }) => {
                    if let Some(old) = previous.photo.as_deref() {
                        if item.photo.as_deref() != Some(old) {
                            state.discard_photo(old);
                        }
                    }
                }
                _ => {
                    if let Some(photo) = &uploaded {
                        state.discard_photo(photo);
                    }
                }
            }
            result
        })
        .await?;

    match outcome {
        UpdateOutcome::Updated { item, .. } => {
            tracing::info!("Updated item {} ({})", item.id, item.name);
            Ok(Redirect::to("/").into_response())
        }
        UpdateOutcome::Invalid(errors) => Ok(rerender(&errors)),
        UpdateOutcome::NotFound => Err(HttpError::not_found()),
    }
}

pub async fn handle_delete_page(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
) -> HttpResult<Html<String>> {
    let item = state
        .blocking(move |state| state.store.get(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    Ok(Html(pages::delete_page(&item)))
}

pub async fn handle_delete(
    State(state): State<HttpState>,
    Path(id): Path<u64>,
) -> HttpResult<Redirect> {
    let removed = state
        .blocking(move |state| state.delete_item(id))
        .await?
        .ok_or_else(HttpError::not_found)?;

    tracing::info!("Deleted item {} ({})", removed.id, removed.name);
    Ok(Redirect::to("/"))
}

/// Form validation plus the upload check. The photo is left unset; the
/// caller attaches an upload or keeps the stored one.
fn validate_submission(
    form: &RepertoireForm,
    submission: &FormSubmission,
) -> Result<ItemDraft, FieldErrors> {
    let mut errors = match &submission.photo {
        Some(upload) if !is_image(&upload.file_name) => FieldErrors::single(
            "photo",
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
        ),
        _ => FieldErrors::default(),
    };

    match form.validate(None) {
        Ok(draft) if errors.is_empty() => Ok(draft),
        Ok(_) => Err(errors),
        Err(form_errors) => {
            errors.merge(form_errors);
            Err(errors)
        }
    }
}

fn is_image(file_name: &str) -> bool {
    mime_guess::from_path(file_name).first_or_octet_stream().type_() == mime_guess::mime::IMAGE
}
