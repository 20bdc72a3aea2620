//! Form submission boundary for the web interface.
//!
//! Every field arrives as free text. Validation collects one message per
//! failing field so the page can be re-rendered with inline errors.

use crate::repertoire::duration::{self, Duration, DurationInput};
use crate::repertoire::models::{
    FieldErrors, ItemDraft, Kind, REQUIRED, Rating, RepertoireItem, validate_fields,
};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Raw field values as submitted (or prefilled from a stored item)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepertoireForm {
    pub name: String,
    pub date: String,
    pub rating: String,
    pub review: String,
    pub kind: String,
    pub duration: String,
    pub season: String,
    /// Stored duration the form was prefilled from. Submitting its `H:MM`
    /// text unchanged keeps it, even past the two-digit hours text accepts.
    pub current_duration: Option<Duration>,
}

impl RepertoireForm {
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let field = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            name: field("name"),
            date: field("date"),
            rating: field("rating"),
            review: field("review"),
            kind: field("kind"),
            duration: field("duration"),
            season: field("season"),
            current_duration: None,
        }
    }

    /// Prefill for the edit page
    pub fn from_item(item: &RepertoireItem) -> Self {
        Self::from_draft(&item.to_draft())
    }

    pub fn from_draft(draft: &ItemDraft) -> Self {
        Self {
            name: draft.name.clone(),
            date: draft.date.format("%Y-%m-%d").to_string(),
            rating: draft.rating.stars().to_string(),
            review: draft.review.clone(),
            kind: draft.kind.code().to_string(),
            duration: duration::format_optional(draft.duration),
            season: draft.season.map(|s| s.to_string()).unwrap_or_default(),
            current_duration: draft.duration,
        }
    }

    pub fn with_current_duration(mut self, duration: Option<Duration>) -> Self {
        self.current_duration = duration;
        self
    }

    /// Validates every field. `photo` is carried through untouched; the caller
    /// decides whether an upload replaces or clears it.
    pub fn validate(&self, photo: Option<String>) -> Result<ItemDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        let date = match self.date.trim() {
            "" => {
                errors.add("date", REQUIRED);
                None
            }
            raw => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| errors.add("date", "Enter a valid date."))
                .ok(),
        };

        let rating = match self.rating.trim() {
            "" => {
                errors.add("rating", REQUIRED);
                None
            }
            raw => raw.parse::<u8>().ok().and_then(Rating::new).or_else(|| {
                errors.add(
                    "rating",
                    format!(
                        "Select a valid choice. {} is not one of the available choices.",
                        raw
                    ),
                );
                None
            }),
        };

        let kind = match self.kind.trim() {
            "" => Some(Kind::default()),
            raw => raw.parse::<Kind>().map_err(|e| errors.add("kind", e)).ok(),
        };

        let duration = match self.current_duration {
            Some(current) if self.duration.trim() == current.to_string() => Some(current),
            _ => DurationInput::from(self.duration.as_str())
                .normalize()
                .map_err(|e| errors.add("duration", e.to_string()))
                .ok()
                .flatten(),
        };

        let season = match self.season.trim() {
            "" => None,
            raw => raw
                .parse::<u16>()
                .map_err(|_| errors.add("season", "Enter a whole number."))
                .ok(),
        };

        if let Err(more) = validate_fields(&self.name, &self.review, season) {
            errors.merge(more);
        }

        match (date, rating, kind) {
            (Some(date), Some(rating), Some(kind)) if errors.is_empty() => Ok(ItemDraft {
                name: self.name.trim().to_string(),
                date,
                rating,
                review: self.review.trim().to_string(),
                kind,
                duration,
                season,
                photo,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repertoire::duration::Duration;

    fn valid_form() -> RepertoireForm {
        RepertoireForm {
            name: "Modelo Teste".to_string(),
            date: "2024-05-01".to_string(),
            rating: "2".to_string(),
            review: "Resenha de teste.".to_string(),
            kind: "MOVIE".to_string(),
            duration: "01:00".to_string(),
            season: String::new(),
            current_duration: None,
        }
    }

    #[test]
    fn test_valid_form_produces_draft() {
        let draft = valid_form().validate(None).unwrap();
        assert_eq!(draft.duration, Some(Duration::from_seconds(3600)));
        assert_eq!(draft.rating.stars(), 2);
        assert_eq!(draft.kind, Kind::Movie);
    }

    #[test]
    fn test_blank_duration_is_none() {
        let mut form = valid_form();
        form.duration = String::new();
        assert_eq!(form.validate(None).unwrap().duration, None);
    }

    #[test]
    fn test_invalid_duration_reported_inline() {
        let mut form = valid_form();
        form.duration = "1:5".to_string();

        let errors = form.validate(None).unwrap_err();
        assert_eq!(errors.get("duration").len(), 1);
        assert!(errors.get("duration")[0].contains("HH:MM"));
        assert!(errors.get("name").is_empty());
    }

    #[test]
    fn test_all_errors_collected() {
        let form = RepertoireForm {
            kind: "PODCAST".to_string(),
            rating: "9".to_string(),
            season: "two".to_string(),
            ..Default::default()
        };

        let errors = form.validate(None).unwrap_err();
        for field in ["name", "date", "rating", "review", "kind", "season"] {
            assert!(!errors.get(field).is_empty(), "missing error for {field}");
        }
    }

    #[test]
    fn test_prefill_round_trips() {
        let draft = valid_form().validate(Some("repertoire/photos/a.png".into())).unwrap();
        let item = RepertoireItem::from_draft(1, draft.clone());

        let form = RepertoireForm::from_item(&item);
        assert_eq!(form.duration, "1:00");
        assert_eq!(form.validate(item.photo.clone()).unwrap(), draft);
    }

    #[test]
    fn test_prefill_keeps_durations_past_two_digit_hours() {
        let mut draft = valid_form().validate(None).unwrap();
        draft.duration = DurationInput::Seconds(360_000).normalize().unwrap();
        let item = RepertoireItem::from_draft(1, draft.clone());

        let form = RepertoireForm::from_item(&item);
        assert_eq!(form.duration, "100:00");
        assert_eq!(form.validate(None).unwrap(), draft);

        let mut typed = form.clone();
        typed.duration = "100:30".to_string();
        assert!(!typed.validate(None).unwrap_err().get("duration").is_empty());

        let mut cleared = form;
        cleared.duration.clear();
        assert_eq!(cleared.validate(None).unwrap().duration, None);
    }
}
