use crate::repertoire::duration::Duration;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const NAME_MAX_CHARS: usize = 100;
pub const REVIEW_MAX_CHARS: usize = 500;
pub const REQUIRED: &str = "This field is required.";

/// Kind of media a repertoire entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Kind {
    #[default]
    Movie,
    Series,
    Other,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Movie, Kind::Series, Kind::Other];

    /// Wire value, as used in forms and the API
    pub fn code(self) -> &'static str {
        match self {
            Kind::Movie => "MOVIE",
            Kind::Series => "SERIES",
            Kind::Other => "OTHER",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Kind::Movie => "Movie",
            Kind::Series => "Series",
            Kind::Other => "Other",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Select a valid choice. {} is not one of the available choices.", s))
    }
}

/// Star rating between [`Rating::MIN`] and [`Rating::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(stars: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&stars).then_some(Self(stars))
    }

    pub fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(stars: u8) -> Result<Self, Self::Error> {
        Self::new(stars).ok_or_else(|| {
            format!(
                "Rating must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                stars
            )
        })
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled = usize::from(self.0);
        let empty = usize::from(Self::MAX) - filled;
        write!(f, "{}{}", "★".repeat(filled), "☆".repeat(empty))
    }
}

/// A logged movie, series or other media entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepertoireItem {
    pub id: u64,
    pub name: String,
    pub date: NaiveDate,
    pub rating: Rating,
    pub review: String,
    #[serde(default)]
    pub kind: Kind,
    #[serde(default)]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub season: Option<u16>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl RepertoireItem {
    pub fn from_draft(id: u64, draft: ItemDraft) -> Self {
        Self {
            id,
            name: draft.name,
            date: draft.date,
            rating: draft.rating,
            review: draft.review,
            kind: draft.kind,
            duration: draft.duration,
            season: draft.season,
            photo: draft.photo,
        }
    }

    pub fn to_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.name.clone(),
            date: self.date,
            rating: self.rating,
            review: self.review.clone(),
            kind: self.kind,
            duration: self.duration,
            season: self.season,
            photo: self.photo.clone(),
        }
    }

    pub fn is_from_year(&self, year: i32) -> bool {
        self.date.year() == year
    }

    /// True when the entry was logged during the current calendar year
    pub fn is_from_current_year(&self) -> bool {
        self.is_from_year(Local::now().year())
    }

    /// File name under which the photo is served, if any
    pub fn photo_file_name(&self) -> Option<&str> {
        self.photo
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|file| !file.is_empty())
    }
}

/// Every field of an item except its id
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub date: NaiveDate,
    pub rating: Rating,
    pub review: String,
    pub kind: Kind,
    pub duration: Option<Duration>,
    pub season: Option<u16>,
    pub photo: Option<String>,
}

impl ItemDraft {
    /// Length and range checks shared by forms and the API
    pub fn validate(&self) -> Result<(), FieldErrors> {
        validate_fields(&self.name, &self.review, self.season)
    }
}

/// Checks the free-text and season constraints of an item
pub fn validate_fields(name: &str, review: &str, season: Option<u16>) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::default();

    check_text(&mut errors, "name", name, NAME_MAX_CHARS);
    check_text(&mut errors, "review", review, REVIEW_MAX_CHARS);

    if season == Some(0) {
        errors.add("season", "Ensure this value is greater than or equal to 1.");
    }

    errors.into_result()
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_chars: usize) {
    let chars = value.trim().chars().count();
    if chars == 0 {
        errors.add(field, REQUIRED);
    } else if chars > max_chars {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max_chars, chars
            ),
        );
    }
}

/// Partial update: `None` leaves a field unchanged. For the double options
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub rating: Option<Rating>,
    pub review: Option<String>,
    pub kind: Option<Kind>,
    pub duration: Option<Option<Duration>>,
    pub season: Option<Option<u16>>,
}

impl ItemPatch {
    pub fn apply(self, draft: &mut ItemDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(date) = self.date {
            draft.date = date;
        }
        if let Some(rating) = self.rating {
            draft.rating = rating;
        }
        if let Some(review) = self.review {
            draft.review = review;
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if let Some(duration) = self.duration {
            draft.duration = duration;
        }
        if let Some(season) = self.season {
            draft.season = season;
        }
    }
}

/// Simple substring/equality predicates for listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilter {
    pub search: Option<String>,
    pub kind: Option<Kind>,
}

impl ListFilter {
    pub fn matches(&self, item: &RepertoireItem) -> bool {
        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                item.name.to_lowercase().contains(&term)
                    || item.review.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("invalid fields: {}", field_names(.0))]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

fn field_names(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors.keys().cloned().collect::<Vec<_>>().join(", ")
}

impl FieldErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}
