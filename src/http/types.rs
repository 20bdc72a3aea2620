use crate::repertoire::duration::{self, DurationInput};
use crate::repertoire::models::{FieldErrors, ItemPatch, Kind, REQUIRED, Rating, RepertoireItem};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An item as returned by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiItem {
    #[serde(flatten)]
    pub item: RepertoireItem,
    /// Relative link to `GET /photos/{file}`
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl From<RepertoireItem> for ApiItem {
    fn from(item: RepertoireItem) -> Self {
        let photo_url = item.photo_file_name().map(|file| format!("/photos/{}", file));
        Self { item, photo_url }
    }
}

/// Body of `PUT`/`PATCH /api/items/{id}`.
///
/// `duration` and `season` distinguish an absent key (keep the stored value)
/// from an explicit `null` (clear it).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub season: Option<Option<u16>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl ItemPayload {
    /// Converts the payload into a patch. A full replacement (`partial` false)
    /// must carry every required field.
    pub fn into_patch(self, partial: bool) -> Result<ItemPatch, FieldErrors> {
        let mut errors = FieldErrors::default();

        if !partial {
            let required = [
                ("name", self.name.is_none()),
                ("date", self.date.is_none()),
                ("rating", self.rating.is_none()),
                ("review", self.review.is_none()),
            ];
            for (field, missing) in required {
                if missing {
                    errors.add(field, REQUIRED);
                }
            }
        }

        let rating = match self.rating {
            Some(stars) => match Rating::new(stars) {
                Some(rating) => Some(rating),
                None => {
                    errors.add(
                        "rating",
                        format!("\"{}\" is not a valid choice.", stars),
                    );
                    None
                }
            },
            None => None,
        };

        let duration = match &self.duration {
            Some(value) => {
                match DurationInput::from_json(value).and_then(duration::normalize) {
                    Ok(duration) => Some(duration),
                    Err(e) => {
                        errors.add("duration", e.to_string());
                        None
                    }
                }
            }
            None => None,
        };

        errors.into_result()?;

        Ok(ItemPatch {
            name: self.name,
            date: self.date,
            rating,
            review: self.review,
            kind: self.kind,
            duration,
            season: self.season,
        })
    }
}
