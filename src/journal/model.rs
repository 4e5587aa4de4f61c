// Core diary types shared by the repository, the timeline transforms
// and the entry workflow.

use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// One of the two diary authors. The pair is fixed; there is no account
/// system behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Father,
    Mother,
}

impl Author {
    pub const ALL: [Author; 2] = [Author::Father, Author::Mother];

    pub fn as_str(&self) -> &'static str {
        match self {
            Author::Father => "father",
            Author::Mother => "mother",
        }
    }

    /// Display label in the diary's own language.
    pub fn label(&self) -> &'static str {
        match self {
            Author::Father => "父",
            Author::Mother => "母",
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown author: {0}")]
pub struct ParseAuthorError(String);

impl FromStr for Author {
    type Err = ParseAuthorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "father" => Ok(Author::Father),
            "mother" => Ok(Author::Mother),
            other => Err(ParseAuthorError(other.to_string())),
        }
    }
}

/// Reading-size preference for the diary views. Defaults to `Large`;
/// the typical reader is far-sighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Medium,
    #[default]
    Large,
}

impl FontSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown font size: {0}")]
pub struct ParseFontSizeError(String);

impl FromStr for FontSize {
    type Err = ParseFontSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(FontSize::Small),
            "medium" => Ok(FontSize::Medium),
            "large" => Ok(FontSize::Large),
            other => Err(ParseFontSizeError(other.to_string())),
        }
    }
}

/// A saved diary entry. `date` is the diary day the entry belongs to,
/// which is not necessarily the day the row was created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub created_at: String,
    pub date: NaiveDate,
    pub author: Author,
    pub comment: Option<String>,
    pub image_url: Option<String>,
    pub is_deleted: bool,
}

/// All posts that share one diary day, newest day first when grouped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostsByDate {
    pub date: NaiveDate,
    pub posts: Vec<Post>,
}

/// One cell of a month grid. Leading cells before the first of the
/// month carry no date so the grid starts on a Sunday column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: Option<NaiveDate>,
    pub posts: Vec<Post>,
}

/// An image picked for upload but not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage {
    pub data: Bytes,
    pub ext: String,
}

impl NewImage {
    /// Builds an upload from the original file name and its bytes. The
    /// extension is kept so the stored object keeps the original type.
    /// Returns `None` when the name has no usable extension.
    pub fn from_upload(file_name: &str, data: Bytes) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        Some(Self { data, ext })
    }
}

/// What should happen to a post's image on update. `Keep` leaves the
/// current object reference untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImageChange {
    #[default]
    Keep,
    Replace(NewImage),
    Remove,
}

/// The diary day "today" resolves to. Day boundaries follow UTC so both
/// devices agree on the date regardless of their local clocks.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_round_trips_through_str() {
        for author in Author::ALL {
            assert_eq!(author.as_str().parse::<Author>().unwrap(), author);
        }
    }

    #[test]
    fn test_unknown_author_rejected() {
        assert!("grandma".parse::<Author>().is_err());
        assert!("Father".parse::<Author>().is_err());
    }

    #[test]
    fn test_author_labels() {
        assert_eq!(Author::Father.label(), "父");
        assert_eq!(Author::Mother.label(), "母");
    }

    #[test]
    fn test_font_size_defaults_to_large() {
        assert_eq!(FontSize::default(), FontSize::Large);
    }

    #[test]
    fn test_author_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Author::Father).unwrap(), "\"father\"");
        assert_eq!(serde_json::to_string(&Author::Mother).unwrap(), "\"mother\"");
    }

    #[test]
    fn test_new_image_takes_extension_from_file_name() {
        let image = NewImage::from_upload("garden photo.JPG", Bytes::from_static(b"x")).unwrap();
        assert_eq!(image.ext, "jpg");
    }

    #[test]
    fn test_new_image_without_extension_rejected() {
        assert!(NewImage::from_upload("photo", Bytes::new()).is_none());
        assert!(NewImage::from_upload("", Bytes::new()).is_none());
    }
}
