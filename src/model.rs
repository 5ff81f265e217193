use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{BlogError, Result};

pub const DEFAULT_AUTHOR: &str = "Unknown Author";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

impl Post {
    pub fn new(id: u64, new_post: NewPost) -> Result<Post> {
        let (title, content) = new_post.required_fields()?;
        let date = match non_empty(new_post.date) {
            Some(date) => validate_date(date)?,
            None => today(),
        };

        Ok(Post {
            id: id,
            title: title,
            content: content,
            author: non_empty(new_post.author).unwrap_or_else(default_author),
            date: date,
        })
    }

    /// Parsed calendar date, `None` for legacy records without a valid date.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Applies every supplied field of `update`. Nothing is changed when any
    /// supplied field is invalid.
    pub fn apply(&mut self, update: PostUpdate) -> Result<()> {
        if let Some(ref title) = update.title {
            if title.is_empty() {
                return Err(BlogError::MissingField("title"));
            }
        }
        if let Some(ref content) = update.content {
            if content.is_empty() {
                return Err(BlogError::MissingField("content"));
            }
        }
        let date = match update.date {
            Some(date) => Some(validate_date(date)?),
            None => None,
        };

        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(content) = update.content {
            self.content = content;
        }
        if let Some(author) = update.author {
            self.author = author;
        }
        if let Some(date) = date {
            self.date = date;
        }
        Ok(())
    }
}

/// Body of a create request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

impl NewPost {
    fn required_fields(&self) -> Result<(String, String)> {
        let title = match self.title {
            Some(ref title) if !title.is_empty() => title.clone(),
            _ => return Err(BlogError::MissingField("title")),
        };
        let content = match self.content {
            Some(ref content) if !content.is_empty() => content.clone(),
            _ => return Err(BlogError::MissingField("content")),
        };
        Ok((title, content))
    }
}

/// Body of an update request. Absent fields keep their stored value.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub date: Option<String>,
}

pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Accepts only dates already written as zero-padded `YYYY-MM-DD`, so stored
/// dates stay searchable by prefix.
fn validate_date(date: String) -> Result<String> {
    match parse_date(&date) {
        Some(parsed) if parsed.format(DATE_FORMAT).to_string() == date => Ok(date),
        _ => Err(BlogError::InvalidDateFormat(date)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn today() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}
