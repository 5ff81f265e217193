//! Sorting and searching over an already loaded post collection.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::{BlogError, Result};
use crate::model::Post;

/// A searchable and sortable post field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostField {
    Title,
    Content,
    Author,
    Date,
}

impl FromStr for PostField {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<PostField> {
        match s {
            "title" => Ok(PostField::Title),
            "content" => Ok(PostField::Content),
            "author" => Ok(PostField::Author),
            "date" => Ok(PostField::Date),
            _ => Err(BlogError::InvalidQueryParameter {
                name: "sort",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl FromStr for Direction {
    type Err = BlogError;

    fn from_str(s: &str) -> Result<Direction> {
        match s {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(BlogError::InvalidQueryParameter {
                name: "direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Orders two posts by a single field. Text fields ignore case, dates compare
/// as calendar dates with unparseable dates first.
pub fn compare(field: PostField, a: &Post, b: &Post) -> Ordering {
    match field {
        PostField::Title => cmp_ignore_case(&a.title, &b.title),
        PostField::Content => cmp_ignore_case(&a.content, &b.content),
        PostField::Author => cmp_ignore_case(&a.author, &b.author),
        PostField::Date => a.calendar_date().cmp(&b.calendar_date()),
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sorts `posts` when both `field` and `direction` are given, otherwise
/// returns them in their stored order. Empty values count as absent, unknown
/// values are rejected even when the other parameter is missing.
pub fn sort(mut posts: Vec<Post>, field: Option<&str>, direction: Option<&str>) -> Result<Vec<Post>> {
    let field = match field.filter(|f| !f.is_empty()) {
        Some(f) => Some(f.parse::<PostField>()?),
        None => None,
    };
    let direction = match direction.filter(|d| !d.is_empty()) {
        Some(d) => Some(d.parse::<Direction>()?),
        None => None,
    };

    if let (Some(field), Some(direction)) = (field, direction) {
        debug!("sorting {} posts by {:?} {:?}", posts.len(), field, direction);
        match direction {
            Direction::Asc => posts.sort_by(|a, b| compare(field, a, b)),
            Direction::Desc => posts.sort_by(|a, b| compare(field, b, a)),
        }
    }
    Ok(posts)
}

/// Per-field substring queries. Unset fields are empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub content: String,
    pub author: String,
    pub date: String,
}

impl SearchQuery {
    fn terms(&self) -> Vec<(PostField, String)> {
        vec![
            (PostField::Title, self.title.to_lowercase()),
            (PostField::Content, self.content.to_lowercase()),
            (PostField::Author, self.author.to_lowercase()),
            (PostField::Date, self.date.to_lowercase()),
        ]
    }
}

fn field_value(post: &Post, field: PostField) -> &str {
    match field {
        PostField::Title => &post.title,
        PostField::Content => &post.content,
        PostField::Author => &post.author,
        PostField::Date => &post.date,
    }
}

/// Returns the posts where ANY non-empty query is a case-insensitive substring
/// of its field.
///
/// Quirk kept for compatibility with existing clients: an empty query is a
/// substring of everything, so a search where every query is empty returns
/// the whole collection rather than nothing. Empty queries do not widen a
/// search that has at least one non-empty query.
pub fn search(posts: &[Post], query: &SearchQuery) -> Vec<Post> {
    let terms: Vec<(PostField, String)> = query
        .terms()
        .into_iter()
        .filter(|(_, term)| !term.is_empty())
        .collect();

    if terms.is_empty() {
        return posts.to_vec();
    }

    posts
        .iter()
        .filter(|post| {
            terms
                .iter()
                .any(|(field, term)| field_value(post, *field).to_lowercase().contains(term.as_str()))
        })
        .cloned()
        .collect()
}
