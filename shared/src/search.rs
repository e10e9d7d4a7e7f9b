//! Search query parsing
//!
//! Search itself is a prefix `LIKE` delegated to the database. This module
//! only normalises what the client sent and decides which column to match.

use crate::error::{Result, ValidationError};
use crate::public_id::is_public_id;

/// Longest accepted search string, in characters.
pub const MAX_QUERY_CHARS: usize = 64;

/// Default and maximum number of profile search results.
pub const PROFILE_SEARCH_DEFAULT_LIMIT: i64 = 10;
/// Upper bound for `search-list`.
pub const PROFILE_SEARCH_MAX_LIMIT: i64 = 25;

/// Default and maximum number of city results.
pub const CITY_SEARCH_DEFAULT_LIMIT: i64 = 10;
/// Upper bound for city search.
pub const CITY_SEARCH_MAX_LIMIT: i64 = 50;

/// Clamp a client-requested limit into `1..=max`, falling back to `default`.
pub fn clamp_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    match requested {
        Some(n) if n >= 1 => n.min(max),
        Some(_) => 1,
        None => default.min(max),
    }
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
/// The queries use `ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn normalise(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyQuery);
    }
    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(ValidationError::QueryTooLong(MAX_QUERY_CHARS));
    }
    Ok(trimmed)
}

/// What a profile search matches against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileQuery {
    /// All-digit input: prefix of the 8-digit public id
    PublicIdPrefix(String),
    /// Anything else: case-insensitive prefix of username or display name
    NamePrefix(String),
}

impl ProfileQuery {
    /// Parse a raw `q` parameter.
    pub fn parse(raw: &str) -> Result<Self> {
        let q = normalise(raw)?;
        if q.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ProfileQuery::PublicIdPrefix(q.to_string()));
        }
        let name = q.strip_prefix('@').unwrap_or(q).trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(ProfileQuery::NamePrefix(name.to_lowercase()))
    }

    /// Pattern for `LIKE ... ESCAPE '\'`
    pub fn like_pattern(&self) -> String {
        match self {
            ProfileQuery::PublicIdPrefix(p) | ProfileQuery::NamePrefix(p) => {
                format!("{}%", escape_like(p))
            }
        }
    }

    /// The normalised text that was matched
    pub fn text(&self) -> &str {
        match self {
            ProfileQuery::PublicIdPrefix(p) | ProfileQuery::NamePrefix(p) => p,
        }
    }

    /// Full public id, when the query can only match one profile
    pub fn exact_public_id(&self) -> Option<&str> {
        match self {
            ProfileQuery::PublicIdPrefix(p) if is_public_id(p) => Some(p),
            _ => None,
        }
    }
}

/// Validated city lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityQuery {
    /// Lower-cased name prefix
    pub prefix: String,
    /// Upper-cased ISO-3166 alpha-2 country filter
    pub country: Option<String>,
    /// Result cap
    pub limit: i64,
}

impl CityQuery {
    /// Validate the `q`, `country` and `limit` query parameters.
    pub fn parse(q: Option<&str>, country: Option<&str>, limit: Option<i64>) -> Result<Self> {
        let prefix = normalise(q.unwrap_or_default())?.to_lowercase();

        let country = match country.map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(c) if c.len() == 2 && c.bytes().all(|b| b.is_ascii_alphabetic()) => {
                Some(c.to_ascii_uppercase())
            }
            Some(c) => return Err(ValidationError::InvalidCountry(c.to_string())),
        };

        Ok(Self {
            prefix,
            country,
            limit: clamp_limit(limit, CITY_SEARCH_DEFAULT_LIMIT, CITY_SEARCH_MAX_LIMIT),
        })
    }

    /// Pattern for `LIKE ... ESCAPE '\'`
    pub fn like_pattern(&self) -> String {
        format!("{}%", escape_like(&self.prefix))
    }
}

/// Resolved `/u/:slug` path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSlug {
    /// Current form: the 8-digit public id
    PublicId(String),
    /// Old username-style link that is no longer served
    Legacy,
}

impl ProfileSlug {
    /// Classify a slug.
    pub fn parse(slug: &str) -> Result<Self> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Err(ValidationError::Missing("slug"));
        }
        if !slug.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(ProfileSlug::Legacy);
        }
        if is_public_id(slug) {
            Ok(ProfileSlug::PublicId(slug.to_string()))
        } else {
            Err(ValidationError::InvalidSlug(slug.to_string()))
        }
    }
}
