use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest id the remote store accepts for documents and files.
pub const MAX_REMOTE_ID_LEN: usize = 36;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

id_newtype!(Slug);
id_newtype!(FileId);
id_newtype!(UserId);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("id must not be empty")]
    Empty,
    #[error("id '{0}' is longer than 36 characters")]
    TooLong(String),
    #[error("id '{0}' must not start with '.', '-' or '_'")]
    LeadingSpecial(String),
    #[error("id '{id}' contains unsupported character '{ch}'")]
    InvalidChar { id: String, ch: char },
}

fn validate_remote_id(raw: &str) -> Result<(), IdError> {
    let Some(first) = raw.chars().next() else {
        return Err(IdError::Empty);
    };
    if raw.chars().count() > MAX_REMOTE_ID_LEN {
        return Err(IdError::TooLong(raw.to_string()));
    }
    if matches!(first, '.' | '-' | '_') {
        return Err(IdError::LeadingSpecial(raw.to_string()));
    }
    if let Some(ch) = raw
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_')))
    {
        return Err(IdError::InvalidChar {
            id: raw.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Turns a title into slug form: lowercased, every run of punctuation becomes
/// one `-`, every whitespace character becomes `-`.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_symbol_run = false;
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_symbol_run = false;
        } else if ch.is_whitespace() {
            out.push('-');
            in_symbol_run = false;
        } else if !in_symbol_run {
            out.push('-');
            in_symbol_run = true;
        }
    }
    out
}

impl Slug {
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        validate_remote_id(&raw)?;
        Ok(Self(raw))
    }

    /// Derives a slug from a post title, truncated to the remote id limit.
    pub fn from_title(title: &str) -> Result<Self, IdError> {
        let mut slug = slugify(title);
        slug.truncate(MAX_REMOTE_ID_LEN);
        Self::parse(slug)
    }
}

impl FromStr for Slug {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FileId {
    pub fn parse(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        validate_remote_id(&raw)?;
        Ok(Self(raw))
    }

    /// Fresh client-generated id (32 lowercase hex characters).
    pub fn unique() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}

impl FromStr for FileId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl FromStr for UserId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Active,
    Inactive,
}

impl PostStatus {
    pub const ALL: [PostStatus; 2] = [PostStatus::Active, PostStatus::Inactive];

    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown post status '{0}' (expected active or inactive)")]
pub struct ParsePostStatusError(pub String);

impl FromStr for PostStatus {
    type Err = ParsePostStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(PostStatus::Active),
            "inactive" => Ok(PostStatus::Inactive),
            other => Err(ParsePostStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation_runs_but_not_spaces() {
        assert_eq!(slugify("  Hello, World!  "), "hello--world-");
        assert_eq!(slugify("Rust & Tokio"), "rust---tokio");
        assert_eq!(slugify("chai aur react"), "chai-aur-react");
    }

    #[test]
    fn from_title_truncates_to_remote_limit() {
        let slug = Slug::from_title(&"a".repeat(50)).expect("slug");
        assert_eq!(slug.as_str().len(), MAX_REMOTE_ID_LEN);
    }

    #[test]
    fn rejects_ids_the_remote_store_refuses() {
        assert_eq!(Slug::parse(""), Err(IdError::Empty));
        assert!(matches!(
            Slug::parse("-leading"),
            Err(IdError::LeadingSpecial(_))
        ));
        assert!(matches!(
            Slug::parse("has space"),
            Err(IdError::InvalidChar { ch: ' ', .. })
        ));
        assert!(Slug::from_title("!!! shout").is_err());
        assert!(Slug::parse("my-first_post.v2").is_ok());
    }

    #[test]
    fn unique_file_ids_are_valid_remote_ids() {
        let id = FileId::unique();
        assert_eq!(id.as_str().len(), 32);
        assert!(FileId::parse(id.as_str()).is_ok());
        assert_ne!(id, FileId::unique());
    }

    #[test]
    fn post_status_round_trips_through_text() {
        for status in PostStatus::ALL {
            assert_eq!(status.as_str().parse::<PostStatus>(), Ok(status));
        }
        assert!("draft".parse::<PostStatus>().is_err());
    }
}
