//! Identity bindings between image fingerprints and named subjects.
//!
//! A binding is only ever created from an explicit user assertion; nothing in
//! the system derives a subject from image content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject label used when the user asserts the observation shows themselves.
pub const SELF_SUBJECT: &str = "user";

/// How certain the binding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("invalid confidence: '{other}'")),
        }
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Medium
    }
}

/// Who established a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingSource {
    User,
    System,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSource::User => write!(f, "user"),
            BindingSource::System => write!(f, "system"),
        }
    }
}

impl FromStr for BindingSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(BindingSource::User),
            "system" => Ok(BindingSource::System),
            other => Err(format!("invalid binding source: '{other}'")),
        }
    }
}

/// Durable association between an image fingerprint and a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityBinding {
    pub image_fingerprint: String,
    pub subject: String,
    pub confidence: Confidence,
    pub source: BindingSource,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl IdentityBinding {
    /// Whether the subject is the user themselves.
    pub fn is_self(&self) -> bool {
        self.subject == SELF_SUBJECT
    }

    /// How the subject should be referred to when speaking to the user.
    pub fn spoken_subject(&self) -> &str {
        if self.is_self() { "you" } else { &self.subject }
    }
}

/// Input to an identity upsert.
///
/// On conflict the store refreshes subject, confidence, notes and last-seen,
/// but keeps the original `created_at` and `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityUpsert {
    pub image_fingerprint: String,
    pub subject: String,
    pub confidence: Confidence,
    pub source: BindingSource,
    pub notes: Option<String>,
    pub seen_at: DateTime<Utc>,
}

impl IdentityUpsert {
    /// A high-confidence binding asserted by the user, seen now.
    pub fn asserted_by_user(image_fingerprint: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            image_fingerprint: image_fingerprint.into(),
            subject: subject.into(),
            confidence: Confidence::High,
            source: BindingSource::User,
            notes: None,
            seen_at: Utc::now(),
        }
    }

    /// The binding this upsert produces when no prior row exists.
    pub fn into_binding(self) -> IdentityBinding {
        IdentityBinding {
            image_fingerprint: self.image_fingerprint,
            subject: self.subject,
            confidence: self.confidence,
            source: self.source,
            created_at: self.seen_at,
            last_seen_at: self.seen_at,
            notes: self.notes,
        }
    }
}
