//! Domain types shared by the store, repository, and front ends.
//!
//! Field names follow the backend's column names so that JSON output lines
//! up with the table contract.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Companies
// ============================================================================

/// A company row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
}

// ============================================================================
// Reviews
// ============================================================================

/// A review row without its relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub company_id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub content: String,
    pub rating: u8,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub work_location: Option<String>,
    pub is_anonymous: bool,
    pub is_current_employee: bool,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub advice_to_management: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review with its company, reactions, and comments, as the list shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewWithRelations {
    #[serde(flatten)]
    pub review: Review,
    /// `None` when the referenced company row is gone (no FK enforcement).
    #[serde(rename = "companies")]
    pub company: Option<Company>,
    pub reactions: Vec<Reaction>,
    pub comments: Vec<Comment>,
}

impl ReviewWithRelations {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.review.id
    }

    /// Whether `user_id` holds a reaction of `kind` on this review.
    #[must_use]
    pub fn has_reaction(&self, user_id: &str, kind: ReactionKind) -> bool {
        self.reactions
            .iter()
            .any(|r| r.kind == kind && r.user_id == user_id)
    }

    #[must_use]
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.has_reaction(user_id, ReactionKind::Like)
    }

    #[must_use]
    pub fn like_count(&self) -> usize {
        self.reactions
            .iter()
            .filter(|r| r.kind == ReactionKind::Like)
            .count()
    }

    /// Company display name, or empty when the company is missing.
    #[must_use]
    pub fn company_name(&self) -> &str {
        self.company.as_ref().map_or("", |c| c.name.as_str())
    }
}

/// Insert payload for a review.
///
/// Relational sub-objects are not part of this type; the caller resolves
/// `company_id` (company lookup) and `author_id` (`None` if anonymous) first.
/// `rating` stays optional so that an unfilled form reaches validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub company_id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub content: String,
    pub rating: Option<u8>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub work_location: Option<String>,
    pub is_anonymous: bool,
    pub is_current_employee: bool,
    pub pros: Option<String>,
    pub cons: Option<String>,
    pub advice_to_management: Option<String>,
}

/// Partial update of a review's scalar fields. `None` leaves a field as is.
///
/// Optional text fields take `Some(None)` to clear them; in JSON that is an
/// explicit `null`, while an absent key leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub company_id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<u8>,
    #[serde(default, deserialize_with = "present")]
    pub position: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub department: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub employment_type: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub work_location: Option<Option<String>>,
    pub is_anonymous: Option<bool>,
    pub is_current_employee: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub pros: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub cons: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub advice_to_management: Option<Option<String>>,
}

/// A key that is present (even as `null`) deserializes to `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ReviewPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply the set fields to a local review copy.
    pub fn apply_to(&self, review: &mut Review) {
        fn set<T: Clone>(slot: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut review.company_id, self.company_id.as_ref());
        set(&mut review.title, self.title.as_ref());
        set(&mut review.content, self.content.as_ref());
        set(&mut review.rating, self.rating.as_ref());
        set(&mut review.is_anonymous, self.is_anonymous.as_ref());
        set(&mut review.is_current_employee, self.is_current_employee.as_ref());
        set(&mut review.position, self.position.as_ref());
        set(&mut review.department, self.department.as_ref());
        set(&mut review.employment_type, self.employment_type.as_ref());
        set(&mut review.work_location, self.work_location.as_ref());
        set(&mut review.pros, self.pros.as_ref());
        set(&mut review.cons, self.cons.as_ref());
        set(&mut review.advice_to_management, self.advice_to_management.as_ref());
    }
}

// ============================================================================
// Reactions
// ============================================================================

/// Reaction type. The UI only produces `Like`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Helpful,
    Insightful,
}

impl ReactionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Helpful => "helpful",
            Self::Insightful => "insightful",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "helpful" => Ok(Self::Helpful),
            "insightful" => Ok(Self::Insightful),
            other => Err(format!("unknown reaction type: {other}")),
        }
    }
}

/// A reaction row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: String,
    pub review_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: ReactionKind,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub review_id: String,
    pub user_id: String,
    pub kind: ReactionKind,
}

/// Like state of a review for the acting user after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Liked,
    Unliked,
}

// ============================================================================
// Comments
// ============================================================================

/// A comment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub review_id: String,
    pub author_id: Option<String>,
    pub content: String,
    pub is_anonymous: bool,
    /// Parent comment for threaded replies.
    pub parent_comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub review_id: String,
    pub author_id: Option<String>,
    pub content: String,
    pub is_anonymous: bool,
    pub parent_comment_id: Option<String>,
}

// ============================================================================
// Profiles
// ============================================================================

/// A user profile row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> Review {
        let now = Utc::now();
        Review {
            id: "r1".to_string(),
            company_id: "c1".to_string(),
            author_id: Some("u1".to_string()),
            title: "Solid place".to_string(),
            content: "Good mentoring".to_string(),
            rating: 4,
            position: None,
            department: None,
            employment_type: None,
            work_location: None,
            is_anonymous: false,
            is_current_employee: true,
            pros: None,
            cons: None,
            advice_to_management: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let mut r = review();
        let patch = ReviewPatch {
            rating: Some(2),
            cons: Some(Some("Long hours".to_string())),
            ..ReviewPatch::default()
        };
        patch.apply_to(&mut r);
        assert_eq!(r.rating, 2);
        assert_eq!(r.cons.as_deref(), Some("Long hours"));
        assert_eq!(r.title, "Solid place");
        assert!(r.is_current_employee);
    }

    #[test]
    fn test_patch_clears_optional_fields() {
        let mut r = review();
        r.pros = Some("Flexible hours".to_string());
        let patch = ReviewPatch {
            pros: Some(None),
            ..ReviewPatch::default()
        };
        patch.apply_to(&mut r);
        assert!(r.pros.is_none());
    }

    #[test]
    fn test_patch_json_null_means_clear() {
        let patch: ReviewPatch =
            serde_json::from_str(r#"{"pros": null, "cons": "Meetings", "rating": 3}"#).unwrap();
        assert_eq!(patch.pros, Some(None));
        assert_eq!(patch.cons, Some(Some("Meetings".to_string())));
        assert_eq!(patch.position, None);
        assert_eq!(patch.rating, Some(3));
    }

    #[test]
    fn test_empty_patch() {
        assert!(ReviewPatch::default().is_empty());
        let patch = ReviewPatch {
            is_anonymous: Some(true),
            ..ReviewPatch::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_reaction_kind_round_trips_through_str() {
        for kind in [ReactionKind::Like, ReactionKind::Helpful, ReactionKind::Insightful] {
            assert_eq!(kind.as_str().parse::<ReactionKind>().unwrap(), kind);
        }
        assert!("love".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn test_review_json_uses_column_names() {
        let with = ReviewWithRelations {
            review: review(),
            company: None,
            reactions: vec![],
            comments: vec![],
        };
        let value = serde_json::to_value(&with).unwrap();
        assert_eq!(value["id"], "r1");
        assert_eq!(value["company_id"], "c1");
        assert!(value["companies"].is_null());
        assert!(value["reactions"].as_array().unwrap().is_empty());
    }
}
