//! Client-side search, filtering, and sorting of loaded reviews and companies.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::companies::{CompanyWithStats, RECENT_WINDOW_DAYS};
use crate::model::ReviewWithRelations;

/// Minimum rating counted as "high rated" or "top rated".
pub const HIGH_RATING: u8 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ReviewFilter {
    #[default]
    All,
    /// Written by current employees.
    Current,
    /// Written by former employees.
    Former,
    HighRated,
    /// Created within the recent window.
    Recent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum ReviewSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
    /// Most reactions first.
    MostLiked,
}

/// Search, filter, and sort settings for a review list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewQuery {
    pub search: Option<String>,
    pub filter: ReviewFilter,
    pub sort: ReviewSort,
}

impl ReviewQuery {
    /// Apply the query to `reviews` as of `now`. Sorting is stable.
    #[must_use]
    pub fn apply<'a>(
        &self,
        reviews: &'a [ReviewWithRelations],
        now: DateTime<Utc>,
    ) -> Vec<&'a ReviewWithRelations> {
        let needle = normalized(self.search.as_deref());
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

        let mut out: Vec<&ReviewWithRelations> = reviews
            .iter()
            .filter(|r| needle.as_deref().is_none_or(|n| review_matches(r, n)))
            .filter(|r| match self.filter {
                ReviewFilter::All => true,
                ReviewFilter::Current => r.review.is_current_employee,
                ReviewFilter::Former => !r.review.is_current_employee,
                ReviewFilter::HighRated => r.review.rating >= HIGH_RATING,
                ReviewFilter::Recent => r.review.created_at >= cutoff,
            })
            .collect();

        match self.sort {
            ReviewSort::Newest => out.sort_by(|a, b| b.review.created_at.cmp(&a.review.created_at)),
            ReviewSort::Oldest => out.sort_by(|a, b| a.review.created_at.cmp(&b.review.created_at)),
            ReviewSort::Highest => out.sort_by(|a, b| b.review.rating.cmp(&a.review.rating)),
            ReviewSort::Lowest => out.sort_by(|a, b| a.review.rating.cmp(&b.review.rating)),
            ReviewSort::MostLiked => out.sort_by(|a, b| b.reactions.len().cmp(&a.reactions.len())),
        }
        out
    }
}

fn review_matches(r: &ReviewWithRelations, needle: &str) -> bool {
    [
        Some(r.review.title.as_str()),
        Some(r.review.content.as_str()),
        Some(r.company_name()),
        r.review.position.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CompanyTab {
    #[default]
    All,
    /// Companies with recent reviews.
    Trending,
    /// Average rating of at least [`HIGH_RATING`].
    TopRated,
    /// Companies with any reviews.
    MostReviewed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum CompanySort {
    #[default]
    Name,
    Rating,
    Reviews,
    /// Most recent reviews first.
    Trending,
}

/// Search, filter, and sort settings for a company list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyQuery {
    pub search: Option<String>,
    /// Exact industry match.
    pub industry: Option<String>,
    /// Exact size match.
    pub size: Option<String>,
    pub tab: CompanyTab,
    pub sort: CompanySort,
}

impl CompanyQuery {
    #[must_use]
    pub fn apply<'a>(&self, companies: &'a [CompanyWithStats]) -> Vec<&'a CompanyWithStats> {
        let needle = normalized(self.search.as_deref());

        let mut out: Vec<&CompanyWithStats> = companies
            .iter()
            .filter(|c| needle.as_deref().is_none_or(|n| company_matches(c, n)))
            .filter(|c| {
                self.industry
                    .as_deref()
                    .is_none_or(|i| c.company.industry.as_deref() == Some(i))
            })
            .filter(|c| {
                self.size
                    .as_deref()
                    .is_none_or(|s| c.company.size.as_deref() == Some(s))
            })
            .filter(|c| match self.tab {
                CompanyTab::All => true,
                CompanyTab::Trending => c.recent_reviews > 0,
                CompanyTab::TopRated => c.average_rating >= f64::from(HIGH_RATING),
                CompanyTab::MostReviewed => c.review_count > 0,
            })
            .collect();

        match self.sort {
            CompanySort::Name => out.sort_by(|a, b| {
                a.company
                    .name
                    .to_lowercase()
                    .cmp(&b.company.name.to_lowercase())
            }),
            CompanySort::Rating => {
                out.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating));
            }
            CompanySort::Reviews => out.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
            CompanySort::Trending => out.sort_by(|a, b| b.recent_reviews.cmp(&a.recent_reviews)),
        }
        out
    }
}

fn company_matches(c: &CompanyWithStats, needle: &str) -> bool {
    [
        Some(c.company.name.as_str()),
        c.company.industry.as_deref(),
        c.company.location.as_deref(),
        c.company.description.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Distinct industries across `companies`, sorted.
#[must_use]
pub fn industries(companies: &[CompanyWithStats]) -> Vec<String> {
    distinct(companies.iter().map(|c| c.company.industry.as_deref()))
}

/// Distinct company sizes across `companies`, sorted.
#[must_use]
pub fn sizes(companies: &[CompanyWithStats]) -> Vec<String> {
    distinct(companies.iter().map(|c| c.company.size.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}
