//! Company lookup: find-or-create by name, slug lookup, and per-company stats.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::errors::{CoreError, CoreResult};
use crate::model::{Company, NewCompany, ReviewWithRelations};
use crate::store::{RemoteErrorKind, RemoteStore};

/// Placeholder for company fields nobody has filled in yet.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Window for "recent" review counts.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Sample companies written by `ratewise init --seed`.
///
/// Fields: name, slug, description, industry, size, location.
pub const SEED_COMPANIES: [[&str; 6]; 3] = [
    [
        "TechCorp Inc.",
        "techcorp",
        "Leading software company specializing in enterprise solutions and cloud infrastructure.",
        "Technology",
        "1000-5000",
        "San Francisco, CA",
    ],
    [
        "StartupXYZ",
        "startupxyz",
        "Fast-growing startup in the fintech space, revolutionizing digital payments.",
        "Financial Technology",
        "50-200",
        "New York, NY",
    ],
    [
        "DataFlow Systems",
        "dataflow",
        "Big data analytics and machine learning solutions for enterprise clients.",
        "Data Analytics",
        "200-500",
        "Seattle, WA",
    ],
];

/// Derive a URL slug from a company name.
///
/// Lowercases, drops characters outside `[a-z0-9]`, whitespace, and `-`,
/// turns whitespace runs into `-`, collapses repeated `-`, and trims `-` from
/// both ends. Returns an empty string when nothing survives.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }
    slug
}

/// A company with review statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyWithStats {
    #[serde(flatten)]
    pub company: Company,
    pub review_count: usize,
    /// Mean rating, 0 when there are no reviews.
    pub average_rating: f64,
    /// Reviews created within the last [`RECENT_WINDOW_DAYS`] days.
    pub recent_reviews: usize,
}

impl CompanyWithStats {
    /// Compute stats for `company` from its reviews as of `now`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reviews(
        company: Company,
        reviews: &[ReviewWithRelations],
        now: DateTime<Utc>,
    ) -> Self {
        let review_count = reviews.len();
        let average_rating = if review_count == 0 {
            0.0
        } else {
            let sum: u32 = reviews.iter().map(|r| u32::from(r.review.rating)).sum();
            f64::from(sum) / review_count as f64
        };
        let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
        let recent_reviews = reviews
            .iter()
            .filter(|r| r.review.created_at >= cutoff)
            .count();

        Self {
            company,
            review_count,
            average_rating,
            recent_reviews,
        }
    }
}

/// Service for company operations.
pub struct CompanyDirectory<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RemoteStore + ?Sized> CompanyDirectory<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Find a company by case-insensitive name, creating it if absent.
    ///
    /// A slug collision is retried once with a millisecond suffix. Returns
    /// `None` for a blank name or when the company could not be created.
    pub fn find_or_create(&self, name: &str) -> Option<Company> {
        let name = name.trim();
        if name.is_empty() {
            debug!("blank company name");
            return None;
        }

        match self.store.find_companies_by_name(name) {
            Ok(found) => {
                if let Some(company) = found.into_iter().next() {
                    debug!(company_id = %company.id, name, "found company");
                    return Some(company);
                }
            }
            // Lookup trouble is not fatal; the insert below decides.
            Err(e) => warn!(name, error = %e, "company lookup failed, trying to create"),
        }

        let millis = Utc::now().timestamp_millis();
        let base = slugify(name);
        let slug = if base.is_empty() {
            format!("company-{millis}")
        } else {
            base
        };

        let mut input = new_company(name, &slug);
        match self.store.insert_company(&input) {
            Ok(company) => {
                info!(company_id = %company.id, slug = %company.slug, "created company");
                Some(company)
            }
            Err(e) if e.kind == RemoteErrorKind::UniqueViolation => {
                input.slug = format!("{slug}-{millis}");
                debug!(slug = %input.slug, "slug taken, retrying");
                match self.store.insert_company(&input) {
                    Ok(company) => {
                        info!(company_id = %company.id, slug = %company.slug, "created company");
                        Some(company)
                    }
                    Err(e) => {
                        error!(name, error = %e, "failed to create company on retry");
                        None
                    }
                }
            }
            Err(e) => {
                error!(name, error = %e, "failed to create company");
                None
            }
        }
    }

    /// Look up a company by slug.
    pub fn by_slug(&self, slug: &str) -> CoreResult<Company> {
        self.store
            .select_company_by_slug(slug)
            .map_err(|e| CoreError::from_remote("fetch company", e))?
            .ok_or_else(|| CoreError::CompanyNotFound {
                slug: slug.to_string(),
            })
    }

    /// Reviews of the company with `slug`, newest first.
    pub fn reviews_for(&self, slug: &str) -> CoreResult<Vec<ReviewWithRelations>> {
        let company = self.by_slug(slug)?;
        self.store
            .select_company_reviews(&company.id)
            .map_err(|e| CoreError::from_remote("fetch company reviews", e))
    }

    /// Insert the [`SEED_COMPANIES`] whose slugs are not taken yet.
    ///
    /// Existing slugs are left untouched. Returns how many were inserted.
    pub fn seed_defaults(&self) -> CoreResult<usize> {
        let mut inserted = 0;
        for [name, slug, description, industry, size, location] in SEED_COMPANIES {
            let existing = self
                .store
                .select_company_by_slug(slug)
                .map_err(|e| CoreError::from_remote("seed companies", e))?;
            if existing.is_some() {
                debug!(slug, "seed company already present");
                continue;
            }

            let input = NewCompany {
                name: name.to_string(),
                slug: slug.to_string(),
                description: Some(description.to_string()),
                website: Some(format!("https://{slug}.com")),
                logo_url: None,
                industry: Some(industry.to_string()),
                size: Some(size.to_string()),
                location: Some(location.to_string()),
            };
            self.store
                .insert_company(&input)
                .map_err(|e| CoreError::from_remote("seed companies", e))?;
            info!(slug, "seeded company");
            inserted += 1;
        }
        Ok(inserted)
    }

    /// All companies, ordered by name, with stats as of `now`.
    ///
    /// A company whose reviews cannot be read gets zeroed stats.
    pub fn list_with_stats(&self, now: DateTime<Utc>) -> CoreResult<Vec<CompanyWithStats>> {
        let companies = self
            .store
            .select_companies()
            .map_err(|e| CoreError::from_remote("fetch companies", e))?;

        Ok(companies
            .into_iter()
            .map(|company| {
                let reviews = self
                    .store
                    .select_company_reviews(&company.id)
                    .unwrap_or_else(|e| {
                        warn!(
                            company_id = %company.id,
                            error = %e,
                            "failed to load company reviews"
                        );
                        Vec::new()
                    });
                CompanyWithStats::from_reviews(company, &reviews, now)
            })
            .collect())
    }
}

fn new_company(name: &str, slug: &str) -> NewCompany {
    NewCompany {
        name: name.to_string(),
        slug: slug.to_string(),
        description: Some(format!("{name} - Company profile")),
        website: Some(format!("https://{slug}.com")),
        logo_url: None,
        industry: Some(NOT_SPECIFIED.to_string()),
        size: Some(NOT_SPECIFIED.to_string()),
        location: Some(NOT_SPECIFIED.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewReview;
    use crate::store::{SessionUser, SqliteStore, StoreOptions};

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory(StoreOptions::default()).unwrap();
        store.init_schema().unwrap();
        store.sign_in(SessionUser::new("u1")).unwrap();
        store
    }

    #[test]
    fn test_seed_defaults_is_idempotent() {
        let store = store();
        let directory = CompanyDirectory::new(&store);
        assert_eq!(directory.seed_defaults().unwrap(), 3);
        assert_eq!(directory.seed_defaults().unwrap(), 0);

        let techcorp = directory.by_slug("techcorp").unwrap();
        assert_eq!(techcorp.name, "TechCorp Inc.");
        assert_eq!(techcorp.industry.as_deref(), Some("Technology"));
        assert_eq!(store.select_companies().unwrap().len(), 3);
    }

    #[test]
    fn test_seed_defaults_needs_session() {
        let store = store();
        store.sign_out();
        let err = CompanyDirectory::new(&store).seed_defaults().unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
        assert_eq!(slugify("  AT&T  Labs "), "att-labs");
        assert_eq!(slugify("--Foo -- Bar--"), "foo-bar");
        assert_eq!(slugify("Café 24/7"), "caf-247");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_find_or_create_ignores_case() {
        let store = store();
        let dir = CompanyDirectory::new(&store);

        let first = dir.find_or_create("Acme Corp").unwrap();
        let second = dir.find_or_create("  acme CORP ").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.select_companies().unwrap().len(), 1);
    }

    #[test]
    fn test_created_company_defaults() {
        let store = store();
        let company = CompanyDirectory::new(&store)
            .find_or_create("Initech")
            .unwrap();

        assert_eq!(company.slug, "initech");
        assert_eq!(company.description.as_deref(), Some("Initech - Company profile"));
        assert_eq!(company.website.as_deref(), Some("https://initech.com"));
        assert_eq!(company.industry.as_deref(), Some(NOT_SPECIFIED));
        assert_eq!(company.location.as_deref(), Some(NOT_SPECIFIED));
    }

    #[test]
    fn test_slug_collision_retries_once() {
        let store = store();
        let dir = CompanyDirectory::new(&store);

        let a = dir.find_or_create("Acme-Corp").unwrap();
        let b = dir.find_or_create("Acme Corp").unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.slug.starts_with("acme-corp-"), "slug: {}", b.slug);
    }

    #[test]
    fn test_symbol_only_name_gets_generated_slug() {
        let store = store();
        let company = CompanyDirectory::new(&store).find_or_create("???").unwrap();
        assert!(company.slug.starts_with("company-"));
    }

    #[test]
    fn test_blank_name_and_signed_out_return_none() {
        let store = store();
        let dir = CompanyDirectory::new(&store);
        assert!(dir.find_or_create("   ").is_none());

        store.sign_out();
        assert!(dir.find_or_create("Hooli").is_none());
    }

    #[test]
    fn test_by_slug_not_found() {
        let store = store();
        let err = CompanyDirectory::new(&store).by_slug("nope").unwrap_err();
        assert!(matches!(err, CoreError::CompanyNotFound { .. }));
    }

    #[test]
    fn test_list_with_stats() {
        let store = store();
        let dir = CompanyDirectory::new(&store);
        let acme = dir.find_or_create("Acme").unwrap();
        dir.find_or_create("Bravo").unwrap();

        for rating in [5, 2] {
            store
                .insert_review(&NewReview {
                    company_id: acme.id.clone(),
                    author_id: Some("u1".to_string()),
                    title: "t".to_string(),
                    content: "c".to_string(),
                    rating: Some(rating),
                    ..NewReview::default()
                })
                .unwrap();
        }
        // Age one review past the recent window.
        store
            .conn()
            .execute(
                "UPDATE reviews SET created_at = '2020-01-01T00:00:00Z' WHERE rating = 2",
                [],
            )
            .unwrap();

        let stats = dir.list_with_stats(Utc::now()).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].company.name, "Acme");
        assert_eq!(stats[0].review_count, 2);
        assert!((stats[0].average_rating - 3.5).abs() < f64::EPSILON);
        assert_eq!(stats[0].recent_reviews, 1);
        assert_eq!(stats[1].review_count, 0);
        assert!(stats[1].average_rating.abs() < f64::EPSILON);

        assert_eq!(dir.reviews_for("acme").unwrap().len(), 2);
    }
}
