//! Implementation of `ratewise companies` subcommands.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;

use crate::cli::commands::helpers::{open_session, CommandContext};
use crate::cli::commands::reviews::ReviewRow;
use crate::output::{Formatter, OutputFormat};
use ratewise_core::companies::{CompanyDirectory, CompanyWithStats};
use ratewise_core::filter::{industries, sizes, CompanyQuery};

/// One line of `companies list`.
#[derive(Debug, Serialize)]
pub struct CompanyRow {
    pub slug: String,
    pub name: String,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
    pub reviews: usize,
    pub rating: String,
    pub recent: usize,
}

impl From<&CompanyWithStats> for CompanyRow {
    fn from(c: &CompanyWithStats) -> Self {
        Self {
            slug: c.company.slug.clone(),
            name: c.company.name.clone(),
            industry: c.company.industry.clone(),
            size: c.company.size.clone(),
            location: c.company.location.clone(),
            reviews: c.review_count,
            rating: format!("{:.1}", c.average_rating),
            recent: c.recent_reviews,
        }
    }
}

/// List companies with stats, filtered and sorted client-side.
#[tracing::instrument(skip(ctx, query, format))]
pub fn run_companies_list(
    ctx: &CommandContext,
    query: &CompanyQuery,
    format: OutputFormat,
) -> Result<()> {
    let session = open_session(ctx)?;
    let all = CompanyDirectory::new(&session.store).list_with_stats(Utc::now())?;

    let rows: Vec<CompanyRow> = query.apply(&all).into_iter().map(CompanyRow::from).collect();

    let mut advice = Vec::new();
    let known_industries = industries(&all);
    if !known_industries.is_empty() {
        advice.push(format!("industries: {}", known_industries.join(", ")));
    }
    let known_sizes = sizes(&all);
    if !known_sizes.is_empty() {
        advice.push(format!("sizes: {}", known_sizes.join(", ")));
    }

    Formatter::new(format).print_list(&rows, "No companies found", "companies", &advice)
}

/// Show a company, its stats, and its reviews.
#[tracing::instrument(skip(ctx, format))]
pub fn run_companies_show(ctx: &CommandContext, slug: &str, format: OutputFormat) -> Result<()> {
    let session = open_session(ctx)?;
    let directory = CompanyDirectory::new(&session.store);
    let company = directory.by_slug(slug)?;
    let reviews = directory.reviews_for(slug)?;

    let rows: Vec<ReviewRow> = reviews.iter().map(ReviewRow::from).collect();
    let output = serde_json::json!({
        "slug": company.slug.clone(),
        "company": CompanyWithStats::from_reviews(company, &reviews, Utc::now()),
        "reviews": rows,
    });
    Formatter::new(format).print(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::init::run_init;
    use crate::cli::commands::reviews::{draft_from_args, run_reviews_create};
    use crate::cli::ReviewDetailsArgs;
    use ratewise_core::filter::{CompanySort, CompanyTab};
    use tempfile::tempdir;

    #[test]
    fn test_list_and_show_companies() {
        let dir = tempdir().unwrap();
        let ctx = CommandContext::new(
            dir.path(),
            Some(dir.path().join("ratewise.db")),
            Some("u1".to_string()),
        );
        run_init(&ctx, false, OutputFormat::Json).unwrap();
        for (company, rating) in [("Acme Corp", 5), ("Globex", 2)] {
            let draft = draft_from_args(
                company.to_string(),
                "Review".to_string(),
                "Body".to_string(),
                rating,
                ReviewDetailsArgs::default(),
                false,
                true,
            );
            run_reviews_create(&ctx, draft, OutputFormat::Json).unwrap();
        }

        let query = CompanyQuery {
            tab: CompanyTab::TopRated,
            sort: CompanySort::Rating,
            ..CompanyQuery::default()
        };
        run_companies_list(&ctx, &query, OutputFormat::Text).unwrap();
        run_companies_show(&ctx, "acme-corp", OutputFormat::Pretty).unwrap();

        let session = open_session(&ctx).unwrap();
        let all = CompanyDirectory::new(&session.store)
            .list_with_stats(Utc::now())
            .unwrap();
        let row = CompanyRow::from(&all[0]);
        assert_eq!(row.slug, "acme-corp");
        assert_eq!(row.rating, "5.0");
        assert_eq!(row.reviews, 1);
    }

    #[test]
    fn test_show_unknown_company() {
        let dir = tempdir().unwrap();
        let ctx = CommandContext::new(dir.path(), Some(dir.path().join("ratewise.db")), None);
        run_init(&ctx, false, OutputFormat::Json).unwrap();
        let err = run_companies_show(&ctx, "nobody", OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("Company not found: nobody"));
    }
}
