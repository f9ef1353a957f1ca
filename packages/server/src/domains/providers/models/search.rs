//! Provider listing and locality search.
//!
//! Two paths share one predicate builder:
//! - structured only: plain `ILIKE` / equality filters
//! - locality: the query string is matched accent- and case-insensitively
//!   against neighborhood, city, state and region tags via Postgres `unaccent`
//!
//! Placeholders are numbered by `sqlx::QueryBuilder`, never by hand.

use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::{debug, error};

use crate::common::{Page, ValidatedPaginationArgs};
use crate::domains::providers::models::{Provider, ProviderTag, ProviderTags};

/// Search failures are never partial: the whole listing fails.
#[derive(Debug, Error)]
pub enum ProviderSearchError {
    #[error("failed to list providers")]
    Failed(#[source] anyhow::Error),
}

impl From<sqlx::Error> for ProviderSearchError {
    fn from(err: sqlx::Error) -> Self {
        ProviderSearchError::Failed(err.into())
    }
}

/// Filters accepted by the provider listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderFilters {
    /// Free-text place; engages the accent-folding path when non-blank
    pub locality: Option<String>,
    pub name: Option<String>,
    pub code_name: Option<String>,
    /// Match providers having at least one of these functions
    #[serde(default)]
    pub functions: Vec<String>,
    /// Match providers having at least one of these region tags
    #[serde(default)]
    pub regions: Vec<String>,
    /// Only providers with a null or zero financial term
    #[serde(default)]
    pub missing_financials: bool,
    pub approved: Option<bool>,
}

/// A provider with its tag collections attached
#[derive(Debug, Clone)]
pub struct ProviderWithTags {
    pub provider: Provider,
    pub tags: ProviderTags,
}

/// Accent/case folding applied to both sides of a comparison
fn fold(expr: &str) -> String {
    format!("unaccent(lower({}))", expr)
}

/// `%term%` with LIKE wildcards in the term escaped
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn non_blank_values(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

impl ProviderFilters {
    /// Trimmed locality, if any
    pub fn locality(&self) -> Option<&str> {
        non_blank(&self.locality)
    }

    /// Whether the accent-folding path is used
    pub fn uses_locality_search(&self) -> bool {
        self.locality().is_some()
    }

    /// Append ` WHERE ...` for these filters
    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        let folding = self.uses_locality_search();
        qb.push(" WHERE TRUE");

        if let Some(locality) = self.locality() {
            let pattern = contains_pattern(locality);

            qb.push(" AND (");
            for (i, column) in ["p.neighborhood", "p.city", "p.state"].iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(fold(column)).push(" LIKE ");
                push_folded_bind(qb, pattern.clone());
            }
            qb.push(" OR EXISTS (SELECT 1 FROM provider_regions r WHERE r.provider_id = p.id AND ")
                .push(fold("r.value"))
                .push(" LIKE ");
            push_folded_bind(qb, pattern);
            qb.push("))");
        }

        if let Some(name) = non_blank(&self.name) {
            push_substring(qb, "p.name", name, folding);
        }

        if let Some(code_name) = non_blank(&self.code_name) {
            push_substring(qb, "p.code_name", code_name, folding);
        }

        let functions = non_blank_values(&self.functions);
        if !functions.is_empty() {
            qb.push(
                " AND EXISTS (SELECT 1 FROM provider_functions f WHERE f.provider_id = p.id AND f.value = ANY(",
            )
            .push_bind(functions)
            .push("))");
        }

        let regions = non_blank_values(&self.regions);
        if !regions.is_empty() {
            qb.push(" AND EXISTS (SELECT 1 FROM provider_regions rs WHERE rs.provider_id = p.id AND ");
            if folding {
                qb.push(fold("rs.value"))
                    .push(" IN (SELECT ")
                    .push(fold("v"))
                    .push(" FROM UNNEST(")
                    .push_bind(regions)
                    .push("::text[]) AS v))");
            } else {
                qb.push("rs.value = ANY(").push_bind(regions).push("))");
            }
        }

        if self.missing_financials {
            qb.push(
                " AND (COALESCE(p.dispatch_fee, 0) = 0 \
                 OR COALESCE(p.extra_hour_rate, 0) = 0 \
                 OR COALESCE(p.extra_km_rate, 0) = 0 \
                 OR COALESCE(p.km_allowance, 0) = 0)",
            );
        }

        if let Some(approved) = self.approved {
            qb.push(" AND p.approved = ").push_bind(approved);
        }
    }

    /// `SELECT COUNT(*)` over every match, ignoring pagination
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM providers p");
        self.push_where(&mut qb);
        qb
    }

    /// One page of matches ordered by name
    pub fn page_query(&self, page: &ValidatedPaginationArgs) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT p.* FROM providers p");
        self.push_where(&mut qb);
        qb.push(" ORDER BY p.name ASC, p.id ASC LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());
        qb
    }
}

/// Bound value wrapped in the same folding as [`fold`]
fn push_folded_bind(qb: &mut QueryBuilder<'static, Postgres>, value: String) {
    qb.push("unaccent(lower(").push_bind(value).push("))");
}

fn push_substring(
    qb: &mut QueryBuilder<'static, Postgres>,
    column: &str,
    term: &str,
    folding: bool,
) {
    let pattern = contains_pattern(term);
    qb.push(" AND ");
    if folding {
        qb.push(fold(column)).push(" LIKE ");
        push_folded_bind(qb, pattern);
    } else {
        qb.push(column).push(" ILIKE ").push_bind(pattern);
    }
}

impl Provider {
    /// Filtered, paginated provider listing with tags attached.
    ///
    /// `total` counts every match regardless of page.
    pub async fn search(
        filters: &ProviderFilters,
        page: &ValidatedPaginationArgs,
        pool: &PgPool,
    ) -> Result<Page<ProviderWithTags>, ProviderSearchError> {
        debug!(
            locality = ?filters.locality(),
            folding = filters.uses_locality_search(),
            page = page.page,
            page_size = page.page_size,
            "Searching providers"
        );

        let total: i64 = filters
            .count_query()
            .build_query_scalar()
            .fetch_one(pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Provider count query failed");
                ProviderSearchError::from(e)
            })?;

        let providers: Vec<Provider> = filters
            .page_query(page)
            .build_query_as()
            .fetch_all(pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Provider page query failed");
                ProviderSearchError::from(e)
            })?;

        let ids: Vec<_> = providers.iter().map(|p| p.id).collect();
        let mut tags = ProviderTag::load_for_providers(&ids, pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Provider tag hydration failed");
                ProviderSearchError::Failed(e)
            })?;

        let items = providers
            .into_iter()
            .map(|provider| ProviderWithTags {
                tags: tags.remove(&provider.id).unwrap_or_default(),
                provider,
            })
            .collect();

        Ok(Page::new(items, total, page))
    }
}
