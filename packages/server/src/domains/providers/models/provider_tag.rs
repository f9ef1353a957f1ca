use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

use crate::common::ProviderId;

/// The three tag collections a provider owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderTagKind {
    Function,
    VehicleType,
    Region,
}

impl ProviderTagKind {
    pub const ALL: [ProviderTagKind; 3] = [
        ProviderTagKind::Function,
        ProviderTagKind::VehicleType,
        ProviderTagKind::Region,
    ];

    /// Backing table; a closed set, safe to splice into SQL
    pub fn table(&self) -> &'static str {
        match self {
            ProviderTagKind::Function => "provider_functions",
            ProviderTagKind::VehicleType => "provider_vehicle_types",
            ProviderTagKind::Region => "provider_regions",
        }
    }
}

/// One tag row with its owning provider, for bulk loading
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProviderTagRow {
    pub provider_id: ProviderId,
    pub value: String,
}

/// A provider's three tag collections, each sorted ascending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderTags {
    pub functions: Vec<String>,
    pub vehicle_types: Vec<String>,
    pub regions: Vec<String>,
}

impl ProviderTags {
    pub fn get_mut(&mut self, kind: ProviderTagKind) -> &mut Vec<String> {
        match kind {
            ProviderTagKind::Function => &mut self.functions,
            ProviderTagKind::VehicleType => &mut self.vehicle_types,
            ProviderTagKind::Region => &mut self.regions,
        }
    }
}

/// Group bulk-loaded rows by provider in one pass.
///
/// Every requested id gets an entry, even with no rows. Values are sorted
/// ascending within each group.
pub fn group_by_provider(
    ids: &[ProviderId],
    rows: Vec<ProviderTagRow>,
) -> HashMap<ProviderId, Vec<String>> {
    let mut grouped: HashMap<ProviderId, Vec<String>> =
        ids.iter().map(|id| (*id, Vec::new())).collect();

    for row in rows {
        grouped.entry(row.provider_id).or_default().push(row.value);
    }

    for values in grouped.values_mut() {
        values.sort();
    }

    grouped
}

/// Trim, drop blanks and duplicates, keep first-seen order
pub fn normalize_values(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_string()))
        .map(String::from)
        .collect()
}

pub struct ProviderTag;

impl ProviderTag {
    /// Batch-load one tag kind for many providers (one query)
    pub async fn find_for_provider_ids(
        kind: ProviderTagKind,
        ids: &[ProviderId],
        pool: &PgPool,
    ) -> Result<Vec<ProviderTagRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT provider_id, value FROM {} WHERE provider_id = ANY($1) ORDER BY provider_id, value",
            kind.table()
        );

        sqlx::query_as::<_, ProviderTagRow>(&sql)
            .bind(ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// All three collections for a page of providers, keyed by provider id
    pub async fn load_for_providers(
        ids: &[ProviderId],
        pool: &PgPool,
    ) -> Result<HashMap<ProviderId, ProviderTags>> {
        let mut tags: HashMap<ProviderId, ProviderTags> = ids
            .iter()
            .map(|id| (*id, ProviderTags::default()))
            .collect();

        for kind in ProviderTagKind::ALL {
            let rows = Self::find_for_provider_ids(kind, ids, pool).await?;
            for (id, values) in group_by_provider(ids, rows) {
                *tags.entry(id).or_default().get_mut(kind) = values;
            }
        }

        Ok(tags)
    }

    /// All three collections for one provider
    pub async fn load_for_provider(id: ProviderId, pool: &PgPool) -> Result<ProviderTags> {
        let mut tags = Self::load_for_providers(&[id], pool).await?;
        Ok(tags.remove(&id).unwrap_or_default())
    }

    /// Replace one collection inside the caller's transaction
    pub async fn replace(
        kind: ProviderTagKind,
        provider_id: ProviderId,
        values: &[String],
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<()> {
        let delete = format!("DELETE FROM {} WHERE provider_id = $1", kind.table());
        sqlx::query(&delete)
            .bind(provider_id)
            .execute(&mut **tx)
            .await?;

        let values = normalize_values(values);
        if values.is_empty() {
            return Ok(());
        }

        let insert = format!(
            "INSERT INTO {} (provider_id, value) SELECT $1, UNNEST($2::text[])",
            kind.table()
        );
        sqlx::query(&insert)
            .bind(provider_id)
            .bind(&values)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}
