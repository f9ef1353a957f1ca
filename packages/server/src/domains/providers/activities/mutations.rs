//! Provider mutation activities
//!
//! Geocoding always runs before a transaction is opened, and a failed lookup
//! never fails the write: the provider is stored with null coordinates.

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::common::ProviderId;
use crate::domains::providers::address::AddressParts;
use crate::domains::providers::data::{CreateProviderInput, ProviderData, UpdateProviderInput};
use crate::domains::providers::models::{Provider, ProviderTag, ProviderTagKind};
use crate::kernel::ServerDeps;

/// Rejected caller input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderInputError {
    #[error("name is required")]
    MissingName,
}

fn validate_name(name: &str) -> Result<(), ProviderInputError> {
    if name.trim().is_empty() {
        return Err(ProviderInputError::MissingName);
    }
    Ok(())
}

fn create_address(input: &CreateProviderInput) -> AddressParts {
    AddressParts::new(
        input.street.clone().unwrap_or_default(),
        input.neighborhood.clone(),
        input.city.clone().unwrap_or_default(),
        input.state.clone().unwrap_or_default(),
    )
}

/// Admin create; the caller may set `approved`
pub async fn create_provider(input: CreateProviderInput, deps: &ServerDeps) -> Result<ProviderData> {
    let approved = input.approved.unwrap_or(false);
    insert_provider(input, approved, deps).await
}

/// Public self-registration; always starts unapproved
pub async fn register_provider(
    input: CreateProviderInput,
    deps: &ServerDeps,
) -> Result<ProviderData> {
    insert_provider(input, false, deps).await
}

async fn insert_provider(
    input: CreateProviderInput,
    approved: bool,
    deps: &ServerDeps,
) -> Result<ProviderData> {
    validate_name(&input.name)?;

    info!(name = %input.name.trim(), approved, "Creating provider");

    let coordinates = deps
        .geocoding_resolver()
        .resolve(&create_address(&input))
        .await;

    let functions = input.functions.clone();
    let vehicle_types = input.vehicle_types.clone();
    let regions = input.regions.clone();

    let mut tx = deps.db_pool.begin().await?;

    let provider = Provider::create(input.into_model(approved, coordinates), &mut tx)
        .await
        .context("Failed to insert provider")?;

    ProviderTag::replace(ProviderTagKind::Function, provider.id, &functions, &mut tx).await?;
    ProviderTag::replace(ProviderTagKind::VehicleType, provider.id, &vehicle_types, &mut tx)
        .await?;
    ProviderTag::replace(ProviderTagKind::Region, provider.id, &regions, &mut tx).await?;

    tx.commit().await?;

    info!(
        provider_id = %provider.id,
        geocoded = coordinates.is_some(),
        "Provider created"
    );

    let tags = ProviderTag::load_for_provider(provider.id, &deps.db_pool).await?;
    Ok(ProviderData::new(provider, tags))
}

/// Partial update. Returns `None` when the provider does not exist.
///
/// Sending any address field re-runs the geocoder on the merged address and
/// replaces both coordinates with the outcome (null when unresolved).
pub async fn update_provider(
    id: ProviderId,
    input: UpdateProviderInput,
    deps: &ServerDeps,
) -> Result<Option<ProviderData>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }

    let Some(current) = Provider::find_by_id_optional(id, &deps.db_pool).await? else {
        return Ok(None);
    };

    info!(provider_id = %id, "Updating provider");

    let mut update = input.to_model();
    if update.touches_address() {
        let address = current.address_after(&update);
        let coordinates = deps.geocoding_resolver().resolve(&address).await;
        info!(
            provider_id = %id,
            geocoded = coordinates.is_some(),
            "Address changed, coordinates replaced"
        );
        update.coordinates = Some(coordinates);
    }

    let mut tx = deps.db_pool.begin().await?;

    let provider = Provider::update(id, update, &mut tx)
        .await
        .context("Failed to update provider")?;

    let replacements = [
        (ProviderTagKind::Function, &input.functions),
        (ProviderTagKind::VehicleType, &input.vehicle_types),
        (ProviderTagKind::Region, &input.regions),
    ];
    for (kind, values) in replacements {
        if let Some(values) = values {
            ProviderTag::replace(kind, id, values, &mut tx).await?;
        }
    }

    tx.commit().await?;

    let tags = ProviderTag::load_for_provider(id, &deps.db_pool).await?;
    Ok(Some(ProviderData::new(provider, tags)))
}

/// Set the approval flag. Returns `None` when the provider does not exist.
pub async fn set_provider_approval(
    id: ProviderId,
    approved: bool,
    deps: &ServerDeps,
) -> Result<Option<ProviderData>> {
    info!(provider_id = %id, approved, "Setting provider approval");

    let Some(provider) = Provider::set_approved(id, approved, &deps.db_pool).await? else {
        return Ok(None);
    };

    let tags = ProviderTag::load_for_provider(id, &deps.db_pool).await?;
    Ok(Some(ProviderData::new(provider, tags)))
}

/// Delete a provider and its tags. Returns false when it did not exist.
pub async fn delete_provider(id: ProviderId, deps: &ServerDeps) -> Result<bool> {
    info!(provider_id = %id, "Deleting provider");

    Provider::delete(id, &deps.db_pool).await
}

/// Outcome of one backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub scanned: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Geocode providers stored without coordinates, oldest first.
///
/// Providers are processed one at a time with the geocoder pacing between
/// them. With `dry_run` nothing is written.
pub async fn backfill_coordinates(
    limit: i64,
    dry_run: bool,
    deps: &ServerDeps,
) -> Result<BackfillReport> {
    let providers = Provider::find_missing_coordinates(limit, &deps.db_pool).await?;
    let resolver = deps.geocoding_resolver();

    info!(count = providers.len(), dry_run, "Backfilling provider coordinates");

    let mut report = BackfillReport::default();
    for (index, provider) in providers.iter().enumerate() {
        if index > 0 && !deps.geocoding_delay.is_zero() {
            tokio::time::sleep(deps.geocoding_delay).await;
        }

        report.scanned += 1;
        match resolver.resolve(&provider.address_parts()).await {
            Some(coordinates) => {
                report.resolved += 1;
                if !dry_run {
                    Provider::set_coordinates(provider.id, Some(coordinates), &deps.db_pool)
                        .await
                        .with_context(|| format!("Failed to store coordinates for {}", provider.id))?;
                }
                info!(
                    provider_id = %provider.id,
                    latitude = coordinates.latitude,
                    longitude = coordinates.longitude,
                    "Provider geocoded"
                );
            }
            None => report.unresolved += 1,
        }
    }

    info!(
        scanned = report.scanned,
        resolved = report.resolved,
        unresolved = report.unresolved,
        "Backfill finished"
    );

    Ok(report)
}
