//! Provider query activities

use anyhow::Result;
use tracing::info;

use crate::common::ProviderId;
use crate::domains::providers::data::{ProviderData, ProviderListQuery, ProviderPage};
use crate::domains::providers::models::{Provider, ProviderSearchError, ProviderTag};
use crate::kernel::ServerDeps;

/// Get a single provider with its tags
pub async fn get_provider(id: ProviderId, deps: &ServerDeps) -> Result<Option<ProviderData>> {
    info!(provider_id = %id, "Getting provider");

    let Some(provider) = Provider::find_by_id_optional(id, &deps.db_pool).await? else {
        return Ok(None);
    };

    let tags = ProviderTag::load_for_provider(id, &deps.db_pool).await?;
    Ok(Some(ProviderData::new(provider, tags)))
}

/// List providers, optionally by locality, one page at a time
pub async fn list_providers(
    query: &ProviderListQuery,
    deps: &ServerDeps,
) -> Result<ProviderPage, ProviderSearchError> {
    let filters = query.filters();
    let page = query.pagination().validate();

    info!(
        locality = ?filters.locality(),
        page = page.page,
        page_size = page.page_size,
        "Listing providers"
    );

    let results = Provider::search(&filters, &page, &deps.db_pool).await?;
    Ok(results.into())
}
