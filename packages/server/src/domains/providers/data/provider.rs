use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::common::utils::Coordinates;
use crate::common::{Page, PaginationArgs};
use crate::domains::providers::models::{
    CreateProvider, Provider, ProviderFilters, ProviderTags, ProviderWithTags, UpdateProvider,
};

/// Provider data type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderData {
    pub id: String,

    // Identity
    pub name: String,
    pub document: Option<String>,
    pub code_name: Option<String>,

    // Contact
    pub phone: Option<String>,
    pub email: Option<String>,

    // Address
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Financial terms
    pub dispatch_fee: Option<Decimal>,
    pub extra_hour_rate: Option<Decimal>,
    pub extra_km_rate: Option<Decimal>,
    pub km_allowance: Option<Decimal>,

    pub approved: bool,
    pub antenna_model: Option<String>,

    // Tags
    pub functions: Vec<String>,
    pub vehicle_types: Vec<String>,
    pub regions: Vec<String>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderData {
    pub fn new(provider: Provider, tags: ProviderTags) -> Self {
        Self {
            id: provider.id.to_string(),
            name: provider.name,
            document: provider.document,
            code_name: provider.code_name,
            phone: provider.phone,
            email: provider.email,
            street: provider.street,
            neighborhood: provider.neighborhood,
            city: provider.city,
            state: provider.state,
            postal_code: provider.postal_code,
            latitude: provider.latitude,
            longitude: provider.longitude,
            dispatch_fee: provider.dispatch_fee,
            extra_hour_rate: provider.extra_hour_rate,
            extra_km_rate: provider.extra_km_rate,
            km_allowance: provider.km_allowance,
            approved: provider.approved,
            antenna_model: provider.antenna_model,
            functions: tags.functions,
            vehicle_types: tags.vehicle_types,
            regions: tags.regions,
            created_at: provider.created_at,
            updated_at: provider.updated_at,
        }
    }
}

impl From<ProviderWithTags> for ProviderData {
    fn from(hit: ProviderWithTags) -> Self {
        Self::new(hit.provider, hit.tags)
    }
}

/// Input for creating a provider (admin or self-registration)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProviderInput {
    pub name: String,
    pub document: Option<String>,
    pub code_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub dispatch_fee: Option<Decimal>,
    pub extra_hour_rate: Option<Decimal>,
    pub extra_km_rate: Option<Decimal>,
    pub km_allowance: Option<Decimal>,
    pub antenna_model: Option<String>,
    /// Ignored on self-registration
    pub approved: Option<bool>,
    #[serde(default)]
    pub functions: Vec<String>,
    #[serde(default)]
    pub vehicle_types: Vec<String>,
    #[serde(default)]
    pub regions: Vec<String>,
}

impl CreateProviderInput {
    /// Model input; coordinates come from the geocoder, never the caller
    pub fn into_model(self, approved: bool, coordinates: Option<Coordinates>) -> CreateProvider {
        CreateProvider {
            name: self.name.trim().to_string(),
            document: self.document,
            code_name: self.code_name,
            phone: self.phone,
            email: self.email,
            street: self.street,
            neighborhood: self.neighborhood,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            dispatch_fee: self.dispatch_fee,
            extra_hour_rate: self.extra_hour_rate,
            extra_km_rate: self.extra_km_rate,
            km_allowance: self.km_allowance,
            approved,
            coordinates,
            antenna_model: self.antenna_model,
        }
    }
}

/// Input for updating a provider. Absent fields are left alone; tag
/// collections that are present replace the stored ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProviderInput {
    pub name: Option<String>,
    pub document: Option<String>,
    pub code_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub dispatch_fee: Option<Decimal>,
    pub extra_hour_rate: Option<Decimal>,
    pub extra_km_rate: Option<Decimal>,
    pub km_allowance: Option<Decimal>,
    pub antenna_model: Option<String>,
    pub functions: Option<Vec<String>>,
    pub vehicle_types: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
}

impl UpdateProviderInput {
    /// Scalar part of the update; coordinates are filled in by the caller
    pub fn to_model(&self) -> UpdateProvider {
        UpdateProvider {
            name: self.name.as_ref().map(|n| n.trim().to_string()),
            document: self.document.clone(),
            code_name: self.code_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            street: self.street.clone(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            dispatch_fee: self.dispatch_fee,
            extra_hour_rate: self.extra_hour_rate,
            extra_km_rate: self.extra_km_rate,
            km_allowance: self.km_allowance,
            antenna_model: self.antenna_model.clone(),
            coordinates: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SetApprovalInput {
    pub approved: bool,
}

/// Query string of the provider listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderListQuery {
    pub locality: Option<String>,
    pub name: Option<String>,
    pub code_name: Option<String>,
    /// Comma-separated
    #[serde(default, deserialize_with = "comma_list")]
    pub functions: Vec<String>,
    /// Comma-separated
    #[serde(default, deserialize_with = "comma_list")]
    pub regions: Vec<String>,
    #[serde(default)]
    pub missing_financials: bool,
    pub approved: Option<bool>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ProviderListQuery {
    pub fn filters(&self) -> ProviderFilters {
        ProviderFilters {
            locality: self.locality.clone(),
            name: self.name.clone(),
            code_name: self.code_name.clone(),
            functions: self.functions.clone(),
            regions: self.regions.clone(),
            missing_financials: self.missing_financials,
            approved: self.approved,
        }
    }

    pub fn pagination(&self) -> PaginationArgs {
        PaginationArgs {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default())
}

/// One page of the provider listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderPage {
    pub providers: Vec<ProviderData>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl From<Page<ProviderWithTags>> for ProviderPage {
    fn from(page: Page<ProviderWithTags>) -> Self {
        let page = page.map(ProviderData::from);
        Self {
            providers: page.items,
            total: page.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_splits_comma_lists() {
        let query: ProviderListQuery = serde_json::from_value(serde_json::json!({
            "locality": "sao paulo",
            "functions": "guincho, pronta resposta,,",
            "page": 2
        }))
        .unwrap();

        assert_eq!(query.functions, vec!["guincho", "pronta resposta"]);
        assert!(query.regions.is_empty());

        let filters = query.filters();
        assert_eq!(filters.locality(), Some("sao paulo"));
        assert_eq!(query.pagination().validate().offset(), 20);
    }

    #[test]
    fn list_query_with_huge_page_stays_in_range() {
        let query = ProviderListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        let page = query.pagination().validate();

        assert_eq!(page.page, crate::common::MAX_PAGE);
        assert!(page.offset() >= 0);
    }

    #[test]
    fn create_input_ignores_caller_coordinates() {
        let input: CreateProviderInput = serde_json::from_value(serde_json::json!({
            "name": "  Ana  ",
            "city": "Campinas",
            "latitude": 1.0,
            "dispatch_fee": "120.50"
        }))
        .unwrap();

        let model = input.into_model(false, None);

        assert_eq!(model.name, "Ana");
        assert_eq!(model.coordinates, None);
        assert_eq!(model.dispatch_fee, Some(Decimal::new(12050, 2)));
    }

    #[test]
    fn update_input_without_address_does_not_touch_address() {
        let input = UpdateProviderInput {
            phone: Some("11 99999-0000".to_string()),
            regions: Some(vec!["Campinas".to_string()]),
            ..Default::default()
        };
        assert!(!input.to_model().touches_address());
    }
}
