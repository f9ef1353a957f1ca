//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly, bypassing geocoding.

use anyhow::Result;
use dispatch_core::common::utils::Coordinates;
use dispatch_core::domains::providers::models::{
    CreateProvider, Provider, ProviderTag, ProviderTagKind,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Short random token for scoping rows to one test
pub fn unique_tag() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// A provider row to insert, with its tags
#[derive(Debug, Clone, Default)]
pub struct ProviderFixture {
    pub provider: CreateProvider,
    pub functions: Vec<String>,
    pub vehicle_types: Vec<String>,
    pub regions: Vec<String>,
}

impl ProviderFixture {
    /// Provider named `"{name} {tag}"` with every financial term filled in
    pub fn new(name: &str, tag: &str) -> Self {
        Self {
            provider: CreateProvider {
                name: format!("{} {}", name, tag),
                dispatch_fee: Some(Decimal::new(15000, 2)),
                extra_hour_rate: Some(Decimal::new(4000, 2)),
                extra_km_rate: Some(Decimal::new(250, 2)),
                km_allowance: Some(Decimal::new(50, 0)),
                approved: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn address(mut self, street: &str, neighborhood: Option<&str>, city: &str, state: &str) -> Self {
        self.provider.street = Some(street.to_string());
        self.provider.neighborhood = neighborhood.map(String::from);
        self.provider.city = Some(city.to_string());
        self.provider.state = Some(state.to_string());
        self
    }

    pub fn city(mut self, city: &str, state: &str) -> Self {
        self.provider.city = Some(city.to_string());
        self.provider.state = Some(state.to_string());
        self
    }

    pub fn regions(mut self, regions: &[&str]) -> Self {
        self.regions = regions.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn functions(mut self, functions: &[&str]) -> Self {
        self.functions = functions.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn code_name(mut self, code_name: &str) -> Self {
        self.provider.code_name = Some(code_name.to_string());
        self
    }

    pub fn approved(mut self, approved: bool) -> Self {
        self.provider.approved = approved;
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.provider.coordinates = Some(Coordinates {
            latitude,
            longitude,
        });
        self
    }

    /// Make `dispatch_fee` missing or zero
    pub fn without_dispatch_fee(mut self, zero: bool) -> Self {
        self.provider.dispatch_fee = if zero { Some(Decimal::ZERO) } else { None };
        self
    }

    pub async fn insert(self, pool: &PgPool) -> Result<Provider> {
        let mut tx = pool.begin().await?;
        let provider = Provider::create(self.provider, &mut tx).await?;
        ProviderTag::replace(ProviderTagKind::Function, provider.id, &self.functions, &mut tx)
            .await?;
        ProviderTag::replace(
            ProviderTagKind::VehicleType,
            provider.id,
            &self.vehicle_types,
            &mut tx,
        )
        .await?;
        ProviderTag::replace(ProviderTagKind::Region, provider.id, &self.regions, &mut tx).await?;
        tx.commit().await?;
        Ok(provider)
    }
}
