use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};

use crate::common::utils::Coordinates;
use crate::common::ProviderId;
use crate::domains::providers::address::AddressParts;

/// Provider model - field agents dispatched to occurrences
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Provider {
    pub id: ProviderId,

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

    // Financial terms
    pub dispatch_fee: Option<Decimal>,
    pub extra_hour_rate: Option<Decimal>,
    pub extra_km_rate: Option<Decimal>,
    pub km_allowance: Option<Decimal>,

    pub approved: bool,

    // Resolved by the geocoder
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub antenna_model: Option<String>,

    // Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new provider
#[derive(Debug, Clone, Default)]
pub struct CreateProvider {
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
    pub approved: bool,
    pub coordinates: Option<Coordinates>,
    pub antenna_model: Option<String>,
}

/// Input for updating a provider; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UpdateProvider {
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
    /// `Some(..)` replaces both coordinate columns, including with a null pair
    pub coordinates: Option<Option<Coordinates>>,
}

impl UpdateProvider {
    /// True when any field the geocoder reads is being changed
    pub fn touches_address(&self) -> bool {
        self.street.is_some()
            || self.neighborhood.is_some()
            || self.city.is_some()
            || self.state.is_some()
            || self.postal_code.is_some()
    }
}

impl Provider {
    /// Address fields as geocoder input
    pub fn address_parts(&self) -> AddressParts {
        AddressParts {
            street: self.street.clone().unwrap_or_default(),
            neighborhood: self.neighborhood.clone(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
        }
    }

    /// Address as it will read after `update` is applied
    pub fn address_after(&self, update: &UpdateProvider) -> AddressParts {
        AddressParts {
            street: update
                .street
                .clone()
                .or_else(|| self.street.clone())
                .unwrap_or_default(),
            neighborhood: update
                .neighborhood
                .clone()
                .or_else(|| self.neighborhood.clone()),
            city: update
                .city
                .clone()
                .or_else(|| self.city.clone())
                .unwrap_or_default(),
            state: update
                .state
                .clone()
                .or_else(|| self.state.clone())
                .unwrap_or_default(),
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Find provider by ID
    pub async fn find_by_id(id: ProviderId, pool: &PgPool) -> Result<Self> {
        let provider = sqlx::query_as::<_, Self>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(provider)
    }

    /// Find provider by ID, returning None if not found
    pub async fn find_by_id_optional(id: ProviderId, pool: &PgPool) -> Result<Option<Self>> {
        let provider = sqlx::query_as::<_, Self>("SELECT * FROM providers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(provider)
    }

    /// Providers the geocoder has not resolved yet but that have enough address to try
    pub async fn find_missing_coordinates(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let providers = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM providers
            WHERE latitude IS NULL
              AND NULLIF(TRIM(street), '') IS NOT NULL
              AND NULLIF(TRIM(city), '') IS NOT NULL
              AND NULLIF(TRIM(state), '') IS NOT NULL
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(providers)
    }

    /// Create a new provider inside a transaction
    pub async fn create(input: CreateProvider, tx: &mut Transaction<'_, Postgres>) -> Result<Self> {
        let (latitude, longitude) = Coordinates::into_columns(input.coordinates);

        let provider = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO providers (
                id, name, document, code_name, phone, email,
                street, neighborhood, city, state, postal_code,
                dispatch_fee, extra_hour_rate, extra_km_rate, km_allowance,
                approved, latitude, longitude, antenna_model
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(ProviderId::new())
        .bind(&input.name)
        .bind(&input.document)
        .bind(&input.code_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.street)
        .bind(&input.neighborhood)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(input.dispatch_fee)
        .bind(input.extra_hour_rate)
        .bind(input.extra_km_rate)
        .bind(input.km_allowance)
        .bind(input.approved)
        .bind(latitude)
        .bind(longitude)
        .bind(&input.antenna_model)
        .fetch_one(&mut **tx)
        .await?;
        Ok(provider)
    }

    /// Update a provider inside a transaction
    pub async fn update(
        id: ProviderId,
        input: UpdateProvider,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Self> {
        let replace_coordinates = input.coordinates.is_some();
        let (latitude, longitude) = Coordinates::into_columns(input.coordinates.flatten());

        let provider = sqlx::query_as::<_, Self>(
            r#"
            UPDATE providers SET
                name = COALESCE($2, name),
                document = COALESCE($3, document),
                code_name = COALESCE($4, code_name),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                street = COALESCE($7, street),
                neighborhood = COALESCE($8, neighborhood),
                city = COALESCE($9, city),
                state = COALESCE($10, state),
                postal_code = COALESCE($11, postal_code),
                dispatch_fee = COALESCE($12, dispatch_fee),
                extra_hour_rate = COALESCE($13, extra_hour_rate),
                extra_km_rate = COALESCE($14, extra_km_rate),
                km_allowance = COALESCE($15, km_allowance),
                antenna_model = COALESCE($16, antenna_model),
                latitude = CASE WHEN $17 THEN $18 ELSE latitude END,
                longitude = CASE WHEN $17 THEN $19 ELSE longitude END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.document)
        .bind(&input.code_name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.street)
        .bind(&input.neighborhood)
        .bind(&input.city)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(input.dispatch_fee)
        .bind(input.extra_hour_rate)
        .bind(input.extra_km_rate)
        .bind(input.km_allowance)
        .bind(&input.antenna_model)
        .bind(replace_coordinates)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(&mut **tx)
        .await?;
        Ok(provider)
    }

    /// Store geocoder output for a provider (both columns together)
    pub async fn set_coordinates(
        id: ProviderId,
        coordinates: Option<Coordinates>,
        pool: &PgPool,
    ) -> Result<()> {
        let (latitude, longitude) = Coordinates::into_columns(coordinates);

        sqlx::query(
            "UPDATE providers SET latitude = $2, longitude = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Set the approval flag
    pub async fn set_approved(id: ProviderId, approved: bool, pool: &PgPool) -> Result<Option<Self>> {
        let provider = sqlx::query_as::<_, Self>(
            "UPDATE providers SET approved = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(approved)
        .fetch_optional(pool)
        .await?;
        Ok(provider)
    }

    /// Delete a provider; tag rows go with it (ON DELETE CASCADE).
    /// Returns false when no such provider existed.
    pub async fn delete(id: ProviderId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM providers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Provider {
        let now = Utc::now();
        Provider {
            id: ProviderId::new(),
            name: "Carlos".to_string(),
            document: None,
            code_name: Some("Falcão".to_string()),
            phone: None,
            email: None,
            street: Some("Rua A 10".to_string()),
            neighborhood: Some("Centro".to_string()),
            city: Some("Campinas".to_string()),
            state: Some("SP".to_string()),
            postal_code: None,
            dispatch_fee: None,
            extra_hour_rate: None,
            extra_km_rate: None,
            km_allowance: None,
            approved: true,
            latitude: Some(-22.9),
            longitude: None,
            antenna_model: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn partial_coordinates_read_as_none() {
        assert_eq!(stored().coordinates(), None);
    }

    #[test]
    fn address_after_merges_update_over_stored() {
        let update = UpdateProvider {
            street: Some("Av. Norte 5".to_string()),
            ..Default::default()
        };
        let address = stored().address_after(&update);

        assert_eq!(address.street, "Av. Norte 5");
        assert_eq!(address.neighborhood.as_deref(), Some("Centro"));
        assert_eq!(address.city, "Campinas");
        assert!(update.touches_address());
    }

    #[test]
    fn non_address_update_does_not_touch_address() {
        let update = UpdateProvider {
            name: Some("Carlos Silva".to_string()),
            dispatch_fee: Some(Decimal::new(15000, 2)),
            ..Default::default()
        };
        assert!(!update.touches_address());
    }
}
