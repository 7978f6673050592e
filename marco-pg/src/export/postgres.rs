//! Export vers PostgreSQL/PostGIS

use anyhow::{Context, Result};
use deadpool_postgres::GenericClient;
use tracing::{debug, info};

use super::{
    LocalityId, LocalityStore, LocalityTypeId, NewLocality, NewLocalityType, SpatialRef,
};
use crate::config::Config;
use crate::error::MigrationError;

/// Requêtes préparées une fois pour toutes à partir de la configuration
#[derive(Debug, Clone)]
struct Statements {
    insert_locality_type: String,
    insert_locality: String,
    insert_parent: String,
}

impl Statements {
    fn new(config: &Config) -> Self {
        Self {
            insert_locality_type: format!(
                r#"
                INSERT INTO {} (metadata_schema, name, publication_date, source, description, original_datum)
                VALUES ($1::text::jsonb, $2, $3::text::date, $4, $5, $6)
                RETURNING id::bigint
                "#,
                config.qualified(&config.locality_type_table)
            ),
            insert_locality: format!(
                r#"
                INSERT INTO {} (name, {}, locality_type_id, metadata)
                VALUES ($1, ST_GeomFromText($2, $3), $4::bigint, $5::text::jsonb)
                RETURNING id::bigint
                "#,
                config.qualified(&config.locality_table),
                config.geometry_column
            ),
            insert_parent: format!(
                "INSERT INTO {} ({}, {}) VALUES ($1::bigint, $2::bigint) ON CONFLICT DO NOTHING",
                config.qualified(&config.is_part_of.table),
                config.is_part_of.from_column,
                config.is_part_of.to_column
            ),
        }
    }
}

/// Stockage PostGIS au-dessus d'un client ou d'une transaction
pub struct PgStore<'a, C> {
    client: &'a C,
    config: &'a Config,
    statements: Statements,
}

impl<'a, C: GenericClient> PgStore<'a, C> {
    pub fn new(client: &'a C, config: &'a Config) -> Self {
        Self {
            client,
            config,
            statements: Statements::new(config),
        }
    }

    /// Résout un SRID vers une définition utilisable par PROJ
    async fn spatial_ref(&self, srid: i32) -> Result<SpatialRef> {
        let row = self
            .client
            .query_opt(
                "SELECT auth_name::text, auth_srid, srtext::text FROM spatial_ref_sys WHERE srid = $1",
                &[&srid],
            )
            .await
            .context("Failed to query spatial_ref_sys")?
            .ok_or(MigrationError::UnknownSrid(srid))?;

        let auth_name: Option<String> = row.get(0);
        let auth_srid: Option<i32> = row.get(1);
        let srtext: Option<String> = row.get(2);

        let definition = match (auth_name, auth_srid, srtext) {
            (Some(name), Some(code), _) if !name.is_empty() => format!("{}:{}", name, code),
            (_, _, Some(wkt)) if !wkt.is_empty() => wkt,
            _ => return Err(MigrationError::UnknownSrid(srid).into()),
        };

        Ok(SpatialRef { srid, definition })
    }
}

impl<C: GenericClient> LocalityStore for PgStore<'_, C> {
    async fn target_srs(&mut self) -> Result<SpatialRef> {
        let srid: i32 = self
            .client
            .query_one(
                "SELECT Find_SRID($1::text, $2::text, $3::text)",
                &[
                    &self.config.schema,
                    &self.config.locality_table,
                    &self.config.geometry_column,
                ],
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to find SRID of {}.{}",
                    self.config.qualified(&self.config.locality_table),
                    self.config.geometry_column
                )
            })?
            .get(0);

        let srs = self.spatial_ref(srid).await?;
        info!(srid = srid, definition = %srs.definition, "Resolved target SRS");
        Ok(srs)
    }

    async fn create_locality_type(
        &mut self,
        locality_type: &NewLocalityType,
    ) -> Result<LocalityTypeId> {
        let schema = serde_json::to_string(&locality_type.metadata_schema)?;
        let row = self
            .client
            .query_one(
                self.statements.insert_locality_type.as_str(),
                &[
                    &schema,
                    &locality_type.name,
                    &locality_type.publication_date,
                    &locality_type.source,
                    &locality_type.description,
                    &locality_type.original_datum,
                ],
            )
            .await
            .with_context(|| format!("Failed to create locality type {}", locality_type.name))?;

        Ok(LocalityTypeId(row.get(0)))
    }

    async fn create_locality(&mut self, locality: &NewLocality) -> Result<LocalityId> {
        let metadata = serde_json::to_string(&locality.metadata)?;
        let row = self
            .client
            .query_one(
                self.statements.insert_locality.as_str(),
                &[
                    &locality.name,
                    &locality.geometry_wkt,
                    &locality.srid,
                    &locality.locality_type.0,
                    &metadata,
                ],
            )
            .await
            .with_context(|| format!("Failed to create locality {}", locality.name))?;

        let id = LocalityId(row.get(0));
        debug!(id = id.0, name = %locality.name, "Created locality");
        Ok(id)
    }

    async fn add_parents(&mut self, child: LocalityId, parents: &[LocalityId]) -> Result<()> {
        for parent in parents {
            self.client
                .execute(
                    self.statements.insert_parent.as_str(),
                    &[&child.0, &parent.0],
                )
                .await
                .with_context(|| {
                    format!("Failed to link locality {} to parent {}", child.0, parent.0)
                })?;
        }
        Ok(())
    }
}
