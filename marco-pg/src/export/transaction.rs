//! Transaction atomique pour la migration complète
//!
//! Les trois passes sont exécutées dans une seule transaction : rollback
//! automatique en cas d'erreur fatale.

use anyhow::{Context, Result};
use deadpool_postgres::{Object, Transaction};
use tracing::{error, info};

use crate::report::{MigrationReport, MigrationStatus};

/// Gestionnaire de transaction pour une migration
pub struct MigrationTransaction<'a> {
    transaction: Transaction<'a>,
}

impl<'a> MigrationTransaction<'a> {
    /// Démarre une nouvelle transaction
    ///
    /// # Arguments
    /// * `client` - Connexion PostgreSQL (doit rester vivante pendant la transaction)
    pub async fn begin(client: &'a mut Object) -> Result<Self> {
        let transaction = client
            .transaction()
            .await
            .context("Failed to begin transaction")?;

        info!("Starting geostatistical framework migration transaction");

        Ok(Self { transaction })
    }

    /// Accède à la transaction sous-jacente pour exécuter des requêtes
    pub fn transaction(&self) -> &Transaction<'a> {
        &self.transaction
    }

    /// Valide et commit la transaction
    pub async fn commit(self, report: &mut MigrationReport) -> Result<()> {
        self.transaction
            .commit()
            .await
            .context("Failed to commit transaction")?;

        report.status = MigrationStatus::Committed;
        info!(
            localities = report.total_localities(),
            links = report.total_links(),
            "Migration committed successfully"
        );
        Ok(())
    }

    /// Annule la transaction (rollback)
    ///
    /// La transaction est également annulée si elle est droppée.
    pub async fn rollback(self, report: &mut MigrationReport, reason: &str) {
        error!(
            reason = %reason,
            localities_attempted = report.total_localities(),
            "Rolling back migration"
        );

        if let Err(e) = self.transaction.rollback().await {
            error!(error = %e, "Explicit rollback failed (will rollback on drop anyway)");
        }

        report.mark_rolled_back(reason);
    }
}
