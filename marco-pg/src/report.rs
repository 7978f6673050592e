//! Rapport de migration
//!
//! Collecte le résultat de chaque passe (LocalityType créé, Locality créées,
//! liens `is_part_of`) et l'issue de la transaction.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::level::Level;

/// Statut global de la migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationStatus {
    /// Migration en cours (pas encore commitée)
    Pending,
    /// Transaction commitée
    Committed,
    /// Transaction annulée (rollback)
    RolledBack,
    /// Exécution à blanc en mémoire
    DryRun,
    /// Exécution à blanc interrompue par une erreur
    Failed,
}

/// Résultat d'une passe
#[derive(Debug, Clone, Serialize)]
pub struct LevelReport {
    pub level: Level,
    /// Identifiant du LocalityType créé
    pub locality_type_id: i64,
    /// Nombre de Locality créées
    pub created: usize,
    /// Nombre de liens vers les parents
    pub links: usize,
    pub duration_secs: f64,
}

/// Rapport complet de migration
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub status: MigrationStatus,
    /// Les archives ont-elles été extraites pendant ce run ?
    pub extracted: bool,
    pub levels: Vec<LevelReport>,
    pub duration_secs: f64,
    /// Cause de l'échec
    pub error: Option<String>,
}

impl Default for MigrationReport {
    fn default() -> Self {
        Self {
            status: MigrationStatus::Pending,
            extracted: false,
            levels: Vec::new(),
            duration_secs: 0.0,
            error: None,
        }
    }
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre le résultat d'une passe
    pub fn record_level(&mut self, level: LevelReport) {
        self.levels.push(level);
    }

    /// Définit la durée totale
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Marque la migration comme annulée
    pub fn mark_rolled_back(&mut self, reason: &str) {
        self.status = MigrationStatus::RolledBack;
        self.error = Some(reason.to_string());
    }

    /// Marque l'exécution à blanc comme échouée
    pub fn mark_failed(&mut self, reason: &str) {
        self.status = MigrationStatus::Failed;
        self.error = Some(reason.to_string());
    }

    /// Nombre total de Locality créées
    pub fn total_localities(&self) -> usize {
        self.levels.iter().map(|l| l.created).sum()
    }

    /// Nombre total de liens `is_part_of`
    pub fn total_links(&self) -> usize {
        self.levels.iter().map(|l| l.links).sum()
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("MIGRATION REPORT - Marco Geoestadístico 2018");
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);
        println!(
            "Archives: {}",
            if self.extracted {
                "extracted"
            } else {
                "already unpacked"
            }
        );

        if !self.levels.is_empty() {
            println!("\n--- BY LEVEL ---");
            for l in &self.levels {
                println!(
                    "  {} (type #{}): {} localities, {} links, {:.2}s",
                    l.level, l.locality_type_id, l.created, l.links, l.duration_secs
                );
            }
        }

        if let Some(error) = &self.error {
            println!("\n--- ERROR ---");
            println!("  {}", error);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{:?}: {} locality types, {} localities, {} links",
            self.status,
            self.levels.len(),
            self.total_localities(),
            self.total_links()
        )
    }
}
