//! Stockage en mémoire (dry-run et tests)

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use super::{
    LocalityId, LocalityStore, LocalityTypeId, NewLocality, NewLocalityType, SpatialRef,
};

/// LocalityType enregistré
#[derive(Debug, Clone)]
pub struct StoredLocalityType {
    pub id: LocalityTypeId,
    pub record: NewLocalityType,
}

/// Locality enregistrée avec son ensemble `is_part_of`
#[derive(Debug, Clone)]
pub struct StoredLocality {
    pub id: LocalityId,
    pub record: NewLocality,
    pub is_part_of: BTreeSet<LocalityId>,
}

/// Stockage en mémoire, ids séquentiels à partir de 1
#[derive(Debug)]
pub struct MemoryStore {
    target: SpatialRef,
    locality_types: Vec<StoredLocalityType>,
    localities: Vec<StoredLocality>,
}

impl MemoryStore {
    pub fn new(target: SpatialRef) -> Self {
        Self {
            target,
            locality_types: Vec::new(),
            localities: Vec::new(),
        }
    }

    pub fn locality_types(&self) -> &[StoredLocalityType] {
        &self.locality_types
    }

    pub fn localities(&self) -> &[StoredLocality] {
        &self.localities
    }

    pub fn locality(&self, id: LocalityId) -> Option<&StoredLocality> {
        self.localities.iter().find(|l| l.id == id)
    }

    /// Localities d'un LocalityType donné
    pub fn localities_of_type(&self, locality_type: LocalityTypeId) -> Vec<&StoredLocality> {
        self.localities
            .iter()
            .filter(|l| l.record.locality_type == locality_type)
            .collect()
    }
}

impl LocalityStore for MemoryStore {
    async fn target_srs(&mut self) -> Result<SpatialRef> {
        Ok(self.target.clone())
    }

    async fn create_locality_type(
        &mut self,
        locality_type: &NewLocalityType,
    ) -> Result<LocalityTypeId> {
        let id = LocalityTypeId(self.locality_types.len() as i64 + 1);
        self.locality_types.push(StoredLocalityType {
            id,
            record: locality_type.clone(),
        });
        Ok(id)
    }

    async fn create_locality(&mut self, locality: &NewLocality) -> Result<LocalityId> {
        if !self
            .locality_types
            .iter()
            .any(|t| t.id == locality.locality_type)
        {
            bail!("Unknown locality type {:?}", locality.locality_type);
        }

        let id = LocalityId(self.localities.len() as i64 + 1);
        self.localities.push(StoredLocality {
            id,
            record: locality.clone(),
            is_part_of: BTreeSet::new(),
        });
        Ok(id)
    }

    async fn add_parents(&mut self, child: LocalityId, parents: &[LocalityId]) -> Result<()> {
        for parent in parents {
            if self.locality(*parent).is_none() {
                bail!("Unknown parent locality {:?}", parent);
            }
        }

        let Some(stored) = self.localities.iter_mut().find(|l| l.id == child) else {
            bail!("Unknown locality {:?}", child);
        };
        stored.is_part_of.extend(parents.iter().copied());
        Ok(())
    }
}
