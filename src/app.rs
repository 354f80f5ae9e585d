use std::time::Duration;

use camino::Utf8Path;
use tracing::debug;

use crate::config::TableLayout;
use crate::domain::{
    NewProtein, ProteinEntity, ProteinPatch, ProvenanceRecord, normalize_id, normalize_name,
};
use crate::error::{CatalogError, NAME_NOT_FOUND};
use crate::ingest::{IngestReport, Ingestor};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Catalog operations shared by the CLI and the HTTP service.
#[derive(Debug, Clone)]
pub struct App {
    store: Store,
}

impl App {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Wipes the catalog and loads every dataset in `source_dir`. Must finish
    /// before the service takes requests.
    pub fn reset_and_load(
        &self,
        source_dir: &Utf8Path,
        layout: &TableLayout,
        sink: &dyn ProgressSink,
    ) -> Result<IngestReport, CatalogError> {
        self.store.reset()?;
        Ingestor::new(&self.store, layout).run(source_dir, sink)
    }

    pub fn lookup(&self, name: &str) -> Result<Vec<ProvenanceRecord>, CatalogError> {
        let name = normalize_name(name);
        let records = self.store.provenance_by_name(&name)?;
        if records.is_empty() {
            return Err(CatalogError::NotFound(NAME_NOT_FOUND.to_string()));
        }
        Ok(records)
    }

    pub fn create(&self, id: &str, request: &NewProtein) -> Result<ProteinEntity, CatalogError> {
        let id = normalize_id(id);
        let protein = ProteinEntity {
            id: normalize_id(&request.id),
            name: normalize_name(&request.name),
        };
        if protein.id.is_empty() || protein.name.is_empty() {
            return Err(CatalogError::Validation(
                "id and name must not be empty".to_string(),
            ));
        }
        if protein.id != id {
            return Err(CatalogError::Validation(format!(
                "body id {} does not match path id {id}",
                protein.id
            )));
        }
        self.store.create_protein(&protein)?;
        debug!(id = %protein.id, name = %protein.name, "protein created");
        Ok(protein)
    }

    pub fn update(&self, id: &str, patch: &ProteinPatch) -> Result<ProteinEntity, CatalogError> {
        let id = normalize_id(id);
        let patch = patch.normalized();
        let updated = self.store.update_protein(&id, &patch)?;
        debug!(id = %id, new_id = %updated.id, name = %updated.name, "protein updated");
        Ok(updated)
    }
}
