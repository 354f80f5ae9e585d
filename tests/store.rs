use assert_matches::assert_matches;

use protein_catalog::domain::{DatasetId, ProteinEntity, ProteinPatch, SourceRow};
use protein_catalog::error::CatalogError;
use protein_catalog::store::Store;

fn store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.reset().unwrap();
    store
}

#[test]
fn create_then_conflict() {
    let store = store();
    let protein = ProteinEntity {
        id: "P1".to_string(),
        name: "Alpha".to_string(),
    };
    store.create_protein(&protein).unwrap();
    let err = store.create_protein(&protein).unwrap_err();
    assert_matches!(err, CatalogError::Conflict(ref message) if message == "Protein id existed...");
    assert_eq!(store.find_protein("P1").unwrap(), Some(protein));
}

#[test]
fn update_missing_is_not_found() {
    let store = store();
    let err = store
        .update_protein("nope", &ProteinPatch::default())
        .unwrap_err();
    assert_matches!(
        err,
        CatalogError::NotFound(ref message) if message == "Protein doesn't exist, cannot update"
    );
}

#[test]
fn provenance_lookup_keeps_insertion_order() {
    let store = store();
    let first: DatasetId = "batch1".parse().unwrap();
    let second: DatasetId = "batch2".parse().unwrap();
    let rows = vec![SourceRow::new("P1", "Alpha"), SourceRow::new("P2", "Beta")];
    store.append_provenance(&first, &rows).unwrap();
    store.append_provenance(&second, &rows[..1]).unwrap();

    let records = store.provenance_by_name("Alpha").unwrap();
    let datasets = records
        .iter()
        .map(|record| record.dataset_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(datasets, vec!["batch1", "batch2"]);
    assert!(records[0].relation_id < records[1].relation_id);
    assert_eq!(store.provenance_count().unwrap(), 3);
}

#[test]
fn provenance_does_not_require_entity() {
    let store = store();
    let dataset: DatasetId = "orphans".parse().unwrap();
    store
        .append_provenance(&dataset, &[SourceRow::new("X9", "Ghost")])
        .unwrap();
    assert_eq!(store.protein_count().unwrap(), 0);
    assert_eq!(store.provenance_by_name("Ghost").unwrap().len(), 1);
}

#[test]
fn existing_names_reflect_inserts() {
    let store = store();
    store
        .insert_proteins(&[SourceRow::new("P1", "Alpha"), SourceRow::new("P2", "Beta")])
        .unwrap();
    let names = store.existing_names().unwrap();
    assert!(names.contains("Alpha"));
    assert!(names.contains("Beta"));
    assert_eq!(names.len(), 2);
}

#[test]
fn file_store_survives_reopen_until_reset() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("catalog.db");
    let location = format!("sqlite://{}", path.display()).parse().unwrap();

    let store = Store::open(&location).unwrap();
    store.reset().unwrap();
    store.insert_proteins(&[SourceRow::new("P1", "Alpha")]).unwrap();
    drop(store);

    let reopened = Store::open(&location).unwrap();
    assert_eq!(reopened.protein_count().unwrap(), 1);
    reopened.reset().unwrap();
    assert_eq!(reopened.protein_count().unwrap(), 0);
}
