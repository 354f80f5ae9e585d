use camino::Utf8Path;

use protein_catalog::domain::{
    DatasetId, ProteinPatch, ProvenanceRecord, SourceRow, normalize_id, normalize_name,
};

#[test]
fn normalization_is_idempotent() {
    for raw in ["P 1(23)", "(A) B\tC", "Q9Y6K9", " ( ) "] {
        let once = normalize_id(raw);
        assert_eq!(normalize_id(&once), once);
    }
    for raw in ["Alpha Beta", " spaced  out ", "Kinase(2)"] {
        let once = normalize_name(raw);
        assert_eq!(normalize_name(&once), once);
    }
}

#[test]
fn source_row_normalizes_both_fields() {
    let row = SourceRow::new("P 1(23)", "Alpha Beta");
    assert_eq!(row.id, "P123");
    assert_eq!(row.name, "AlphaBeta");
}

#[test]
fn dataset_id_from_file_name() {
    let id = DatasetId::from_path(Utf8Path::new("AdditionalDatasets/batch1.csv")).unwrap();
    assert_eq!(id.as_str(), "batch1");

    let id = DatasetId::from_path(Utf8Path::new("screen.2024.tsv")).unwrap();
    assert_eq!(id.as_str(), "screen.2024");
}

#[test]
fn provenance_serializes_without_relation_id() {
    let record = ProvenanceRecord {
        relation_id: 7,
        protein_id: "P123".to_string(),
        protein_name: "AlphaBeta".to_string(),
        dataset_id: "batch1".to_string(),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "protein_id": "P123",
            "protein_name": "AlphaBeta",
            "dataset_id": "batch1"
        })
    );
}

#[test]
fn patch_deserializes_partial_body() {
    let patch: ProteinPatch = serde_json::from_str(r#"{"name": "Gamma"}"#).unwrap();
    assert!(patch.id.is_none());
    assert_eq!(patch.name.as_deref(), Some("Gamma"));

    let empty: ProteinPatch = serde_json::from_str("{}").unwrap();
    assert!(empty.normalized().is_empty());
}
