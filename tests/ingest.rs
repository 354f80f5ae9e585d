use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use protein_catalog::app::App;
use protein_catalog::config::TableLayout;
use protein_catalog::error::CatalogError;
use protein_catalog::output::JsonOutput;
use protein_catalog::store::Store;

const HEADER: &str = ",Protein.name1,ID \n";

fn dataset_dir(files: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    for (name, body) in files {
        fs::write(root.join(name), format!("{HEADER}{body}")).unwrap();
    }
    (temp, root)
}

fn app() -> App {
    App::new(Store::open_in_memory().unwrap())
}

#[test]
fn single_file_example() {
    let (_temp, root) = dataset_dir(&[("batch1.csv", "0,Alpha Beta,P 1(23)\n")]);
    let app = app();
    let report = app
        .reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();

    assert_eq!(report.total_rows, 1);
    assert_eq!(report.total_inserted, 1);
    let protein = app.store().find_protein("P123").unwrap().unwrap();
    assert_eq!(protein.name, "AlphaBeta");
    let records = app.lookup("AlphaBeta").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].protein_id, "P123");
    assert_eq!(records[0].dataset_id, "batch1");
}

#[test]
fn first_file_wins_and_every_file_gets_provenance() {
    let (_temp, root) = dataset_dir(&[
        ("b_second.csv", "0,Alpha,P1\n1,Gamma,P3\n"),
        ("a_first.csv", "0,Alpha,P1\n1,Beta,P2\n"),
    ]);
    let app = app();
    let report = app
        .reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();

    let order = report
        .files
        .iter()
        .map(|file| (file.dataset_id.as_str(), file.rows, file.inserted))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![("a_first", 2, 2), ("b_second", 2, 1)]);
    assert_eq!(app.store().protein_count().unwrap(), 3);

    let datasets = app
        .lookup("Alpha")
        .unwrap()
        .into_iter()
        .map(|record| record.dataset_id)
        .collect::<Vec<_>>();
    assert_eq!(datasets, vec!["a_first", "b_second"]);
}

#[test]
fn same_name_twice_in_one_file_inserts_once() {
    let (_temp, root) = dataset_dir(&[("batch.csv", "0,Alpha,P1\n1,Alpha,P1-b\n2,Alpha,P1\n")]);
    let app = app();
    let report = app
        .reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();

    assert_eq!(report.files[0].rows, 2);
    assert_eq!(report.files[0].inserted, 1);
    assert_eq!(app.store().find_protein("P1").unwrap().unwrap().name, "Alpha");
    assert_eq!(app.store().find_protein("P1-b").unwrap(), None);
    assert_eq!(app.lookup("Alpha").unwrap().len(), 2);
}

#[test]
fn hidden_files_are_ignored() {
    let (_temp, root) = dataset_dir(&[("batch1.csv", "0,Alpha,P1\n")]);
    fs::write(root.join(".DS_Store"), [0u8, 1, 2, 3]).unwrap();
    let report = app()
        .reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();
    assert_eq!(report.files.len(), 1);
}

#[test]
fn malformed_file_aborts_ingestion() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    fs::write(root.join("bad.csv"), ",name,accession\n0,Alpha,P1\n").unwrap();

    let err = app()
        .reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap_err();
    assert_matches!(err, CatalogError::IngestionFormat { ref path, .. } if path.ends_with("bad.csv"));
}

#[test]
fn reload_wipes_previous_state() {
    let (_temp, root) = dataset_dir(&[("batch1.csv", "0,Alpha,P1\n")]);
    let app = app();
    app.reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();
    app.reset_and_load(&root, &TableLayout::default(), &JsonOutput)
        .unwrap();

    assert_eq!(app.store().protein_count().unwrap(), 1);
    assert_eq!(app.store().provenance_count().unwrap(), 1);
}

#[test]
fn custom_layout_without_index_column() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    fs::write(root.join("screen.tsv"), "Accession\tGene\nQ 9(Y)\tKinase A\n").unwrap();
    let layout = TableLayout {
        name_column: "Gene".to_string(),
        id_column: "Accession".to_string(),
        delimiter: b'\t',
        index_column: false,
    };

    let app = app();
    app.reset_and_load(&root, &layout, &JsonOutput).unwrap();
    let records = app.lookup("KinaseA").unwrap();
    assert_eq!(records[0].protein_id, "Q9Y");
    assert_eq!(records[0].dataset_id, "screen");
}
