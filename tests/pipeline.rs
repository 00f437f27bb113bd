use std::io::Write;

use _core::schema::output;
use _core::{
    build_schema_at, extract_dimensions, materialize_records, rebuild_pivot_at, rebuild_worksheet_pivot,
    recover_table, remap_table, CellValue, NormalizedRecord, RecoverError, SchemaConfig, WorkbookSnapshot,
};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tempfile::NamedTempFile;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,_core=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Two pivots on "Plan1": a coded fuel-sales cache and one whose month
/// header is not a recognised label.
const SNAPSHOT: &str = r#"{
  "worksheets": [{
    "name": "Plan1",
    "pivots": [
      {
        "name": "Tabela dinâmica3",
        "cache": {
          "fields": [
            {"name": "COMBUSTÍVEL", "shared_items": [{"s": "GASOLINA C (m3)"}, {"s": "ÓLEO DIESEL (m3)"}]},
            {"name": "REGIÃO", "shared_items": [{"s": "SUDESTE"}, {"s": "NORDESTE"}]},
            {"name": "ANO", "shared_items": [{"n": 2020}, {"n": 2021}]},
            {"name": "ESTADO", "shared_items": [{"s": "SÃO PAULO"}, {"s": "BAHIA"}, null]},
            {"name": "UNIDADE", "shared_items": [{"s": "m3"}]},
            {"name": "TOTAL"},
            {"name": "Jan"},
            {"name": "Fev"},
            {"name": "Mar"}
          ],
          "records": [
            [{"x": 0}, {"x": 0}, {"x": 1}, {"x": 0}, {"x": 0}, {"n": 60.5}, {"n": 10.5}, {"n": 20}, {"n": 30}],
            [{"x": 1}, {"x": 1}, {"x": 0}, {"x": 1}, {"x": 0}, {"n": 7}, {"n": 7}, "m"],
            [{"x": 1}, {"x": 0}, {"x": 1}, {"x": 2}, {"x": 0}, {"n": 0}]
          ]
        }
      },
      {
        "name": "Tabela dinâmica1",
        "cache": {
          "fields": [
            {"name": "COMBUSTÍVEL"}, {"name": "REGIÃO"}, {"name": "ANO"},
            {"name": "ESTADO"}, {"name": "UNIDADE"}, {"name": "TOTAL"}, {"name": "Xyz"}
          ],
          "records": [
            [{"s": "DIESEL"}, {"s": "X"}, {"n": 2021}, {"s": "SP"}, {"s": "m3"}, {"n": 1}, {"n": 1}]
          ]
        }
      }
    ]
  }]
}"#;

fn snapshot() -> WorkbookSnapshot {
    WorkbookSnapshot::from_json_str(SNAPSHOT).unwrap()
}

fn batch_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap()
}

#[test]
fn dictionaries_cover_every_shared_item() {
    let book = snapshot();
    let cache = &book.worksheet("Plan1").unwrap().pivot(0).unwrap().cache;
    let dims = extract_dimensions(cache);

    for (field, dict) in cache.fields.iter().zip(&dims.dictionaries) {
        let expected = field.shared_items.as_ref().map_or(0, Vec::len);
        assert_eq!(dict.len(), expected, "field {}", field.name);
    }
    assert_eq!(dims.dictionary("ESTADO").unwrap().get(2), Some(&CellValue::Missing));
}

#[test]
fn materialized_rows_match_field_count() {
    let book = snapshot();
    let cache = &book.worksheet("Plan1").unwrap().pivot(0).unwrap().cache;
    let dims = extract_dimensions(cache);
    let table = materialize_records(cache, &dims).unwrap();

    assert_eq!(table.width(), cache.fields.len());
    for i in 0..table.height() {
        assert_eq!(table.row(i).unwrap().len(), cache.fields.len());
    }

    let remapped = remap_table(&table, &dims);
    let again = remap_table(&remapped, &dims);
    assert_eq!(again, remapped);
}

#[test]
fn coded_pivot_rebuilds_into_load_schema() {
    init_test_logging();
    let book = snapshot();
    let cache = &book.worksheet("Plan1").unwrap().pivot(0).unwrap().cache;

    let df = rebuild_pivot_at(cache, &SchemaConfig::default(), batch_time()).unwrap();

    assert_eq!(df.get_column_names_str(), output::ALL.to_vec());
    // 3 rows x 3 month columns
    assert_eq!(df.height(), 9);

    let products: Vec<Option<&str>> = df.column(output::PRODUCT).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(&products[..3], &[Some("GASOLINA C (m3)"), Some("ÓLEO DIESEL (m3)"), Some("ÓLEO DIESEL (m3)")]);

    let ufs: Vec<Option<&str>> = df.column(output::UF).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(&ufs[..3], &[Some("SÃO PAULO"), Some("BAHIA"), None]);

    let volumes: Vec<Option<f64>> = df.column(output::VOLUME).unwrap().f64().unwrap().into_iter().collect();
    assert_eq!(
        volumes,
        vec![Some(10.5), Some(7.0), None, Some(20.0), None, None, Some(30.0), None, None]
    );

    let recovered = recover_table(cache).unwrap();
    let frame = build_schema_at(&recovered, &SchemaConfig::default(), batch_time()).unwrap();
    let records = NormalizedRecord::from_frame(&frame).unwrap();
    let months: Vec<NaiveDate> = records.iter().map(|r| r.year_month).collect();
    assert_eq!(months[0], NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
    assert_eq!(months[1], NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
    assert_eq!(months[8], NaiveDate::from_ymd_opt(2021, 3, 1).unwrap());
    assert!(records.iter().all(|r| r.created_at == batch_time()));
}

#[test]
fn unknown_month_label_aborts_run() {
    let book = snapshot();
    let sheet = book.worksheet("Plan1").unwrap();

    let err = rebuild_worksheet_pivot(sheet, 1, &SchemaConfig::default()).unwrap_err();
    assert!(matches!(err, RecoverError::UnknownMonthLabel(label) if label == "Xyz"));
}

#[test]
fn worksheet_run_from_snapshot_file() {
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(SNAPSHOT.as_bytes()).unwrap();

    let book = WorkbookSnapshot::from_json_file(tmp.path()).unwrap();
    let sheet = book.worksheet("Plan1").unwrap();
    assert_eq!(sheet.pivot_names(), vec!["Tabela dinâmica3", "Tabela dinâmica1"]);

    let run = rebuild_worksheet_pivot(sheet, 0, &SchemaConfig::default()).unwrap();
    assert_eq!(run.target, "Pivot0");
    assert_eq!(run.frame.height(), 9);

    let created = run
        .frame
        .column(output::CREATED_AT)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap();
    let stamps = created.i64().unwrap();
    assert_eq!(stamps.null_count(), 0);
    assert_eq!(stamps.min(), stamps.max());
}

#[test]
fn config_file_relabels_identity_columns() {
    let json = SNAPSHOT
        .replace("\"ESTADO\"", "\"UF\"")
        .replace("\"COMBUSTÍVEL\"", "\"PRODUTO\"");
    let book = WorkbookSnapshot::from_json_str(&json).unwrap();
    let cache = &book.worksheet("Plan1").unwrap().pivot(0).unwrap().cache;

    let mut config_file = NamedTempFile::new().unwrap();
    config_file
        .write_all(br#"{"identity": {"product": "PRODUTO", "state": "UF"}}"#)
        .unwrap();
    let config = SchemaConfig::from_json_file(config_file.path()).unwrap();

    let df = rebuild_pivot_at(cache, &config, batch_time()).unwrap();
    assert_eq!(df.height(), 9);
    assert!(matches!(
        rebuild_pivot_at(cache, &SchemaConfig::default(), batch_time()),
        Err(RecoverError::MissingColumn(_))
    ));
}
