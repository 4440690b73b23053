use super::*;
use crate::testutil::{log, monitoring, source};

#[test]
fn test_insert_logs_sql() {
    let rows = vec![
        LogRow::from_entry(&log("a", 1)),
        LogRow::from_entry(&log("b", 2)),
    ];
    let qb = insert_logs(&rows);
    let sql = qb.sql();

    assert!(sql.starts_with("INSERT INTO logs (id, message, level"));
    assert!(sql.contains("$1, $2"));
    // 12 columns × 2 rows
    assert!(sql.contains("$24"));
    assert!(!sql.contains("$25"));
    assert!(sql.ends_with("ON CONFLICT (id) DO NOTHING"));
}

#[test]
fn test_insert_monitoring_sql() {
    let rows = vec![MonitoringRow::from_entry(&monitoring("m1", 1))];
    let sql = insert_monitoring(&rows).sql().to_string();

    assert!(sql.starts_with("INSERT INTO monitoring ("));
    assert!(sql.contains("$11"));
    assert!(!sql.contains("$12"));
}

#[test]
fn test_upsert_sources_sql() {
    let rows = vec![SourceRow::from_source(&source("app"))];
    let sql = upsert_sources(&rows).sql().to_string();

    assert!(sql.contains("ON CONFLICT (source_id) DO UPDATE SET"));
    assert!(sql.contains("log_count = EXCLUDED.log_count"));
}

#[test]
fn test_delete_ids_binds_one_array() {
    let ids = vec!["a".to_string(), "b".to_string()];
    let sql = delete_ids("logs", &ids).sql().to_string();
    assert_eq!(sql, "DELETE FROM logs WHERE id = ANY($1)");
}

#[test]
fn test_seq_column_added_to_entry_tables() {
    for table in ["logs", "monitoring"] {
        assert!(
            POSTGRES_SEQ_STATEMENTS
                .iter()
                .any(|s| s.contains(&format!("TABLE {table} ")) && s.contains("seq BIGSERIAL"))
        );
    }
}
