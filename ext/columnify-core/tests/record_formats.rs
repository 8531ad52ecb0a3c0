use apache_avro::types::{Record, Value as AvroValue};
use columnify_core::*;
use parquet::record::{Field, RowAccessor};
use std::collections::HashMap;

mod test_helpers;
use test_helpers::*;

fn event_container(count: i64) -> Vec<u8> {
    let schema = apache_avro::Schema::parse_str(EVENT_AVRO).unwrap();
    let mut writer = apache_avro::Writer::new(&schema, Vec::new());

    for i in 0..count {
        let mut record = Record::new(writer.schema()).unwrap();
        record.put("id", i);
        record.put("kind", AvroValue::Enum(1, "view".to_string()));
        record.put(
            "score",
            AvroValue::Union(1, Box::new(AvroValue::Double(i as f64 / 2.0))),
        );
        record.put(
            "tags",
            AvroValue::Array(vec![AvroValue::String(format!("t{}", i))]),
        );
        let attrs: HashMap<String, AvroValue> =
            [("n".to_string(), AvroValue::Long(i * 10))].into_iter().collect();
        record.put("attrs", AvroValue::Union(1, Box::new(AvroValue::Map(attrs))));
        record.put("at", AvroValue::TimestampMillis(1_700_000_000_000 + i));
        record.put(
            "payload",
            AvroValue::Union(1, Box::new(AvroValue::Bytes(vec![0xff, i as u8]))),
        );
        record.put("origin", AvroValue::Union(0, Box::new(AvroValue::Null)));
        writer.append(record).unwrap();
    }

    writer.into_inner().unwrap()
}

#[test]
fn test_avro_container_to_parquet() {
    let ws = Workspace::new();
    let input = ws.file("events.avro", event_container(3));

    let mut session = ws.session("avro", EVENT_AVRO, "avro").unwrap();
    session.write_from_files(&[input]).unwrap();
    session.finalize().unwrap();

    assert_eq!(
        column_names(&ws.output()),
        vec!["id", "kind", "score", "tags", "attrs", "at", "payload", "origin"]
    );

    let rows = read_rows(&ws.output());
    assert_eq!(rows.len(), 3);

    let row = &rows[2];
    assert_eq!(row.get_long(0).unwrap(), 2);
    assert_eq!(row.get_string(1).unwrap(), "view");
    assert_eq!(row.get_double(2).unwrap(), 1.0);
    assert_eq!(row.get_list(3).unwrap().len(), 1);
    assert_eq!(row.get_map(4).unwrap().len(), 1);
    assert_eq!(row.get_timestamp_millis(5).unwrap(), 1_700_000_000_002);
    assert_eq!(row.get_bytes(6).unwrap().data(), &[0xff, 2]);

    let origin = row.get_column_iter().nth(7).map(|(_, field)| field.clone());
    assert_eq!(origin, Some(Field::Null));
}

#[test]
fn test_msgpack_stream_to_parquet() {
    let ws = Workspace::new();

    let mut data = Vec::new();
    for (id, name) in [(1, Some("Alice")), (2, None)] {
        let name = name.map(rmpv::Value::from).unwrap_or(rmpv::Value::Nil);
        let value = rmpv::Value::Map(vec![
            (rmpv::Value::from("id"), rmpv::Value::from(id)),
            (rmpv::Value::from("name"), name),
        ]);
        rmpv::encode::write_value(&mut data, &value).unwrap();
    }

    let mut session = ws.session("bigquery", ID_NAME_BIGQUERY, "msgpack").unwrap();
    session.write_from_reader(data.as_slice()).unwrap();
    session.finalize().unwrap();

    let rows = read_rows(&ws.output());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_string(1).unwrap(), "Alice");
    assert_eq!(rows[1].get_long(0).unwrap(), 2);
    assert_eq!(
        rows[1].get_column_iter().nth(1).map(|(_, f)| f.clone()),
        Some(Field::Null)
    );
}

#[test]
fn test_ltsv_and_tsv_to_parquet() {
    let schema = r#"[
        {"name": "host", "type": "STRING", "mode": "REQUIRED"},
        {"name": "status", "type": "INTEGER"},
        {"name": "ok", "type": "BOOLEAN"},
        {"name": "day", "type": "DATE"}
    ]"#;

    let ws = Workspace::new();
    let mut session = ws.session("bigquery", schema, "ltsv").unwrap();
    session
        .write_from_reader(
            "host:a\tstatus:200\tok:true\tday:1970-01-02\n\nstatus:\thost:b\tok:f\textra:x\n"
                .as_bytes(),
        )
        .unwrap();
    session.finalize().unwrap();

    let rows = read_rows(&ws.output());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_long(1).unwrap(), 200);
    assert!(rows[0].get_bool(2).unwrap());
    assert_eq!(rows[0].get_date(3).unwrap(), 1);
    assert_eq!(rows[1].get_string(0).unwrap(), "b");
    assert!(!rows[1].get_bool(2).unwrap());

    let ws = Workspace::new();
    let mut session = ws.session("bigquery", schema, "tsv").unwrap();
    session
        .write_from_reader("a\t404\tFALSE\t3\nb\t\t\t\n".as_bytes())
        .unwrap();
    session.finalize().unwrap();

    let rows = read_rows(&ws.output());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_long(1).unwrap(), 404);
    assert_eq!(rows[0].get_date(3).unwrap(), 3);
    assert_eq!(
        rows[1].get_column_iter().nth(1).map(|(_, f)| f.clone()),
        Some(Field::Null)
    );
}

#[test]
fn test_jsonl_nested_bigquery_records() {
    let schema = r#"[
        {"name": "user", "type": "RECORD", "mode": "REQUIRED", "fields": [
            {"name": "email", "type": "STRING", "mode": "REQUIRED"},
            {"name": "joined", "type": "TIMESTAMP"}
        ]},
        {"name": "scores", "type": "FLOAT", "mode": "REPEATED"}
    ]"#;

    let ws = Workspace::new();
    let mut session = ws.session("bigquery", schema, "jsonl").unwrap();
    session
        .write_from_reader(
            concat!(
                "{\"user\": {\"email\": \"a@x\", \"joined\": \"2024-01-01T00:00:00Z\"}, \"scores\": [1.5, 2]}\n",
                "{\"user\": {\"email\": \"b@x\"}, \"scores\": []}\n",
            )
            .as_bytes(),
        )
        .unwrap();
    session.finalize().unwrap();

    let rows = read_rows(&ws.output());
    assert_eq!(rows.len(), 2);

    let user = rows[0].get_group(0).unwrap();
    assert_eq!(user.get_string(0).unwrap(), "a@x");
    assert_eq!(user.get_timestamp_micros(1).unwrap(), 1_704_067_200_000_000);
    assert_eq!(rows[0].get_list(1).unwrap().len(), 2);
    assert_eq!(rows[1].get_list(1).unwrap().len(), 0);
}
