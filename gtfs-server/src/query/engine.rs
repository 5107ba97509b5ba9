//! Table listing and the route stop-sequence join.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::store::StoreSnapshot;
use crate::table::{FieldValue, Row, Table, TableName};

use super::error::QueryError;

/// A table row rendered as a JSON object keyed by column name.
pub type JsonRow = Map<String, Value>;

/// One stop visited by a route, joined from `stop_times` and `stops`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStop {
    pub stop_id: String,
    pub stop_name: FieldValue,
    pub arrival_time: FieldValue,
    pub departure_time: FieldValue,
    pub sequence: i64,
    pub lat: FieldValue,
    pub lon: FieldValue,
}

/// Return every row of a table as a JSON object.
///
/// The rows are copies; missing and non-finite values are rendered as `""`.
pub fn list_table(snapshot: &StoreSnapshot, name: TableName) -> Result<Vec<JsonRow>, QueryError> {
    let table = table(snapshot, name)?;
    Ok(table.rows().iter().map(|row| table.row_to_json(row)).collect())
}

/// Ordered stops of a route, with times and coordinates.
///
/// Only the first trip of the route (in `trips` row order) is used; other
/// trips of the same route, which may serve different stop patterns, are
/// ignored. Stops are ordered by `stop_sequence`, keeping row order for
/// equal sequence numbers.
///
/// Fails with [`QueryError::ReferentialIntegrity`] if any stop time of the
/// trip references a stop missing from `stops`, rather than returning a
/// shortened sequence.
pub fn stops_for_route(
    snapshot: &StoreSnapshot,
    route_id: &str,
) -> Result<Vec<RouteStop>, QueryError> {
    let trips = table(snapshot, TableName::Trips)?;
    let trip_route_col = column(trips, TableName::Trips, "route_id")?;
    let trip_id_col = column(trips, TableName::Trips, "trip_id")?;

    let trip = trips
        .rows()
        .iter()
        .find(|row| field(row, trip_route_col).matches_str(route_id))
        .ok_or_else(|| QueryError::RouteNotFound(route_id.to_string()))?;
    let trip_id = field(trip, trip_id_col).to_string();

    let visits = trip_visits(snapshot, &trip_id)?;

    let stops = table(snapshot, TableName::Stops)?;
    let stop_id_col = column(stops, TableName::Stops, "stop_id")?;
    let stop_name_col = column(stops, TableName::Stops, "stop_name")?;
    let stop_lat_col = column(stops, TableName::Stops, "stop_lat")?;
    let stop_lon_col = column(stops, TableName::Stops, "stop_lon")?;

    let mut stops_by_id: HashMap<String, &Row> = HashMap::new();
    for row in stops.rows() {
        stops_by_id
            .entry(field(row, stop_id_col).to_string())
            .or_insert(row);
    }

    visits
        .into_iter()
        .map(|visit| {
            let stop = stops_by_id.get(&visit.stop_id).ok_or_else(|| {
                QueryError::ReferentialIntegrity {
                    trip_id: trip_id.clone(),
                    stop_id: visit.stop_id.clone(),
                }
            })?;

            Ok(RouteStop {
                stop_name: field(stop, stop_name_col).clone(),
                lat: field(stop, stop_lat_col).clone(),
                lon: field(stop, stop_lon_col).clone(),
                stop_id: visit.stop_id,
                arrival_time: visit.arrival_time,
                departure_time: visit.departure_time,
                sequence: visit.sequence,
            })
        })
        .collect()
}

/// A stop time of the selected trip.
struct Visit {
    stop_id: String,
    arrival_time: FieldValue,
    departure_time: FieldValue,
    sequence: i64,
}

/// Stop times of one trip, stably sorted by `stop_sequence`.
fn trip_visits(snapshot: &StoreSnapshot, trip_id: &str) -> Result<Vec<Visit>, QueryError> {
    let stop_times = table(snapshot, TableName::StopTimes)?;
    let trip_col = column(stop_times, TableName::StopTimes, "trip_id")?;
    let stop_col = column(stop_times, TableName::StopTimes, "stop_id")?;
    let sequence_col = column(stop_times, TableName::StopTimes, "stop_sequence")?;
    let arrival_col = column(stop_times, TableName::StopTimes, "arrival_time")?;
    let departure_col = column(stop_times, TableName::StopTimes, "departure_time")?;

    let mut visits = stop_times
        .rows()
        .iter()
        .filter(|row| field(row, trip_col).matches_str(trip_id))
        .map(|row| {
            let raw_sequence = field(row, sequence_col);
            let sequence = raw_sequence
                .as_integer()
                .ok_or_else(|| QueryError::InvalidField {
                    table: TableName::StopTimes,
                    column: "stop_sequence",
                    value: raw_sequence.to_string(),
                })?;

            Ok(Visit {
                stop_id: field(row, stop_col).to_string(),
                arrival_time: field(row, arrival_col).clone(),
                departure_time: field(row, departure_col).clone(),
                sequence,
            })
        })
        .collect::<Result<Vec<_>, QueryError>>()?;

    // sort_by_key is stable: equal sequence numbers keep row order
    visits.sort_by_key(|visit| visit.sequence);
    Ok(visits)
}

fn table(snapshot: &StoreSnapshot, name: TableName) -> Result<&Table, QueryError> {
    snapshot
        .get(name)
        .map(|table| &**table)
        .ok_or(QueryError::TableNotFound(name))
}

fn column(table: &Table, name: TableName, column: &'static str) -> Result<usize, QueryError> {
    table
        .column_index(column)
        .ok_or(QueryError::MissingColumn {
            table: name,
            column,
        })
}

fn field(row: &Row, index: usize) -> &FieldValue {
    row.get(index).unwrap_or(&FieldValue::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_records(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|f| f.to_string()).collect())
                .collect(),
        )
    }

    fn trips(rows: &[&[&str]]) -> Table {
        table(&["trip_id", "route_id"], rows)
    }

    fn stop_times(rows: &[&[&str]]) -> Table {
        table(
            &[
                "trip_id",
                "arrival_time",
                "departure_time",
                "stop_id",
                "stop_sequence",
            ],
            rows,
        )
    }

    fn stops(rows: &[&[&str]]) -> Table {
        table(&["stop_id", "stop_name", "stop_lat", "stop_lon"], rows)
    }

    fn snapshot(trips: Table, stop_times: Table, stops: Table) -> StoreSnapshot {
        StoreSnapshot::from_tables([
            (TableName::Trips, trips),
            (TableName::StopTimes, stop_times),
            (TableName::Stops, stops),
        ])
    }

    fn standard_stops() -> Table {
        stops(&[
            &["S1", "Glavni kolodvor", "45.8046", "15.9785"],
            &["S2", "Trg bana Jelačića", "45.8131", "15.9772"],
            &["S3", "Kvaternikov trg", "45.8148", "16.0021"],
        ])
    }

    #[test]
    fn first_trip_only_ordered_by_sequence() {
        let snap = snapshot(
            trips(&[&["T1", "R1"], &["T2", "R1"]]),
            stop_times(&[
                &["T1", "08:05:00", "08:06:00", "S2", "2"],
                &["T1", "08:00:00", "08:00:00", "S1", "1"],
                &["T2", "09:00:00", "09:00:00", "S3", "1"],
            ]),
            standard_stops(),
        );

        let result = stops_for_route(&snap, "R1").unwrap();
        let ids: Vec<_> = result.iter().map(|s| s.stop_id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "S2"]);

        assert_eq!(result[0].sequence, 1);
        assert_eq!(result[0].stop_name, FieldValue::Text("Glavni kolodvor".into()));
        assert_eq!(result[0].arrival_time, FieldValue::Text("08:00:00".into()));
        assert_eq!(result[1].departure_time, FieldValue::Text("08:06:00".into()));
        assert_eq!(result[1].lat, FieldValue::Float(45.8131));
    }

    #[test]
    fn unknown_route_is_not_found() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[&["T1", "08:00:00", "08:00:00", "S1", "1"]]),
            standard_stops(),
        );

        assert_eq!(
            stops_for_route(&snap, "nonexistent"),
            Err(QueryError::RouteNotFound("nonexistent".into()))
        );
    }

    #[test]
    fn unknown_stop_fails_whole_call() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[
                &["T1", "08:00:00", "08:00:00", "S1", "1"],
                &["T1", "08:05:00", "08:05:00", "S404", "2"],
                &["T1", "08:10:00", "08:10:00", "S3", "3"],
            ]),
            standard_stops(),
        );

        assert_eq!(
            stops_for_route(&snap, "R1"),
            Err(QueryError::ReferentialIntegrity {
                trip_id: "T1".into(),
                stop_id: "S404".into(),
            })
        );
    }

    #[test]
    fn trip_without_stop_times_is_empty() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[&["T2", "08:00:00", "08:00:00", "S1", "1"]]),
            standard_stops(),
        );
        assert_eq!(stops_for_route(&snap, "R1"), Ok(vec![]));
    }

    #[test]
    fn sequence_sorts_numerically_across_gaps() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[
                &["T1", "08:20:00", "08:20:00", "S3", "10"],
                &["T1", "08:10:00", "08:10:00", "S2", "9"],
                &["T1", "08:00:00", "08:00:00", "S1", "1"],
            ]),
            standard_stops(),
        );

        let sequences: Vec<_> = stops_for_route(&snap, "R1")
            .unwrap()
            .iter()
            .map(|s| s.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 9, 10]);
    }

    #[test]
    fn times_past_midnight_are_kept_verbatim() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[&["T1", "24:35:00", "24:36:00", "S1", "1"]]),
            standard_stops(),
        );

        let result = stops_for_route(&snap, "R1").unwrap();
        assert_eq!(result[0].arrival_time, FieldValue::Text("24:35:00".into()));
    }

    #[test]
    fn non_integer_sequence_is_invalid_field() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[&["T1", "08:00:00", "08:00:00", "S1", "first"]]),
            standard_stops(),
        );

        assert!(matches!(
            stops_for_route(&snap, "R1"),
            Err(QueryError::InvalidField {
                column: "stop_sequence",
                ..
            })
        ));
    }

    #[test]
    fn missing_tables_and_columns() {
        let snap = StoreSnapshot::from_tables([(TableName::Trips, trips(&[&["T1", "R1"]]))]);
        assert_eq!(
            stops_for_route(&snap, "R1"),
            Err(QueryError::TableNotFound(TableName::StopTimes))
        );

        let snap = StoreSnapshot::from_tables([(
            TableName::Trips,
            table(&["trip_id"], &[&["T1"]]),
        )]);
        assert_eq!(
            stops_for_route(&snap, "R1"),
            Err(QueryError::MissingColumn {
                table: TableName::Trips,
                column: "route_id",
            })
        );

        assert_eq!(
            stops_for_route(&StoreSnapshot::default(), "R1"),
            Err(QueryError::TableNotFound(TableName::Trips))
        );
    }

    #[test]
    fn missing_coordinates_serialize_as_empty() {
        let snap = snapshot(
            trips(&[&["T1", "R1"]]),
            stop_times(&[&["T1", "", "08:00:00", "S1", "1"]]),
            stops(&[&["S1", "Trg", "", "inf"]]),
        );

        let result = stops_for_route(&snap, "R1").unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json[0]["lat"], Value::String(String::new()));
        assert_eq!(json[0]["lon"], Value::String(String::new()));
        assert_eq!(json[0]["arrival_time"], Value::String(String::new()));
        assert_eq!(json[0]["sequence"], Value::from(1));
        assert_eq!(json[0]["stop_id"], Value::String("S1".into()));
    }

    #[test]
    fn list_table_copies_rows() {
        let snap = StoreSnapshot::from_tables([(
            TableName::Routes,
            table(
                &["route_id", "route_short_name", "route_color"],
                &[&["R1", "6", ""], &["R2", "11", "FF0000"]],
            ),
        )]);

        let rows = list_table(&snap, TableName::Routes).unwrap();
        assert_eq!(rows.len(), 2);
        for row in &rows {
            let mut keys: Vec<_> = row.keys().cloned().collect();
            keys.sort();
            assert_eq!(keys, vec!["route_color", "route_id", "route_short_name"]);
        }
        assert_eq!(rows[0]["route_color"], Value::String(String::new()));
        assert_eq!(rows[1]["route_short_name"], Value::from(11));
    }

    #[test]
    fn list_missing_table_is_not_found() {
        assert_eq!(
            list_table(&StoreSnapshot::default(), TableName::Stops),
            Err(QueryError::TableNotFound(TableName::Stops))
        );
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Snapshot with one trip whose stop times carry the given sequence
    /// numbers; each row's arrival time records its original row index.
    fn snapshot_with_sequences(sequences: &[i64]) -> StoreSnapshot {
        let trips = Table::from_records(
            vec!["trip_id".into(), "route_id".into()],
            vec![vec!["T1".into(), "R1".into()]],
        );
        let stop_times = Table::from_records(
            vec![
                "trip_id".into(),
                "arrival_time".into(),
                "departure_time".into(),
                "stop_id".into(),
                "stop_sequence".into(),
            ],
            sequences
                .iter()
                .enumerate()
                .map(|(i, seq)| {
                    vec![
                        "T1".into(),
                        format!("row{i}"),
                        format!("row{i}"),
                        "S1".into(),
                        seq.to_string(),
                    ]
                })
                .collect(),
        );
        let stops = Table::from_records(
            vec![
                "stop_id".into(),
                "stop_name".into(),
                "stop_lat".into(),
                "stop_lon".into(),
            ],
            vec![vec!["S1".into(), "Trg".into(), "45.8".into(), "15.9".into()]],
        );
        StoreSnapshot::from_tables([
            (TableName::Trips, trips),
            (TableName::StopTimes, stop_times),
            (TableName::Stops, stops),
        ])
    }

    fn row_index(stop: &RouteStop) -> usize {
        match &stop.arrival_time {
            FieldValue::Text(s) => s.trim_start_matches("row").parse().unwrap(),
            other => panic!("unexpected arrival time {other:?}"),
        }
    }

    proptest! {
        /// Output is sorted by sequence, and equal sequences keep row order
        #[test]
        fn sorted_and_stable(sequences in prop::collection::vec(0i64..8, 0..40)) {
            let snap = snapshot_with_sequences(&sequences);
            let result = stops_for_route(&snap, "R1").unwrap();

            prop_assert_eq!(result.len(), sequences.len());
            for pair in result.windows(2) {
                prop_assert!(pair[0].sequence <= pair[1].sequence);
                if pair[0].sequence == pair[1].sequence {
                    prop_assert!(row_index(&pair[0]) < row_index(&pair[1]));
                }
            }
        }

        /// Every stop time of the trip appears exactly once
        #[test]
        fn no_rows_lost(sequences in prop::collection::vec(-100i64..100, 0..40)) {
            let snap = snapshot_with_sequences(&sequences);
            let result = stops_for_route(&snap, "R1").unwrap();

            let mut indices: Vec<usize> = result.iter().map(row_index).collect();
            indices.sort();
            prop_assert_eq!(indices, (0..sequences.len()).collect::<Vec<_>>());
        }
    }
}
