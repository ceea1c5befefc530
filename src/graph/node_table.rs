use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::graph::error::Error;
use crate::graph::events::{Event, EventKind};

/// One row of the node table, in the committed column order. The same type
/// writes the table in `nodegen` and reads it back in `linkgen`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "NodeId")]
    pub node_id: i64,
    #[serde(rename = "RouteId")]
    pub route_id: i64,
    #[serde(rename = "RouteNo")]
    pub route_no: String,
    #[serde(rename = "RouteVarId")]
    pub variant_id: i64,
    #[serde(rename = "TripId")]
    pub trip_id: i64,
    #[serde(rename = "StopId")]
    pub stop_id: i64,
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
    #[serde(rename = "Event")]
    pub event: EventKind,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "StopName")]
    pub stop_name: String,
    /// Packed `[route_id, stop_id, timestamp, event_kind]` JSON array.
    #[serde(rename = "Attributes")]
    pub attributes: String,
}

impl From<&Event> for NodeRecord {
    fn from(event: &Event) -> NodeRecord {
        NodeRecord {
            node_id: event.node_id,
            route_id: event.route_id,
            route_no: event.route_no.clone(),
            variant_id: event.variant_id,
            trip_id: event.trip_id,
            stop_id: event.stop_id,
            timestamp: event.timestamp,
            event: event.kind,
            time: time_string(event.timestamp),
            stop_name: event.stop_name.clone(),
            attributes: serde_json::json!([
                event.route_id,
                event.stop_id,
                event.timestamp,
                event.kind.as_str()
            ])
            .to_string(),
        }
    }
}

/// Render seconds since midnight as `HH:MM:SS`, with a `+Nd` suffix for
/// timestamps that spill past midnight.
pub fn time_string(timestamp: i64) -> String {
    let days = timestamp.div_euclid(86_400);
    let rem = timestamp.rem_euclid(86_400);
    let (hours, minutes, seconds) = (rem / 3600, rem % 3600 / 60, rem % 60);
    if days > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}+{days}d")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

pub fn write_nodes<W: Write>(events: &[Event], writer: W) -> Result<(), Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // written up front so an empty run still produces a valid table
    writer.write_record([
        "NodeId", "RouteId", "RouteNo", "RouteVarId", "TripId", "StopId", "Timestamp", "Event",
        "Time", "StopName", "Attributes",
    ])?;
    for event in events {
        writer.serialize(NodeRecord::from(event))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_nodes_to_path<P: AsRef<Path>>(events: &[Event], path: P) -> Result<(), Error> {
    let file = std::fs::File::create(path)?;
    write_nodes(events, std::io::BufWriter::new(file))
}

pub fn read_nodes<R: Read>(reader: R) -> Result<Vec<NodeRecord>, Error> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut nodes = Vec::new();
    for record in reader.deserialize() {
        nodes.push(record?);
    }
    Ok(nodes)
}

pub fn read_nodes_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<NodeRecord>, Error> {
    let file = std::fs::File::open(path)?;
    read_nodes(std::io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        Event {
            node_id: 1,
            route_id: 3,
            route_no: "03".to_string(),
            variant_id: 5,
            trip_id: 7,
            stop_id: 100,
            stop_name: "Ben Thanh".to_string(),
            timestamp: 25_200,
            kind: EventKind::Departure,
        }
    }

    #[test]
    fn test_time_string() {
        assert_eq!(time_string(0), "00:00:00");
        assert_eq!(time_string(25_200), "07:00:00");
        assert_eq!(time_string(86_399), "23:59:59");
        assert_eq!(time_string(86_400), "00:00:00+1d");
        assert_eq!(time_string(88_170), "00:29:30+1d");
    }

    #[test]
    fn test_header_and_row() {
        let mut buffer = Vec::new();
        write_nodes(&[sample_event()], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "NodeId,RouteId,RouteNo,RouteVarId,TripId,StopId,Timestamp,Event,Time,StopName,Attributes"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("1,3,03,5,7,100,25200,DEPARTURE,07:00:00,Ben Thanh,"));
        assert!(row.contains(r#"[3,100,25200,""DEPARTURE""]"#));
    }

    #[test]
    fn test_write_read_round_trip() {
        let events = vec![
            sample_event(),
            Event {
                node_id: 2,
                timestamp: 25_470,
                kind: EventKind::Arrival,
                stop_id: 101,
                stop_name: "Cho Lon".to_string(),
                ..sample_event()
            },
        ];
        let mut buffer = Vec::new();
        write_nodes(&events, &mut buffer).unwrap();
        let nodes = read_nodes(buffer.as_slice()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_id, 1);
        assert_eq!(nodes[0].event, EventKind::Departure);
        assert_eq!(nodes[1].event, EventKind::Arrival);
        assert_eq!(nodes[1].timestamp, 25_470);
        assert_eq!(nodes[1].stop_name, "Cho Lon");
    }
}
