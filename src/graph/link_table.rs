use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::graph::error::Error;

/// Rows buffered before each append to the output file. Keeps resident
/// memory independent of the total link count.
const CHUNK_ROWS: usize = 50_000;

/// The four legal transitions between events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    #[serde(rename = "bus")]
    Bus,
    #[serde(rename = "wait")]
    Wait,
    #[serde(rename = "transfer")]
    Transfer,
    #[serde(rename = "walk")]
    Walk,
}

impl LinkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkMode::Bus => "bus",
            LinkMode::Wait => "wait",
            LinkMode::Transfer => "transfer",
            LinkMode::Walk => "walk",
        }
    }
}

/// One row of the link table CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub link_id: i64,
    pub from_node: i64,
    pub to_node: i64,
    pub duration: i64,
    pub mode: LinkMode,
}

/// Chunked link writer shared by all four builders.
///
/// Link ids are assigned sequentially across the writer's whole lifetime, so
/// running the builders one after another against the same writer yields one
/// dense id sequence and a single concatenated file.
pub struct LinkWriter<W: Write> {
    writer: csv::Writer<W>,
    buffer: Vec<LinkRecord>,
    next_id: i64,
}

impl<W: Write> LinkWriter<W> {
    /// Wrap `inner` and write the header row immediately, so even an empty
    /// run produces a valid table.
    pub fn new(inner: W) -> Result<LinkWriter<W>, Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(["link_id", "from_node", "to_node", "duration", "mode"])?;
        Ok(LinkWriter {
            writer,
            buffer: Vec::with_capacity(CHUNK_ROWS),
            next_id: 1,
        })
    }

    /// Append a link, assigning it the next id.
    pub fn push(
        &mut self,
        from_node: i64,
        to_node: i64,
        duration: i64,
        mode: LinkMode,
    ) -> Result<(), Error> {
        self.buffer.push(LinkRecord {
            link_id: self.next_id,
            from_node,
            to_node,
            duration,
            mode,
        });
        self.next_id += 1;
        if self.buffer.len() >= CHUNK_ROWS {
            self.flush_chunk()?;
        }
        Ok(())
    }

    pub fn links_written(&self) -> i64 {
        self.next_id - 1
    }

    fn flush_chunk(&mut self) -> Result<(), Error> {
        for record in self.buffer.drain(..) {
            self.writer.serialize(record)?;
        }
        Ok(())
    }

    /// Flush everything and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W, Error> {
        self.flush_chunk()?;
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| Error::Error(e.to_string()))
    }
}
