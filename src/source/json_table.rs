//! [`Table`] implementation over JSON text.
//!
//! Records are read as a stream of concatenated JSON values, which covers
//! line-delimited files. When the first non-whitespace byte opens an array
//! the document is treated as array-wrapped: its elements are the records,
//! decoded one at a time, and anything after the closing bracket is ignored.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Mutex;
use std::thread;

use recql_core::{QueryError, QueryResult, Row, RowIterator, Table};
use serde::de::{self, SeqAccess, Visitor};
use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer, Value};

use super::{Input, RecordFormat};

type BoxedReader = Box<dyn Read + Send>;
type ValueStream = StreamDeserializer<'static, IoRead<BufReader<BoxedReader>>, Value>;
type Element = Result<Value, serde_json::Error>;

/// Decoded array elements buffered ahead of the consumer.
const ELEMENT_BUFFER: usize = 64;

/// A named table backed by a file, standard input or an inline literal.
///
/// Files and inline literals can be iterated any number of times, each
/// iteration opening an independent reader. Standard input is consumed by
/// the first iteration; later ones fail with a source error.
pub struct JsonTable {
    name: String,
    input: Input,
    stream: Mutex<Option<BoxedReader>>,
}

impl JsonTable {
    pub fn new(name: impl Into<String>, input: Input) -> Self {
        let stream = match input {
            Input::Stdin => Some(Box::new(io::stdin()) as BoxedReader),
            _ => None,
        };
        Self {
            name: name.into(),
            input,
            stream: Mutex::new(stream),
        }
    }

    /// Single-use table over any reader, read the same way as standard input.
    pub fn from_reader(name: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Self {
            name: name.into(),
            input: Input::Stdin,
            stream: Mutex::new(Some(Box::new(reader))),
        }
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    /// Open a new scan. Unlike [`Table::iterate`] the concrete iterator is
    /// returned, so callers can ask which layout the input had.
    pub fn scan(&self) -> QueryResult<JsonRowIterator> {
        let reader = self.open()?;
        tracing::debug!(table = %self.name, input = %self.input, "opened record source");
        Ok(JsonRowIterator::new(self.input.to_string(), reader))
    }

    fn open(&self) -> QueryResult<BoxedReader> {
        match &self.input {
            Input::File(path) => {
                let file = File::open(path).map_err(|e| {
                    QueryError::Source(format!("failed to open {}: {}", path.display(), e))
                })?;
                Ok(Box::new(file))
            }
            Input::Inline(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
            Input::Stdin => {
                let mut slot = self
                    .stream
                    .lock()
                    .map_err(|_| QueryError::Source("input stream lock poisoned".to_string()))?;
                slot.take().ok_or_else(|| {
                    QueryError::Source(format!(
                        "{} was already consumed by an earlier scan of '{}'",
                        self.input, self.name
                    ))
                })
            }
        }
    }
}

impl Table for JsonTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn iterate(&self) -> QueryResult<Box<dyn RowIterator>> {
        Ok(Box::new(self.scan()?))
    }
}

enum Records {
    /// Not read yet; the layout is decided by the first byte.
    Pending(BufReader<BoxedReader>),
    /// Concatenated or line-delimited values.
    Stream(ValueStream),
    /// Elements of an array-wrapped document, decoded on a reader thread.
    Elements(Receiver<Element>),
    Done,
}

/// Pull iterator decoding one record per `next`.
pub struct JsonRowIterator {
    label: String,
    records: Records,
    array_wrapped: bool,
    decoded: usize,
    current: Option<Row>,
    error: Option<QueryError>,
}

impl JsonRowIterator {
    pub fn new(label: impl Into<String>, reader: BoxedReader) -> Self {
        Self {
            label: label.into(),
            records: Records::Pending(BufReader::new(reader)),
            array_wrapped: false,
            decoded: 0,
            current: None,
            error: None,
        }
    }

    /// Records decoded so far.
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Layout of the input as seen so far: an array-wrapped document or a
    /// single value is JSON, several top-level values are JSONL.
    pub fn format(&self) -> RecordFormat {
        if self.array_wrapped || self.decoded <= 1 {
            RecordFormat::Json
        } else {
            RecordFormat::Jsonl
        }
    }

    fn fail(&mut self, message: fmt::Arguments<'_>) {
        self.error = Some(QueryError::Source(format!("{}: {}", self.label, message)));
        self.records = Records::Done;
    }

    fn start(&mut self, mut reader: BufReader<BoxedReader>) {
        match first_byte(&mut reader) {
            Ok(Some(b'[')) => match spawn_element_reader(reader) {
                Ok(elements) => {
                    tracing::debug!(source = %self.label, "array-wrapped input");
                    self.array_wrapped = true;
                    self.records = Records::Elements(elements);
                }
                Err(err) => self.fail(format_args!("failed to start reader thread: {}", err)),
            },
            Ok(Some(_)) => {
                self.records =
                    Records::Stream(Deserializer::from_reader(reader).into_iter::<Value>());
            }
            Ok(None) => self.records = Records::Done,
            Err(err) => self.fail(format_args!("failed to read: {}", err)),
        }
    }

    fn pull(&mut self) -> Option<Value> {
        if let Records::Pending(_) = self.records {
            if let Records::Pending(reader) = std::mem::replace(&mut self.records, Records::Done) {
                self.start(reader);
            }
        }

        let decoded = match &mut self.records {
            Records::Stream(stream) => stream.next(),
            Records::Elements(elements) => elements.recv().ok(),
            Records::Pending(_) | Records::Done => return None,
        };

        match decoded {
            Some(Ok(value)) => {
                self.decoded += 1;
                Some(value)
            }
            Some(Err(err)) => {
                let record = self.decoded + 1;
                self.fail(format_args!("failed to decode record {}: {}", record, err));
                None
            }
            None => {
                self.records = Records::Done;
                None
            }
        }
    }
}

impl RowIterator for JsonRowIterator {
    fn next(&mut self) -> bool {
        self.current = self.pull().map(Row::new);
        self.current.is_some()
    }

    fn row(&self) -> Option<&Row> {
        self.current.as_ref()
    }

    fn error(&self) -> Option<&QueryError> {
        self.error.as_ref()
    }

    fn close(&mut self) -> QueryResult<()> {
        // Dropping the receiver stops the element reader at its next send
        self.records = Records::Done;
        self.current = None;
        Ok(())
    }
}

/// Skip leading whitespace and return the first byte without consuming it.
fn first_byte(reader: &mut BufReader<BoxedReader>) -> io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(index) => {
                let byte = buf[index];
                reader.consume(index);
                return Ok(Some(byte));
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

fn spawn_element_reader(reader: BufReader<BoxedReader>) -> io::Result<Receiver<Element>> {
    let (tx, rx) = mpsc::sync_channel(ELEMENT_BUFFER);
    thread::Builder::new()
        .name("recql-array-reader".to_string())
        .spawn(move || {
            let mut deserializer = Deserializer::from_reader(reader);
            let sent =
                serde::Deserializer::deserialize_seq(&mut deserializer, ElementSender { tx: &tx });
            if let Err(err) = sent {
                // Fails again if the consumer is gone, which ends the thread
                let _ = tx.send(Err(err));
            }
        })?;
    Ok(rx)
}

/// Forwards each array element to the consumer as soon as it is decoded.
struct ElementSender<'a> {
    tx: &'a SyncSender<Element>,
}

impl<'de> Visitor<'de> for ElementSender<'_> {
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(element) = seq.next_element::<Value>()? {
            if self.tx.send(Ok(element)).is_err() {
                return Err(de::Error::custom("record consumer closed"));
            }
        }
        Ok(())
    }
}
