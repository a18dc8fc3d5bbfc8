//! Streaming JSON report parser.
//!
//! The report is decoded straight from the reader one section at a time; the
//! raw text is never buffered whole. Each finished section is announced as a
//! [`ParseProgress`] event to whoever is observing the parse.

use std::fmt;
use std::io::{BufReader, Read};

use serde::de::{self, DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use tracing::info;

use crate::domain::results::{PrivateAccess, Results, Trace, Vulnerability};
use crate::error::Result;

const VULNERABILITIES: &str = "vulnerability_warning";
const PRIVATE_ACCESSES: &str = "private_access";
const TRACES: &str = "traces";
const ENVELOPE: &str = "soaap";

/// A milestone reached while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProgress {
    Vulnerabilities(usize),
    PrivateAccesses(usize),
    Traces(usize),
}

impl fmt::Display for ParseProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseProgress::Vulnerabilities(n) => write!(f, "parsed {} vulnerability warnings", n),
            ParseProgress::PrivateAccesses(n) => write!(f, "parsed {} private accesses", n),
            ParseProgress::Traces(n) => write!(f, "parsed {} call traces", n),
        }
    }
}

/// Parse a report, reporting each section as it completes.
///
/// Missing sections yield empty sequences. Any malformed record fails the
/// whole parse; no partial results are returned.
pub fn parse_report<R, F>(reader: R, mut progress: F) -> Result<Results>
where
    R: Read,
    F: FnMut(ParseProgress),
{
    let mut de = serde_json::Deserializer::from_reader(BufReader::new(reader));
    let mut sections = Sections::default();
    ReportSeed {
        sections: &mut sections,
        progress: &mut progress,
    }
    .deserialize(&mut de)?;
    de.end()?;
    Ok(sections.into_results())
}

/// Parse a report and collect the progress events alongside the results.
pub fn parse_report_with_events<R: Read>(reader: R) -> Result<(Results, Vec<ParseProgress>)> {
    let mut events = Vec::new();
    let results = parse_report(reader, |p| events.push(p))?;
    Ok((results, events))
}

/// Parse a report, logging progress.
pub fn parse_report_logged<R: Read>(reader: R) -> Result<Results> {
    parse_report(reader, |p| info!("[Parse] {}", p))
}

#[derive(Default)]
struct Sections {
    vulnerabilities: Option<Vec<Vulnerability>>,
    private_accesses: Option<Vec<PrivateAccess>>,
    traces: Option<Vec<Trace>>,
}

impl Sections {
    fn into_results(self) -> Results {
        Results {
            vulnerabilities: self.vulnerabilities.unwrap_or_default(),
            private_accesses: self.private_accesses.unwrap_or_default(),
            traces: self.traces.unwrap_or_default(),
        }
    }
}

/// Walks one JSON object, filling `sections`. Recurses once into the
/// optional `"soaap"` envelope.
struct ReportSeed<'a, F> {
    sections: &'a mut Sections,
    progress: &'a mut F,
}

impl<'de, 'a, F> DeserializeSeed<'de> for ReportSeed<'a, F>
where
    F: FnMut(ParseProgress),
{
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> std::result::Result<(), D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de, 'a, F> Visitor<'de> for ReportSeed<'a, F>
where
    F: FnMut(ParseProgress),
{
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an analysis report object")
    }

    fn visit_map<A>(mut self, mut map: A) -> std::result::Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                ENVELOPE => map.next_value_seed(ReportSeed {
                    sections: &mut *self.sections,
                    progress: &mut *self.progress,
                })?,
                VULNERABILITIES => {
                    let items: Vec<Vulnerability> =
                        take_section(&mut map, &self.sections.vulnerabilities, VULNERABILITIES)?;
                    (self.progress)(ParseProgress::Vulnerabilities(items.len()));
                    self.sections.vulnerabilities = Some(items);
                }
                PRIVATE_ACCESSES => {
                    let items: Vec<PrivateAccess> =
                        take_section(&mut map, &self.sections.private_accesses, PRIVATE_ACCESSES)?;
                    (self.progress)(ParseProgress::PrivateAccesses(items.len()));
                    self.sections.private_accesses = Some(items);
                }
                TRACES => {
                    let items: Vec<Trace> =
                        take_section(&mut map, &self.sections.traces, TRACES)?;
                    (self.progress)(ParseProgress::Traces(items.len()));
                    self.sections.traces = Some(items);
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(())
    }
}

fn take_section<'de, A, T>(
    map: &mut A,
    existing: &Option<Vec<T>>,
    name: &'static str,
) -> std::result::Result<Vec<T>, A::Error>
where
    A: MapAccess<'de>,
    T: serde::Deserialize<'de>,
{
    if existing.is_some() {
        return Err(de::Error::duplicate_field(name));
    }
    map.next_value()
}
