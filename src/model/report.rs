use crate::insight::InsightValue;
use crate::model::record::NormalizedRecord;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Source name used for the batch-level "nothing found" record
pub const GENERAL_SOURCE: &str = "General";

/// Per-request report: records grouped by source plus derived insights
///
/// Sources keep the order in which they were first written.
#[derive(Debug, Clone, Default)]
pub struct AggregatedReport {
    sources: Vec<(String, Vec<NormalizedRecord>)>,
    insights: BTreeMap<String, InsightValue>,
}

impl AggregatedReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends records under a source, creating the key if needed
    ///
    /// An empty `records` still creates the key.
    pub(crate) fn push(&mut self, source: &str, records: Vec<NormalizedRecord>) {
        match self.sources.iter_mut().find(|(name, _)| name == source) {
            Some((_, existing)) => existing.extend(records),
            None => self.sources.push((source.to_string(), records)),
        }
    }

    pub(crate) fn set_insight(&mut self, key: &str, value: InsightValue) {
        self.insights.insert(key.to_string(), value);
    }

    /// Merges derived insights into the report
    pub(crate) fn extend_insights(&mut self, insights: BTreeMap<String, InsightValue>) {
        self.insights.extend(insights);
    }

    /// Reorders sources with a stable sort
    pub(crate) fn sort_sources_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&(String, Vec<NormalizedRecord>), &(String, Vec<NormalizedRecord>)) -> Ordering,
    {
        self.sources.sort_by(|a, b| compare(a, b));
    }

    /// Adds the batch-level "nothing found" record when no source wrote anything
    pub(crate) fn ensure_not_empty(&mut self, message: &str) {
        if self.total_records() == 0 {
            self.sources.clear();
            self.push(
                GENERAL_SOURCE,
                vec![NormalizedRecord::no_results(GENERAL_SOURCE, message)],
            );
        }
    }

    /// Records written under a source
    pub fn get(&self, source: &str) -> Option<&[NormalizedRecord]> {
        self.sources
            .iter()
            .find(|(name, _)| name == source)
            .map(|(_, records)| records.as_slice())
    }

    /// Source names in report order
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(name, _)| name.as_str())
    }

    /// Number of sources in the report
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// All records across sources, in report order
    pub fn records(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.sources.iter().flat_map(|(_, records)| records.iter())
    }

    pub fn total_records(&self) -> usize {
        self.sources.iter().map(|(_, records)| records.len()).sum()
    }

    pub fn insights(&self) -> &BTreeMap<String, InsightValue> {
        &self.insights
    }

    pub fn insight(&self, key: &str) -> Option<&InsightValue> {
        self.insights.get(key)
    }
}

/// Order-preserving view over the source list for serialization
struct SourceMap<'a>(&'a [(String, Vec<NormalizedRecord>)]);

impl Serialize for SourceMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, records) in self.0 {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

impl Serialize for AggregatedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("sources", &SourceMap(&self.sources))?;
        map.serialize_entry("insights", &self.insights)?;
        map.end()
    }
}
