//! Multi-source profile reconciliation.
//!
//! Pure and synchronous: takes the settled provider payloads and produces one
//! [`CanonicalProfile`], or [`Reconciliation::NotFound`] when no provider has
//! a record for the subject. No I/O and no logging happen here.

use chrono::{DateTime, FixedOffset, Local, Offset, SecondsFormat, Utc};
use serde_json::Value;

use crate::models::{
    CanonicalProfile, FieldValue, MediaLinks, ProvenanceMetadata, Sentinel,
};
use crate::precedence::{Candidate, Fallback, Rule, PRESENCE_MARKERS, PROFILE_FIELDS};

/// Schema version reported in `metadata.apiVersion`.
pub const API_VERSION: &str = "2.0";

/// Display format for converted epoch timestamps, e.g. `Jan 5, 2023, 14:32`.
pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %H:%M";

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Found(Box<CanonicalProfile>),
    /// Neither provider reported a record for the subject.
    NotFound,
}

impl Reconciliation {
    pub fn into_profile(self) -> Option<CanonicalProfile> {
        match self {
            Reconciliation::Found(profile) => Some(*profile),
            Reconciliation::NotFound => None,
        }
    }
}

/// Merges provider payloads using the precedence table.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    display_offset: FixedOffset,
}

impl Reconciler {
    /// Creates a reconciler that renders epoch timestamps at `display_offset`.
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    /// Uses the host's current UTC offset for epoch timestamps.
    pub fn with_local_offset() -> Self {
        Self::new(Local::now().offset().fix())
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Reconciles `sources` (primary first) for `subject_id`, stamping the
    /// profile with the current time.
    pub fn reconcile(
        &self,
        subject_id: &str,
        region: &str,
        sources: &[Value],
        media: MediaLinks,
    ) -> Reconciliation {
        self.reconcile_at(subject_id, region, sources, media, Utc::now())
    }

    /// Same as [`Reconciler::reconcile`] with an explicit generation time.
    pub fn reconcile_at(
        &self,
        subject_id: &str,
        region: &str,
        sources: &[Value],
        media: MediaLinks,
        fetched_at: DateTime<Utc>,
    ) -> Reconciliation {
        if !has_record(sources) {
            return Reconciliation::NotFound;
        }

        Reconciliation::Found(Box::new(
            self.build_profile(subject_id, region, sources, media, fetched_at),
        ))
    }

    /// Builds a profile without the presence check. Every table field is
    /// filled, with placeholders where nothing usable exists.
    pub fn build_profile(
        &self,
        subject_id: &str,
        region: &str,
        sources: &[Value],
        media: MediaLinks,
        fetched_at: DateTime<Utc>,
    ) -> CanonicalProfile {
        let metadata = ProvenanceMetadata {
            fetched_at: fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            api_version: API_VERSION.to_string(),
        };
        let mut profile = CanonicalProfile::empty(media, metadata);

        for field in PROFILE_FIELDS {
            let value = self.resolve(&field.rule, subject_id, region, sources);
            profile
                .section_mut(field.section)
                .insert(field.name.to_string(), value);
        }

        profile
    }

    /// Resolves a single rule against the payloads.
    pub fn resolve(
        &self,
        rule: &Rule,
        subject_id: &str,
        region: &str,
        sources: &[Value],
    ) -> FieldValue {
        match rule {
            Rule::SubjectId => FieldValue::text(subject_id),
            Rule::FirstOf(candidates, fallback) => candidates
                .iter()
                .find_map(|c| lookup(sources, c).and_then(FieldValue::from_json))
                .unwrap_or_else(|| fallback_value(*fallback, region)),
            Rule::Timestamp { readable, epoch } => readable
                .and_then(|c| lookup(sources, &c).and_then(FieldValue::from_json))
                .or_else(|| {
                    lookup(sources, epoch)
                        .and_then(epoch_seconds)
                        .and_then(|secs| self.format_epoch(secs))
                        .map(FieldValue::Text)
                })
                .unwrap_or_else(|| FieldValue::placeholder(Sentinel::Dash)),
            Rule::Joined(candidate) => lookup(sources, candidate)
                .and_then(join_identifiers)
                .map(FieldValue::Text)
                .unwrap_or_else(|| FieldValue::placeholder(Sentinel::Dash)),
        }
    }

    /// Formats epoch seconds in the display offset. `None` when out of range.
    pub fn format_epoch(&self, secs: i64) -> Option<String> {
        let utc = DateTime::from_timestamp(secs, 0)?;
        Some(
            utc.with_timezone(&self.display_offset)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
        )
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::with_local_offset()
    }
}

/// Follows `candidate.path` into its source payload.
///
/// Total: a missing source, a missing key, or a non-object along the way all
/// yield `None`. A JSON null at the end of the path also yields `None`.
pub fn lookup<'a>(sources: &'a [Value], candidate: &Candidate) -> Option<&'a Value> {
    let mut current = sources.get(candidate.source)?;
    for segment in candidate.path {
        current = current.as_object()?.get(*segment)?;
    }
    (!current.is_null()).then_some(current)
}

/// True when at least one provider carries its presence marker.
pub fn has_record(sources: &[Value]) -> bool {
    PRESENCE_MARKERS
        .iter()
        .any(|marker| lookup(sources, marker).is_some_and(is_present))
}

/// Lowercases the caller's region for provider URLs, substituting
/// `default_region` when it is missing or blank.
pub fn normalize_region(region: Option<&str>, default_region: &str) -> String {
    region
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(default_region)
        .to_lowercase()
}

/// A marker counts only when truthy: null, `false`, zero and `""` do not.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn fallback_value(fallback: Fallback, region: &str) -> FieldValue {
    match fallback {
        Fallback::Placeholder(sentinel) => FieldValue::placeholder(sentinel),
        Fallback::CallerRegion => {
            let region = region.trim();
            if region.is_empty() {
                FieldValue::placeholder(Sentinel::Dash)
            } else {
                FieldValue::text(region.to_uppercase())
            }
        }
    }
}

/// Accepts epoch seconds as a JSON number or a numeric string. Zero and
/// negative values are not timestamps.
fn epoch_seconds(value: &Value) -> Option<i64> {
    let secs = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (secs > 0).then_some(secs)
}

fn join_identifiers(value: &Value) -> Option<String> {
    let items: Vec<String> = value
        .as_array()?
        .iter()
        .filter_map(FieldValue::from_json)
        .map(|v| v.to_string())
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}
