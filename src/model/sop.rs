//! Document-level types.

use super::StepRecord;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// A complete SOP record: metadata plus ordered steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sop {
    /// Opaque identifier assigned by the document store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Title block metadata
    pub metadata: SopMetadata,

    /// Steps in document order
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

impl Sop {
    /// Create a new SOP with the given title and no steps.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            metadata: SopMetadata::new(title),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    pub fn add_step(&mut self, step: StepRecord) {
        self.steps.push(step);
    }

    /// Builder-style variant of [`add_step`](Self::add_step).
    pub fn with_step(mut self, step: StepRecord) -> Self {
        self.steps.push(step);
        self
    }

    /// Get the number of steps (before normalization).
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Number of steps that carry an image reference.
    pub fn image_count(&self) -> usize {
        self.steps.iter().filter(|s| s.image.is_some()).count()
    }
}

/// SOP metadata shown in the title block of every page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SopMetadata {
    /// Document title (required)
    #[serde(default)]
    pub title: String,

    /// Author name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Owning department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// Approver name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver: Option<String>,

    /// Creation date
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_date: Option<NaiveDate>,

    /// Approval date
    #[serde(
        default,
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub approval_date: Option<NaiveDate>,

    /// Document version
    #[serde(default = "default_version")]
    pub version: String,
}

/// Read an optional date, treating blank or unparseable values as absent.
///
/// Document stores write dates as `YYYY-MM-DD`, as RFC 3339 timestamps or
/// as empty strings; none of these should reject the whole document.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        });
    if parsed.is_none() {
        log::warn!("ignoring unrecognised date '{}'", raw);
    }
    parsed
}

fn default_version() -> String {
    "1.0".to_string()
}

impl SopMetadata {
    /// Create metadata with a title and the default version.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Set the approver.
    pub fn with_approver(mut self, approver: impl Into<String>) -> Self {
        self.approver = Some(approver.into());
        self
    }

    /// Set the creation date.
    pub fn with_created_date(mut self, date: NaiveDate) -> Self {
        self.created_date = Some(date);
        self
    }

    /// Set the approval date.
    pub fn with_approval_date(mut self, date: NaiveDate) -> Self {
        self.approval_date = Some(date);
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Whether the title is present and not just whitespace.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Label/value pairs for the metadata grid, in display order.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Author", self.author.clone().unwrap_or_default()),
            ("Department", self.department.clone().unwrap_or_default()),
            ("Approved by", self.approver.clone().unwrap_or_default()),
            ("Created", format_date(self.created_date)),
            ("Approved on", format_date(self.approval_date)),
            ("Version", self.version.clone()),
        ]
    }
}

impl Default for SopMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: None,
            department: None,
            approver: None,
            created_date: None,
            approval_date: None,
            version: default_version(),
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_default()
}
