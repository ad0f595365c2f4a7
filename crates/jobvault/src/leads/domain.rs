use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the storage layer. Hosted tables hand out either
/// integer or UUID keys, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl<'de> Deserialize<'de> for LeadId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(value) => LeadId(value),
            RawId::Number(value) => LeadId(value.to_string()),
        })
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LeadId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Review state of a lead. `Pending` and `New` are both "not yet handled";
/// different form generations wrote one or the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Pending,
    New,
    Processed,
}

impl LeadStatus {
    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::New => "new",
            LeadStatus::Processed => "processed",
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, LeadStatus::Pending | LeadStatus::New)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LeadStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "new" => Ok(Self::New),
            "processed" => Ok(Self::Processed),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn label(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DeviceType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            other => Err(UnknownVariant {
                kind: "device",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Payload posted by the lead-capture forms.
///
/// The hero, get-started, and call-to-action forms each send a slightly
/// different subset of these keys, so everything is optional here and the
/// intake service decides what is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    #[serde(rename = "properties", alias = "jobVolume")]
    pub job_volume: Option<String>,
    #[serde(alias = "formSource", alias = "form_source")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp", alias = "submitted_at")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    #[serde(alias = "user_agent")]
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    #[serde(alias = "utm_source")]
    pub utm_source: Option<String>,
    #[serde(alias = "utm_medium")]
    pub utm_medium: Option<String>,
    #[serde(alias = "utm_campaign")]
    pub utm_campaign: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_device",
        alias = "device",
        alias = "device_type"
    )]
    pub device_type: Option<DeviceType>,
    pub viewport_width: Option<u32>,
    pub is_from_hero: Option<bool>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub hero_submission_time: Option<DateTime<Utc>>,
}

/// Row handed to storage; the identifier is assigned on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(rename = "properties", default, deserialize_with = "null_as_default")]
    pub job_volume: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: LeadStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub form_source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default, deserialize_with = "lenient_device")]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_from_hero: bool,
    #[serde(default)]
    pub hero_submission_time: Option<DateTime<Utc>>,
}

/// Stored lead submission as read back from the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    #[serde(flatten)]
    pub lead: NewLead,
}

impl LeadRecord {
    pub fn new(id: LeadId, lead: NewLead) -> Self {
        Self { id, lead }
    }

    pub fn status(&self) -> LeadStatus {
        self.lead.status
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.lead.submitted_at
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Older rows and some form variants wrote "unknown" or an empty string.
fn lenient_device<'de, D>(deserializer: D) -> Result<Option<DeviceType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        DateTime::parse_from_rfc3339(value.trim())
            .ok()
            .map(|parsed| parsed.with_timezone(&Utc))
    }))
}
