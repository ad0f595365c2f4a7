use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{DeviceType, LeadRecord, LeadStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Dashboard filter state. Every filter accepts `"all"` or an empty value
/// to mean "no filter", so the dashboard can send its select boxes verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadQuery {
    #[serde(default, deserialize_with = "filter_value")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "filter_value")]
    pub status: Option<LeadStatus>,
    #[serde(default, deserialize_with = "filter_value")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "filter_value")]
    pub device: Option<DeviceType>,
    #[serde(default, deserialize_with = "filter_value")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "filter_value")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl LeadQuery {
    pub fn apply(&self, leads: &[LeadRecord]) -> Vec<LeadRecord> {
        let needle = self
            .search
            .as_deref()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty());
        let window_start = self.start_date.map(|date| date.and_time(NaiveTime::MIN).and_utc());
        let window_end = self.end_date.and_then(end_of_day);

        let mut filtered: Vec<LeadRecord> = leads
            .iter()
            .filter(|record| match &needle {
                Some(term) => matches_search(record, term),
                None => true,
            })
            .filter(|record| match self.status {
                Some(LeadStatus::Pending) => record.status().is_pending(),
                Some(status) => record.status() == status,
                None => true,
            })
            .filter(|record| match self.source.as_deref() {
                Some(source) => record.lead.form_source.eq_ignore_ascii_case(source.trim()),
                None => true,
            })
            .filter(|record| match self.device {
                Some(device) => record.lead.device_type == Some(device),
                None => true,
            })
            .filter(|record| window_start.map_or(true, |start| record.submitted_at() >= start))
            .filter(|record| window_end.map_or(true, |end| record.submitted_at() <= end))
            .cloned()
            .collect();

        match self.sort {
            SortOrder::Desc => filtered.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at())),
            SortOrder::Asc => filtered.sort_by_key(LeadRecord::submitted_at),
        }

        filtered
    }
}

fn matches_search(record: &LeadRecord, term: &str) -> bool {
    [
        record.lead.name.as_str(),
        record.lead.email.as_str(),
        record.lead.company.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

// Inclusive through 23:59:59 of the end date.
fn end_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    NaiveTime::from_hms_opt(23, 59, 59).map(|time| date.and_time(time).and_utc())
}

fn filter_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::store::fixtures::mock_leads;

    fn ids(leads: &[LeadRecord]) -> Vec<&str> {
        leads.iter().map(|record| record.id.0.as_str()).collect()
    }

    fn query(raw: &str) -> LeadQuery {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        let value = serde_json::Value::Object(
            pairs
                .into_iter()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect(),
        );
        serde_json::from_value(value).expect("query parses")
    }

    #[test]
    fn default_query_sorts_newest_first() {
        let leads = mock_leads();
        assert_eq!(ids(&LeadQuery::default().apply(&leads)), ["1", "2", "3", "4"]);

        let oldest_first = LeadQuery {
            sort: SortOrder::Asc,
            ..LeadQuery::default()
        };
        assert_eq!(ids(&oldest_first.apply(&leads)), ["4", "3", "2", "1"]);
    }

    #[test]
    fn search_matches_name_email_or_company() {
        let leads = mock_leads();
        assert_eq!(ids(&query("search=BRIGHTSPARK").apply(&leads)), ["3"]);
        assert_eq!(ids(&query("search=dwayne").apply(&leads)), ["2"]);
        assert_eq!(ids(&query("search=becker%20plumbing").apply(&leads)), ["4"]);
    }

    #[test]
    fn pending_filter_includes_new_rows() {
        let leads = mock_leads();
        assert_eq!(ids(&query("status=pending").apply(&leads)), ["1", "2", "4"]);
        assert_eq!(ids(&query("status=new").apply(&leads)), ["2"]);
        assert_eq!(ids(&query("status=processed").apply(&leads)), ["3"]);
        assert_eq!(query("status=all").apply(&leads).len(), 4);
    }

    #[test]
    fn source_and_device_filters_combine() {
        let leads = mock_leads();
        let filtered = query("source=get-started&device=mobile").apply(&leads);
        assert_eq!(ids(&filtered), ["4"]);
    }

    #[test]
    fn date_range_is_inclusive_of_the_end_day() {
        let leads = mock_leads();
        let filtered = query("start_date=2025-03-10&end_date=2025-03-13").apply(&leads);
        assert_eq!(ids(&filtered), ["2", "3"]);

        let single_day = query("start_date=2025-03-14&end_date=2025-03-14").apply(&leads);
        assert_eq!(ids(&single_day), ["1"]);
    }

    #[test]
    fn unknown_filter_values_are_rejected() {
        let value = serde_json::json!({ "status": "archived" });
        assert!(serde_json::from_value::<LeadQuery>(value).is_err());
    }
}
