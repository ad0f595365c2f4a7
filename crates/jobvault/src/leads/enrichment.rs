//! Request metadata helpers used to fill in whatever the browser did not send.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::domain::{DeviceType, LeadSubmission};

/// Viewports narrower than this are treated as phones.
pub const MOBILE_VIEWPORT_BREAKPOINT: u32 = 768;

const MOBILE_AGENT_MARKERS: [&str; 5] = ["mobi", "android", "iphone", "ipad", "ipod"];

pub fn detect_device(user_agent: Option<&str>, viewport_width: Option<u32>) -> DeviceType {
    if viewport_width.is_some_and(|width| width < MOBILE_VIEWPORT_BREAKPOINT) {
        return DeviceType::Mobile;
    }

    let agent = user_agent.unwrap_or_default().to_ascii_lowercase();
    if MOBILE_AGENT_MARKERS
        .iter()
        .any(|marker| agent.contains(marker))
    {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}

/// Campaign attribution carried on the landing page URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: String,
}

impl UtmParams {
    pub fn from_url(raw: &str) -> Self {
        let Some(url) = parse_page_url(raw) else {
            return Self::default();
        };

        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "utm_source" => params.source = value.into_owned(),
                "utm_medium" => params.medium = value.into_owned(),
                "utm_campaign" => params.campaign = value.into_owned(),
                _ => {}
            }
        }
        params
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.medium.is_empty() && self.campaign.is_empty()
    }
}

/// True when the visitor was redirected from the hero form (`?from=hero`).
pub fn arrived_from_hero(raw: &str) -> bool {
    parse_page_url(raw).is_some_and(|url| {
        url.query_pairs()
            .any(|(key, value)| key == "from" && value == "hero")
    })
}

fn parse_page_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    Url::parse(trimmed).ok().or_else(|| {
        Url::parse("http://localhost/")
            .ok()
            .and_then(|base| base.join(trimmed).ok())
    })
}

/// First hop in `X-Forwarded-For`, falling back to `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_string)
}

/// Metadata observed by the server for a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
    pub referer: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap, received_at: DateTime<Utc>) -> Self {
        let header_text = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
                .filter(|value| !value.trim().is_empty())
        };

        Self {
            user_agent: header_text(header::USER_AGENT),
            client_ip: client_ip(headers),
            referer: header_text(header::REFERER),
            received_at,
        }
    }

    pub fn empty(received_at: DateTime<Utc>) -> Self {
        Self {
            user_agent: None,
            client_ip: None,
            referer: None,
            received_at,
        }
    }
}

/// Fill the fields the browser left blank from server-side observations.
/// Values the form supplied always win.
pub fn enrich(mut submission: LeadSubmission, context: &RequestContext) -> LeadSubmission {
    fill_blank(&mut submission.user_agent, context.user_agent.as_deref());
    fill_blank(&mut submission.ip, context.client_ip.as_deref());
    fill_blank(&mut submission.url, context.referer.as_deref());

    if submission.device_type.is_none() {
        submission.device_type = Some(detect_device(
            submission.user_agent.as_deref(),
            submission.viewport_width,
        ));
    }

    if let Some(url) = submission.url.as_deref() {
        let utm = UtmParams::from_url(url);
        fill_blank(&mut submission.utm_source, Some(utm.source.as_str()));
        fill_blank(&mut submission.utm_medium, Some(utm.medium.as_str()));
        fill_blank(&mut submission.utm_campaign, Some(utm.campaign.as_str()));
    }

    submission
}

fn fill_blank(slot: &mut Option<String>, fallback: Option<&str>) {
    let blank = slot.as_deref().map_or(true, |value| value.trim().is_empty());
    if !blank {
        return;
    }

    *slot = fallback
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string);
}
