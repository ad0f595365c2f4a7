use chrono::{DateTime, TimeZone, Utc};

use crate::leads::domain::{DeviceType, LeadId, LeadRecord, LeadStatus, NewLead};

/// Static sample rows served by the dashboard when the hosted table is
/// unreachable and the mock fallback is selected.
pub fn mock_leads() -> Vec<LeadRecord> {
    vec![
        mock(
            "1",
            ("Maria Gonzalez", "maria@gonzalezroofing.com", "Gonzalez Roofing"),
            "6-20",
            LeadStatus::Pending,
            timestamp(2025, 3, 14, 16, 5),
            "get-started",
            DeviceType::Desktop,
            ("google", "cpc", "spring-contractors"),
        ),
        mock(
            "2",
            ("", "dwayne.p@example.com", ""),
            "",
            LeadStatus::New,
            timestamp(2025, 3, 13, 9, 41),
            "hero",
            DeviceType::Mobile,
            ("facebook", "social", "escrow-launch"),
        ),
        mock(
            "3",
            ("Priya Natarajan", "priya@brightsparkelectric.com", "BrightSpark Electric"),
            "21-50",
            LeadStatus::Processed,
            timestamp(2025, 3, 10, 18, 22),
            "homepage",
            DeviceType::Desktop,
            ("", "", ""),
        ),
        mock(
            "4",
            ("Tom Becker", "tom@beckerplumbing.co", "Becker Plumbing"),
            "1-5",
            LeadStatus::Pending,
            timestamp(2025, 3, 8, 12, 0),
            "get-started",
            DeviceType::Mobile,
            ("newsletter", "email", "march-digest"),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn mock(
    id: &str,
    (name, email, company): (&str, &str, &str),
    job_volume: &str,
    status: LeadStatus,
    submitted_at: DateTime<Utc>,
    form_source: &str,
    device: DeviceType,
    (utm_source, utm_medium, utm_campaign): (&str, &str, &str),
) -> LeadRecord {
    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());
    let user_agent = match device {
        DeviceType::Mobile => "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X)",
        DeviceType::Desktop => "Mozilla/5.0 (Windows NT 10.0; Win64; x64)",
    };

    LeadRecord::new(
        LeadId::from(id),
        NewLead {
            name: name.to_string(),
            email: email.to_string(),
            company: company.to_string(),
            job_volume: job_volume.to_string(),
            status,
            notes: String::new(),
            submitted_at,
            created_at: Some(submitted_at),
            form_source: form_source.to_string(),
            url: Some(format!("https://jobvault.example/{form_source}")),
            user_agent: Some(user_agent.to_string()),
            device_type: Some(device),
            ip_address: None,
            utm_source: optional(utm_source),
            utm_medium: optional(utm_medium),
            utm_campaign: optional(utm_campaign),
            is_from_hero: false,
            hero_submission_time: None,
        },
    )
}

fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .unwrap_or_default()
}
