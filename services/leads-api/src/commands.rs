use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::Args;
use jobvault::config::AppConfig;
use jobvault::error::AppError;
use jobvault::leads::store::InMemoryLeadRepository;
use jobvault::leads::{
    DeviceType, FallbackPolicy, JourneyTracker, LeadAdminService,
    LeadIntakeService, LeadListing, LeadQuery, LeadStatus, LeadSubmission, RecordingRelay,
    RequestContext, SortOrder, SummaryView,
};

use crate::infra::{build_lead_services, parse_date};

/// Dashboard filters shared by the lead commands.
#[derive(Args, Debug, Default)]
pub(crate) struct FilterArgs {
    /// Case-insensitive match on name, email, or company
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// pending, new, or processed (pending also matches new)
    #[arg(long)]
    pub(crate) status: Option<LeadStatus>,
    /// Form source, e.g. hero or get-started
    #[arg(long)]
    pub(crate) source: Option<String>,
    /// mobile or desktop
    #[arg(long)]
    pub(crate) device: Option<DeviceType>,
    /// First submission date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Last submission date to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    /// Oldest submissions first
    #[arg(long)]
    pub(crate) ascending: bool,
}

impl FilterArgs {
    pub(crate) fn to_query(&self) -> LeadQuery {
        LeadQuery {
            search: self.search.clone(),
            status: self.status,
            source: self.source.clone(),
            device: self.device,
            start_date: self.start_date,
            end_date: self.end_date,
            sort: if self.ascending {
                SortOrder::Asc
            } else {
                SortOrder::Desc
            },
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Destination file; defaults to jobvault-leads-<date>.csv in the working directory
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) filters: FilterArgs,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Also count submissions newer than this RFC 3339 timestamp
    #[arg(long)]
    pub(crate) since: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Email used for the simulated visitor
    #[arg(long, default_value = "demo.visitor@example.com")]
    pub(crate) email: String,
    /// Print the CSV export after the dashboard view
    #[arg(long)]
    pub(crate) show_csv: bool,
}

pub(crate) async fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let services = build_lead_services(&config)?;
    let today = Utc::now().date_naive();

    let export = services.admin.export(&args.filters.to_query(), today).await?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(export.filename.clone()));
    tokio::fs::write(&output, &export.body).await?;

    println!("Exported {} leads to {}", export.rows, output.display());
    Ok(())
}

pub(crate) async fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let services = build_lead_services(&config)?;

    let view = services.admin.summary(args.since).await?;
    render_summary(&view);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let repository = Arc::new(InMemoryLeadRepository::default());
    let relay = RecordingRelay::default();
    let intake = LeadIntakeService::new(
        Arc::clone(&repository),
        Arc::new(relay.clone()),
        Arc::new(JourneyTracker::default()),
    );
    let admin = LeadAdminService::new(repository, FallbackPolicy::None, None);

    println!("Lead capture demo");
    let now = Utc::now();
    let visit = RequestContext {
        user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X)".to_string()),
        client_ip: Some("198.51.100.23".to_string()),
        referer: Some(
            "https://jobvault.example/?utm_source=google&utm_medium=cpc&utm_campaign=demo"
                .to_string(),
        ),
        received_at: now,
    };

    for (step, submission, context) in [
        (
            "Hero form",
            demo_hero_submission(&args.email),
            visit.clone(),
        ),
        (
            "Get-started form",
            demo_full_submission(&args.email),
            RequestContext {
                received_at: now + Duration::minutes(2),
                referer: Some("https://jobvault.example/get-started?from=hero".to_string()),
                ..visit.clone()
            },
        ),
    ] {
        match intake.submit(submission, context).await {
            Ok(outcome) => println!(
                "- {step}: stored={} relayed={} id={}",
                outcome.stored,
                outcome.relayed,
                outcome
                    .lead_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
            Err(err) => println!("- {step}: rejected ({err})"),
        }
    }
    println!("Relay captured {} payloads", relay.forwarded().len());

    let listing = admin.list(&LeadQuery::default()).await?;
    render_listing(&listing);

    if args.show_csv {
        let export = admin
            .export(&LeadQuery::default(), now.date_naive())
            .await?;
        println!("\n{}", export.filename);
        println!("{}", String::from_utf8_lossy(&export.body));
    }

    Ok(())
}

fn demo_hero_submission(email: &str) -> LeadSubmission {
    LeadSubmission {
        email: Some(email.to_string()),
        source: Some("hero".to_string()),
        ..LeadSubmission::default()
    }
}

fn demo_full_submission(email: &str) -> LeadSubmission {
    LeadSubmission {
        name: Some("Demo Visitor".to_string()),
        email: Some(email.to_string()),
        company: Some("Demo Contracting".to_string()),
        job_volume: Some("6-20".to_string()),
        source: Some("get-started".to_string()),
        ..LeadSubmission::default()
    }
}

pub(crate) fn render_summary(view: &SummaryView) {
    println!("Lead summary ({:?} data)", view.source);
    println!(
        "- {} total | {} pending | {} processed",
        view.summary.total, view.summary.pending, view.summary.processed
    );
    println!(
        "- {} mobile | {} desktop",
        view.summary.mobile, view.summary.desktop
    );
    if let Some(fresh) = &view.new_submissions {
        println!("- {} new since last check", fresh.count);
    }
}

fn render_listing(listing: &LeadListing) {
    println!("\nDashboard ({:?} data)", listing.source);
    if let Some(warning) = &listing.warning {
        println!("Warning: {warning}");
    }
    for record in &listing.leads {
        let lead = &record.lead;
        println!(
            "  #{} {} <{}> {} | {} | {} | hero={}",
            record.id,
            if lead.name.is_empty() { "-" } else { lead.name.as_str() },
            lead.email,
            lead.form_source,
            lead.status,
            lead.device_type.map_or("unknown", |device| device.label()),
            lead.is_from_hero
        );
    }
}
