//! Username and email checks
//!
//! A username is checked against every selected platform in parallel. Each
//! platform yields exactly one record; the report lists platforms where the
//! profile exists first, then the rest, each group by platform name.

use crate::dispatch::{Dispatcher, ProviderJob};
use crate::model::{AggregatedReport, NormalizedRecord, Outcome, QueryRequest};
use crate::registry::{self, ProviderDescriptor, USERNAME_PLATFORMS};
use crate::resolve::{DnsResolve, RecordType};
use crate::validate::{validate_email, validate_username};
use std::sync::Arc;

/// Source name of the email check record
pub const EMAIL_SOURCE: &str = "Email Validation";

/// Checks a username across the selected platforms
///
/// # Arguments
///
/// * `dispatcher` - Shared query dispatcher
/// * `request` - Username plus optional platform selection
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - One record per platform
/// * `Err(OsintError)` - Invalid username or unknown platform
pub async fn check_username(
    dispatcher: Arc<Dispatcher>,
    request: &QueryRequest,
) -> crate::Result<AggregatedReport> {
    let username = validate_username(&request.subject)?;
    let platforms = registry::select(USERNAME_PLATFORMS, &request.providers)?;

    tracing::info!(
        "Checking username '{}' on {} platforms",
        username,
        platforms.len()
    );

    let jobs = platforms
        .into_iter()
        .map(|platform| {
            let dispatcher = dispatcher.clone();
            let username = username.clone();
            let platform = *platform;
            ProviderJob::new(platform.id, async move {
                Ok(vec![check_platform(&dispatcher, &platform, &username).await])
            })
        })
        .collect();

    let mut report = dispatcher.fan_out().run(jobs).await;

    // Present first, then by platform name
    report.sort_sources_by(|(a_name, a), (b_name, b)| {
        let a_found = a.iter().any(|r| r.outcome().is_present());
        let b_found = b.iter().any(|r| r.outcome().is_present());
        b_found.cmp(&a_found).then_with(|| a_name.cmp(b_name))
    });

    let found = report
        .records()
        .filter(|r| r.outcome().is_present())
        .count();
    tracing::info!(
        "Username '{}' found on {} of {} platforms",
        username,
        found,
        report.len()
    );

    Ok(report)
}

/// Checks one platform; transport failures become error records
async fn check_platform(
    dispatcher: &Dispatcher,
    platform: &ProviderDescriptor,
    username: &str,
) -> NormalizedRecord {
    let url = platform.render(username);
    let referer = format!("https://www.google.com/search?q={}", platform.id);

    match dispatcher.get_with_referer(&url, Some(&referer)).await {
        Ok(response) => {
            let outcome = platform.predicate.classify(response.status, &response.body);
            NormalizedRecord::data(platform.id, outcome)
                .with("platform", platform.id)
                .with("url", url)
                .with("status_code", response.status)
        }
        Err(e) => {
            tracing::warn!("{} check failed: {}", platform.id, e);
            NormalizedRecord::failed(platform.id, e)
                .with("platform", platform.id)
                .with("url", url)
        }
    }
}

/// Checks whether an email address can receive mail
///
/// The address format is validated first; then the domain must resolve and
/// publish MX records.
///
/// # Returns
///
/// * `Ok(AggregatedReport)` - A single "Email Validation" record
/// * `Err(OsintError)` - The address is malformed
pub async fn check_email(
    resolver: &dyn DnsResolve,
    request: &QueryRequest,
) -> crate::Result<AggregatedReport> {
    let (email, domain) = validate_email(&request.subject)?;
    tracing::info!("Validating email domain {}", domain);

    let base = |outcome: Outcome| {
        NormalizedRecord::data(EMAIL_SOURCE, outcome)
            .with("platform", EMAIL_SOURCE)
            .with("url", format!("mailto:{}", email))
            .with("email", email.as_str())
            .with("domain", domain.as_str())
            .with("valid_format", true)
    };

    let record = match resolver.lookup_ipv4(&domain).await {
        Ok(ips) if ips.is_empty() => base(Outcome::Absent)
            .with("domain_exists", false)
            .with("deliverable", false)
            .with("details", "Domain does not exist"),
        Ok(_) => match resolver.resolve(&domain, RecordType::Mx).await {
            Ok(mx) if !mx.is_empty() => base(Outcome::Present)
                .with("domain_exists", true)
                .with("has_mx_records", true)
                .with("deliverable", true)
                .with("details", "Email domain has valid MX records"),
            Ok(_) => base(Outcome::Absent)
                .with("domain_exists", true)
                .with("has_mx_records", false)
                .with("deliverable", false)
                .with("details", "Domain exists but has no mail exchanger"),
            Err(e) => NormalizedRecord::failed(EMAIL_SOURCE, e)
                .with("email", email.as_str())
                .with("details", "Verification error"),
        },
        Err(e) => NormalizedRecord::failed(EMAIL_SOURCE, e)
            .with("email", email.as_str())
            .with("details", "Verification error"),
    };

    let mut report = AggregatedReport::new();
    report.push(EMAIL_SOURCE, vec![record]);
    Ok(report)
}
