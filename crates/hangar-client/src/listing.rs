use std::collections::HashSet;
use std::time::Duration;

use hangar_core::ats::StrategyId;
use hangar_core::error::AppError;
use hangar_core::filter::is_candidate;
use hangar_core::models::RawPosting;
use hangar_core::target::Target;
use hangar_core::traits::{ExtractionStrategy, PageFetcher, TextCleaner};
use hangar_core::util::collapse_whitespace;
use scraper::{Html, Selector};
use url::Url;

const MIN_CUSTOM_TEXT: usize = 5;
const MAX_LINK_TEXT: usize = 200;

const SOCIAL_HOSTS: &[&str] = &[
    "linkedin.",
    "facebook.",
    "twitter.",
    "x.com",
    "instagram.",
    "youtube.",
    "tiktok.",
    "glassdoor.",
];

/// Job-link selector per ATS vendor. Custom sites fall back to every anchor.
pub fn job_link_selector(strategy: StrategyId) -> &'static str {
    match strategy {
        StrategyId::Taleo => {
            "span.titlelink a, a.job-title, a[href*='jobdetail'], a[href*='requisition.ftl']"
        }
        StrategyId::Workday => "a[data-automation-id='jobTitle'], li a[href*='/job/']",
        StrategyId::SuccessFactors => {
            "a.jobTitle-link, a[href*='jobDetail'], a[href*='requisition'], tr.job-row a"
        }
        StrategyId::Brassring => "a[href*='jobdetails'], a.jobProperty.jobtitle",
        StrategyId::Icims => "a.iCIMS_Anchor[href*='/jobs/'], div.iCIMS_JobsTable a[href]",
        StrategyId::Greenhouse => "div.opening a[href], tr.job-post a[href], a[href*='/jobs/']",
        StrategyId::Lever => "a.posting-title, div.posting a.posting-btn-submit",
        StrategyId::SmartRecruiters => "a.link--block.details, li.opening-job a[href]",
        StrategyId::Avature => "a[href*='JobDetail'], h3 a[href]",
        StrategyId::Custom => "a[href]",
    }
}

/// A job link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingAnchor {
    pub title: String,
    pub url: String,
}

/// Extract job anchors from a listing page.
///
/// Hrefs are resolved against `page_url` and de-duplicated in document order.
/// Custom pages additionally keep only same-site links with 5 to 200
/// characters of text.
pub fn extract_anchors(
    html: &str,
    page_url: &Url,
    strategy: StrategyId,
) -> Result<Vec<ListingAnchor>, AppError> {
    let selector = Selector::parse(job_link_selector(strategy))
        .map_err(|e| AppError::Generic(format!("Invalid selector for {strategy}: {e}")))?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut anchors = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve_href(page_url, href) else {
            continue;
        };
        if is_social(&url) {
            continue;
        }

        let title = collapse_whitespace(&element.text().collect::<String>());
        let len = title.chars().count();
        if len == 0 || len > MAX_LINK_TEXT {
            continue;
        }
        if strategy == StrategyId::Custom
            && (len < MIN_CUSTOM_TEXT || !same_site(page_url, &url))
        {
            continue;
        }

        if seen.insert(url.to_string()) {
            anchors.push(ListingAnchor {
                title,
                url: url.into(),
            });
        }
    }
    Ok(anchors)
}

fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        return None;
    }
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn is_social(url: &Url) -> bool {
    url.host_str().is_some_and(|host| {
        let host = host.to_ascii_lowercase();
        SOCIAL_HOSTS.iter().any(|s| host.contains(s))
    })
}

/// Hosts match ignoring `www.`, or one is a subdomain of the other.
fn same_site(a: &Url, b: &Url) -> bool {
    let (Some(a), Some(b)) = (a.host_str(), b.host_str()) else {
        return false;
    };
    let a = a.trim_start_matches("www.").to_ascii_lowercase();
    let b = b.trim_start_matches("www.").to_ascii_lowercase();
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}

/// Extraction strategy over static or browser-rendered listing HTML.
///
/// One hop only: the listing page, then optionally the first
/// `max_detail_pages` postings that pass the pilot candidate filter, fetched
/// one at a time with `detail_delay` between requests.
#[derive(Clone)]
pub struct HtmlListingStrategy<F, Cl>
where
    F: PageFetcher,
    Cl: TextCleaner,
{
    fetcher: F,
    cleaner: Cl,
    max_detail_pages: usize,
    detail_delay: Duration,
}

impl<F, Cl> HtmlListingStrategy<F, Cl>
where
    F: PageFetcher,
    Cl: TextCleaner,
{
    pub fn new(fetcher: F, cleaner: Cl) -> Self {
        Self {
            fetcher,
            cleaner,
            max_detail_pages: 0,
            detail_delay: Duration::from_secs(2),
        }
    }

    pub fn with_detail_pages(mut self, max: usize, delay: Duration) -> Self {
        self.max_detail_pages = max;
        self.detail_delay = delay;
        self
    }

    async fn detail_text(&self, url: &str) -> Option<String> {
        let html = match self.fetcher.fetch(url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(%url, error = %e, "Detail page fetch failed");
                return None;
            }
        };
        match self.cleaner.clean(&html) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(%url, error = %e, "Detail page cleaning failed");
                None
            }
        }
    }
}

impl<F, Cl> ExtractionStrategy for HtmlListingStrategy<F, Cl>
where
    F: PageFetcher,
    Cl: TextCleaner,
{
    async fn fetch(&self, strategy: StrategyId, target: &Target) -> Result<Vec<RawPosting>, AppError> {
        let page_url = Url::parse(&target.url)
            .map_err(|e| AppError::HttpError(format!("Invalid target URL {}: {e}", target.url)))?;
        let html = self.fetcher.fetch(&target.url).await?;
        let anchors = extract_anchors(&html, &page_url, strategy)?;
        tracing::debug!(target_id = %target.id, %strategy, anchors = anchors.len(), "Listing parsed");

        // Only pilot candidates spend the detail-page budget.
        let mut detailed = 0;
        let mut postings = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let mut posting = RawPosting::new(target.id, anchor.title, anchor.url);
            if detailed < self.max_detail_pages
                && is_candidate(&posting.title_text, &posting.anchor_url)
            {
                if detailed > 0 && !self.detail_delay.is_zero() {
                    tokio::time::sleep(self.detail_delay).await;
                }
                posting.body_text = self.detail_text(&posting.anchor_url).await;
                detailed += 1;
            }
            postings.push(posting);
        }
        Ok(postings)
    }
}

#[cfg(test)]
mod tests {
    use hangar_core::target::Tier;
    use hangar_core::testutil::{MockCleaner, MockPageFetcher};

    use super::*;

    const CAREERS: &str = "https://www.example-air.com/careers";

    fn page() -> Url {
        Url::parse(CAREERS).unwrap()
    }

    fn titles(anchors: &[ListingAnchor]) -> Vec<&str> {
        anchors.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_custom_keeps_same_site_job_links() {
        let html = r##"
            <a href="/careers/captain-a320">Captain   A320</a>
            <a href="https://jobs.example-air.com/fo-b737">First Officer B737</a>
            <a href="https://other-airline.com/pilot">Pilot elsewhere</a>
            <a href="https://www.linkedin.com/company/example-air">Follow us on LinkedIn</a>
            <a href="#top">Back to top link</a>
            <a href="mailto:hr@example-air.com">Email recruitment</a>
            <a href="javascript:void(0)">Open the menu</a>
            <a href="/about">Info</a>
            <a href="/careers/captain-a320#apply">Captain A320 apply</a>
        "##;
        let anchors = extract_anchors(html, &page(), StrategyId::Custom).unwrap();
        assert_eq!(titles(&anchors), vec!["Captain A320", "First Officer B737"]);
        assert_eq!(anchors[0].url, "https://www.example-air.com/careers/captain-a320");
    }

    #[test]
    fn test_overlong_link_text_is_skipped() {
        let long = "Pilot ".repeat(50);
        let html = format!(r#"<a href="/a">{long}</a><a href="/b">Second Officer</a>"#);
        let anchors = extract_anchors(&html, &page(), StrategyId::Custom).unwrap();
        assert_eq!(titles(&anchors), vec!["Second Officer"]);
    }

    #[test]
    fn test_vendor_selector_ignores_page_chrome() {
        let html = r#"
            <a href="/about">About Example Air careers</a>
            <div class="posting">
              <a class="posting-title" href="https://jobs.lever.co/example-air/1"><h5>A330 Captain</h5></a>
            </div>
            <div class="posting">
              <a class="posting-title" href="https://jobs.lever.co/example-air/2"><h5>FO</h5></a>
            </div>
        "#;
        let listing = Url::parse("https://jobs.lever.co/example-air").unwrap();
        let anchors = extract_anchors(html, &listing, StrategyId::Lever).unwrap();
        // Vendor pages keep short titles; the candidate filter decides later.
        assert_eq!(titles(&anchors), vec!["A330 Captain", "FO"]);
    }

    #[test]
    fn test_every_vendor_selector_parses() {
        for id in [
            StrategyId::Taleo,
            StrategyId::Workday,
            StrategyId::SuccessFactors,
            StrategyId::Brassring,
            StrategyId::Icims,
            StrategyId::Greenhouse,
            StrategyId::Lever,
            StrategyId::SmartRecruiters,
            StrategyId::Avature,
            StrategyId::Custom,
        ] {
            assert!(Selector::parse(job_link_selector(id)).is_ok(), "{id}");
        }
    }

    #[tokio::test]
    async fn test_fetch_fills_detail_bodies_up_to_limit() {
        let listing = r#"
            <a href="/careers/1">Captain A320</a>
            <a href="/careers/2">First Officer A320</a>
            <a href="/careers/3">Second Officer B777</a>
        "#;
        let fetcher = MockPageFetcher::new()
            .with_page(CAREERS, listing)
            .with_page(
                "https://www.example-air.com/careers/1",
                "<p>Minimum 3000 hours total time</p>",
            )
            .with_error(
                "https://www.example-air.com/careers/2",
                AppError::HttpError("HTTP 500".into()),
            );
        let strategy = HtmlListingStrategy::new(fetcher.clone(), MockCleaner)
            .with_detail_pages(2, Duration::ZERO);
        let target = Target::new("Example Air", CAREERS, Tier::One);

        let postings = strategy.fetch(StrategyId::Custom, &target).await.unwrap();

        assert_eq!(postings.len(), 3);
        assert_eq!(
            postings[0].body_text.as_deref(),
            Some("Minimum 3000 hours total time")
        );
        assert_eq!(postings[1].body_text, None);
        assert_eq!(postings[2].body_text, None);
        assert!(postings.iter().all(|p| p.source_target_id == target.id));
        // Listing plus two detail pages; the third is beyond the limit.
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_detail_budget_skips_non_pilot_links() {
        let listing = r#"
            <a href="/careers/benefits">Benefits and life at Example Air</a>
            <a href="/careers/captain-a320">Captain A320</a>
        "#;
        let fetcher = MockPageFetcher::new()
            .with_page(CAREERS, listing)
            .with_page(
                "https://www.example-air.com/careers/benefits",
                "<p>Staff travel and pension</p>",
            )
            .with_page(
                "https://www.example-air.com/careers/captain-a320",
                "<p>Minimum 5000 hours total time</p>",
            );
        let strategy = HtmlListingStrategy::new(fetcher.clone(), MockCleaner)
            .with_detail_pages(1, Duration::ZERO);
        let target = Target::new("Example Air", CAREERS, Tier::One);

        let postings = strategy.fetch(StrategyId::Custom, &target).await.unwrap();

        assert_eq!(postings.len(), 2);
        assert_eq!(postings[0].body_text, None);
        assert_eq!(
            postings[1].body_text.as_deref(),
            Some("Minimum 5000 hours total time")
        );
        assert_eq!(
            fetcher.requested(),
            vec![
                CAREERS.to_string(),
                "https://www.example-air.com/careers/captain-a320".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_fetch_error_propagates() {
        let fetcher = MockPageFetcher::new()
            .with_error(CAREERS, AppError::HttpError("HTTP 503 for listing".into()));
        let strategy = HtmlListingStrategy::new(fetcher, MockCleaner);
        let target = Target::new("Example Air", CAREERS, Tier::One);

        let err = strategy
            .fetch(StrategyId::Custom, &target)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
