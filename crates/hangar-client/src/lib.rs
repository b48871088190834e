#[cfg(feature = "browser")]
pub mod browser_fetcher;
pub mod cleaner;
pub mod fetcher;
pub mod listing;
pub mod llm;

#[cfg(feature = "browser")]
pub use browser_fetcher::BrowserFetcher;
pub use cleaner::HtmdCleaner;
pub use fetcher::ReqwestFetcher;
pub use listing::{HtmlListingStrategy, ListingAnchor, extract_anchors, job_link_selector};
pub use llm::OpenAiClassifier;
