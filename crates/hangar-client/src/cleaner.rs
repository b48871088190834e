use std::sync::Arc;

use hangar_core::error::AppError;
use hangar_core::traits::TextCleaner;
use hangar_core::util::collapse_whitespace;
use htmd::HtmlToMarkdown;

/// Detail-page cleaner built on htmd.
///
/// Renders posting HTML as Markdown with page chrome (navigation, footers,
/// scripts, cookie banners in `aside`) removed, then collapses blank runs so
/// the requirement text reads as one block for the hour and license rules.
#[derive(Clone)]
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec![
                "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
                "form", "button",
            ])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl TextCleaner for HtmdCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let markdown = self
            .converter
            .convert(html)
            .map_err(|e| AppError::Generic(format!("HTML conversion failed: {e}")))?;

        let lines: Vec<String> = markdown
            .lines()
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .collect();
        Ok(lines.join("\n"))
    }
}
