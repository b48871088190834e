use hangar_client::{OpenAiClassifier, ReqwestFetcher};
use hangar_core::error::AppError;
use hangar_core::models::ClassifierVerdict;
use hangar_core::traits::{NullClassifier, PageFetcher, TextClassifier};

/// Text classifier chosen at startup: rules only, or a remote model with
/// rule-based fallback.
#[derive(Clone)]
pub enum Classifier {
    Rules(NullClassifier),
    Remote(OpenAiClassifier),
}

impl Classifier {
    /// A remote classifier when an API key is configured, rules otherwise.
    pub fn from_args(
        api_key: Option<&str>,
        model: &str,
        base_url: Option<&str>,
    ) -> Result<Self, AppError> {
        let Some(key) = api_key.filter(|k| !k.trim().is_empty()) else {
            tracing::info!("No classifier API key; using rule-based extraction only");
            return Ok(Self::Rules(NullClassifier));
        };
        let classifier = match base_url {
            Some(url) => OpenAiClassifier::with_base_url(key, model, url)?,
            None => OpenAiClassifier::new(key, model)?,
        };
        tracing::info!(%model, "Remote classifier enabled");
        Ok(Self::Remote(classifier))
    }
}

impl TextClassifier for Classifier {
    async fn classify(
        &self,
        text: &str,
        url: &str,
        context_label: &str,
    ) -> Result<ClassifierVerdict, AppError> {
        match self {
            Self::Rules(c) => c.classify(text, url, context_label).await,
            Self::Remote(c) => c.classify(text, url, context_label).await,
        }
    }
}

/// Page fetcher chosen at startup.
#[derive(Clone)]
pub enum Fetcher {
    Http(ReqwestFetcher),
    #[cfg(feature = "browser")]
    Browser(hangar_client::BrowserFetcher),
}

impl Fetcher {
    pub async fn build(browser: bool) -> Result<Self, AppError> {
        if browser {
            return Self::browser().await;
        }
        Ok(Self::Http(ReqwestFetcher::new()?))
    }

    #[cfg(feature = "browser")]
    async fn browser() -> Result<Self, AppError> {
        Ok(Self::Browser(hangar_client::BrowserFetcher::new().await?))
    }

    #[cfg(not(feature = "browser"))]
    async fn browser() -> Result<Self, AppError> {
        Err(AppError::ConfigError(
            "--browser requires building hangar with the `browser` feature".into(),
        ))
    }
}

impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        match self {
            Self::Http(f) => f.fetch(url).await,
            #[cfg(feature = "browser")]
            Self::Browser(f) => f.fetch(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_without_key_is_rule_based() {
        let classifier = Classifier::from_args(None, "gpt-4o-mini", None).unwrap();
        assert!(matches!(classifier, Classifier::Rules(_)));

        let classifier = Classifier::from_args(Some("  "), "gpt-4o-mini", None).unwrap();
        assert!(matches!(classifier, Classifier::Rules(_)));
    }

    #[test]
    fn test_classifier_with_key_is_remote() {
        let classifier =
            Classifier::from_args(Some("key"), "gpt-4o-mini", Some("http://localhost:8080/v1"))
                .unwrap();
        assert!(matches!(classifier, Classifier::Remote(_)));
    }

    #[tokio::test]
    async fn test_rule_based_classifier_accepts_everything() {
        let classifier = Classifier::Rules(NullClassifier);
        let verdict = classifier
            .classify("Captain A320", "https://a.example/jobs/1", "Example Air")
            .await
            .unwrap();
        assert!(verdict.is_valid_job);
        assert_eq!(verdict.title, None);
    }

    #[cfg(not(feature = "browser"))]
    #[tokio::test]
    async fn test_browser_requires_feature() {
        let err = Fetcher::build(true).await.err().unwrap();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
