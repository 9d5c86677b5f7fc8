//! Page fetching
//!
//! A fetch either yields page text or nothing. Network errors, timeouts and
//! blank pages all collapse to `None`; the caller only needs to know that
//! there is nothing to score.

use async_trait::async_trait;

/// Retrieves the readable text of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Page fetching powered by daedra (HTML converted to markdown)
pub struct DaedraFetcher;

impl DaedraFetcher {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DaedraFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for DaedraFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        match daedra::tools::fetch::fetch_page(&fetch_args).await {
            Ok(page) => non_blank(page.content),
            Err(e) => {
                tracing::debug!(url, "Failed to fetch page: {}", e);
                None
            }
        }
    }
}

fn non_blank(content: String) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content)
    }
}
