//! The page-level operations the browser skills need.
//!
//! [`BrowserSession`](crate::session::BrowserSession) implements this over
//! CDP; skills take `&mut dyn PageDriver` so they can run against a scripted
//! page in tests.

use {async_trait::async_trait, serde_json::Value};

use crate::{error::BrowserError, types::PdfOptions};

#[async_trait]
pub trait PageDriver: Send {
    /// Navigate the page to `url`.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Wait until network activity settles, then the configured settle delay.
    async fn wait_for_idle(&mut self) -> Result<(), BrowserError>;

    /// Evaluate a JavaScript expression and return its JSON value.
    async fn evaluate(&mut self, script: &str) -> Result<Value, BrowserError>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    /// Focus the first element matching `selector` and type `text` into it.
    async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Capture a PNG of the viewport or the whole page.
    async fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, BrowserError>;

    /// Render the page to PDF bytes.
    async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;
}

/// Scripted page used by the skill tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashSet, VecDeque};

    use super::*;

    #[derive(Default)]
    pub struct FakePage {
        /// Responses returned by successive `evaluate` calls; `Null` once drained.
        pub evaluations: VecDeque<Result<Value, String>>,
        /// 1-based `goto` call numbers that fail.
        pub failing_gotos: HashSet<usize>,
        /// Selectors that do not exist on the page.
        pub missing: HashSet<String>,
        pub url: String,
        /// Every call, in order, e.g. `goto https://…`, `click #next`.
        pub log: Vec<String>,
        gotos: usize,
    }

    impl FakePage {
        pub fn with_evaluations(values: impl IntoIterator<Item = Value>) -> Self {
            Self {
                evaluations: values.into_iter().map(Ok).collect(),
                ..Default::default()
            }
        }

        pub fn calls(&self, prefix: &str) -> usize {
            self.log.iter().filter(|c| c.starts_with(prefix)).count()
        }
    }

    #[async_trait]
    impl PageDriver for FakePage {
        async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
            self.gotos += 1;
            self.log.push(format!("goto {url}"));
            if self.failing_gotos.contains(&self.gotos) {
                return Err(BrowserError::NavigationFailed(format!(
                    "net::ERR_CONNECTION_REFUSED at {url}"
                )));
            }
            self.url = url.to_string();
            Ok(())
        }

        async fn wait_for_idle(&mut self) -> Result<(), BrowserError> {
            self.log.push("idle".into());
            Ok(())
        }

        async fn evaluate(&mut self, _script: &str) -> Result<Value, BrowserError> {
            self.log.push("evaluate".into());
            match self.evaluations.pop_front() {
                Some(Ok(v)) => Ok(v),
                Some(Err(e)) => Err(BrowserError::JsEvalFailed(e)),
                None => Ok(Value::Null),
            }
        }

        async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
            self.log.push(format!("click {selector}"));
            if self.missing.contains(selector) {
                return Err(BrowserError::ElementNotFound(selector.to_string()));
            }
            Ok(())
        }

        async fn type_into(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
            self.log.push(format!("type {selector}={text}"));
            if self.missing.contains(selector) {
                return Err(BrowserError::ElementNotFound(selector.to_string()));
            }
            Ok(())
        }

        async fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, BrowserError> {
            self.log.push(format!("screenshot full_page={full_page}"));
            Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
        }

        async fn pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>, BrowserError> {
            self.log
                .push(format!("pdf landscape={}", options.landscape));
            Ok(b"%PDF-1.4 fake".to_vec())
        }

        async fn current_url(&mut self) -> Result<String, BrowserError> {
            Ok(self.url.clone())
        }
    }
}
