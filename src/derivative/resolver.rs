//! # Derivative Address Resolver
//!
//! Resolves a document plus transform options to a URL. Resolution is a
//! first-match chain of flat strategies; the first strategy that supports
//! the request renders it.

use std::fmt;
use std::sync::Arc;

use super::codec::OptionsCodec;
use super::options::NormalizedOptions;
use crate::config::AeroDocConfig;
use crate::document::{Document, MimeCatalog};
use crate::errors::{DocumentError, DocumentResult};

/// URL prefixes used when rendering addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSettings {
    pub public_base_url: String,
    pub derivative_base_url: String,
    pub absolute_host: Option<String>,
}

impl From<&AeroDocConfig> for UrlSettings {
    fn from(config: &AeroDocConfig) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            derivative_base_url: config.derivative_base_url.clone(),
            absolute_host: config.absolute_host.clone(),
        }
    }
}

impl Default for UrlSettings {
    fn default() -> Self {
        Self::from(&AeroDocConfig::default())
    }
}

fn join(base: &str, rest: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rest)
}

/// One way of addressing a document
pub trait AddressStrategy: Send + Sync + fmt::Debug {
    fn supports(&self, document: &Document, options: &NormalizedOptions) -> bool;

    /// Root-relative URL for the document
    fn render(&self, document: &Document, options: &NormalizedOptions, settings: &UrlSettings) -> String;
}

/// Serves the stored file as-is, without touching the codec
#[derive(Debug)]
pub struct OriginalFileStrategy {
    catalog: Arc<MimeCatalog>,
}

impl OriginalFileStrategy {
    pub fn new(catalog: Arc<MimeCatalog>) -> Self {
        Self { catalog }
    }
}

impl AddressStrategy for OriginalFileStrategy {
    fn supports(&self, document: &Document, options: &NormalizedOptions) -> bool {
        let processable = document
            .mime_type
            .as_deref()
            .map(|m| self.catalog.is_processable(m))
            .unwrap_or(false);
        options.no_process() || !processable || options.is_identity()
    }

    fn render(&self, document: &Document, _options: &NormalizedOptions, settings: &UrlSettings) -> String {
        let relative = document.relative_path().unwrap_or_default();
        join(&settings.public_base_url, &relative)
    }
}

/// Addresses a derivative by its options token
#[derive(Debug, Default)]
pub struct DerivativeStrategy;

impl AddressStrategy for DerivativeStrategy {
    fn supports(&self, _document: &Document, _options: &NormalizedOptions) -> bool {
        true
    }

    fn render(&self, document: &Document, options: &NormalizedOptions, settings: &UrlSettings) -> String {
        let token = OptionsCodec::encode(options);
        let relative = document.relative_path().unwrap_or_default();
        join(&settings.derivative_base_url, &format!("{}/{}", token, relative))
    }
}

/// Document + options → URL
#[derive(Debug)]
pub struct DerivativeAddressResolver {
    settings: UrlSettings,
    strategies: Vec<Box<dyn AddressStrategy>>,
}

impl DerivativeAddressResolver {
    /// Resolver with the default chain: original file, then derivative
    pub fn new(settings: UrlSettings, catalog: Arc<MimeCatalog>) -> Self {
        Self {
            settings,
            strategies: vec![
                Box::new(OriginalFileStrategy::new(catalog)),
                Box::new(DerivativeStrategy),
            ],
        }
    }

    /// Put a strategy ahead of the existing chain
    pub fn with_strategy(mut self, strategy: Box<dyn AddressStrategy>) -> Self {
        self.strategies.insert(0, strategy);
        self
    }

    pub fn settings(&self) -> &UrlSettings {
        &self.settings
    }

    /// Resolve the URL of a document rendition.
    ///
    /// The document must have a local file; callers check
    /// `Document::is_local` first. Raw originals and private documents are
    /// never addressable and fail with `PreconditionViolation` too. The
    /// derivative need not exist yet.
    pub fn resolve(
        &self,
        document: &Document,
        options: &NormalizedOptions,
        absolute: bool,
    ) -> DocumentResult<String> {
        if !document.is_local() {
            return Err(DocumentError::PreconditionViolation(format!(
                "Document {} has no local file",
                document.id
            )));
        }
        if document.is_raw {
            return Err(DocumentError::PreconditionViolation(format!(
                "Document {} is a raw original and is never served",
                document.id
            )));
        }
        if document.is_private() {
            return Err(DocumentError::PreconditionViolation(format!(
                "Document {} is private",
                document.id
            )));
        }

        let strategy = self
            .strategies
            .iter()
            .find(|s| s.supports(document, options))
            .ok_or_else(|| {
                DocumentError::PreconditionViolation(format!(
                    "No address strategy supports document {}",
                    document.id
                ))
            })?;

        let path = strategy.render(document, options, &self.settings);
        match (absolute, self.settings.absolute_host.as_deref()) {
            (true, Some(host)) => Ok(format!("{}{}", host.trim_end_matches('/'), path)),
            _ => Ok(path),
        }
    }
}
