//! Normalising arbitrary failures into [`DnsError`]s.
//!
//! Work that builds a response runs inside an [`ErrorConverter`]. Whatever
//! goes wrong in there comes out as a `DnsError`, so the caller always has an
//! RCODE to answer with.

use log::debug;
use thiserror::Error;

use crate::error::{ContextValue, DnsError, Failure};
use crate::packet::taxonomy::{CodeOrLabel, TaxonomyError, RCODES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverterError {
    #[error("at least one fallback code is required")]
    NoFallback,
    #[error("bad fallback code: {0}")]
    Taxonomy(#[from] TaxonomyError),
}

/// Runs fallible work and turns any failure into a [`DnsError`].
///
/// ```
/// use dns_rr_codec::converter::ErrorConverter;
///
/// let guard = ErrorConverter::new(["SERVFAIL"], Some("resolver"))?;
/// let err = guard
///     .run(|| -> anyhow::Result<()> { anyhow::bail!("upstream timed out") })
///     .unwrap_err();
/// assert_eq!(
///     format!("{:?}", err),
///     "DnsError('SERVFAIL', 2, 'upstream timed out')"
/// );
/// # Ok::<(), dns_rr_codec::converter::ConverterError>(())
/// ```
///
/// The fallback codes are a collection, a lone code does not type check:
///
/// ```compile_fail
/// use dns_rr_codec::converter::ErrorConverter;
///
/// let guard = ErrorConverter::new(3u16, None);
/// ```
#[derive(Debug, Clone)]
pub struct ErrorConverter {
    fallback: Vec<CodeOrLabel>,
    label: &'static str,
    code: u16,
    logger: Option<String>,
}

impl ErrorConverter {
    /// Only the first fallback code is used; it is resolved here so a typo
    /// shows up before any work runs.
    pub fn new<I>(fallback: I, logger: Option<&str>) -> Result<Self, ConverterError>
    where
        I: IntoIterator,
        I::Item: Into<CodeOrLabel>,
    {
        let fallback: Vec<CodeOrLabel> = fallback.into_iter().map(Into::into).collect();
        let first = fallback.first().ok_or(ConverterError::NoFallback)?;
        let (label, code) = RCODES.resolve(first)?;

        Ok(Self {
            fallback,
            label,
            code,
            logger: logger.map(str::to_owned),
        })
    }

    pub fn fallback(&self) -> &[CodeOrLabel] {
        &self.fallback
    }

    pub fn logger(&self) -> Option<&str> {
        self.logger.as_deref()
    }

    pub fn run<T, F>(&self, f: F) -> Result<T, DnsError>
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        f().map_err(|e| self.convert(e))
    }

    /// A `DnsError` is handed back untouched. Anything else is logged and
    /// replaced by the fallback code, carrying the failure's arguments.
    pub fn convert(&self, err: anyhow::Error) -> DnsError {
        let err = match err.downcast::<DnsError>() {
            Ok(dns) => return dns,
            Err(err) => err,
        };

        if let Some(logger) = &self.logger {
            debug!(target: logger.as_str(), "converting to {}: {:#}", self.label, err);
        }

        let context = match err.downcast_ref::<Failure>() {
            Some(failure) => failure.args().to_vec(),
            None => {
                let text = format!("{:#}", err);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![ContextValue::Text(text)]
                }
            }
        };

        DnsError::from_parts(self.label, self.code, context)
    }
}
