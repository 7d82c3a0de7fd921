//! Structured DNS errors.
//!
//! A [`DnsError`] is the only failure handed back across a guarded boundary
//! (see [`crate::converter`]). It names an RCODE by both label and number, and
//! may carry extra values describing what went wrong.

use std::fmt;

use thiserror::Error;
use ux::u4;

use crate::packet::taxonomy::{CodeOrLabel, TaxonomyError, RCODES};

/// A diagnostic value attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for ContextValue {
    /// Quoted text, bare integers: `'SERVFAIL'`, `2`.
    ///
    /// Text holding a single quote but no double quote is wrapped in double
    /// quotes instead: `"You're late"`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => write!(f, "{x}"),
            Self::Text(x) if x.contains('\'') && !x.contains('"') => {
                write!(f, "\"{}\"", x.replace('\\', "\\\\"))
            }
            Self::Text(x) => write!(f, "'{}'", x.replace('\\', "\\\\").replace('\'', "\\'")),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u16> for ContextValue {
    fn from(value: u16) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

fn join(values: &[ContextValue]) -> String {
    values
        .iter()
        .map(ContextValue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A plain failure described by a list of values.
///
/// When a `Failure` is converted into a [`DnsError`], its values become the
/// error's context as they are, instead of a single line of text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{}", render_failure(.args))]
pub struct Failure {
    args: Vec<ContextValue>,
}

fn render_failure(args: &[ContextValue]) -> String {
    match args {
        [] => String::new(),
        [ContextValue::Text(x)] => x.clone(),
        [x] => x.to_string(),
        _ => format!("({})", join(args)),
    }
}

impl Failure {
    pub fn new<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ContextValue>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[ContextValue] {
        &self.args
    }
}

/// An RCODE with its canonical label and optional context.
///
/// Equality and hashing cover the whole `(label, code, *context)` tuple.
#[derive(Clone, PartialEq, Eq, Hash, Error)]
#[error("{label} (rcode {code}){}", render_context(.context))]
pub struct DnsError {
    label: &'static str,
    code: u16,
    context: Vec<ContextValue>,
}

fn render_context(context: &[ContextValue]) -> String {
    if context.is_empty() {
        String::new()
    } else {
        format!(": {}", join(context))
    }
}

impl DnsError {
    pub fn new(key: impl Into<CodeOrLabel>) -> Result<Self, TaxonomyError> {
        Self::with_context(key, Vec::new())
    }

    pub fn with_context(
        key: impl Into<CodeOrLabel>,
        context: Vec<ContextValue>,
    ) -> Result<Self, TaxonomyError> {
        let (label, code) = RCODES.resolve(&key.into())?;
        Ok(Self::from_parts(label, code, context))
    }

    /// Build from a pair already resolved against the RCODE table.
    pub(crate) fn from_parts(label: &'static str, code: u16, context: Vec<ContextValue>) -> Self {
        Self {
            label,
            code,
            context,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn context(&self) -> &[ContextValue] {
        &self.context
    }

    /// The canonical argument tuple: label, code, then the context values.
    pub fn args(&self) -> Vec<ContextValue> {
        let mut args = Vec::with_capacity(self.context.len() + 2);
        args.push(ContextValue::from(self.label));
        args.push(ContextValue::from(self.code));
        args.extend(self.context.iter().cloned());
        args
    }

    /// Value for the 4-bit RCODE field of a message header, if the code fits.
    pub fn header_rcode(&self) -> Option<u4> {
        if self.code <= 0xF {
            Some(u4::new(self.code as u8))
        } else {
            None
        }
    }
}

impl fmt::Debug for DnsError {
    /// Call-style form, e.g. `DnsError('NXDOMAIN', 3)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DnsError({})", join(&self.args()))
    }
}
