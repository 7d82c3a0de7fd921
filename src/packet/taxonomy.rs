//! Fixed code/label tables.
//!
//! Response codes, record types and record classes all follow the same shape:
//! a numeric wire value paired with a canonical uppercase mnemonic. Each table
//! keeps a forward and an inverse map so both directions are a single lookup.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("unknown {table} code: {code}")]
    UnknownCode { table: &'static str, code: u16 },
    #[error("unknown {table} label: {label:?}")]
    UnknownLabel { table: &'static str, label: String },
}

/// Either side of a table entry, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CodeOrLabel {
    Code(u16),
    Label(String),
}

impl From<u16> for CodeOrLabel {
    fn from(value: u16) -> Self {
        Self::Code(value)
    }
}

impl From<&str> for CodeOrLabel {
    fn from(value: &str) -> Self {
        Self::Label(value.to_owned())
    }
}

impl From<String> for CodeOrLabel {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

/// Digits name a code, anything else a label.
impl FromStr for CodeOrLabel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<u16>() {
            Ok(code) => Self::Code(code),
            Err(_) => Self::Label(s.to_owned()),
        })
    }
}

impl fmt::Display for CodeOrLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Label(label) => write!(f, "{label}"),
        }
    }
}

pub struct Taxonomy {
    name: &'static str,
    entries: &'static [(u16, &'static str)],
    by_code: HashMap<u16, &'static str>,
    by_label: HashMap<&'static str, u16>,
}

impl Taxonomy {
    fn new(name: &'static str, entries: &'static [(u16, &'static str)]) -> Self {
        Self {
            name,
            entries,
            by_code: entries.iter().copied().collect(),
            by_label: entries.iter().map(|&(code, label)| (label, code)).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn label(&self, code: u16) -> Result<&'static str, TaxonomyError> {
        self.by_code
            .get(&code)
            .copied()
            .ok_or(TaxonomyError::UnknownCode {
                table: self.name,
                code,
            })
    }

    /// Exact, case-sensitive match against the canonical labels.
    pub fn code(&self, label: &str) -> Result<u16, TaxonomyError> {
        self.by_label
            .get(label)
            .copied()
            .ok_or_else(|| TaxonomyError::UnknownLabel {
                table: self.name,
                label: label.to_owned(),
            })
    }

    /// Canonical `(label, code)` pair for either side of an entry.
    pub fn resolve(&self, key: &CodeOrLabel) -> Result<(&'static str, u16), TaxonomyError> {
        match key {
            CodeOrLabel::Code(code) => Ok((self.label(*code)?, *code)),
            CodeOrLabel::Label(label) => {
                let code = self.code(label)?;
                // Hand back the table's own string rather than the caller's.
                Ok((self.label(code)?, code))
            }
        }
    }

    pub fn get_label(&self, key: &CodeOrLabel) -> Result<&'static str, TaxonomyError> {
        self.resolve(key).map(|(label, _)| label)
    }

    /// Entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'static str)> {
        self.entries.iter().copied()
    }
}

impl fmt::Debug for Taxonomy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Taxonomy")
            .field("name", &self.name)
            .field("entries", &self.entries)
            .finish()
    }
}

const RCODE_ENTRIES: &[(u16, &str)] = &[
    (0, "NOERROR"),
    (1, "FORMERR"),
    (2, "SERVFAIL"),
    (3, "NXDOMAIN"),
    (4, "NOTIMP"),
    (5, "REFUSED"),
    (6, "YXDOMAIN"),
    (7, "YXRRSET"),
    (8, "NXRRSET"),
    (9, "NOTAUTH"),
    (10, "NOTZONE"),
    (11, "BADVERS"),
    (12, "BADSIG"),
    (13, "BADKEY"),
    (14, "BADTIME"),
];

const RECORD_TYPE_ENTRIES: &[(u16, &str)] = &[
    (1, "A"),     // a host address
    (2, "NS"),    // an authoritative name server
    (3, "MD"),    // obsolete, use MX
    (4, "MF"),    // obsolete, use MX
    (5, "CNAME"), // the canonical name for an alias
    (6, "SOA"),   // marks the start of a zone of authority
    (7, "MB"),
    (8, "MG"),
    (9, "MR"),
    (10, "NULL"),
    (11, "WKS"), // a well known service description
    (12, "PTR"), // a domain name pointer
    (13, "HINFO"),
    (14, "MINFO"),
    (15, "MX"), // mail exchange
    (16, "TXT"),
    (28, "AAAA"),
    (33, "SRV"),
    (252, "AXFR"),
    (253, "MAILB"),
    (254, "MAILA"),
    (255, "*"),
];

const RECORD_CLASS_ENTRIES: &[(u16, &str)] = &[
    (1, "IN"),
    (2, "CS"),
    (3, "CH"),
    (4, "HS"),
    (255, "*"),
];

pub static RCODES: LazyLock<Taxonomy> = LazyLock::new(|| Taxonomy::new("rcode", RCODE_ENTRIES));

pub static RECORD_TYPES: LazyLock<Taxonomy> =
    LazyLock::new(|| Taxonomy::new("record type", RECORD_TYPE_ENTRIES));

pub static RECORD_CLASSES: LazyLock<Taxonomy> =
    LazyLock::new(|| Taxonomy::new("record class", RECORD_CLASS_ENTRIES));
