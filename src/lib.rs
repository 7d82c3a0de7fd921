//! Single DNS resource records on the wire, and DNS-shaped errors.
//!
//! [`Record`] packs and unpacks one resource record. [`DnsError`] names an
//! RCODE, and [`ErrorConverter`] makes sure anything that fails while building
//! a response surfaces as one.

pub mod converter;
pub mod error;
pub mod logging;
pub mod packet;

pub use converter::{ConverterError, ErrorConverter};
pub use error::{ContextValue, DnsError, Failure};
pub use packet::qname::{bytes_to_labels, labels_to_bytes, LabelError};
pub use packet::record::{Record, RecordError};
pub use packet::taxonomy::{CodeOrLabel, TaxonomyError};
