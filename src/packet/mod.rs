pub mod parse;
pub mod qname;
pub mod record;
pub mod taxonomy;
