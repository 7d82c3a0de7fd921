use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};

use cookie_factory as cf;
use nom::{
    bytes::complete::take,
    number::complete::{be_u16, be_u32},
    sequence::tuple,
};
use thiserror::Error;

use super::{
    parse::{fail, offset_of, Input, ParseError, ParseResult},
    qname::{read_labels, LabelError, Qname},
    taxonomy::{CodeOrLabel, TaxonomyError, RECORD_CLASSES, RECORD_TYPES},
};

/// type, class, ttl and rdlength
pub const RECORD_HEADER_LEN: usize = 10;
pub const DEFAULT_TTL: u32 = 1800;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error("invalid name: {0}")]
    Label(#[from] LabelError),
    #[error("invalid {rtype} address: {rdata:?}")]
    InvalidAddress { rtype: &'static str, rdata: String },
    #[error("bogus {rtype} rdata length: {len}, expected {expected}")]
    BadAddressLength {
        rtype: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("rdata is not valid UTF-8 text")]
    RdataNotText,
    #[error("rdata too long: {0} bytes, expected <= {}", u16::MAX)]
    RdataTooLong(usize),
    #[error("record truncated at offset {offset}: {needed} bytes needed, {available} available")]
    TruncatedRecord {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("cannot serialize record: {0}")]
    Serialize(String),
}

/// Fixed-size part of a record following its name.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RecordHeader {
    rtype: u16,
    rclass: u16,
    ttl: u32,
    rdlength: u16,
}

impl RecordHeader {
    fn parse(i: Input) -> ParseResult<Self> {
        let (i, (rtype, rclass, ttl, rdlength)) = tuple((be_u16, be_u16, be_u32, be_u16))(i)?;

        Ok((
            i,
            Self {
                rtype,
                rclass,
                ttl,
                rdlength,
            },
        ))
    }

    fn serialize<W: io::Write>(self) -> impl cf::SerializeFn<W> {
        use cf::{
            bytes::{be_u16, be_u32},
            sequence::tuple,
        };

        tuple((
            be_u16(self.rtype),
            be_u16(self.rclass),
            be_u32(self.ttl),
            be_u16(self.rdlength),
        ))
    }
}

/// A single resource record.
///
/// Type and class are kept as their canonical labels, the numeric codes are
/// looked up whenever they are needed. Records are immutable: the packed rdata
/// is computed once in [`Record::new`] and always matches `rdata`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    domain_name: String,
    rdata: String,
    rtype: &'static str,
    rttl: u32,
    rclass: &'static str,
    rdata_packed: Vec<u8>,
}

impl Record {
    pub fn new(
        domain_name: impl Into<String>,
        rdata: impl Into<String>,
        rtype: impl Into<CodeOrLabel>,
        rttl: u32,
        rclass: impl Into<CodeOrLabel>,
    ) -> Result<Self, RecordError> {
        let rtype = RECORD_TYPES.get_label(&rtype.into())?;
        let rclass = RECORD_CLASSES.get_label(&rclass.into())?;
        let rdata = rdata.into();
        let rdata_packed = pack_rdata(rtype, &rdata)?;

        Ok(Self {
            domain_name: domain_name.into(),
            rdata,
            rtype,
            rttl,
            rclass,
            rdata_packed,
        })
    }

    /// An `IN A` record with the default TTL.
    pub fn with_defaults(
        domain_name: impl Into<String>,
        rdata: impl Into<String>,
    ) -> Result<Self, RecordError> {
        Self::new(domain_name, rdata, "A", DEFAULT_TTL, "IN")
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn rdata(&self) -> &str {
        &self.rdata
    }

    pub fn rtype(&self) -> &'static str {
        self.rtype
    }

    pub fn rttl(&self) -> u32 {
        self.rttl
    }

    pub fn rclass(&self) -> &'static str {
        self.rclass
    }

    pub fn rdata_packed(&self) -> &[u8] {
        &self.rdata_packed
    }

    pub fn rtype_code(&self) -> Result<u16, TaxonomyError> {
        RECORD_TYPES.code(self.rtype)
    }

    pub fn rclass_code(&self) -> Result<u16, TaxonomyError> {
        RECORD_CLASSES.code(self.rclass)
    }

    fn header(&self) -> Result<RecordHeader, RecordError> {
        let len = self.rdata_packed.len();
        Ok(RecordHeader {
            rtype: self.rtype_code()?,
            rclass: self.rclass_code()?,
            ttl: self.rttl,
            rdlength: u16::try_from(len).map_err(|_| RecordError::RdataTooLong(len))?,
        })
    }

    pub fn serialize<'a, W: io::Write + 'a>(
        &'a self,
        name: &'a Qname,
    ) -> Result<impl cf::SerializeFn<W> + 'a, RecordError> {
        use cf::{combinator::slice, sequence::tuple};

        let header = self.header()?;
        Ok(tuple((
            name.serialize(),
            header.serialize(),
            slice(&self.rdata_packed),
        )))
    }

    /// Wire form of the record: name, fixed header, rdata.
    pub fn pack(&self) -> Result<Vec<u8>, RecordError> {
        let name = Qname::try_from(self.domain_name.as_str())?;
        let out = Vec::with_capacity(
            name.serialized_size() + RECORD_HEADER_LEN + self.rdata_packed.len(),
        );

        let serializer = self.serialize(&name)?;
        cf::gen_simple(serializer, out).map_err(|e| RecordError::Serialize(format!("{:?}", e)))
    }

    /// Parse a record at `i`; `buf` is the enclosing message.
    pub fn parse<'a>(i: Input<'a>, buf: Input<'a>) -> ParseResult<'a, Self> {
        let (i, labels) = read_labels(buf)(i)?;

        let offset = offset_of(buf, i);
        let (i, header) = match RecordHeader::parse(i) {
            Ok(x) => x,
            Err(_) => {
                return fail(
                    i,
                    RecordError::TruncatedRecord {
                        offset,
                        needed: RECORD_HEADER_LEN,
                        available: i.len(),
                    },
                )
            }
        };

        let offset = offset_of(buf, i);
        let needed = header.rdlength as usize;
        let (i, raw) = match take::<usize, Input<'a>, ParseError<Input<'a>>>(needed)(i) {
            Ok(x) => x,
            Err(_) => {
                return fail(
                    i,
                    RecordError::TruncatedRecord {
                        offset,
                        needed,
                        available: i.len(),
                    },
                )
            }
        };

        match Self::decode(labels, header, raw) {
            Ok(record) => Ok((i, record)),
            Err(e) => fail(i, e),
        }
    }

    fn decode(labels: Vec<String>, header: RecordHeader, raw: &[u8]) -> Result<Self, RecordError> {
        let rtype = RECORD_TYPES.label(header.rtype)?;
        let rclass = RECORD_CLASSES.label(header.rclass)?;
        let rdata = unpack_rdata(rtype, raw)?;

        Ok(Self {
            domain_name: labels.join("."),
            rdata,
            rtype,
            rttl: header.ttl,
            rclass,
            rdata_packed: raw.to_vec(),
        })
    }

    /// Decode the record at the start of `source`.
    ///
    /// Returns the number of bytes consumed together with the record, so the
    /// caller can continue with whatever follows.
    pub fn unpack(source: &[u8]) -> Result<(usize, Self), RecordError> {
        match Self::parse(source, source) {
            Ok((rest, record)) => Ok((offset_of(source, rest), record)),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(match e {
                ParseError::Record((_, e)) => e,
                ParseError::Label((_, e)) => e.into(),
                ParseError::Nom((i, _)) => RecordError::TruncatedRecord {
                    offset: offset_of(source, i),
                    needed: 1,
                    available: i.len(),
                },
            }),
            Err(nom::Err::Incomplete(_)) => Err(RecordError::TruncatedRecord {
                offset: source.len(),
                needed: 1,
                available: 0,
            }),
        }
    }
}

impl fmt::Display for Record {
    /// Zone-file style: `www.example.com. 1800 IN A 192.0.2.1`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.domain_name.strip_suffix('.').unwrap_or(&self.domain_name);
        write!(
            f,
            "{}. {} {} {} {}",
            name, self.rttl, self.rclass, self.rtype, self.rdata
        )
    }
}

/// Binary form of `rdata` for the given record type.
pub fn pack_rdata(rtype: &'static str, rdata: &str) -> Result<Vec<u8>, RecordError> {
    let invalid = || RecordError::InvalidAddress {
        rtype,
        rdata: rdata.to_owned(),
    };

    match rtype {
        "A" => rdata
            .parse::<Ipv4Addr>()
            .map(|addr| addr.octets().to_vec())
            .map_err(|_| invalid()),
        "AAAA" => rdata
            .parse::<Ipv6Addr>()
            .map(|addr| addr.octets().to_vec())
            .map_err(|_| invalid()),
        _ => Ok(rdata.as_bytes().to_vec()),
    }
}

/// Text form of raw rdata, the inverse of [`pack_rdata`].
pub fn unpack_rdata(rtype: &'static str, raw: &[u8]) -> Result<String, RecordError> {
    let bad_len = |expected| RecordError::BadAddressLength {
        rtype,
        len: raw.len(),
        expected,
    };

    match rtype {
        "A" => {
            let octets = <[u8; 4]>::try_from(raw).map_err(|_| bad_len(4))?;
            Ok(Ipv4Addr::from(octets).to_string())
        }
        "AAAA" => {
            let octets = <[u8; 16]>::try_from(raw).map_err(|_| bad_len(16))?;
            Ok(Ipv6Addr::from(octets).to_string())
        }
        _ => String::from_utf8(raw.to_vec()).map_err(|_| RecordError::RdataNotText),
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::packet::qname::MAX_LABEL_LEN;

    fn get_data(path: &str) -> Vec<u8> {
        let path = Path::new(path);
        std::fs::read(path).expect("cannot read file")
    }

    const A_RECORD_LEN: usize = 31;

    #[test]
    fn pack_a_record() {
        let data = get_data("test_data/www_example_com_a.bin");
        let record = Record::new("www.example.com", "1.2.3.4", "A", 1800, "IN").unwrap();

        assert_eq!(record.pack().unwrap(), &data[..A_RECORD_LEN]);
    }

    #[test]
    fn unpack_a_record() {
        let data = get_data("test_data/www_example_com_a.bin");
        let (consumed, record) = Record::unpack(&data).unwrap();

        // The fixture carries the first bytes of a following record.
        assert_eq!(consumed, A_RECORD_LEN);
        assert!(data.len() > consumed);

        assert_eq!(record.domain_name(), "www.example.com");
        assert_eq!(record.rdata(), "1.2.3.4");
        assert_eq!(record.rtype(), "A");
        assert_eq!(record.rttl(), 1800);
        assert_eq!(record.rclass(), "IN");
        assert_eq!(record.rdata_packed(), &[1, 2, 3, 4]);
    }

    #[test]
    fn defaults() {
        let record = Record::with_defaults("example.com", "192.0.2.1").unwrap();
        assert_eq!(record.rtype(), "A");
        assert_eq!(record.rttl(), DEFAULT_TTL);
        assert_eq!(record.rclass(), "IN");
        assert_eq!(record.rtype_code(), Ok(1));
        assert_eq!(record.rclass_code(), Ok(1));
    }

    #[test]
    fn type_and_class_from_codes() {
        let record = Record::new(
            "example.com",
            "::1",
            CodeOrLabel::Code(28),
            60,
            CodeOrLabel::Code(1),
        )
        .unwrap();

        assert_eq!(record.rtype(), "AAAA");
        assert_eq!(record.rclass(), "IN");
        assert_eq!(record.rtype_code(), Ok(28));
    }

    #[test]
    fn unknown_type() {
        assert_eq!(
            Record::new("example.com", "x", "BOGUS", 60, "IN"),
            Err(RecordError::Taxonomy(TaxonomyError::UnknownLabel {
                table: "record type",
                label: "BOGUS".into()
            }))
        );
        assert!(matches!(
            Record::new("example.com", "x", "TXT", 60, "in"),
            Err(RecordError::Taxonomy(TaxonomyError::UnknownLabel { .. }))
        ));
    }

    #[test]
    fn a_round_trip() {
        let record = Record::new("host.example.org", "203.0.113.7", "A", 3600, "IN").unwrap();
        let packed = record.pack().unwrap();
        let (consumed, unpacked) = Record::unpack(&packed).unwrap();

        assert_eq!(consumed, packed.len());
        assert_eq!(unpacked.domain_name(), record.domain_name());
        assert_eq!(unpacked.rttl(), record.rttl());
        assert_eq!(unpacked.rdata(), record.rdata());
        assert_eq!(unpacked, record);
    }

    #[test]
    fn aaaa_round_trip() {
        let record = Record::new("v6.example.org", "2001:db8::1", "AAAA", 300, "IN").unwrap();
        assert_eq!(record.rdata_packed().len(), 16);

        let packed = record.pack().unwrap();
        assert_eq!(packed.len(), 16 + RECORD_HEADER_LEN + 16);

        let (consumed, unpacked) = Record::unpack(&packed).unwrap();
        assert_eq!(consumed, packed.len());
        assert_eq!(unpacked.domain_name(), "v6.example.org");
        assert_eq!(unpacked.rdata(), "2001:db8::1");
        assert_eq!(unpacked.rttl(), 300);
    }

    #[test]
    fn text_rdata_round_trip() {
        let record = Record::new("example.com", "v=spf1 -all", "TXT", 60, "IN").unwrap();
        assert_eq!(record.rdata_packed(), b"v=spf1 -all");

        let (_, unpacked) = Record::unpack(&record.pack().unwrap()).unwrap();
        assert_eq!(unpacked.rtype(), "TXT");
        assert_eq!(unpacked.rdata(), "v=spf1 -all");
    }

    #[test]
    fn fully_qualified_name() {
        let fqdn = Record::with_defaults("www.example.com.", "1.2.3.4").unwrap();
        let pqdn = Record::with_defaults("www.example.com", "1.2.3.4").unwrap();
        assert_eq!(fqdn.pack().unwrap(), pqdn.pack().unwrap());
        assert_eq!(fqdn.to_string(), "www.example.com. 1800 IN A 1.2.3.4");
    }

    #[test]
    fn invalid_address() {
        assert_eq!(
            Record::with_defaults("example.com", "300.1.1.1"),
            Err(RecordError::InvalidAddress {
                rtype: "A",
                rdata: "300.1.1.1".into()
            })
        );
        assert!(matches!(
            Record::new("example.com", "1.2.3.4", "AAAA", 60, "IN"),
            Err(RecordError::InvalidAddress { rtype: "AAAA", .. })
        ));
    }

    #[test]
    fn pack_label_too_long() {
        let name = format!("{}.example.com", "a".repeat(MAX_LABEL_LEN + 1));
        let record = Record::with_defaults(name, "1.2.3.4").unwrap();
        assert_eq!(
            record.pack(),
            Err(RecordError::Label(LabelError::LabelTooLong(MAX_LABEL_LEN + 1)))
        );
    }

    #[test]
    fn pack_rdata_too_long() {
        let rdata = "x".repeat(u16::MAX as usize + 1);
        let record = Record::new("example.com", rdata, "TXT", 60, "IN").unwrap();
        assert_eq!(
            record.pack(),
            Err(RecordError::RdataTooLong(u16::MAX as usize + 1))
        );
    }

    #[test]
    fn truncated_rdata() {
        let data = get_data("test_data/www_example_com_a.bin");
        assert_eq!(
            Record::unpack(&data[..29]),
            Err(RecordError::TruncatedRecord {
                offset: 27,
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn truncated_header() {
        let data = get_data("test_data/www_example_com_a.bin");
        assert_eq!(
            Record::unpack(&data[..20]),
            Err(RecordError::TruncatedRecord {
                offset: 17,
                needed: RECORD_HEADER_LEN,
                available: 3
            })
        );
    }

    #[test]
    fn truncated_anywhere() {
        let data = get_data("test_data/www_example_com_a.bin");

        for i in 0..A_RECORD_LEN {
            assert!(Record::unpack(&data[..i]).is_err(), "prefix of {i} bytes");
        }
        assert!(Record::unpack(&data[..A_RECORD_LEN]).is_ok());
    }

    #[test]
    fn unknown_type_code() {
        let mut data = get_data("test_data/www_example_com_a.bin");
        // rtype lives right after the 17 byte name
        data[17] = 0x12;
        data[18] = 0x34;

        assert_eq!(
            Record::unpack(&data),
            Err(RecordError::Taxonomy(TaxonomyError::UnknownCode {
                table: "record type",
                code: 0x1234
            }))
        );
    }

    #[test]
    fn bad_address_length() {
        let data = b"\x01a\x00\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x03\x7f\x00\x01";
        assert_eq!(
            Record::unpack(data),
            Err(RecordError::BadAddressLength {
                rtype: "A",
                len: 3,
                expected: 4
            })
        );
    }

    #[test]
    fn compressed_name() {
        let data = b"\xc0\x0c\x00\x01\x00\x01\x00\x00\x00\x3c\x00\x04\x7f\x00\x00\x01";
        assert_eq!(
            Record::unpack(data),
            Err(RecordError::Label(LabelError::UnsupportedEncoding {
                offset: 0,
                byte: 0xc0
            }))
        );
    }

    #[test]
    fn binary_text_rdata() {
        let data = b"\x01a\x00\x00\x10\x00\x01\x00\x00\x00\x3c\x00\x02\xff\xfe";
        assert_eq!(Record::unpack(data), Err(RecordError::RdataNotText));
    }

    #[test]
    fn dotted_label_is_rejected() {
        let data = b"\x03a.b\x00\x00\x10\x00\x01\x00\x00\x00\x3c\x00\x01x";
        assert_eq!(
            Record::unpack(data),
            Err(RecordError::Label(LabelError::BadLabelText { offset: 0 }))
        );
    }

    #[test]
    fn binary_label_is_rejected() {
        let data = b"\x02\xff\xfe\x00\x00\x10\x00\x01\x00\x00\x00\x3c\x00\x01x";
        assert_eq!(
            Record::unpack(data),
            Err(RecordError::Label(LabelError::BadLabelText { offset: 0 }))
        );
    }
}
