use std::borrow::Cow;
use std::io;

use cookie_factory as cf;
use nom::bytes::complete::take;
use nom::number::complete::be_u8;
use thiserror::Error;

use super::parse::{fail, offset_of, Input, ParseError, ParseResult};

pub const MAX_QNAME_LEN: usize = 255;
pub const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("bogus label length: {0}, expected <= {}", MAX_LABEL_LEN)]
    LabelTooLong(usize),
    #[error("empty label inside a name")]
    EmptyLabel,
    #[error("exceeded maximum name length: {0}, expected <= {}", MAX_QNAME_LEN)]
    NameTooLong(usize),
    #[error("unsupported label encoding {byte:#04x} at offset {offset}")]
    UnsupportedEncoding { offset: usize, byte: u8 },
    #[error("name truncated at offset {offset}")]
    Truncated { offset: usize },
    #[error("label at offset {offset} is not dot-free UTF-8 text")]
    BadLabelText { offset: usize },
    #[error("cannot serialize name: {0}")]
    Serialize(String),
}

/// Split a dotted name into its labels.
///
/// A single trailing dot marks a fully-qualified name and does not produce an
/// empty label, so `"www.example.com."` and `"www.example.com"` encode the same.
pub fn split_name(name: &str) -> Vec<&str> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Vec::new();
    }
    name.split('.').collect()
}

/// Encode a label sequence as `(len, bytes)*` followed by the zero terminator.
pub fn labels_to_bytes<I>(labels: I) -> Result<Vec<u8>, LabelError>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Qname::from_labels(labels)?.to_bytes()
}

/// Decode the labels of a name starting at `start`.
///
/// Returns the offset right after the terminating zero byte together with the
/// decoded labels.
pub fn bytes_to_labels(buf: &[u8], start: usize) -> Result<(usize, Vec<String>), LabelError> {
    let i = buf
        .get(start..)
        .ok_or(LabelError::Truncated { offset: buf.len() })?;

    match read_labels(buf)(i) {
        Ok((rest, labels)) => Ok((offset_of(buf, rest), labels)),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(match e {
            ParseError::Label((_, e)) => e,
            _ => LabelError::Truncated { offset: buf.len() },
        }),
        Err(nom::Err::Incomplete(_)) => Err(LabelError::Truncated { offset: buf.len() }),
    }
}

/// Read a name made of plain labels.
///
/// `buf` is the whole message, it is only used to report absolute offsets.
/// Compression pointers are not followed.
pub fn read_labels<'a>(buf: Input<'a>) -> impl FnMut(Input<'a>) -> ParseResult<'a, Vec<String>> {
    move |mut i: Input<'a>| {
        let mut labels = Vec::new();
        let mut total = 0;

        loop {
            let offset = offset_of(buf, i);
            let (rest, len) = match be_u8::<Input<'a>, ParseError<Input<'a>>>(i) {
                Ok(x) => x,
                Err(_) => return fail(i, LabelError::Truncated { offset: buf.len() }),
            };

            // Names end with the empty root label.
            if len == 0 {
                return Ok((rest, labels));
            }

            // 0b11 is a pointer, 0b01 and 0b10 are reserved label types.
            if len & 0xC0 != 0 {
                return fail(i, LabelError::UnsupportedEncoding { offset, byte: len });
            }

            total += len as usize + 1;
            if total + 1 > MAX_QNAME_LEN {
                return fail(i, LabelError::NameTooLong(total + 1));
            }

            let (rest, raw) = match take::<usize, Input<'a>, ParseError<Input<'a>>>(len as usize)(rest) {
                Ok(x) => x,
                Err(_) => return fail(rest, LabelError::Truncated { offset: buf.len() }),
            };

            // Labels come back joined with dots, so they must not hold one.
            match std::str::from_utf8(raw) {
                Ok(text) if !text.contains('.') => labels.push(text.to_owned()),
                _ => return fail(i, LabelError::BadLabelText { offset }),
            }
            i = rest;
        }
    }
}

/// Validated sequence of labels, ready for the wire.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Qname {
    inner: Vec<Vec<u8>>,
}

impl Qname {
    pub fn from_labels<I>(labels: I) -> Result<Self, LabelError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let checked = labels
            .into_iter()
            .map(|x| {
                let x = x.as_ref();
                match x.len() {
                    0 => Err(LabelError::EmptyLabel),
                    len if len > MAX_LABEL_LEN => Err(LabelError::LabelTooLong(len)),
                    _ => Ok(x.to_vec()),
                }
            })
            .collect::<Result<Vec<_>, LabelError>>()?;

        let qname = Self { inner: checked };
        let size = qname.serialized_size();
        if size > MAX_QNAME_LEN {
            return Err(LabelError::NameTooLong(size));
        }

        Ok(qname)
    }

    pub fn labels(&self) -> impl Iterator<Item = Cow<'_, str>> {
        self.inner.iter().map(|x| String::from_utf8_lossy(x))
    }

    pub fn serialize<'a, W: io::Write + 'a>(&'a self) -> impl cf::SerializeFn<W> + 'a {
        use cf::{bytes::be_u8, combinator::slice, multi::all, sequence::tuple};
        tuple((
            all(self
                .inner
                .iter()
                .map(|x| tuple((be_u8(x.len() as u8), slice(x))))),
            be_u8(0),
        ))
    }

    pub fn serialized_size(&self) -> usize {
        self.inner.iter().map(|x| x.len() + 1).sum::<usize>() + 1
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, LabelError> {
        cf::gen_simple(self.serialize(), Vec::with_capacity(self.serialized_size()))
            .map_err(|e| LabelError::Serialize(format!("{:?}", e)))
    }
}

impl TryFrom<&str> for Qname {
    type Error = LabelError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_labels(split_name(value))
    }
}

impl std::fmt::Display for Qname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<_> = self.labels().collect();
        write!(f, "{}", labels.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_www_example_com() {
        let bytes = labels_to_bytes(split_name("www.example.com")).unwrap();
        assert_eq!(
            bytes,
            b"\x03www\x07example\x03com\x00".to_vec()
        );
    }

    #[test]
    fn encode_root() {
        assert_eq!(labels_to_bytes(split_name("")).unwrap(), vec![0]);
        assert_eq!(labels_to_bytes(split_name(".")).unwrap(), vec![0]);
    }

    #[test]
    fn fully_qualified_matches_partial() {
        assert_eq!(
            labels_to_bytes(split_name("example.org.")).unwrap(),
            labels_to_bytes(split_name("example.org")).unwrap()
        );
    }

    #[test]
    fn decode_what_was_encoded() {
        let names = [
            "www.example.com",
            "a",
            "xn--bcher-kva.example",
            "_sip._tcp.example.net",
            "MiXeD.Case.Org",
        ];

        for name in names {
            let bytes = labels_to_bytes(split_name(name)).unwrap();
            let (end, labels) = bytes_to_labels(&bytes, 0).unwrap();
            assert_eq!(end, bytes.len());
            assert_eq!(labels.join("."), name);
        }
    }

    #[test]
    fn longest_label_is_accepted() {
        let label = "a".repeat(MAX_LABEL_LEN);
        let bytes = labels_to_bytes([label.as_str()]).unwrap();
        assert_eq!(bytes[0] as usize, MAX_LABEL_LEN);
        assert_eq!(bytes.len(), MAX_LABEL_LEN + 2);
    }

    #[test]
    fn label_too_long() {
        let label = "a".repeat(MAX_LABEL_LEN + 1);
        assert_eq!(
            labels_to_bytes(["www", label.as_str()]),
            Err(LabelError::LabelTooLong(MAX_LABEL_LEN + 1))
        );
    }

    #[test]
    fn empty_interior_label() {
        assert_eq!(
            labels_to_bytes(split_name("www..com")),
            Err(LabelError::EmptyLabel)
        );
    }

    #[test]
    fn name_too_long() {
        let label = "a".repeat(MAX_LABEL_LEN);
        let labels = vec![label.as_str(); 4];
        assert_eq!(
            labels_to_bytes(labels),
            Err(LabelError::NameTooLong(4 * (MAX_LABEL_LEN + 1) + 1))
        );
    }

    #[test]
    fn decode_from_offset() {
        let data = b"\xff\xff\x03foo\x03bar\x00\x01";
        let (end, labels) = bytes_to_labels(data, 2).unwrap();
        assert_eq!(end, 11);
        assert_eq!(labels, vec!["foo", "bar"]);
    }

    #[test]
    fn decode_compression_pointer() {
        let data = b"\x03www\xc0\x0c";
        assert_eq!(
            bytes_to_labels(data, 0),
            Err(LabelError::UnsupportedEncoding {
                offset: 4,
                byte: 0xc0
            })
        );
    }

    #[test]
    fn decode_reserved_label_type() {
        let data = b"\x41abc\x00";
        assert!(matches!(
            bytes_to_labels(data, 0),
            Err(LabelError::UnsupportedEncoding { offset: 0, .. })
        ));
    }

    #[test]
    fn decode_label_with_dot() {
        let data = b"\x03foo\x03a.b\x00";
        assert_eq!(
            bytes_to_labels(data, 0),
            Err(LabelError::BadLabelText { offset: 4 })
        );
    }

    #[test]
    fn decode_non_utf8_label() {
        let data = b"\x02\xff\xfe\x00";
        assert_eq!(
            bytes_to_labels(data, 0),
            Err(LabelError::BadLabelText { offset: 0 })
        );
    }

    #[test]
    fn decode_bad_buffer() {
        let data = b"\x03www\x07example\x03com\x00";

        for i in 0..data.len() {
            assert_eq!(
                bytes_to_labels(&data[..i], 0),
                Err(LabelError::Truncated { offset: i })
            );
        }
        assert!(bytes_to_labels(data, 0).is_ok());
        assert_eq!(
            bytes_to_labels(data, data.len() + 1),
            Err(LabelError::Truncated { offset: data.len() })
        );
    }

    #[test]
    fn qname_display() {
        let qname = Qname::try_from("mail.example.com.").unwrap();
        assert_eq!(qname.to_string(), "mail.example.com");
        assert_eq!(qname.serialized_size(), 18);
    }
}
