use crate::{protocol::ItemFormat, SecsError, SecsResult};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};

// Largest body an item can declare: the 4-byte count form does not exist on
// the wire, so three length bytes are the maximum.
const MAX_ITEM_LENGTH: usize = 0xFF_FFFF;

// UCS-2 type tag that precedes the characters of every wide-string item.
const WIDE_PREFIX: [u8; 2] = [0x00, 0x01];

/// A SECS-II value tree.
///
/// Every message body is one `SecsValue`; nested structure is expressed with
/// [`List`](Self::List). Scalar and array variants of the same numeric type
/// are distinct so that a received item keeps its wire shape: a one-element
/// `U1` item parses as [`U1`](Self::U1), never as a one-element array, and a
/// one-byte binary item parses as [`Binary`](Self::Binary) even though the
/// two share a byte representation.
#[derive(Clone, Debug, PartialEq)]
pub enum SecsValue {
    /// Absent value; encodes to nothing and is skipped inside lists.
    Empty,
    /// Single boolean.
    Bool(bool),
    /// Single signed 8-bit integer.
    I1(i8),
    /// Single signed 16-bit integer.
    I2(i16),
    /// Single signed 32-bit integer.
    I4(i32),
    /// Single signed 64-bit integer.
    I8(i64),
    /// Single unsigned 8-bit integer.
    U1(u8),
    /// Single unsigned 16-bit integer.
    U2(u16),
    /// Single unsigned 32-bit integer.
    U4(u32),
    /// Single unsigned 64-bit integer.
    U8(u64),
    /// Single 32-bit float.
    F4(f32),
    /// Single 64-bit float.
    F8(f64),
    /// ASCII character string. A string containing bytes outside printable
    /// 7-bit ASCII is emitted as a wide string instead.
    Ascii(String),
    /// JIS-8 character string, kept as raw bytes.
    Jis8(Vec<u8>),
    /// Two-byte character string (UCS-2, big-endian). Characters outside the
    /// basic multilingual plane are emitted as U+FFFD.
    Wide(String),
    /// Binary octets.
    Binary(Vec<u8>),
    /// Boolean array.
    BoolArray(Vec<bool>),
    /// Signed 8-bit array.
    I1Array(Vec<i8>),
    /// Signed 16-bit array.
    I2Array(Vec<i16>),
    /// Signed 32-bit array.
    I4Array(Vec<i32>),
    /// Signed 64-bit array.
    I8Array(Vec<i64>),
    /// Unsigned 8-bit array. Distinct from [`Binary`](Self::Binary).
    U1Array(Vec<u8>),
    /// Unsigned 16-bit array.
    U2Array(Vec<u16>),
    /// Unsigned 32-bit array.
    U4Array(Vec<u32>),
    /// Unsigned 64-bit array.
    U8Array(Vec<u64>),
    /// 32-bit float array.
    F4Array(Vec<f32>),
    /// 64-bit float array.
    F8Array(Vec<f64>),
    /// List of values.
    List(Vec<SecsValue>),
    /// Ordered name/value pairs, emitted with the conventional
    /// list-of-two-element-lists encoding. Names must be unique and
    /// non-empty. The wire form is indistinguishable from a literal list,
    /// so it parses back as the equivalent [`List`](Self::List) shape.
    NameValueSet(Vec<(String, SecsValue)>),
}

impl SecsValue {
    /// Convenience constructor for an ASCII value.
    pub fn ascii(s: impl Into<String>) -> Self {
        Self::Ascii(s.into())
    }

    /// Convenience constructor for a list value.
    pub fn list(elements: impl Into<Vec<SecsValue>>) -> Self {
        Self::List(elements.into())
    }

    /// The item format this value is emitted with.
    ///
    /// `Ascii` reports [`ItemFormat::Wide`] when its content forces the
    /// wide-string upgrade.
    pub fn format(&self) -> ItemFormat {
        match self {
            Self::Empty => ItemFormat::None,
            Self::Bool(_) | Self::BoolArray(_) => ItemFormat::Boolean,
            Self::I1(_) | Self::I1Array(_) => ItemFormat::I1,
            Self::I2(_) | Self::I2Array(_) => ItemFormat::I2,
            Self::I4(_) | Self::I4Array(_) => ItemFormat::I4,
            Self::I8(_) | Self::I8Array(_) => ItemFormat::I8,
            Self::U1(_) | Self::U1Array(_) => ItemFormat::U1,
            Self::U2(_) | Self::U2Array(_) => ItemFormat::U2,
            Self::U4(_) | Self::U4Array(_) => ItemFormat::U4,
            Self::U8(_) | Self::U8Array(_) => ItemFormat::U8,
            Self::F4(_) | Self::F4Array(_) => ItemFormat::F4,
            Self::F8(_) | Self::F8Array(_) => ItemFormat::F8,
            Self::Ascii(s) => {
                if is_printable_ascii(s) {
                    ItemFormat::Ascii
                } else {
                    ItemFormat::Wide
                }
            }
            Self::Jis8(_) => ItemFormat::Jis8,
            Self::Wide(_) => ItemFormat::Wide,
            Self::Binary(_) => ItemFormat::Binary,
            Self::List(_) | Self::NameValueSet(_) => ItemFormat::List,
        }
    }

    /// Emits the value as a self-delimiting item sequence.
    ///
    /// `Empty` emits nothing; everything else emits exactly one item.
    pub fn emit(&self, w: &mut dyn std::io::Write) -> SecsResult<()> {
        match self {
            Self::Empty => Ok(()),

            Self::Bool(b) => {
                emit_item_header(ItemFormat::Boolean, 1, w)?;
                Ok(w.write_u8(u8::from(*b))?)
            }
            Self::I1(i) => {
                emit_item_header(ItemFormat::I1, 1, w)?;
                Ok(w.write_i8(*i)?)
            }
            Self::I2(i) => {
                emit_item_header(ItemFormat::I2, 2, w)?;
                Ok(w.write_i16::<BigEndian>(*i)?)
            }
            Self::I4(i) => {
                emit_item_header(ItemFormat::I4, 4, w)?;
                Ok(w.write_i32::<BigEndian>(*i)?)
            }
            Self::I8(i) => {
                emit_item_header(ItemFormat::I8, 8, w)?;
                Ok(w.write_i64::<BigEndian>(*i)?)
            }
            Self::U1(u) => {
                emit_item_header(ItemFormat::U1, 1, w)?;
                Ok(w.write_u8(*u)?)
            }
            Self::U2(u) => {
                emit_item_header(ItemFormat::U2, 2, w)?;
                Ok(w.write_u16::<BigEndian>(*u)?)
            }
            Self::U4(u) => {
                emit_item_header(ItemFormat::U4, 4, w)?;
                Ok(w.write_u32::<BigEndian>(*u)?)
            }
            Self::U8(u) => {
                emit_item_header(ItemFormat::U8, 8, w)?;
                Ok(w.write_u64::<BigEndian>(*u)?)
            }
            Self::F4(f) => {
                emit_item_header(ItemFormat::F4, 4, w)?;
                Ok(w.write_f32::<BigEndian>(*f)?)
            }
            Self::F8(f) => {
                emit_item_header(ItemFormat::F8, 8, w)?;
                Ok(w.write_f64::<BigEndian>(*f)?)
            }

            Self::Ascii(s) => {
                if is_printable_ascii(s) {
                    emit_item_header(ItemFormat::Ascii, s.len(), w)?;
                    Ok(w.write_all(s.as_bytes())?)
                } else {
                    emit_wide(s, w)
                }
            }
            Self::Wide(s) => emit_wide(s, w),
            Self::Jis8(bytes) => {
                emit_item_header(ItemFormat::Jis8, bytes.len(), w)?;
                Ok(w.write_all(bytes)?)
            }
            Self::Binary(bytes) => {
                emit_item_header(ItemFormat::Binary, bytes.len(), w)?;
                Ok(w.write_all(bytes)?)
            }

            Self::BoolArray(bs) => {
                emit_item_header(ItemFormat::Boolean, bs.len(), w)?;
                for b in bs {
                    w.write_u8(u8::from(*b))?;
                }
                Ok(())
            }
            Self::I1Array(is) => {
                emit_item_header(ItemFormat::I1, is.len(), w)?;
                for i in is {
                    w.write_i8(*i)?;
                }
                Ok(())
            }
            Self::I2Array(is) => {
                emit_item_header(ItemFormat::I2, is.len() * 2, w)?;
                for i in is {
                    w.write_i16::<BigEndian>(*i)?;
                }
                Ok(())
            }
            Self::I4Array(is) => {
                emit_item_header(ItemFormat::I4, is.len() * 4, w)?;
                for i in is {
                    w.write_i32::<BigEndian>(*i)?;
                }
                Ok(())
            }
            Self::I8Array(is) => {
                emit_item_header(ItemFormat::I8, is.len() * 8, w)?;
                for i in is {
                    w.write_i64::<BigEndian>(*i)?;
                }
                Ok(())
            }
            Self::U1Array(us) => {
                emit_item_header(ItemFormat::U1, us.len(), w)?;
                Ok(w.write_all(us)?)
            }
            Self::U2Array(us) => {
                emit_item_header(ItemFormat::U2, us.len() * 2, w)?;
                for u in us {
                    w.write_u16::<BigEndian>(*u)?;
                }
                Ok(())
            }
            Self::U4Array(us) => {
                emit_item_header(ItemFormat::U4, us.len() * 4, w)?;
                for u in us {
                    w.write_u32::<BigEndian>(*u)?;
                }
                Ok(())
            }
            Self::U8Array(us) => {
                emit_item_header(ItemFormat::U8, us.len() * 8, w)?;
                for u in us {
                    w.write_u64::<BigEndian>(*u)?;
                }
                Ok(())
            }
            Self::F4Array(fs) => {
                emit_item_header(ItemFormat::F4, fs.len() * 4, w)?;
                for f in fs {
                    w.write_f32::<BigEndian>(*f)?;
                }
                Ok(())
            }
            Self::F8Array(fs) => {
                emit_item_header(ItemFormat::F8, fs.len() * 8, w)?;
                for f in fs {
                    w.write_f64::<BigEndian>(*f)?;
                }
                Ok(())
            }

            Self::List(elements) => {
                let kept: Vec<&SecsValue> =
                    elements.iter().filter(|e| !matches!(e, Self::Empty)).collect();
                emit_item_header(ItemFormat::List, kept.len(), w)?;
                for element in kept {
                    element.emit(w)?;
                }
                Ok(())
            }

            Self::NameValueSet(entries) => {
                validate_nvs(entries)?;
                emit_item_header(ItemFormat::List, entries.len(), w)?;
                for (name, value) in entries {
                    if matches!(value, Self::Empty) {
                        emit_item_header(ItemFormat::List, 1, w)?;
                        Self::Ascii(name.clone()).emit(w)?;
                    } else {
                        emit_item_header(ItemFormat::List, 2, w)?;
                        Self::Ascii(name.clone()).emit(w)?;
                        value.emit(w)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Number of bytes [`emit`](Self::emit) will produce; used for sizing
    /// frame buffers.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Bool(_) | Self::I1(_) | Self::U1(_) => header_len(1) + 1,
            Self::I2(_) | Self::U2(_) => header_len(2) + 2,
            Self::I4(_) | Self::U4(_) | Self::F4(_) => header_len(4) + 4,
            Self::I8(_) | Self::U8(_) | Self::F8(_) => header_len(8) + 8,
            Self::Ascii(s) => {
                if is_printable_ascii(s) {
                    header_len(s.len()) + s.len()
                } else {
                    wide_encoded_len(s)
                }
            }
            Self::Wide(s) => wide_encoded_len(s),
            Self::Jis8(bytes) => header_len(bytes.len()) + bytes.len(),
            Self::Binary(bytes) => header_len(bytes.len()) + bytes.len(),
            Self::BoolArray(bs) => header_len(bs.len()) + bs.len(),
            Self::I1Array(is) => header_len(is.len()) + is.len(),
            Self::U1Array(us) => header_len(us.len()) + us.len(),
            Self::I2Array(is) => header_len(is.len() * 2) + is.len() * 2,
            Self::U2Array(us) => header_len(us.len() * 2) + us.len() * 2,
            Self::I4Array(is) => header_len(is.len() * 4) + is.len() * 4,
            Self::U4Array(us) => header_len(us.len() * 4) + us.len() * 4,
            Self::F4Array(fs) => header_len(fs.len() * 4) + fs.len() * 4,
            Self::I8Array(is) => header_len(is.len() * 8) + is.len() * 8,
            Self::U8Array(us) => header_len(us.len() * 8) + us.len() * 8,
            Self::F8Array(fs) => header_len(fs.len() * 8) + fs.len() * 8,
            Self::List(elements) => {
                let kept: Vec<&SecsValue> =
                    elements.iter().filter(|e| !matches!(e, Self::Empty)).collect();
                header_len(kept.len()) + kept.iter().map(|e| e.encoded_len()).sum::<usize>()
            }
            Self::NameValueSet(entries) => {
                let mut len = header_len(entries.len());
                for (name, value) in entries {
                    len += header_len(2) + Self::Ascii(name.clone()).encoded_len();
                    if !matches!(value, Self::Empty) {
                        len += value.encoded_len();
                    }
                }
                len
            }
        }
    }

    /// Emits into a fresh byte vector.
    pub fn to_bytes(&self) -> SecsResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        self.emit(&mut bytes)?;
        Ok(bytes)
    }

    /// Parses one complete value from `bytes`.
    ///
    /// An empty input yields [`Empty`](Self::Empty); bytes left over after
    /// the outermost item fail with `TrailingBytes`.
    pub fn parse(bytes: &[u8]) -> SecsResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }
        let mut pos = 0_usize;
        let value = parse_item(bytes, &mut pos)?;
        if pos != bytes.len() {
            return Err(SecsError::TrailingBytes);
        }
        Ok(value)
    }

    /// The equivalent plain-list shape: `NameValueSet`s become their
    /// conventional list-of-sub-lists encoding, recursively. A value parsed
    /// back from the wire compares equal to the original's list shape.
    pub fn as_list_shape(&self) -> SecsValue {
        match self {
            Self::NameValueSet(entries) => Self::List(
                entries
                    .iter()
                    .map(|(name, value)| {
                        if matches!(value, Self::Empty) {
                            Self::List(vec![Self::Ascii(name.clone())])
                        } else {
                            Self::List(vec![Self::Ascii(name.clone()), value.as_list_shape()])
                        }
                    })
                    .collect(),
            ),
            Self::List(elements) => Self::List(
                elements
                    .iter()
                    .filter(|e| !matches!(e, Self::Empty))
                    .map(Self::as_list_shape)
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Returns true if the value is the absent value.
    pub fn is_empty_value(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The contained boolean, if this is a boolean scalar.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The contained string, if this is a character value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) | Self::Wide(s) => Some(s),
            _ => None,
        }
    }

    /// The contained bytes, if this is a binary or JIS-8 value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) | Self::Jis8(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The contained elements, if this is a list.
    pub fn as_list(&self) -> Option<&[SecsValue]> {
        match self {
            Self::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// The value widened to u64, for any unsigned scalar.
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Self::U1(u) => Some(u64::from(*u)),
            Self::U2(u) => Some(u64::from(*u)),
            Self::U4(u) => Some(u64::from(*u)),
            Self::U8(u) => Some(*u),
            _ => None,
        }
    }

    /// The value widened to i64, for any signed scalar.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Self::I1(i) => Some(i64::from(*i)),
            Self::I2(i) => Some(i64::from(*i)),
            Self::I4(i) => Some(i64::from(*i)),
            Self::I8(i) => Some(*i),
            _ => None,
        }
    }

    /// The value widened to f64, for any float scalar.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::F4(f) => Some(f64::from(*f)),
            Self::F8(f) => Some(*f),
            _ => None,
        }
    }
}

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

// Minimal number of length bytes for the count, per the wire format.
fn length_byte_count(count: usize) -> SecsResult<u32> {
    match count {
        0..=0xFF => Ok(1),
        0x100..=0xFFFF => Ok(2),
        0x1_0000..=MAX_ITEM_LENGTH => Ok(3),
        count => Err(SecsError::LengthInvalid(format!(
            "item length {count} exceeds the three-byte maximum"
        ))),
    }
}

fn header_len(count: usize) -> usize {
    match count {
        0..=0xFF => 2,
        0x100..=0xFFFF => 3,
        _ => 4,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn emit_item_header(
    format: ItemFormat,
    count: usize,
    w: &mut dyn std::io::Write,
) -> SecsResult<()> {
    if !format.is_wire_format() {
        return Err(SecsError::UnsupportedIfc(format.code()));
    }
    let n = length_byte_count(count)?;
    w.write_u8((format.code() << 2) | n as u8)?;
    match n {
        1 => w.write_u8(count as u8)?,
        2 => w.write_u16::<BigEndian>(count as u16)?,
        _ => {
            w.write_u8((count >> 16) as u8)?;
            w.write_u16::<BigEndian>((count & 0xFFFF) as u16)?;
        }
    }
    Ok(())
}

fn emit_wide(s: &str, w: &mut dyn std::io::Write) -> SecsResult<()> {
    let char_count = s.chars().count();
    emit_item_header(ItemFormat::Wide, 2 + 2 * char_count, w)?;
    w.write_all(&WIDE_PREFIX)?;
    for c in s.chars() {
        let unit = u32::from(c);
        // UCS-2 has no surrogate pairs; astral characters degrade to U+FFFD
        let unit = if unit > 0xFFFF { 0xFFFD } else { unit as u16 };
        w.write_u16::<BigEndian>(unit)?;
    }
    Ok(())
}

fn wide_encoded_len(s: &str) -> usize {
    let body = 2 + 2 * s.chars().count();
    header_len(body) + body
}

fn validate_nvs(entries: &[(String, SecsValue)]) -> SecsResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(entries.len());
    for (name, _) in entries {
        if name.is_empty() {
            return Err(SecsError::Usage("name/value-set names must be non-empty"));
        }
        if !seen.insert(name.as_str()) {
            return Err(SecsError::UsageDetailed(format!(
                "duplicate name \"{name}\" in name/value-set"
            )));
        }
    }
    Ok(())
}

fn need<'a>(buf: &'a [u8], pos: &mut usize, n: usize) -> SecsResult<&'a [u8]> {
    if *pos + n > buf.len() {
        return Err(SecsError::Truncated);
    }
    let slice = &buf[*pos..*pos + n];
    *pos += n;
    Ok(slice)
}

#[allow(clippy::cast_possible_wrap)]
fn parse_item(buf: &[u8], pos: &mut usize) -> SecsResult<SecsValue> {
    let header = need(buf, pos, 1)?[0];
    let n = usize::from(header & 0b11);
    if n == 0 {
        return Err(SecsError::HeaderInvalid("length-byte count 0"));
    }
    let format = ItemFormat::try_new(header >> 2)?;

    let count_bytes = need(buf, pos, n)?;
    let mut count = 0_usize;
    for b in count_bytes {
        count = (count << 8) | usize::from(*b);
    }

    if format == ItemFormat::List {
        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(parse_item(buf, pos)?);
        }
        return Ok(SecsValue::List(elements));
    }

    // count is the body byte count for every non-list format
    let element_size = format.element_size();
    let extra = format.extra_header_len();
    if extra > 0 {
        if count < extra || (count - extra) % element_size != 0 {
            return Err(SecsError::LengthInvalid(format!(
                "byte count {count} is invalid for a wide string"
            )));
        }
    } else if element_size > 1 && count % element_size != 0 {
        return Err(SecsError::LengthInvalid(format!(
            "byte count {count} is not a multiple of the {format} element size {element_size}"
        )));
    }

    let body = need(buf, pos, count)?;

    Ok(match format {
        ItemFormat::Binary => SecsValue::Binary(body.to_vec()),
        ItemFormat::Boolean => {
            if count == 1 {
                SecsValue::Bool(body[0] != 0)
            } else {
                SecsValue::BoolArray(body.iter().map(|b| *b != 0).collect())
            }
        }
        ItemFormat::Ascii => SecsValue::Ascii(String::from_utf8_lossy(body).into_owned()),
        ItemFormat::Jis8 => SecsValue::Jis8(body.to_vec()),
        ItemFormat::Wide => {
            // drop the two prefix bytes before computing the character count
            let units: Vec<u16> = body[2..]
                .chunks_exact(2)
                .map(BigEndian::read_u16)
                .collect();
            SecsValue::Wide(String::from_utf16_lossy(&units))
        }
        ItemFormat::I1 => {
            if count == 1 {
                SecsValue::I1(body[0] as i8)
            } else {
                SecsValue::I1Array(body.iter().map(|b| *b as i8).collect())
            }
        }
        ItemFormat::I2 => {
            if count == 2 {
                SecsValue::I2(BigEndian::read_i16(body))
            } else {
                SecsValue::I2Array(body.chunks_exact(2).map(BigEndian::read_i16).collect())
            }
        }
        ItemFormat::I4 => {
            if count == 4 {
                SecsValue::I4(BigEndian::read_i32(body))
            } else {
                SecsValue::I4Array(body.chunks_exact(4).map(BigEndian::read_i32).collect())
            }
        }
        ItemFormat::I8 => {
            if count == 8 {
                SecsValue::I8(BigEndian::read_i64(body))
            } else {
                SecsValue::I8Array(body.chunks_exact(8).map(BigEndian::read_i64).collect())
            }
        }
        ItemFormat::U1 => {
            if count == 1 {
                SecsValue::U1(body[0])
            } else {
                SecsValue::U1Array(body.to_vec())
            }
        }
        ItemFormat::U2 => {
            if count == 2 {
                SecsValue::U2(BigEndian::read_u16(body))
            } else {
                SecsValue::U2Array(body.chunks_exact(2).map(BigEndian::read_u16).collect())
            }
        }
        ItemFormat::U4 => {
            if count == 4 {
                SecsValue::U4(BigEndian::read_u32(body))
            } else {
                SecsValue::U4Array(body.chunks_exact(4).map(BigEndian::read_u32).collect())
            }
        }
        ItemFormat::U8 => {
            if count == 8 {
                SecsValue::U8(BigEndian::read_u64(body))
            } else {
                SecsValue::U8Array(body.chunks_exact(8).map(BigEndian::read_u64).collect())
            }
        }
        ItemFormat::F4 => {
            if count == 4 {
                SecsValue::F4(BigEndian::read_f32(body))
            } else {
                SecsValue::F4Array(body.chunks_exact(4).map(BigEndian::read_f32).collect())
            }
        }
        ItemFormat::F8 => {
            if count == 8 {
                SecsValue::F8(BigEndian::read_f64(body))
            } else {
                SecsValue::F8Array(body.chunks_exact(8).map(BigEndian::read_f64).collect())
            }
        }
        ItemFormat::List | ItemFormat::None | ItemFormat::Invalid | ItemFormat::Null => {
            unreachable!("handled above / never produced by try_new")
        }
    })
}

// SML-like rendering, used for logging and debugging only.
impl std::fmt::Display for SecsValue {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Empty => write!(fmt, "<>"),
            Self::Bool(b) => write!(fmt, "<BOOLEAN {}>", u8::from(*b)),
            Self::I1(i) => write!(fmt, "<I1 {i}>"),
            Self::I2(i) => write!(fmt, "<I2 {i}>"),
            Self::I4(i) => write!(fmt, "<I4 {i}>"),
            Self::I8(i) => write!(fmt, "<I8 {i}>"),
            Self::U1(u) => write!(fmt, "<U1 {u}>"),
            Self::U2(u) => write!(fmt, "<U2 {u}>"),
            Self::U4(u) => write!(fmt, "<U4 {u}>"),
            Self::U8(u) => write!(fmt, "<U8 {u}>"),
            Self::F4(f) => write!(fmt, "<F4 {f}>"),
            Self::F8(f) => write!(fmt, "<F8 {f}>"),
            Self::Ascii(s) => write!(fmt, "<A \"{s}\">"),
            Self::Wide(s) => write!(fmt, "<W \"{s}\">"),
            Self::Jis8(bytes) => write!(fmt, "<J 0x{}>", hex::encode(bytes)),
            Self::Binary(bytes) => write!(fmt, "<B 0x{}>", hex::encode(bytes)),
            Self::BoolArray(bs) => {
                write!(fmt, "<BOOLEAN [{}]", bs.len())?;
                for b in bs {
                    write!(fmt, " {}", u8::from(*b))?;
                }
                write!(fmt, ">")
            }
            Self::I1Array(is) => fmt_numeric_array(fmt, "I1", is),
            Self::I2Array(is) => fmt_numeric_array(fmt, "I2", is),
            Self::I4Array(is) => fmt_numeric_array(fmt, "I4", is),
            Self::I8Array(is) => fmt_numeric_array(fmt, "I8", is),
            Self::U1Array(us) => fmt_numeric_array(fmt, "U1", us),
            Self::U2Array(us) => fmt_numeric_array(fmt, "U2", us),
            Self::U4Array(us) => fmt_numeric_array(fmt, "U4", us),
            Self::U8Array(us) => fmt_numeric_array(fmt, "U8", us),
            Self::F4Array(fs) => fmt_numeric_array(fmt, "F4", fs),
            Self::F8Array(fs) => fmt_numeric_array(fmt, "F8", fs),
            Self::List(elements) => {
                write!(fmt, "<L [{}]", elements.len())?;
                for element in elements {
                    write!(fmt, " {element}")?;
                }
                write!(fmt, ">")
            }
            Self::NameValueSet(entries) => {
                write!(fmt, "<L [{}]", entries.len())?;
                for (name, value) in entries {
                    write!(fmt, " <L [2] <A \"{name}\"> {value}>")?;
                }
                write!(fmt, ">")
            }
        }
    }
}

fn fmt_numeric_array<T: std::fmt::Display>(
    fmt: &mut std::fmt::Formatter,
    tag: &str,
    elements: &[T],
) -> std::fmt::Result {
    write!(fmt, "<{tag} [{}]", elements.len())?;
    for element in elements {
        write!(fmt, " {element}")?;
    }
    write!(fmt, ">")
}
