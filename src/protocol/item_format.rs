use crate::{SecsError, SecsResult};

/// Format code of a SECS-II item, per SEMI E5 Table 1.
///
/// The wire carries the code in the upper six bits of the item header byte.
/// The last three codes (`None`, `Invalid`, `Null`) are internal markers
/// that never appear on the wire: `None` stands for an absent value,
/// `Invalid` for an unrepresentable one, `Null` for an explicit null
/// placeholder. Emitting any of them as an item is refused.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ItemFormat {
    /// List; the length field counts elements, not bytes.
    List = 0o00,
    /// Binary octets, uninterpreted.
    Binary = 0o10,
    /// Boolean, one byte per element, zero is false.
    Boolean = 0o11,
    /// ASCII character string.
    Ascii = 0o20,
    /// JIS-8 character string.
    Jis8 = 0o21,
    /// Two-byte character string, prefixed with a two-byte UCS-2 type tag.
    Wide = 0o22,
    /// Signed 64-bit integer.
    I8 = 0o30,
    /// Signed 8-bit integer.
    I1 = 0o31,
    /// Signed 16-bit integer.
    I2 = 0o32,
    /// Signed 32-bit integer.
    I4 = 0o34,
    /// 64-bit floating point.
    F8 = 0o40,
    /// 32-bit floating point.
    F4 = 0o44,
    /// Unsigned 64-bit integer.
    U8 = 0o50,
    /// Unsigned 8-bit integer.
    U1 = 0o51,
    /// Unsigned 16-bit integer.
    U2 = 0o52,
    /// Unsigned 32-bit integer.
    U4 = 0o54,
    /// Absent value; no item is emitted for it.
    None = 0x40,
    /// Unrepresentable value; refused by the encoder.
    Invalid = 0x41,
    /// Explicit null placeholder; refused by the encoder.
    Null = 0x42,
}

impl ItemFormat {
    /// Decodes the six-bit wire code.
    pub fn try_new(code: u8) -> SecsResult<Self> {
        Ok(match code {
            0o00 => Self::List,
            // 0o01 - 0o07: not defined
            0o10 => Self::Binary,
            0o11 => Self::Boolean,
            // 0o12 - 0o17: not defined
            0o20 => Self::Ascii,
            0o21 => Self::Jis8,
            0o22 => Self::Wide,
            // 0o23 - 0o27: not defined
            0o30 => Self::I8,
            0o31 => Self::I1,
            0o32 => Self::I2,
            // 0o33: reserved for I3
            0o34 => Self::I4,
            // 0o35 - 0o37: not defined
            0o40 => Self::F8,
            // 0o41 - 0o43: not defined
            0o44 => Self::F4,
            // 0o45 - 0o47: not defined
            0o50 => Self::U8,
            0o51 => Self::U1,
            0o52 => Self::U2,
            // 0o53: reserved for U3
            0o54 => Self::U4,
            // 0o55 - 0o77: not defined
            code => return Err(SecsError::UnsupportedIfc(code)),
        })
    }

    /// Size in bytes of one element of this format; 0 for lists.
    pub fn element_size(self) -> usize {
        match self {
            Self::List | Self::None | Self::Invalid | Self::Null => 0,
            Self::Binary | Self::Boolean | Self::Ascii | Self::Jis8 | Self::I1 | Self::U1 => 1,
            Self::Wide | Self::I2 | Self::U2 => 2,
            Self::I4 | Self::U4 | Self::F4 => 4,
            Self::I8 | Self::U8 | Self::F8 => 8,
        }
    }

    /// Number of body bytes that precede the element data (the UCS-2 type
    /// tag of wide strings).
    pub fn extra_header_len(self) -> usize {
        match self {
            Self::Wide => 2,
            _ => 0,
        }
    }

    /// True for codes that may be emitted on the wire.
    pub fn is_wire_format(self) -> bool {
        !matches!(self, Self::None | Self::Invalid | Self::Null)
    }

    /// The six-bit wire code.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ItemFormat {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "{}",
            match self {
                Self::List => "L",
                Self::Binary => "B",
                Self::Boolean => "BOOLEAN",
                Self::Ascii => "A",
                Self::Jis8 => "J",
                Self::Wide => "W",
                Self::I8 => "I8",
                Self::I1 => "I1",
                Self::I2 => "I2",
                Self::I4 => "I4",
                Self::F8 => "F8",
                Self::F4 => "F4",
                Self::U8 => "U8",
                Self::U1 => "U1",
                Self::U2 => "U2",
                Self::U4 => "U4",
                Self::None => "NONE",
                Self::Invalid => "INVALID",
                Self::Null => "NULL",
            }
        )
    }
}

#[cfg(test)]
mod test {
    use super::ItemFormat;

    #[test]
    fn wire_codes_round_trip() {
        for format in [
            ItemFormat::List,
            ItemFormat::Binary,
            ItemFormat::Boolean,
            ItemFormat::Ascii,
            ItemFormat::Jis8,
            ItemFormat::Wide,
            ItemFormat::I8,
            ItemFormat::I1,
            ItemFormat::I2,
            ItemFormat::I4,
            ItemFormat::F8,
            ItemFormat::F4,
            ItemFormat::U8,
            ItemFormat::U1,
            ItemFormat::U2,
            ItemFormat::U4,
        ] {
            assert_eq!(format, ItemFormat::try_new(format.code()).unwrap());
        }
    }

    #[test]
    fn undefined_codes_are_refused() {
        for code in [0o01_u8, 0o12, 0o33, 0o53, 0o77] {
            assert!(ItemFormat::try_new(code).is_err());
        }
    }

    #[test]
    fn internal_codes_are_not_wire_formats() {
        assert!(!ItemFormat::None.is_wire_format());
        assert!(!ItemFormat::Invalid.is_wire_format());
        assert!(!ItemFormat::Null.is_wire_format());
        assert!(ItemFormat::U4.is_wire_format());
    }
}
