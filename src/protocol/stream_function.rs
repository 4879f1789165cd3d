use crate::{SecsError, SecsResult};

/// A stream/function pair naming a SECS-II message class, plus the
/// reply-expected flag.
///
/// The text form is `S<stream>F<function>` with an optional `/` separator
/// and an optional trailing `W` or `[W]`: `S1F13W`, `S2/F41[W]`, `S6F12`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StreamFunction {
    /// Stream, 1..=255.
    pub stream: u8,
    /// Function, 0..=255; odd functions are primaries.
    pub function: u8,
    /// True if the sender expects a reply.
    pub wants_reply: bool,
}

impl StreamFunction {
    /// A new stream/function pair.
    pub fn new(stream: u8, function: u8, wants_reply: bool) -> Self {
        Self {
            stream,
            function,
            wants_reply,
        }
    }

    /// The stream/function of the reply answering this primary.
    pub fn reply(&self) -> Self {
        Self {
            stream: self.stream,
            function: self.function.wrapping_add(1),
            wants_reply: false,
        }
    }

    /// True for odd functions.
    pub fn is_primary(&self) -> bool {
        self.function & 1 != 0
    }
}

impl std::str::FromStr for StreamFunction {
    type Err = SecsError;

    #[allow(clippy::cast_possible_truncation)]
    fn from_str(s: &str) -> SecsResult<Self> {
        let invalid =
            || SecsError::UsageDetailed(format!("\"{s}\" is not a valid stream/function"));

        let rest = s.strip_prefix('S').ok_or_else(invalid)?;
        let f_at = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        let (stream_digits, rest) = rest.split_at(f_at);
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        let rest = rest.strip_prefix('F').ok_or_else(invalid)?;
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (function_digits, suffix) = rest.split_at(digits_end);

        let wants_reply = match suffix {
            "" => false,
            "W" | "[W]" => true,
            _ => return Err(invalid()),
        };
        if stream_digits.is_empty() || function_digits.is_empty() {
            return Err(invalid());
        }
        let stream: u16 = stream_digits.parse().map_err(|_| invalid())?;
        let function: u16 = function_digits.parse().map_err(|_| invalid())?;
        if !(1..=255).contains(&stream) || function > 255 {
            return Err(invalid());
        }

        Ok(Self {
            stream: stream as u8,
            function: function as u8,
            wants_reply,
        })
    }
}

impl std::fmt::Display for StreamFunction {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            fmt,
            "S{}F{}{}",
            self.stream,
            self.function,
            if self.wants_reply { "W" } else { "" }
        )
    }
}

#[cfg(test)]
mod test {
    use super::StreamFunction;

    #[test]
    fn parses_the_documented_forms() {
        let sf: StreamFunction = "S1F13W".parse().unwrap();
        assert_eq!(sf, StreamFunction::new(1, 13, true));

        let sf: StreamFunction = "S99F0".parse().unwrap();
        assert_eq!(sf, StreamFunction::new(99, 0, false));

        let sf: StreamFunction = "S2/F41[W]".parse().unwrap();
        assert_eq!(sf, StreamFunction::new(2, 41, true));
    }

    #[test]
    fn rejects_out_of_range_and_malformed() {
        for s in [
            "S0F1", "S256F1", "S1F256", "F13", "S1", "S1F", "SF1", "S1F13X", "S1F13[W", "s1f13",
            "S1F13 ",
        ] {
            assert!(s.parse::<StreamFunction>().is_err(), "accepted {s}");
        }
    }

    #[test]
    fn display_matches_the_text_form() {
        assert_eq!(StreamFunction::new(1, 13, true).to_string(), "S1F13W");
        assert_eq!(StreamFunction::new(6, 12, false).to_string(), "S6F12");
    }

    #[test]
    fn reply_pairing() {
        let primary = StreamFunction::new(2, 41, true);
        let reply = primary.reply();
        assert_eq!(reply.stream, 2);
        assert_eq!(reply.function, 42);
        assert!(!reply.wants_reply);
        assert!(primary.is_primary());
        assert!(!reply.is_primary());
    }
}
