use crate::error::{SyntaxError, SyntaxErrorKind};

/// One instruction line as printed by `go tool objdump -gnu`:
///
/// ```text
/// blake2b_arm64.s:334	0xfbf40			f94007e0		MOVD 8(RSP), R0                      // ldr x0, [sp,#8]
/// ```
///
/// `go_asm` is the disassembler's own notation, `gnu_asm` the target
/// notation after the `// ` marker. Only `gnu_asm` is fed to the analyzer.
/// Text fields hold the bytes exactly as objdump printed them; they need not
/// be UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub file: Vec<u8>,
    pub line: u32,
    pub offset: usize,
    pub bytes: Vec<u8>,
    pub go_asm: Vec<u8>,
    pub gnu_asm: Vec<u8>,
}

const OFFSET_PREFIX: &[u8] = b"0x";
const COMMENT_MARKER: &[u8] = b"// ";

impl Instruction {
    /// Parse one objdump line. Surrounding whitespace is ignored; the fields
    /// may be separated by any run of spaces or tabs.
    pub fn parse(raw: &[u8]) -> Result<Self, SyntaxError> {
        let err = |kind, reason| SyntaxError::new(kind, reason, raw);
        let s = raw.trim_ascii();

        let (file, rest) = split_once(s, b":")
            .ok_or_else(|| err(SyntaxErrorKind::MissingColon, "missing colon in file name"))?;

        let (digits, rest) = take_while(rest, |c| c.is_ascii_digit());
        let line = ascii(digits)
            .and_then(|d| d.parse::<u32>().ok())
            .ok_or_else(|| err(SyntaxErrorKind::InvalidNumber, "invalid line number"))?;

        let rest = rest
            .trim_ascii_start()
            .strip_prefix(OFFSET_PREFIX)
            .ok_or_else(|| {
                err(SyntaxErrorKind::MissingOffsetPrefix, "missing 0x prefix for offset")
            })?;
        let (digits, rest) = take_while(rest, |c| c.is_ascii_hexdigit());
        let offset = ascii(digits)
            .and_then(|d| usize::from_str_radix(d, 16).ok())
            .ok_or_else(|| err(SyntaxErrorKind::InvalidNumber, "invalid offset"))?;

        let (digits, rest) = take_while(rest.trim_ascii_start(), |c| c.is_ascii_hexdigit());
        let bytes = decode_hex(digits)
            .ok_or_else(|| err(SyntaxErrorKind::InvalidHex, "invalid instruction encoding"))?;

        let rest = rest.trim_ascii_start();
        let (go_asm, gnu_asm) = split_once(rest, COMMENT_MARKER).ok_or_else(|| {
            err(SyntaxErrorKind::MissingCommentMarker, "missing GNU assembly comments")
        })?;

        Ok(Self {
            file: file.to_vec(),
            line,
            offset,
            bytes,
            go_asm: go_asm.trim_ascii().to_vec(),
            gnu_asm: gnu_asm.trim_ascii().to_vec(),
        })
    }

    /// Lowercase hex of the raw encoding, empty when objdump reported none.
    pub fn hex_bytes(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

fn split_once<'a>(s: &'a [u8], sep: &[u8]) -> Option<(&'a [u8], &'a [u8])> {
    let i = s.windows(sep.len()).position(|w| w == sep)?;
    Some((&s[..i], &s[i + sep.len()..]))
}

/// Split `s` after the longest prefix whose bytes all satisfy `pred`.
fn take_while(s: &[u8], pred: impl Fn(u8) -> bool) -> (&[u8], &[u8]) {
    let end = s.iter().position(|&c| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// `digits` come from `take_while` with an ASCII predicate, so they are valid
/// UTF-8; an empty run is `None`.
fn ascii(digits: &[u8]) -> Option<&str> {
    match std::str::from_utf8(digits) {
        Ok(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}

fn decode_hex(s: &[u8]) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    s.chunks(2)
        .map(|pair| u8::from_str_radix(ascii(pair)?, 16).ok())
        .collect()
}
