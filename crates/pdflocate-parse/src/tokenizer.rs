//! Content stream tokenizer.
//!
//! Splits raw content stream bytes into [`Operator`]s, each carrying the
//! [`Operand`]s that preceded it. Only the syntax needed to follow the
//! graphics state, text placement and marked content is modelled; inline
//! image data is skipped.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    /// Name without the leading `/`.
    Name(String),
    /// Literal or hex string, as raw bytes.
    Bytes(Vec<u8>),
    Array(Vec<Operand>),
    /// Inline dictionary, as used by `BDC`.
    Dictionary(Vec<(String, Operand)>),
    Boolean(bool),
    Null,
}

impl Operand {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// An operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

/// Tokenize a decoded content stream.
///
/// Malformed input never fails the stream. A stray byte is skipped along
/// with the operands gathered for it; an unterminated string, array,
/// dictionary or inline image ends tokenizing, and the operators read so
/// far are returned.
pub fn tokenize(input: &[u8]) -> Vec<Operator> {
    let mut lexer = Lexer { input, pos: 0 };
    let mut ops = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();

    while let Some(b) = lexer.peek_token_start() {
        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'*' | b'\'' | b'"' => {
                let keyword = lexer.keyword();
                match keyword.as_str() {
                    "true" => stack.push(Operand::Boolean(true)),
                    "false" => stack.push(Operand::Boolean(false)),
                    "null" => stack.push(Operand::Null),
                    "BI" => {
                        if let Err(err) = lexer.skip_inline_image() {
                            tracing::debug!(%err, ops = ops.len(), "content stream truncated");
                            break;
                        }
                        stack.clear();
                        ops.push(Operator {
                            name: keyword,
                            operands: Vec::new(),
                        });
                    }
                    _ => ops.push(Operator {
                        name: keyword,
                        operands: std::mem::take(&mut stack),
                    }),
                }
            }
            b']' | b'>' | b')' | b'{' | b'}' => {
                // stray delimiter
                lexer.pos += 1;
            }
            _ => match lexer.operand() {
                Ok(operand) => stack.push(operand),
                Err(err) if lexer.at_end() => {
                    tracing::debug!(%err, ops = ops.len(), "content stream truncated");
                    break;
                }
                Err(err) => {
                    tracing::debug!(%err, offset = lexer.pos, "skipping malformed operand");
                    stack.clear();
                }
            },
        }
    }
    ops
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn byte(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Skip whitespace and comments; return the next byte, if any.
    fn peek_token_start(&mut self) -> Option<u8> {
        while let Some(b) = self.byte(0) {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while self.byte(0).is_some_and(|c| c != b'\n' && c != b'\r') {
                    self.pos += 1;
                }
            } else {
                return Some(b);
            }
        }
        None
    }

    fn operand(&mut self) -> Result<Operand, BackendError> {
        let b = self
            .peek_token_start()
            .ok_or_else(|| BackendError::Content("unexpected end of stream".into()))?;
        match b {
            b'(' => Ok(Operand::Bytes(self.literal_string()?)),
            b'<' if self.byte(1) == Some(b'<') => Ok(Operand::Dictionary(self.dictionary()?)),
            b'<' => Ok(Operand::Bytes(self.hex_string())),
            b'[' => {
                self.pos += 1;
                Ok(Operand::Array(self.array()?))
            }
            b'/' => Ok(Operand::Name(self.name())),
            b'0'..=b'9' | b'+' | b'-' | b'.' => Ok(self.number()),
            b'a'..=b'z' | b'A'..=b'Z' => {
                let kw = self.keyword();
                Ok(match kw.as_str() {
                    "true" => Operand::Boolean(true),
                    "false" => Operand::Boolean(false),
                    "null" => Operand::Null,
                    _ => Operand::Name(kw),
                })
            }
            other => {
                self.pos += 1;
                Err(BackendError::Content(format!(
                    "unexpected byte 0x{other:02X}"
                )))
            }
        }
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1u32;
        while let Some(b) = self.byte(0) {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => {
                    let Some(esc) = self.byte(0) else { break };
                    self.pos += 1;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\r' => {
                            if self.byte(0) == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut val = u32::from(esc - b'0');
                            for _ in 0..2 {
                                match self.byte(0) {
                                    Some(d @ b'0'..=b'7') => {
                                        val = val * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((val & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                _ => out.push(b),
            }
        }
        Err(BackendError::Content("unterminated literal string".into()))
    }

    fn hex_string(&mut self) -> Vec<u8> {
        self.pos += 1;
        let mut digits = Vec::new();
        while let Some(b) = self.byte(0) {
            self.pos += 1;
            if b == b'>' {
                break;
            }
            if let Some(v) = hex_value(b) {
                digits.push(v);
            }
        }
        if digits.len() % 2 != 0 {
            digits.push(0);
        }
        digits.chunks(2).map(|c| (c[0] << 4) | c[1]).collect()
    }

    fn array(&mut self) -> Result<Vec<Operand>, BackendError> {
        let mut items = Vec::new();
        loop {
            match self.peek_token_start() {
                None => return Err(BackendError::Content("unterminated array".into())),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(_) => items.push(self.operand()?),
            }
        }
    }

    fn dictionary(&mut self) -> Result<Vec<(String, Operand)>, BackendError> {
        self.pos += 2;
        let mut entries = Vec::new();
        loop {
            match self.peek_token_start() {
                None => return Err(BackendError::Content("unterminated dictionary".into())),
                Some(b'>') if self.byte(1) == Some(b'>') => {
                    self.pos += 2;
                    return Ok(entries);
                }
                Some(b'/') => {
                    let key = self.name();
                    if self.peek_token_start().is_none() {
                        return Err(BackendError::Content("unterminated dictionary".into()));
                    }
                    entries.push((key, self.operand()?));
                }
                Some(_) => {
                    return Err(BackendError::Content(
                        "expected name key in dictionary".into(),
                    ));
                }
            }
        }
    }

    fn name(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        while self
            .byte(0)
            .is_some_and(|b| !is_whitespace(b) && !is_delimiter(b))
        {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];
        let mut name = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                    name.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            name.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&name).into_owned()
    }

    /// Malformed numbers parse as zero rather than failing the stream.
    fn number(&mut self) -> Operand {
        let start = self.pos;
        if matches!(self.byte(0), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut has_dot = false;
        while let Some(b) = self.byte(0) {
            if b == b'.' && !has_dot {
                has_dot = true;
            } else if !b.is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        let token = String::from_utf8_lossy(&self.input[start..self.pos]);
        if has_dot {
            Operand::Real(token.parse().unwrap_or(0.0))
        } else {
            Operand::Integer(token.parse().unwrap_or(0))
        }
    }

    fn keyword(&mut self) -> String {
        let start = self.pos;
        while self
            .byte(0)
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'*' || b == b'\'' || b == b'"')
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Skip `<dict> ID <data> EI` after a `BI` keyword.
    fn skip_inline_image(&mut self) -> Result<(), BackendError> {
        while let Some(b) = self.byte(0) {
            if b == b'I'
                && self.byte(1) == Some(b'D')
                && self.byte(2).is_none_or(is_whitespace)
            {
                self.pos += 3;
                break;
            }
            self.pos += 1;
        }
        while self.pos < self.input.len() {
            let preceded = self.pos == 0 || is_whitespace(self.input[self.pos - 1]);
            if preceded
                && self.byte(0) == Some(b'E')
                && self.byte(1) == Some(b'I')
                && self.byte(2).is_none_or(|c| is_whitespace(c) || is_delimiter(c))
            {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(BackendError::Content(
            "unterminated inline image (missing EI)".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(ops: &[Operator]) -> Vec<&str> {
        ops.iter().map(|o| o.name.as_str()).collect()
    }

    #[test]
    fn operators_collect_preceding_operands() {
        let ops = tokenize(b"q 200 0 0 150 100 300 cm /Im0 Do Q");
        assert_eq!(names(&ops), vec!["q", "cm", "Do", "Q"]);
        assert_eq!(ops[1].operands.len(), 6);
        assert_eq!(ops[1].operands[0], Operand::Integer(200));
        assert_eq!(ops[2].operands, vec![Operand::Name("Im0".into())]);
    }

    #[test]
    fn reals_and_signs() {
        let ops = tokenize(b"-1.5 .25 +3 Td");
        assert_eq!(
            ops[0].operands,
            vec![Operand::Real(-1.5), Operand::Real(0.25), Operand::Integer(3)]
        );
    }

    #[test]
    fn bdc_with_inline_dictionary() {
        let ops = tokenize(b"/Figure <</MCID 3>> BDC EMC");
        assert_eq!(names(&ops), vec!["BDC", "EMC"]);
        assert_eq!(
            ops[0].operands[1],
            Operand::Dictionary(vec![("MCID".into(), Operand::Integer(3))])
        );
    }

    #[test]
    fn literal_string_escapes() {
        let ops = tokenize(br"(a\(b\)c\101) Tj");
        assert_eq!(ops[0].operands[0], Operand::Bytes(b"a(b)cA".to_vec()));
    }

    #[test]
    fn hex_string_and_tj_array() {
        let ops = tokenize(b"[<48656C6C6F> -250 (World)] TJ");
        let Operand::Array(items) = &ops[0].operands[0] else {
            panic!("expected array");
        };
        assert_eq!(items[0], Operand::Bytes(b"Hello".to_vec()));
        assert_eq!(items[1], Operand::Integer(-250));
    }

    #[test]
    fn comments_are_skipped() {
        let ops = tokenize(b"% header\nq % save\nQ");
        assert_eq!(names(&ops), vec!["q", "Q"]);
    }

    #[test]
    fn inline_image_data_is_skipped() {
        let ops = tokenize(b"BI /W 2 /H 2 ID \x00\x01EI\xff Q EI q");
        assert_eq!(names(&ops), vec!["BI", "q"]);
    }

    #[test]
    fn quote_operators() {
        let ops = tokenize(b"(a) ' 1 2 (b) \" T*");
        assert_eq!(names(&ops), vec!["'", "\"", "T*"]);
    }

    #[test]
    fn unterminated_tail_keeps_earlier_operators() {
        let ops = tokenize(b"q 10 0 0 10 0 0 cm /Im0 Do Q BT (unterminated");
        assert_eq!(names(&ops), vec!["q", "cm", "Do", "Q", "BT"]);

        assert_eq!(names(&tokenize(b"q [1 2")), vec!["q"]);
        assert_eq!(names(&tokenize(b"q /Span <</MCID 1")), vec!["q"]);
        assert_eq!(names(&tokenize(b"q BI /W 1 ID \x00")), vec!["q"]);
    }

    #[test]
    fn stray_byte_is_skipped() {
        let ops = tokenize(b"q 5 \x80 Tw 1 0 0 1 0 0 cm Q");
        assert_eq!(names(&ops), vec!["q", "Tw", "cm", "Q"]);
        // the operands read before the bad byte are dropped with it
        assert!(ops[1].operands.is_empty());
        assert_eq!(ops[2].operands.len(), 6);
    }
}
