//! PDF object parser.
//!
//! A recursive-descent `nom` parser for the object syntax found in signature
//! and form-field dictionaries: numbers, names, literal and hexadecimal
//! strings, arrays, dictionaries and indirect references. Stream data is not
//! consumed; a stream object parses as its dictionary.
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped
//! between tokens.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{not, opt, peek, recognize, value},
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

/// Maximum nesting of arrays/dictionaries before parsing is abandoned.
const MAX_DEPTH: usize = 64;

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments.
fn skip_ws(input: &[u8]) -> &[u8] {
    let mut remaining = input;
    loop {
        let (rest, _) = take_while::<_, _, nom::error::Error<&[u8]>>(is_whitespace)(remaining)
            .unwrap_or((remaining, &[][..]));
        remaining = rest;
        match comment(remaining) {
            Ok((rest, _)) => remaining = rest,
            Err(_) => return remaining,
        }
    }
}

fn unsigned(input: &[u8]) -> IResult<&[u8], u64> {
    let (rest, digits) = digit1(input)?;
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(|n| (rest, n))
        .ok_or_else(|| nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)))
}

/// Parse `N G R`.
fn parse_reference(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, (id, _, gen, _, _)) = tuple((
        unsigned,
        take_while1(is_whitespace),
        unsigned,
        take_while(is_whitespace),
        terminated(char('R'), not(peek(take_while1(is_regular)))),
    ))(input)?;
    let (Ok(id), Ok(gen)) = (u32::try_from(id), u16::try_from(gen)) else {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit)));
    };
    Ok((rest, Object::Reference(ObjectRef::new(id, gen))))
}

/// Parse an integer or real number (`42`, `-3`, `.5`, `4.`).
fn parse_number(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, text) = recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
    )))(input)?;
    let text = std::str::from_utf8(text).unwrap_or_default();
    let error = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit));
    if text.contains('.') {
        let text = text.strip_prefix('+').unwrap_or(text);
        let normalized = if text.ends_with('.') { format!("{}0", text) } else { text.to_string() };
        normalized.parse().map(|r| (rest, Object::Real(r))).map_err(|_| error())
    } else {
        let text = text.strip_prefix('+').unwrap_or(text);
        text.parse().map(|i| (rest, Object::Integer(i))).map_err(|_| error())
    }
}

/// Parse a name, decoding `#xx` escapes.
fn parse_name(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, raw) = preceded(char('/'), take_while(is_regular))(input)?;
    let mut name = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let Ok(byte) = u8::from_str_radix(&String::from_utf8_lossy(&raw[i + 1..i + 3]), 16) {
                name.push(byte);
                i += 3;
                continue;
            }
        }
        name.push(raw[i]);
        i += 1;
    }
    Ok((rest, Object::Name(String::from_utf8_lossy(&name).into_owned())))
}

/// Parse a literal string with balanced parentheses.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Object> {
    let (body_start, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut i = 0;
    while i < body_start.len() {
        match body_start[i] {
            b'\\' => i += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let raw = &body_start[..i];
                    return Ok((&body_start[i + 1..], Object::String(decode_literal_string_escapes(raw))));
                }
            },
            _ => {},
        }
        i += 1;
    }
    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

/// Parse `<...>` (not `<<`).
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, _) = char('<')(input)?;
    let (rest, body) = take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c))(rest)?;
    let (rest, _) = char('>')(rest)?;
    let digits: String = body
        .iter()
        .filter(|c| !is_whitespace(**c))
        .map(|&c| c as char)
        .collect();
    Ok((rest, Object::HexString(digits)))
}

fn parse_keyword(input: &[u8]) -> IResult<&[u8], Object> {
    terminated(
        alt((
            value(Object::Boolean(true), tag("true")),
            value(Object::Boolean(false), tag("false")),
            value(Object::Null, tag("null")),
        )),
        not(peek(take_while1(is_regular))),
    )(input)
}

fn parse_array(input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    let (mut rest, _) = char('[')(input)?;
    let mut items = Vec::new();
    loop {
        rest = skip_ws(rest);
        if let Ok((after, _)) = char::<_, nom::error::Error<&[u8]>>(']')(rest) {
            return Ok((after, Object::Array(items)));
        }
        let (after, item) = parse_object_at_depth(rest, depth + 1)?;
        items.push(item);
        rest = after;
    }
}

fn parse_dictionary(input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    let (mut rest, _) = tag("<<")(input)?;
    let mut dict = Dictionary::new();
    loop {
        rest = skip_ws(rest);
        if let Ok((after, _)) = tag::<_, _, nom::error::Error<&[u8]>>(">>")(rest) {
            return Ok((after, Object::Dictionary(dict)));
        }
        let (after, key) = parse_name(rest)?;
        let (after, val) = parse_object_at_depth(after, depth + 1)?;
        if let Object::Name(key) = key {
            dict.insert(key, val);
        }
        rest = after;
    }
}

fn parse_object_at_depth<'a>(input: &'a [u8], depth: usize) -> IResult<&'a [u8], Object> {
    if depth > MAX_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::TooLarge,
        )));
    }
    let input = skip_ws(input);
    alt((
        |i: &'a [u8]| parse_dictionary(i, depth),
        parse_hex_string,
        |i: &'a [u8]| parse_array(i, depth),
        parse_name,
        parse_literal_string,
        parse_reference,
        parse_number,
        parse_keyword,
    ))(input)
}

/// Parse a single PDF object.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    parse_object_at_depth(input, 0)
}

/// Parse the body of an indirect object that starts right after `N G obj`.
pub fn parse_object_body(input: &[u8], offset: usize) -> Result<Object> {
    parse_object(input)
        .map(|(_, obj)| obj)
        .map_err(|e| Error::ParseError {
            offset,
            reason: format!("{:?}", e.map_input(|i: &[u8]| i.len())),
        })
}

/// Decode escape sequences in PDF literal strings (ISO 32000-1:2008, 7.3.4.2).
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' || i + 1 >= raw.len() {
            result.push(raw[i]);
            i += 1;
            continue;
        }
        let next = raw[i + 1];
        i += 2;
        match next {
            b'n' => result.push(b'\n'),
            b'r' => result.push(b'\r'),
            b't' => result.push(b'\t'),
            b'b' => result.push(0x08),
            b'f' => result.push(0x0C),
            b'\n' => {},
            b'\r' => {
                if raw.get(i) == Some(&b'\n') {
                    i += 1;
                }
            },
            b'0'..=b'7' => {
                let mut code = u32::from(next - b'0');
                let mut taken = 1;
                while taken < 3 && i < raw.len() && (b'0'..=b'7').contains(&raw[i]) {
                    code = code * 8 + u32::from(raw[i] - b'0');
                    i += 1;
                    taken += 1;
                }
                result.push((code & 0xFF) as u8);
            },
            other => result.push(other),
        }
    }
    result
}

/// Decode hexadecimal digits, ignoring whitespace.
///
/// An odd trailing digit is padded with zero, as PDF hex strings require.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let digits: Vec<u8> = hex_bytes
        .iter()
        .filter(|c| !c.is_ascii_whitespace())
        .copied()
        .collect();
    let nibble = |c: u8, pos: usize| -> Result<u8> {
        (c as char)
            .to_digit(16)
            .map(|d| d as u8)
            .ok_or_else(|| Error::ParseError {
                offset: pos,
                reason: format!("Invalid hex digit '{}'", c as char),
            })
    };
    let mut result = Vec::with_capacity(digits.len() / 2 + 1);
    for (idx, chunk) in digits.chunks(2).enumerate() {
        let high = nibble(chunk[0], idx * 2)?;
        let low = match chunk.get(1) {
            Some(&c) => nibble(c, idx * 2 + 1)?,
            None => 0,
        };
        result.push(high << 4 | low);
    }
    Ok(result)
}

/// Parse a PDF date string (ISO 32000-1:2008, 7.9.4): `D:YYYYMMDDHHmmSSOHH'mm'`.
///
/// Everything after the year is optional. A missing or `Z` offset is UTC.
pub fn parse_pdf_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let text = text.strip_prefix("D:").unwrap_or(text);
    let digits_end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
    let (digits, zone) = text.split_at(digits_end);
    if digits.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match digits.get(range) {
            Some(value) => value.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6, 1)?, field(6..8, 1)?)?;
    let naive = date.and_hms_opt(field(8..10, 0)?, field(10..12, 0)?, field(12..14, 0)?)?;

    let offset_seconds = match zone.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let zone_digits: String = zone[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = zone_digits.get(0..2).and_then(|v| v.parse().ok()).unwrap_or(0);
            let minutes: i32 = zone_digits.get(2..4).and_then(|v| v.parse().ok()).unwrap_or(0);
            let total = hours * 3600 + minutes * 60;
            if sign == '-' {
                -total
            } else {
                total
            }
        },
        _ => 0,
    };
    FixedOffset::east_opt(offset_seconds)?
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Object {
        parse_object(input).unwrap().1
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse(b"null"), Object::Null);
        assert_eq!(parse(b"true"), Object::Boolean(true));
        assert_eq!(parse(b"-42"), Object::Integer(-42));
        assert_eq!(parse(b"3.5"), Object::Real(3.5));
        assert_eq!(parse(b".5"), Object::Real(0.5));
        assert_eq!(parse(b"/Sig"), Object::Name("Sig".into()));
    }

    #[test]
    fn test_parse_name_hex_escape() {
        assert_eq!(parse(b"/A#20B"), Object::Name("A B".into()));
    }

    #[test]
    fn test_parse_reference_vs_numbers() {
        assert_eq!(parse(b"5 0 R"), Object::Reference(ObjectRef::new(5, 0)));
        assert_eq!(
            parse(b"[0 100 200 50]"),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(100),
                Object::Integer(200),
                Object::Integer(50)
            ])
        );
    }

    #[test]
    fn test_parse_literal_string_nested_and_escaped() {
        assert_eq!(parse(b"(a (b) c)"), Object::String(b"a (b) c".to_vec()));
        assert_eq!(parse(br"(x\)y)"), Object::String(b"x)y".to_vec()));
        assert_eq!(parse(br"(\101\n)"), Object::String(b"A\n".to_vec()));
    }

    #[test]
    fn test_parse_hex_string_keeps_digits() {
        assert_eq!(parse(b"<30 82\n0A>"), Object::HexString("30820A".into()));
    }

    #[test]
    fn test_parse_signature_dictionary() {
        let input = b"<< /Type /Sig /ByteRange [0 10 20 5] /Contents <3082> \
                      /Reason (Approval) % trailing comment\n /V 7 0 R >>";
        let obj = parse(input);
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Type").and_then(|o| o.as_name()), Some("Sig"));
        assert_eq!(dict.get("Contents"), Some(&Object::HexString("3082".into())));
        assert_eq!(dict.get("Reason").and_then(|o| o.as_text()).as_deref(), Some("Approval"));
        assert_eq!(dict.get("V").and_then(|o| o.as_reference()), Some(ObjectRef::new(7, 0)));
        assert_eq!(dict.get("ByteRange").and_then(|o| o.as_array()).map(|a| a.len()), Some(4));
    }

    #[test]
    fn test_parse_unterminated_fails() {
        assert!(parse_object(b"<< /Type /Sig").is_err());
        assert!(parse_object(b"(open").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "[".repeat(MAX_DEPTH + 5);
        assert!(parse_object(deep.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex(b"48 65 6C").unwrap(), b"Hel");
        assert_eq!(decode_hex(b"ABC").unwrap(), vec![0xAB, 0xC0]);
        assert!(decode_hex(b"ZZ").is_err());
        assert!(decode_hex(b"").unwrap().is_empty());
    }

    #[test]
    fn test_parse_pdf_date() {
        let dt = parse_pdf_date("D:20260301120000+01'00'").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T11:00:00+00:00");

        let dt = parse_pdf_date("D:20240115").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let dt = parse_pdf_date("D:20240115083000-05'30").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T14:00:00+00:00");

        let dt = parse_pdf_date("D:20240115083000Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T08:30:00+00:00");
    }

    #[test]
    fn test_parse_pdf_date_invalid() {
        assert!(parse_pdf_date("yesterday").is_none());
        assert!(parse_pdf_date("D:20241301").is_none());
        assert!(parse_pdf_date("").is_none());
    }
}
