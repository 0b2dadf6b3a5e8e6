//! Embedded `mtempPrt(...)` call grammar.
//!
//! The first save parameter may carry the report call that produced the
//! file:
//!
//! ```text
//! call    = "mtempPrt(" int "," str "," int "," str "," str "," str ")"
//! int     = digits | '"' digits '"'
//! str     = '"' <any chars except newline> '"'
//! ```
//!
//! The call may be embedded in a longer string (for example prefixed with
//! `^`); the first occurrence that parses wins. A string field ends at the
//! earliest closing quote that lets the rest of the call match, so quotes
//! and delimiters inside a field are kept.

// ============================================================================
// Imports
// ============================================================================

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Call name and opening parenthesis.
const CALL_PREFIX: &str = "mtempPrt(";

/// Query appended to download URLs.
const DOWNLOAD_QUERY: [(&str, &str); 2] = [("enc", "0"), ("addCRLF", "No")];

// ============================================================================
// DownloadParams
// ============================================================================

/// Structured parameters extracted from a report call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadParams {
    /// Report identifier.
    pub report_id: u64,

    /// Report type code.
    pub report_type: String,

    /// Report mode.
    pub mode: u32,

    /// Report body.
    pub body: String,

    /// Output format.
    pub fmt: String,

    /// Layout name.
    pub layout: String,

    /// The matched call text.
    pub call: String,

    /// The full parameter string the call was found in.
    pub full_path: String,
}

impl DownloadParams {
    /// Rebuilds the call expression used by the download endpoint.
    ///
    /// Format: `^mtempPrt(id,"type",mode,"body","fmt","layout")`
    #[must_use]
    pub fn to_call_expression(&self) -> String {
        format!(
            r#"^mtempPrt({},"{}",{},"{}","{}","{}")"#,
            self.report_id, self.report_type, self.mode, self.body, self.fmt, self.layout
        )
    }

    /// Builds the direct download URL for this report under `base_url`.
    ///
    /// Format: `{base}/download/{percent-encoded call}?enc=0&addCRLF=No`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `base_url` is not a valid URL.
    pub fn download_url(&self, base_url: &str) -> Result<Url> {
        let expression = self.to_call_expression();
        let encoded = urlencoding::encode(&expression);
        let raw = format!("{}/download/{encoded}", base_url.trim_end_matches('/'));

        let mut url = Url::parse(&raw)
            .map_err(|e| Error::config(format!("invalid download base url {base_url:?}: {e}")))?;

        url.query_pairs_mut().extend_pairs(DOWNLOAD_QUERY);

        Ok(url)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Finds and parses the first `mtempPrt(...)` call in `input`.
///
/// # Errors
///
/// Returns [`Error::Pattern`] if no occurrence parses. The error describes
/// the last attempted occurrence.
pub fn parse_call(input: &str) -> Result<DownloadParams> {
    let mut last_error = None;

    for (start, _) in input.match_indices(CALL_PREFIX) {
        match parse_at(input, start) {
            Ok(params) => return Ok(params),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error.unwrap_or_else(|| Error::pattern(0, "no mtempPrt( call found")))
}

fn parse_at(input: &str, start: usize) -> Result<DownloadParams> {
    let mut captures = Vec::with_capacity(6);
    let end = match_tokens(input, start, &GRAMMAR, &mut captures)?;

    let [report_id, report_type, mode, body, fmt, layout] = captures[..] else {
        return Err(Error::pattern(start, "unexpected field count"));
    };

    Ok(DownloadParams {
        report_id: parse_integer(report_id, start)?,
        report_type: report_type.to_string(),
        mode: parse_integer(mode, start)?,
        body: body.to_string(),
        fmt: fmt.to_string(),
        layout: layout.to_string(),
        call: input[start..end].to_string(),
        full_path: input.to_string(),
    })
}

fn parse_integer<T: FromStr>(digits: &str, offset: usize) -> Result<T> {
    digits
        .parse()
        .map_err(|_| Error::pattern(offset, format!("integer out of range: {digits}")))
}

// ============================================================================
// Matcher
// ============================================================================

/// One element of the call grammar.
#[derive(Debug, Clone, Copy)]
enum Token {
    /// Exact text.
    Literal(&'static str),
    /// Bare or double-quoted run of ASCII digits; captured.
    Integer,
    /// Quoted string whose closing quote is followed by the given text;
    /// captured.
    Text(&'static str),
}

const GRAMMAR: [Token; 13] = [
    Token::Literal(CALL_PREFIX),
    Token::Integer,
    Token::Literal(","),
    Token::Text(","),
    Token::Literal(","),
    Token::Integer,
    Token::Literal(","),
    Token::Text(","),
    Token::Literal(","),
    Token::Text(","),
    Token::Literal(","),
    Token::Text(")"),
    Token::Literal(")"),
];

/// Matches `tokens` at `pos`, returning the end offset.
///
/// A string field first tries the shortest candidate and moves on to the
/// next closing quote when the rest of the grammar fails to match.
fn match_tokens<'a>(
    src: &'a str,
    pos: usize,
    tokens: &[Token],
    captures: &mut Vec<&'a str>,
) -> Result<usize> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(pos);
    };

    match *token {
        Token::Literal(expected) => {
            if !src[pos..].starts_with(expected) {
                return Err(Error::pattern(pos, format!("expected {expected:?}")));
            }
            match_tokens(src, pos + expected.len(), rest, captures)
        }

        Token::Integer => {
            let quoted = src[pos..].starts_with('"');
            let start = pos + usize::from(quoted);

            let digits = src[start..].bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err(Error::pattern(start, "expected digits"));
            }

            let mut end = start + digits;
            if quoted {
                if !src[end..].starts_with('"') {
                    return Err(Error::pattern(end, "expected closing quote"));
                }
                end += 1;
            }

            captures.push(&src[start..start + digits]);
            match_tokens(src, end, rest, captures).inspect_err(|_| {
                captures.pop();
            })
        }

        Token::Text(terminator) => {
            if !src[pos..].starts_with('"') {
                return Err(Error::pattern(pos, "expected opening quote"));
            }

            let start = pos + 1;
            let line_end = src[start..].find('\n').map_or(src.len(), |i| start + i);
            let closing = format!("\"{terminator}");

            let mut last_error =
                Error::pattern(start, format!("unterminated string before {terminator:?}"));

            for (offset, _) in src[start..line_end].match_indices(&closing) {
                let end = start + offset;
                captures.push(&src[start..end]);

                match match_tokens(src, end + 1, rest, captures) {
                    Ok(end) => return Ok(end),
                    Err(e) => {
                        captures.pop();
                        last_error = e;
                    }
                }
            }

            Err(last_error)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_parse_quoted_mode() {
        let params = parse_call(r#"mtempPrt(7,"INV","2","B","fmt","lay")"#).expect("parses");

        assert_eq!(params.report_id, 7);
        assert_eq!(params.report_type, "INV");
        assert_eq!(params.mode, 2);
        assert_eq!(params.body, "B");
        assert_eq!(params.fmt, "fmt");
        assert_eq!(params.layout, "lay");
    }

    #[test]
    fn test_parse_bare_mode_with_prefix() {
        let input = r#"^mtempPrt(1042,"ACT",0,"Q1 2026","PDF","A4")"#;
        let params = parse_call(input).expect("parses");

        assert_eq!(params.report_id, 1042);
        assert_eq!(params.mode, 0);
        assert_eq!(params.body, "Q1 2026");
        assert_eq!(params.call, &input[1..]);
        assert_eq!(params.full_path, input);
    }

    #[test]
    fn test_string_may_contain_commas_and_quotes() {
        let params = parse_call(r#"mtempPrt(3,"A,B",1,"say "hi"","x","y")"#).expect("parses");
        assert_eq!(params.report_type, "A,B");
        assert_eq!(params.body, r#"say "hi""#);
    }

    #[test]
    fn test_string_retries_later_closing_quote() {
        let params = parse_call(r#"mtempPrt(3,"T",1,"say ",hi","x","y")"#).expect("parses");
        assert_eq!(params.report_type, "T");
        assert_eq!(params.body, r#"say ",hi"#);
        assert_eq!(params.fmt, "x");
        assert_eq!(params.layout, "y");
    }

    #[test]
    fn test_layout_ends_at_first_closing_paren() {
        let params = parse_call(r#"mtempPrt(3,"T",1,"b","f","a")b")"#).expect("parses");
        assert_eq!(params.layout, "a");
        assert_eq!(params.call, r#"mtempPrt(3,"T",1,"b","f","a")"#);
    }

    #[test]
    fn test_empty_strings() {
        let params = parse_call(r#"mtempPrt(3,"",1,"","","")"#).expect("parses");
        assert_eq!(params.report_type, "");
        assert_eq!(params.layout, "");
    }

    #[test]
    fn test_later_occurrence_wins_when_first_is_malformed() {
        let params =
            parse_call(r#"mtempPrt(x) then mtempPrt(5,"T",1,"b","f","l")"#).expect("parses");
        assert_eq!(params.report_id, 5);
    }

    #[test]
    fn test_malformed_calls() {
        for input in [
            "",
            "x",
            "mtempPrt()",
            r#"mtempPrt(-1,"T",1,"b","f","l")"#,
            r#"mtempPrt(1,"T",1,"b","f")"#,
            r#"mtempPrt(1,T,1,"b","f","l")"#,
            r#"mtempPrt(1,"T",1,"b","f","l""#,
            r#"mtempPrt(99999999999999999999,"T",1,"b","f","l")"#,
            "mtempPrt(1,\"T\",1,\"b\nc\",\"f\",\"l\")",
        ] {
            let err = parse_call(input).unwrap_err();
            assert!(matches!(err, Error::Pattern { .. }), "{input:?} -> {err}");
        }
    }

    #[test]
    fn test_call_expression_round_trips() {
        let params = parse_call(r#"mtempPrt(7,"INV",2,"B","fmt","lay")"#).expect("parses");
        let expression = params.to_call_expression();
        assert_eq!(expression, r#"^mtempPrt(7,"INV",2,"B","fmt","lay")"#);

        let reparsed = parse_call(&expression).expect("reparses");
        assert_eq!(reparsed.report_id, params.report_id);
        assert_eq!(reparsed.layout, params.layout);
    }

    #[test]
    fn test_download_url() {
        let params = parse_call(r#"mtempPrt(7,"INV",2,"B","fmt","lay")"#).expect("parses");
        let url = params.download_url("https://qms.example.com/").expect("url");

        assert_eq!(
            url.as_str(),
            "https://qms.example.com/download/%5EmtempPrt%287%2C%22INV%22%2C2%2C%22B%22%2C%22fmt%22%2C%22lay%22%29?enc=0&addCRLF=No"
        );
    }

    #[test]
    fn test_download_url_rejects_bad_base() {
        let params = parse_call(r#"mtempPrt(7,"INV",2,"B","fmt","lay")"#).expect("parses");
        assert!(matches!(params.download_url("not a url"), Err(Error::Config { .. })));
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let params = parse_call(r#"mtempPrt(7,"INV",2,"B","fmt","lay")"#).expect("parses");
        let json = serde_json::to_value(&params).expect("serialize");
        assert_eq!(json["report_id"], 7);
        assert_eq!(json["report_type"], "INV");
        assert_eq!(json["full_path"], r#"mtempPrt(7,"INV",2,"B","fmt","lay")"#);
    }

    proptest! {
        #[test]
        fn prop_never_panics(input in ".*") {
            let _ = parse_call(&input);
        }

        #[test]
        fn prop_well_formed_calls_parse(
            id in 0u64..1_000_000,
            mode in 0u32..100,
            report_type in "[A-Za-z0-9 ]{0,8}",
            body in "[A-Za-z0-9 ,.]{0,16}",
            fmt in "[A-Za-z]{0,4}",
            layout in "[A-Za-z0-9]{0,6}",
            quote_mode in any::<bool>(),
        ) {
            let mode_text = if quote_mode { format!("\"{mode}\"") } else { mode.to_string() };
            let input = format!(
                r#"mtempPrt({id},"{report_type}",{mode_text},"{body}","{fmt}","{layout}")"#
            );

            let params = parse_call(&input).expect("well-formed call parses");
            prop_assert_eq!(params.report_id, id);
            prop_assert_eq!(params.mode, mode);
            prop_assert_eq!(params.report_type, report_type);
            prop_assert_eq!(params.body, body);
            prop_assert_eq!(params.fmt, fmt);
            prop_assert_eq!(params.layout, layout);
        }

        #[test]
        fn prop_truncated_calls_fail(cut in 0usize..30) {
            let input = r#"mtempPrt(12,"T",1,"b","f","layout")"#;
            let truncated = &input[..cut.min(input.len() - 1)];
            prop_assert!(parse_call(truncated).is_err());
        }
    }
}
