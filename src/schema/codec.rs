//! Delimited row codec
//!
//! Comma-separated rows with RFC 4180 quoting. A field is quoted only when it
//! contains a comma, a double quote, CR or LF; embedded quotes are doubled.
//! An absent value is an empty, unquoted field. Rows written before quoting
//! existed (commas stripped from free text) decode unchanged.

use crate::error::ParseError;

pub const DELIMITER: char = ',';

/// One physical record read from a stream file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line where the record starts
    pub line: usize,
    /// Byte offset of the record in the parsed text
    pub offset: usize,
    pub fields: Vec<Option<String>>,
    /// Record text as found on disk, without the line terminator
    pub raw: String,
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.contains([DELIMITER, '"', '\r', '\n'])
}

/// Encode one row, terminated by `\n`
pub fn encode_row<S: AsRef<str>>(fields: &[Option<S>]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        let Some(value) = field else { continue };
        let value = value.as_ref();
        if needs_quoting(value) {
            out.push('"');
            out.push_str(&value.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(value);
        }
    }
    out.push('\n');
    out
}

pub fn encode_header(names: &[&str]) -> String {
    let fields: Vec<Option<&str>> = names.iter().copied().map(Some).collect();
    encode_row(&fields)
}

/// Iterator over the records of a stream file
///
/// Empty lines are skipped. A malformed record yields a `ParseError` and
/// parsing resumes at the next line.
pub struct RowParser<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> RowParser<'a> {
    pub fn new(input: &'a str) -> Self {
        let pos = if input.starts_with('\u{feff}') {
            '\u{feff}'.len_utf8()
        } else {
            0
        };
        RowParser {
            input,
            pos,
            line: 1,
        }
    }

    fn skip_blank_lines(&mut self) {
        let bytes = self.input.as_bytes();
        while matches!(bytes.get(self.pos), Some(b'\r' | b'\n')) {
            self.pos = self.consume_line_end(self.pos);
        }
    }

    /// Step over a line terminator at `i`, if any
    fn consume_line_end(&mut self, i: usize) -> usize {
        let bytes = self.input.as_bytes();
        match bytes.get(i) {
            Some(b'\r') if bytes.get(i + 1) == Some(&b'\n') => {
                self.line += 1;
                i + 2
            }
            Some(b'\r' | b'\n') => {
                self.line += 1;
                i + 1
            }
            _ => i,
        }
    }

    /// Read one record from `self.pos`; returns the fields and where the
    /// record text ends
    fn read_fields(&mut self) -> (Result<Vec<Option<String>>, String>, usize) {
        let input = self.input;
        let bytes = input.as_bytes();
        let mut fields = Vec::new();
        let start = self.pos;
        let start_line = self.line;
        let mut i = start;

        loop {
            if bytes.get(i) == Some(&b'"') {
                i += 1;
                let mut segment = i;
                let mut value = String::new();
                loop {
                    match bytes.get(i) {
                        None => {
                            // Only the line the record started on is lost
                            let end = line_end(bytes, start);
                            self.line = start_line;
                            self.pos = self.consume_line_end(end);
                            return (Err("unterminated quoted field".to_string()), end);
                        }
                        Some(b'"') if bytes.get(i + 1) == Some(&b'"') => {
                            value.push_str(&input[segment..=i]);
                            i += 2;
                            segment = i;
                        }
                        Some(b'"') => {
                            value.push_str(&input[segment..i]);
                            i += 1;
                            break;
                        }
                        Some(b'\n') => {
                            self.line += 1;
                            i += 1;
                        }
                        Some(_) => i += 1,
                    }
                }
                fields.push(Some(value));

                if !matches!(bytes.get(i), None | Some(b',' | b'\r' | b'\n')) {
                    let end = line_end(bytes, i);
                    self.pos = self.consume_line_end(end);
                    return (
                        Err("unexpected character after closing quote".to_string()),
                        end,
                    );
                }
            } else {
                let end = line_or_field_end(bytes, i);
                let text = &input[i..end];
                fields.push(if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                });
                i = end;
            }

            if bytes.get(i) == Some(&b',') {
                i += 1;
            } else {
                self.pos = self.consume_line_end(i);
                return (Ok(fields), i);
            }
        }
    }
}

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| matches!(b, b'\r' | b'\n'))
        .map_or(bytes.len(), |p| from + p)
}

fn line_or_field_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|b| matches!(b, b',' | b'\r' | b'\n'))
        .map_or(bytes.len(), |p| from + p)
}

impl<'a> Iterator for RowParser<'a> {
    type Item = Result<RawRow, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_blank_lines();
        if self.pos >= self.input.len() {
            return None;
        }

        let start = self.pos;
        let line = self.line;
        let (fields, raw_end) = self.read_fields();
        let raw = self.input[start..raw_end].to_string();

        Some(match fields {
            Ok(fields) => Ok(RawRow {
                line,
                offset: start,
                fields,
                raw,
            }),
            Err(reason) => Err(ParseError { line, reason, raw }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn test_encode_quotes_only_when_needed() {
        let row = encode_row(&[
            Some("2024-01-01 08:00:00"),
            Some("Lunch"),
            Some("rice, beans"),
            Some("said \"yum\""),
            None,
        ]);
        assert_eq!(
            row,
            "2024-01-01 08:00:00,Lunch,\"rice, beans\",\"said \"\"yum\"\"\",\n"
        );
        assert_eq!(encode_header(&["a", "b"]), "a,b\n");
    }

    #[test]
    fn test_parse_quoted_fields_round_trip() {
        let fields = vec![
            Some("toast".to_string()),
            Some("line one\nline two".to_string()),
            Some("a \"quoted\", comma".to_string()),
            None,
        ];
        let text = encode_row(&fields);
        let rows: Vec<RawRow> = RowParser::new(&text).map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fields, fields);
        assert_eq!(rows[0].line, 1);
    }

    #[test]
    fn test_line_numbers_follow_embedded_newlines() {
        let text = "h1,h2\n\"multi\nline\",x\n\nlast,row\n";
        let rows: Vec<RawRow> = RowParser::new(text).map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].line, 2);
        assert_eq!(rows[1].raw, "\"multi\nline\",x");
        assert_eq!(rows[2].line, 5);
        assert_eq!(rows[2].offset, text.find("last").unwrap());
        assert_eq!(rows[2].fields, some(&["last", "row"]));
    }

    #[test]
    fn test_crlf_and_legacy_rows() {
        let text = "\u{feff}datetime,meal_type,food,notes\r\n2024-01-01 08:00:00,Breakfast,eggs and toast,\r\n";
        let rows: Vec<RawRow> = RowParser::new(text).map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fields[0].as_deref(), Some("datetime"));
        assert_eq!(rows[1].offset, text.find("2024").unwrap());
        assert_eq!(
            rows[1].fields,
            vec![
                Some("2024-01-01 08:00:00".to_string()),
                Some("Breakfast".to_string()),
                Some("eggs and toast".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn test_malformed_row_recovers_at_next_line() {
        let text = "a,\"b\"x,c\nd,e\n";
        let mut parser = RowParser::new(text);

        let err = parser.next().unwrap().unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.raw, "a,\"b\"x,c");

        let row = parser.next().unwrap().unwrap();
        assert_eq!(row.fields, some(&["d", "e"]));
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_unterminated_quote_loses_only_its_line() {
        let mut parser = RowParser::new("ok,row\n\"never closed,\nmore,rows\nlast\n");
        assert!(parser.next().unwrap().is_ok());

        let err = parser.next().unwrap().unwrap_err();
        assert_eq!(err.reason, "unterminated quoted field");
        assert_eq!(err.line, 2);
        assert_eq!(err.raw, "\"never closed,");

        let row = parser.next().unwrap().unwrap();
        assert_eq!((row.line, row.fields), (3, some(&["more", "rows"])));
        let row = parser.next().unwrap().unwrap();
        assert_eq!((row.line, row.fields), (4, some(&["last"])));
        assert!(parser.next().is_none());
    }
}
