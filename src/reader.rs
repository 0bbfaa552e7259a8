use crate::error::ParseError;
use std::io::{self, BufRead};
use std::str::FromStr;

/// Line cursor over a text input that remembers where it is, so parse errors
/// can point at the offending line.
pub struct LineReader<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        LineReader {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Number of the line returned last, 1-based.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Next line with surrounding whitespace removed, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<String>, ParseError> {
        match self.lines.next() {
            Some(line) => {
                self.line += 1;
                Ok(Some(line?.trim().to_owned()))
            }
            None => Ok(None),
        }
    }

    pub fn require(&mut self, expected: &'static str) -> Result<String, ParseError> {
        match self.next_line()? {
            Some(line) => Ok(line),
            None => Err(ParseError::UnexpectedEof {
                line: self.line + 1,
                expected,
            }),
        }
    }

    pub fn expect_marker(&mut self, marker: &'static str) -> Result<(), ParseError> {
        let found = self.require(marker)?;
        if found != marker {
            return Err(ParseError::UnexpectedMarker {
                line: self.line,
                expected: marker,
                found,
            });
        }
        Ok(())
    }
}

/// Splits a comma-separated line and parses every field.
pub fn parse_fields<T: FromStr>(
    text: &str,
    line: usize,
    kind: &'static str,
) -> Result<Vec<T>, ParseError> {
    text.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse::<T>().map_err(|_| ParseError::Number {
                line,
                token: token.to_owned(),
                kind,
            })
        })
        .collect()
}

/// Like [`parse_fields`], but the line must hold exactly `expected` fields.
pub fn parse_exact<T: FromStr>(
    text: &str,
    line: usize,
    expected: usize,
    kind: &'static str,
) -> Result<Vec<T>, ParseError> {
    let found = text.split(',').count();
    if found != expected {
        return Err(ParseError::FieldCount {
            line,
            expected,
            found,
        });
    }
    parse_fields(text, line, kind)
}
