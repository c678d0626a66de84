//! Flat details codec
//!
//! Packs the nested part of an [`Issue`] (primary location, flows, quick
//! fixes) into one line-oriented text blob for backends that only offer
//! scalar columns.
//!
//! ```text
//! P|<loc>                      primary location (omitted when absent)
//! F;L|<loc>;L|<loc>            one flow per line, a bare "F" is an empty flow
//! Q;<text>;L|<loc>             one quick fix per line, <text> is its message
//!
//! <loc> = <file_path>|<start_line>|<end_line>|<start_offset>|<end_offset>|<message>
//! ```
//!
//! Integers are decimal, empty when absent. Text is empty when absent and
//! otherwise `~` followed by standard base64, so neither `|`, `;` nor a
//! newline can ever appear inside a field and an empty string stays distinct
//! from a missing one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CodecError;
use crate::model::{Issue, IssueFlow, IssueLocation, QuickFix};

const PRIMARY: char = 'P';
const FLOW: char = 'F';
const QUICK_FIX: char = 'Q';
const LOCATION: char = 'L';
const FIELD_SEP: char = '|';
const ITEM_SEP: char = ';';
const PRESENT: char = '~';

/// Fields in a location token, including the leading tag
const LOCATION_FIELDS: usize = 7;

/// Decoded nested portion of an issue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDetails {
    pub primary_location: Option<IssueLocation>,
    pub flows: Vec<IssueFlow>,
    pub quick_fixes: Vec<QuickFix>,
}

impl IssueDetails {
    /// Replace the nested fields of `issue` with these details
    pub fn apply_to(self, issue: &mut Issue) {
        issue.primary_location = self.primary_location;
        issue.flows = self.flows;
        issue.quick_fixes = self.quick_fixes;
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode the primary location, flows and quick fixes of `issue`
pub fn encode(issue: &Issue) -> String {
    let mut out = String::new();

    if let Some(primary) = &issue.primary_location {
        out.push(PRIMARY);
        push_location_fields(&mut out, primary);
        out.push('\n');
    }

    for flow in &issue.flows {
        out.push(FLOW);
        for loc in &flow.locations {
            out.push(ITEM_SEP);
            push_location(&mut out, loc);
        }
        out.push('\n');
    }

    for fix in &issue.quick_fixes {
        out.push(QUICK_FIX);
        out.push(ITEM_SEP);
        push_text(&mut out, Some(&fix.message));
        for loc in &fix.locations {
            out.push(ITEM_SEP);
            push_location(&mut out, loc);
        }
        out.push('\n');
    }

    out
}

fn push_location(out: &mut String, loc: &IssueLocation) {
    out.push(LOCATION);
    push_location_fields(out, loc);
}

fn push_location_fields(out: &mut String, loc: &IssueLocation) {
    out.push(FIELD_SEP);
    push_text(out, loc.file_path.as_deref());
    for value in [loc.start_line, loc.end_line, loc.start_offset, loc.end_offset] {
        out.push(FIELD_SEP);
        if let Some(v) = value {
            out.push_str(&v.to_string());
        }
    }
    out.push(FIELD_SEP);
    push_text(out, loc.message.as_deref());
}

fn push_text(out: &mut String, text: Option<&str>) {
    if let Some(text) = text {
        out.push(PRESENT);
        STANDARD.encode_string(text.as_bytes(), out);
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a blob produced by [`encode`]
pub fn decode(blob: &str) -> Result<IssueDetails, CodecError> {
    let mut details = IssueDetails::default();

    for (idx, line) in blob.lines().enumerate() {
        let line_no = idx + 1;
        let mut chars = line.chars();
        let Some(tag) = chars.next() else {
            continue;
        };
        let rest = chars.as_str();

        match tag {
            PRIMARY => {
                if !rest.starts_with(FIELD_SEP) {
                    return Err(CodecError::MalformedPrimary {
                        line: line_no,
                        token: line.chars().take(16).collect(),
                    });
                }
                // rest starts with the separator, so fields[0] is empty
                let fields: Vec<&str> = rest.split(FIELD_SEP).collect();
                if fields.len() != LOCATION_FIELDS {
                    return Err(CodecError::FieldCount {
                        line: line_no,
                        expected: LOCATION_FIELDS,
                        found: fields.len(),
                    });
                }
                details.primary_location = Some(parse_location_fields(&fields[1..], line_no)?);
            }
            FLOW => {
                let mut locations = Vec::new();
                for token in items(rest, line_no)? {
                    locations.push(parse_location(token, line_no)?);
                }
                details.flows.push(IssueFlow::new(locations));
            }
            QUICK_FIX => {
                let mut tokens = items(rest, line_no)?;
                let message = tokens
                    .next()
                    .ok_or(CodecError::FieldCount {
                        line: line_no,
                        expected: 1,
                        found: 0,
                    })
                    .and_then(|t| parse_text(t, line_no))?
                    .unwrap_or_default();
                let mut locations = Vec::new();
                for token in tokens {
                    locations.push(parse_location(token, line_no)?);
                }
                details.quick_fixes.push(QuickFix::new(message, locations));
            }
            other => {
                return Err(CodecError::UnknownTag {
                    line: line_no,
                    tag: other,
                })
            }
        }
    }

    Ok(details)
}

/// Decode `blob` into `issue`, leaving it untouched on error
pub fn decode_into(blob: &str, issue: &mut Issue) -> Result<(), CodecError> {
    decode(blob)?.apply_to(issue);
    Ok(())
}

/// Items after a flow/quick-fix tag: ";a;b" -> ["a", "b"], "" -> []
fn items(rest: &str, line: usize) -> Result<impl Iterator<Item = &str>, CodecError> {
    if !rest.is_empty() && !rest.starts_with(ITEM_SEP) {
        return Err(CodecError::ExpectedLocation {
            line,
            token: rest.chars().take(16).collect(),
        });
    }
    Ok(rest
        .strip_prefix(ITEM_SEP)
        .map(|r| r.split(ITEM_SEP))
        .into_iter()
        .flatten())
}

fn parse_location(token: &str, line: usize) -> Result<IssueLocation, CodecError> {
    let fields: Vec<&str> = token.split(FIELD_SEP).collect();
    if fields[0].strip_prefix(LOCATION) != Some("") {
        return Err(CodecError::ExpectedLocation {
            line,
            token: token.chars().take(16).collect(),
        });
    }
    if fields.len() != LOCATION_FIELDS {
        return Err(CodecError::FieldCount {
            line,
            expected: LOCATION_FIELDS,
            found: fields.len(),
        });
    }
    parse_location_fields(&fields[1..], line)
}

/// Parse the six value fields of a location
fn parse_location_fields(fields: &[&str], line: usize) -> Result<IssueLocation, CodecError> {
    Ok(IssueLocation {
        file_path: parse_text(fields[0], line)?,
        start_line: parse_int(fields[1], line)?,
        end_line: parse_int(fields[2], line)?,
        start_offset: parse_int(fields[3], line)?,
        end_offset: parse_int(fields[4], line)?,
        message: parse_text(fields[5], line)?,
    })
}

fn parse_int(field: &str, line: usize) -> Result<Option<u32>, CodecError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse()
        .map(Some)
        .map_err(|_| CodecError::InvalidInteger {
            line,
            value: field.to_string(),
        })
}

fn parse_text(field: &str, line: usize) -> Result<Option<String>, CodecError> {
    if field.is_empty() {
        return Ok(None);
    }
    let encoded = field
        .strip_prefix(PRESENT)
        .ok_or(CodecError::MissingMarker { line })?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| CodecError::InvalidBase64 { line })?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| CodecError::InvalidUtf8 { line })
}
