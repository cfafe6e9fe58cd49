//! Data-file header codec.
//!
//! Uploaded data files carry their metadata as a block of `key=value` lines:
//!
//! ```text
//! expocode=33HQ20110517
//! vessel_name=Healy
//! investigator[
//! name=J. Doe
//! email=j@x.org
//! ]
//! additional_information=first line
//! second line
//! ```
//!
//! - A line without an unescaped `=`, `[` or `]` continues the previous value.
//! - `group[` opens a record of a repeating group; a lone `]` closes it.
//! - `\\`, `\=`, `\[` and `\]` escape the delimiters inside values.
//! - Values are trimmed at both ends; continuation lines keep their leading
//!   indentation. Empty values are treated as absent.
//! - A block repeating the identity of an earlier block in the same group is
//!   folded into it.
//!
//! Keys and group names are matched case-insensitively against the schema.

use crate::document::MetadataDocument;
use crate::error::MergeError;
use crate::model::CompositeRecord;
use crate::schema::{self, CRUISE_ID, RECORD_GROUPS};

// ---------------------------------------------------------------------------
// Line scanning
// ---------------------------------------------------------------------------

/// One header line with escapes resolved and unescaped delimiters located.
struct HeaderLine {
    text: String,
    delims: Vec<(usize, char)>,
}

impl HeaderLine {
    fn scan(raw: &str) -> Self {
        let mut text = String::with_capacity(raw.len());
        let mut delims = Vec::new();
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => text.push(chars.next().unwrap_or('\\')),
                '=' | '[' | ']' => {
                    delims.push((text.len(), c));
                    text.push(c);
                }
                _ => text.push(c),
            }
        }
        Self { text, delims }
    }

    fn count(&self, delim: char) -> usize {
        self.delims.iter().filter(|(_, c)| *c == delim).count()
    }

    fn first(&self, delim: char) -> Option<usize> {
        self.delims.iter().find(|(_, c)| *c == delim).map(|(i, _)| *i)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

struct Pending {
    key: String,
    value: String,
    line: usize,
}

struct OpenRecord {
    group: &'static str,
    record: CompositeRecord,
    line: usize,
}

/// Parse header text into a new document.
///
/// # Errors
/// [`MergeError::Header`] naming the 1-based line of the first problem:
/// orphaned continuation lines, misplaced or repeated delimiters, nested or
/// unterminated record blocks, and unknown keys, groups or entries.
pub fn parse_header(text: &str) -> Result<MetadataDocument, MergeError> {
    let mut doc = MetadataDocument::new();
    let mut pending: Option<Pending> = None;
    let mut open: Option<OpenRecord> = None;
    let mut last_line = 0;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        last_line = line_no;
        let line = HeaderLine::scan(raw);

        if line.delims.is_empty() {
            match pending.as_mut() {
                Some(p) => {
                    p.value.push('\n');
                    p.value.push_str(line.text.trim_end());
                }
                None if line.text.trim().is_empty() => {}
                None => {
                    return Err(MergeError::header(
                        line_no,
                        format!("orphaned line \"{}\"", raw.trim()),
                    ));
                }
            }
            continue;
        }

        if line.count(']') > 0 {
            if line.delims.len() != 1 || line.text.trim() != "]" {
                return Err(MergeError::header(
                    line_no,
                    "a closing ']' must be alone on its line",
                ));
            }
            let Some(mut block) = open.take() else {
                return Err(MergeError::header(
                    line_no,
                    "closing ']' without an opening block",
                ));
            };
            flush_entry(&mut block.record, pending.take())?;
            if block.record.is_empty() {
                tracing::debug!(group = block.group, line = block.line, "skipping empty record block");
            } else {
                doc.push_record(block.group, block.record)
                    .map_err(|e| MergeError::header(block.line, e.to_string()))?;
            }
            continue;
        }

        if let Some(at) = line.first('[') {
            if line.count('=') > 0 || line.count('[') > 1 {
                return Err(MergeError::header(
                    line_no,
                    "an opening '[' cannot be mixed with '=' or another '['",
                ));
            }
            if !line.text[at + 1..].trim().is_empty() {
                return Err(MergeError::header(
                    line_no,
                    "an opening '[' must end its line",
                ));
            }
            if let Some(block) = &open {
                return Err(MergeError::header(
                    line_no,
                    format!("cannot nest a record inside `{}[` opened on line {}", block.group, block.line),
                ));
            }
            flush_scalar(&mut doc, pending.take())?;

            let name = line.text[..at].trim();
            let Some(spec) = schema::lookup_group(name).and_then(|i| RECORD_GROUPS.get(i)) else {
                return Err(MergeError::header(line_no, format!("unknown record group `{name}`")));
            };
            open = Some(OpenRecord {
                group: spec.key,
                record: MetadataDocument::new_record(spec.key)?,
                line: line_no,
            });
            continue;
        }

        if line.count('=') > 1 {
            return Err(MergeError::header(
                line_no,
                "cannot have more than one '=' on a line",
            ));
        }
        let Some(at) = line.first('=') else {
            continue;
        };
        let next = Pending {
            key: line.text[..at].trim().to_owned(),
            value: line.text[at + 1..].trim().to_owned(),
            line: line_no,
        };
        match open.as_mut() {
            Some(block) => flush_entry(&mut block.record, pending.replace(next))?,
            None => flush_scalar(&mut doc, pending.replace(next))?,
        }
    }

    if let Some(block) = open {
        return Err(MergeError::header(
            last_line,
            format!("header ends inside the `{}[` block opened on line {}", block.group, block.line),
        ));
    }
    flush_scalar(&mut doc, pending)?;
    Ok(doc)
}

fn flush_scalar(doc: &mut MetadataDocument, pending: Option<Pending>) -> Result<(), MergeError> {
    let Some(Pending { key, value, line }) = pending else {
        return Ok(());
    };
    let value = value.trim();
    match schema::lookup_field(&key) {
        None => Err(MergeError::header(line, format!("unknown field `{key}`"))),
        Some(_) if value.is_empty() => Ok(()),
        Some(_) => doc.add_value(&key, value),
    }
}

fn flush_entry(record: &mut CompositeRecord, pending: Option<Pending>) -> Result<(), MergeError> {
    let Some(Pending { key, value, line }) = pending else {
        return Ok(());
    };
    let value = value.trim();
    let name = key.to_ascii_lowercase();
    if !record.shape().allows(&name) {
        return Err(MergeError::header(
            line,
            format!("unknown entry `{key}` in `{}` record", record.path()),
        ));
    }
    if value.is_empty() {
        return Ok(());
    }
    record
        .add_entry(&name, value)
        .map_err(|e| MergeError::header(line, e.to_string()))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render every non-empty value of `doc` as header text, in schema order.
///
/// # Errors
/// [`MergeError::HeaderConflict`] for the first field or record still in
/// dispute; header text has no way to carry more than one value.
pub fn render_header(doc: &MetadataDocument) -> Result<String, MergeError> {
    let mut out = String::new();

    let cruise_id = doc.cruise_id();
    if cruise_id.has_conflict() {
        return Err(MergeError::HeaderConflict {
            key: CRUISE_ID.key.to_owned(),
        });
    }
    push_line(&mut out, CRUISE_ID.key, cruise_id.canonical_value());

    for (spec, field) in doc.scalar_fields() {
        if field.has_conflict() {
            return Err(MergeError::HeaderConflict {
                key: spec.key.to_owned(),
            });
        }
        push_line(&mut out, spec.key, field.canonical_value());
    }

    for (spec, records) in doc.groups() {
        for record in records {
            if record.has_conflict() {
                return Err(MergeError::HeaderConflict {
                    key: format!("{}[{}]", spec.key, record.identity_label()),
                });
            }
            out.push_str(spec.key);
            out.push_str("[\n");
            for entry in spec.entries {
                push_line(&mut out, entry, record.value(entry));
            }
            out.push_str("]\n");
        }
    }

    Ok(out)
}

fn push_line(out: &mut String, key: &str, value: &str) {
    let value = escape(value.trim());
    if value.is_empty() {
        return;
    }
    out.push_str(key);
    out.push('=');
    out.push_str(&value);
    out.push('\n');
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '=' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
