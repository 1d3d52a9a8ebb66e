//! Employee CSV parser with encoding and delimiter auto-detection.
//!
//! Turns the text of a spreadsheet export into validated
//! [`ParsedEmployeeRow`]s plus one [`ParseError`] per rejected line. Data
//! problems never abort the parse: only an empty file or a header without the
//! required columns rejects the file as a whole, and even then the result is
//! returned as data.
//!
//! # Format
//!
//! - First non-blank line is the header. Column names are matched
//!   case-insensitively against [`resolve_header`] (English and Portuguese).
//! - Delimiter is `;` when the header contains one, `,` otherwise.
//! - Fields are split on every delimiter occurrence. Quoting is **not**
//!   supported: `"Silva, Joao"` in a comma file is two cells.
//! - Blank lines are skipped and do not count towards line numbers.
//!
//! # Example
//!
//! ```rust,ignore
//! use onboarding::parse_employees_csv;
//!
//! let outcome = parse_employees_csv("Name,Email,Cost_Center\nJoao,joao@empresa.com,1");
//! assert_eq!(outcome.rows.len(), 1);
//! assert_eq!(outcome.rows[0].line, 2);
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{Field, ParseError, ParseOutcome};
use crate::validation::{parse_cost_center, validate_row, RowDraft};

/// Message for a file with no non-blank lines.
pub const EMPTY_FILE_MESSAGE: &str = "empty file";

/// Map a header cell to its canonical field.
///
/// The cell is trimmed and lowercased before lookup.
pub fn resolve_header(cell: &str) -> Option<Field> {
    match cell.trim().to_lowercase().as_str() {
        "name" | "nome" | "fullname" | "full name" | "full_name" => Some(Field::FullName),
        "email" | "e-mail" | "mail" => Some(Field::Email),
        "cost_center" | "costcenter" | "cost_center_id" | "centro de custo" | "cc" => {
            Some(Field::CostCenterId)
        }
        "department" | "departamento" => Some(Field::Department),
        _ => None,
    }
}

/// Pick the delimiter from the header line: `;` if present, else `,`.
pub fn detect_delimiter(header_line: &str) -> char {
    if header_line.contains(';') {
        ';'
    } else {
        ','
    }
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes with an explicit encoding label (`utf-8`, `latin1`, `windows-1252`, ...).
pub fn decode_with_label(bytes: &[u8], label: &str) -> CsvResult<String> {
    let encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
        CsvError::Encoding {
            encoding: label.to_string(),
            message: "unknown encoding label".to_string(),
        }
    })?;
    let (text, _, _) = encoding.decode(bytes);
    Ok(text.into_owned())
}

/// Decode bytes using a detected encoding name.
///
/// Unknown names fall back to lossy UTF-8 so a wrong guess never rejects a file.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding {
        "utf-8" => String::from_utf8_lossy(bytes).into_owned(),
        other => decode_with_label(bytes, other)
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Parse employee CSV text.
pub fn parse_employees_csv(text: &str) -> ParseOutcome {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    // `\n`, `\r\n` and bare `\r`; the empty pieces `\r\n` leaves are blank.
    let lines: Vec<&str> = text
        .split(|c: char| c == '\r' || c == '\n')
        .filter(|l| !l.trim().is_empty())
        .collect();

    let Some(header_line) = lines.first() else {
        return ParseOutcome::structural(EMPTY_FILE_MESSAGE);
    };

    let delimiter = detect_delimiter(header_line);
    let columns: Vec<Option<Field>> = header_line.split(delimiter).map(resolve_header).collect();

    let missing: Vec<&str> = Field::REQUIRED
        .iter()
        .filter(|field| !columns.contains(&Some(**field)))
        .map(|field| field.as_str())
        .collect();

    if !missing.is_empty() {
        return ParseOutcome::structural(format!(
            "missing required columns: {}",
            missing.join(", ")
        ));
    }

    let mut outcome = ParseOutcome::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, raw) in lines.iter().enumerate().skip(1) {
        let line = i + 1;
        let draft = build_draft(line, raw, delimiter, &columns);

        match validate_row(draft, &seen) {
            Ok(row) => {
                seen.insert(row.email.clone(), row.line);
                outcome.rows.push(row);
            }
            Err(violation) => {
                outcome
                    .errors
                    .push(ParseError::new(line, violation.to_string()).with_raw(*raw));
            }
        }
    }

    outcome
}

/// Map one data line onto a draft using the header's column layout.
///
/// Cells past the end of the line read as empty. When a field has more than
/// one column, the last one wins.
fn build_draft(line: usize, raw: &str, delimiter: char, columns: &[Option<Field>]) -> RowDraft {
    let cells: Vec<&str> = raw.split(delimiter).collect();
    let mut draft = RowDraft {
        line,
        ..RowDraft::default()
    };

    for (idx, field) in columns.iter().enumerate() {
        let Some(field) = field else { continue };
        let value = cells.get(idx).map(|c| c.trim()).unwrap_or("");

        match field {
            Field::FullName => draft.full_name = value.to_string(),
            Field::Email => draft.email = value.to_lowercase(),
            Field::CostCenterId => draft.cost_center = parse_cost_center(value),
            Field::Department => draft.department = value.to_string(),
        }
    }

    draft
}

/// Parse employee CSV bytes with encoding auto-detection.
pub fn parse_employees_bytes(bytes: &[u8]) -> ParseOutcome {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    parse_employees_csv(&content)
}

/// Read and parse an employee CSV file.
///
/// With `encoding = None` the encoding is detected; otherwise the label is used as given.
pub fn parse_employees_file<P: AsRef<Path>>(path: P, encoding: Option<&str>) -> CsvResult<ParseOutcome> {
    let bytes = std::fs::read(path.as_ref())?;
    match encoding {
        Some(label) => Ok(parse_employees_csv(&decode_with_label(&bytes, label)?)),
        None => Ok(parse_employees_bytes(&bytes)),
    }
}
