//! Breakdown CSV reader with encoding and delimiter auto-detection.
//!
//! Bytes are decoded first (UTF-8, ISO-8859-1 or Windows-1252, sniffed with
//! `chardet`), then the delimiter is picked from the header line unless one
//! is given. Headers are matched case-insensitively; columns the pipeline
//! does not use are ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::path::Path;

use crate::error::{InputError, InputResult};
use crate::models::RawRow;

/// Delimiters tried by [`detect_delimiter`], in tie-break order.
const SEPARATORS: [char; 4] = [',', ';', '\t', '|'];

/// Columns that must be present, each with its accepted aliases.
const REQUIRED_COLUMNS: [&[&str]; 3] = [
    &["posted_date"],
    &["work_city", "work_location"],
    &["project_type"],
];

/// `RawRow` fields and the headers that may feed them, in preference order.
const FIELD_COLUMNS: [&[&str]; 7] = [
    &["posted_date"],
    &["work_city", "work_location"],
    &["project_type"],
    &["rate_value", "rate"],
    &["role_billing", "role_type"],
    &["union_status", "union"],
    &["role_description"],
];

/// Rows read from the input plus reader metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedInput {
    pub rows: Vec<RawRow>,
    /// Records the reader could not decode into a row.
    pub malformed: usize,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
    /// Normalized column headers.
    pub headers: Vec<String>,
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

/// Decode bytes using the given encoding label; unknown labels fall back
/// to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        // WHATWG maps the latin1 labels onto windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &SEPARATORS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// `" Work City "` → `"work_city"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Read and parse a breakdown CSV file.
pub fn read_input_file<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
) -> InputResult<ParsedInput> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes, delimiter)
}

/// Parse CSV bytes with auto-detection of encoding and (optionally) delimiter.
pub fn parse_bytes(bytes: &[u8], delimiter: Option<char>) -> InputResult<ParsedInput> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(InputError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    parse_str(&content, delimiter, encoding)
}

/// Parse decoded CSV text with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> InputResult<ParsedInput> {
    if content.trim().is_empty() {
        return Err(InputError::EmptyFile);
    }
    if !delimiter.is_ascii() {
        return Err(InputError::InvalidDelimiter(delimiter));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let raw_headers = reader
        .headers()
        .map_err(|e| InputError::NoHeaders(e.to_string()))?
        .clone();
    let headers: Vec<String> = raw_headers.iter().map(normalize_header).collect();

    if headers.iter().all(String::is_empty) {
        return Err(InputError::NoHeaders("header line is blank".into()));
    }
    check_required_columns(&headers)?;

    let header_record = resolve_headers(&headers);
    let width = header_record.len();

    let mut rows = Vec::new();
    let mut malformed = 0;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(line, error = %e, "unreadable CSV record");
                malformed += 1;
                continue;
            }
        };

        // Pad short rows and cut long ones so every field lines up with a header
        let fitted: StringRecord = (0..width).map(|i| record.get(i).unwrap_or("")).collect();

        match fitted.deserialize::<RawRow>(Some(&header_record)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::debug!(line, error = %e, "undecodable CSV record");
                malformed += 1;
            }
        }
    }

    Ok(ParsedInput {
        rows,
        malformed,
        encoding,
        delimiter,
        headers,
    })
}

/// Map normalized headers onto `RawRow` field names.
///
/// Each field is fed by exactly one column: the first header in
/// [`FIELD_COLUMNS`] preference order that is present, at its first
/// occurrence. Every other column naming the same field is blanked so
/// the row deserializer skips it.
fn resolve_headers(headers: &[String]) -> StringRecord {
    let mut resolved: Vec<&str> = headers.iter().map(String::as_str).collect();

    for names in FIELD_COLUMNS {
        let source = names
            .iter()
            .find_map(|name| headers.iter().position(|h| h == name));

        for (idx, header) in headers.iter().enumerate() {
            if names.contains(&header.as_str()) {
                resolved[idx] = if Some(idx) == source { names[0] } else { "" };
            }
        }
    }

    StringRecord::from(resolved)
}

fn check_required_columns(headers: &[String]) -> InputResult<()> {
    for aliases in REQUIRED_COLUMNS {
        if !aliases.iter().any(|a| headers.iter().any(|h| h == a)) {
            return Err(InputError::MissingColumn(aliases[0].to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "posted_date,work_city,project_type,rate_value,role_billing,union_status,role_description";

    fn parse(csv: &str) -> ParsedInput {
        parse_bytes(csv.as_bytes(), None).unwrap()
    }

    #[test]
    fn test_simple_csv() {
        let csv = format!(
            "{}\n2024-05-01,Los Angeles,Film,$150,Lead,SAG-AFTRA,A robot\n",
            HEADER
        );
        let parsed = parse(&csv);

        assert_eq!(parsed.delimiter, ',');
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.malformed, 0);
        let row = &parsed.rows[0];
        assert_eq!(row.posted_date.as_deref(), Some("2024-05-01"));
        assert_eq!(row.work_city.as_deref(), Some("Los Angeles"));
        assert_eq!(row.rate_value.as_deref(), Some("$150"));
        assert_eq!(row.union_status.as_deref(), Some("SAG-AFTRA"));
        assert_eq!(row.role_description.as_deref(), Some("A robot"));
    }

    #[test]
    fn test_semicolon_and_quoted_values() {
        let csv = "posted_date;work_city;project_type;role_description\n\
                   2024-05-01;\"Burbank, CA\";TV;\"Dry; witty\"\n";
        let parsed = parse(csv);

        assert_eq!(parsed.delimiter, ';');
        assert_eq!(parsed.rows[0].work_city.as_deref(), Some("Burbank, CA"));
        assert_eq!(parsed.rows[0].role_description.as_deref(), Some("Dry; witty"));
    }

    #[test]
    fn test_aliases_and_header_case() {
        let csv = "Posted Date,Work Location,Project Type,Rate,Role Type,Union\n\
                   2024-05-01,NYC,Film,200,Lead,Non-Union\n";
        let parsed = parse(csv);

        assert_eq!(parsed.headers[0], "posted_date");
        let row = &parsed.rows[0];
        assert_eq!(row.work_city.as_deref(), Some("NYC"));
        assert_eq!(row.rate_value.as_deref(), Some("200"));
        assert_eq!(row.role_billing.as_deref(), Some("Lead"));
        assert_eq!(row.union_status.as_deref(), Some("Non-Union"));
    }

    #[test]
    fn test_canonical_column_wins_over_alias() {
        let csv = "posted_date,work_city,work_location,project_type,\
                   rate,rate_value,union,union_status\n\
                   2024-05-01,Los Angeles,LA,Film,$150/day,150,SAG,yes\n\
                   2024-05-02,Brooklyn,NY,TV,,300,,Non-Union\n";
        let parsed = parse(csv);

        assert_eq!(parsed.malformed, 0);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].work_city.as_deref(), Some("Los Angeles"));
        assert_eq!(parsed.rows[0].rate_value.as_deref(), Some("150"));
        assert_eq!(parsed.rows[0].union_status.as_deref(), Some("yes"));
        assert_eq!(parsed.rows[1].work_city.as_deref(), Some("Brooklyn"));
        assert_eq!(parsed.rows[1].rate_value.as_deref(), Some("300"));
        // Reported headers keep the input names
        assert_eq!(parsed.headers[2], "work_location");
    }

    #[test]
    fn test_repeated_column_uses_first_occurrence() {
        let csv = "posted_date,work_location,project_type,work_location\n\
                   2024-05-01,NYC,Film,Brooklyn\n";
        let parsed = parse(csv);

        assert_eq!(parsed.malformed, 0);
        assert_eq!(parsed.rows[0].work_city.as_deref(), Some("NYC"));
    }

    #[test]
    fn test_resolve_headers() {
        let headers: Vec<String> = ["Rate", "rate_value", "role_type", "notes"]
            .iter()
            .map(|h| normalize_header(h))
            .collect();
        let resolved = resolve_headers(&headers);
        let names: Vec<&str> = resolved.iter().collect();
        assert_eq!(names, vec!["", "rate_value", "role_billing", "notes"]);
    }

    #[test]
    fn test_identity_and_extra_columns_ignored() {
        let csv = "actor_id,actor_name,posted_date,work_city,project_type\n\
                   42,Jane Doe,2024-05-01,LA,Film,trailing,extra\n";
        let parsed = parse(csv);

        assert_eq!(parsed.rows.len(), 1);
        let as_json = serde_json::to_string(&parsed.rows[0]).unwrap();
        assert!(!as_json.contains("Jane"));
        assert!(!as_json.contains("42"));
    }

    #[test]
    fn test_short_rows_and_empty_fields_are_missing() {
        let csv = format!("{}\n2024-05-01,LA,Film,,\n", HEADER);
        let parsed = parse(&csv);

        let row = &parsed.rows[0];
        assert_eq!(row.rate_value, None);
        assert_eq!(row.role_billing, None);
        assert_eq!(row.role_description, None);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_bytes(b"", None), Err(InputError::EmptyFile)));
        assert!(matches!(parse_bytes(b"  \n\n", None), Err(InputError::EmptyFile)));
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_bytes(b"posted_date,project_type\n2024-05-01,Film\n", None).unwrap_err();
        assert!(matches!(err, InputError::MissingColumn(ref c) if c == "work_city"));
    }

    #[test]
    fn test_header_only_gives_no_rows() {
        let parsed = parse(HEADER);
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.headers.len(), 7);
    }

    #[test]
    fn test_delimiter_override() {
        let csv = "posted_date|work_city|project_type\n2024-05-01|Austin, TX|Film\n";
        let parsed = parse_bytes(csv.as_bytes(), Some('|')).unwrap();
        assert_eq!(parsed.rows[0].work_city.as_deref(), Some("Austin, TX"));
        assert!(matches!(
            parse_bytes(csv.as_bytes(), Some('§')),
            Err(InputError::InvalidDelimiter('§'))
        ));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Work City "), "work_city");
        assert_eq!(normalize_header("\u{feff}posted_date"), "posted_date");
        assert_eq!(normalize_header("role-description"), "role_description");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Montréal" in ISO-8859-1
        let bytes: &[u8] = &[0x4D, 0x6F, 0x6E, 0x74, 0x72, 0xE9, 0x61, 0x6C];
        assert_eq!(decode_content(bytes, "iso-8859-1"), "Montréal");
        assert_eq!(decode_content(bytes, "windows-1252"), "Montréal");
        // 0xA4 is the currency sign in Latin-1, not the euro sign of ISO-8859-15
        assert_eq!(decode_content(&[0xA4], "iso-8859-1"), "\u{a4}");
    }

    #[test]
    fn test_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"posted_date,work_city,project_type\n2024-05-01,LA,Film\n");
        let parsed = parse_bytes(&bytes, None).unwrap();
        assert_eq!(parsed.headers[0], "posted_date");
        assert_eq!(parsed.rows.len(), 1);
    }
}
