//! Minimal comma-separated text reader/writer
//!
//! Double-quoted fields may contain commas, quotes (`""`) and line breaks.
//! Records end in `\n` or `\r\n`; blank records and a leading BOM are
//! ignored.

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Split text into records of fields
///
/// Unquoted fields are returned as-is (callers trim); an unterminated
/// quote runs to the end of input.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    field.push(QUOTE);
                    chars.next();
                }
                QUOTE => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            QUOTE => in_quotes = true,
            DELIMITER => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => finish_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }
    finish_record(&mut records, &mut record, &mut field);

    records
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    record.push(std::mem::take(field));
    let fields = std::mem::take(record);
    if fields.iter().all(|f| f.trim().is_empty()) {
        return;
    }
    records.push(fields);
}

/// Quote a field when it contains a delimiter, quote or line break
pub fn escape_field(value: &str) -> String {
    if value.contains([DELIMITER, QUOTE, '\n', '\r']) {
        quote_field(value)
    } else {
        value.to_string()
    }
}

/// Always quote, doubling embedded quotes
pub fn quote_field(value: &str) -> String {
    format!("{QUOTE}{}{QUOTE}", value.replace(QUOTE, "\"\""))
}

/// Join already-escaped fields into one record
pub fn join_record<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| f.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Index of the header cell naming `wanted`, trimmed and compared without
/// regard to case (Unicode-aware, so `NUMÉRO` matches `Numéro`)
pub fn find_column(header: &[String], wanted: &str) -> Option<usize> {
    let wanted = wanted.trim().to_lowercase();
    header.iter().position(|h| h.trim().to_lowercase() == wanted)
}
