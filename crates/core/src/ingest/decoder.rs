//! Decoding of the quick-pick procedure's two output parameters.
//!
//! The procedure answers with stringified cursor rows such as
//! `[{ERROR_DESCRIPTION=Lot expired}, {ERROR_DESCRIPTION=Bin full}]`. Older
//! handheld builds parse the error string produced by [`DecodeMode::Legacy`]
//! positionally, so that mode reproduces the historical output exactly,
//! including its reversed ordering. [`DecodeMode::Structured`] reads the rows
//! properly and also returns the descriptions as a list.

use serde_json::{json, Value};

use crate::domain::response::{ApiResponse, CREATED};
use crate::ingest::ports::QuickPickOutput;

const BAD_REQUEST_PREFIX: &str = "BAD REQUEST~";
const ERROR_DESCRIPTION: &str = "ERROR_DESCRIPTION";
const LEGACY_ROW_DELIMITER: &str = "}, {ERROR_DESCRIPTION=";
const LEGACY_PREFIX_CHARS: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeMode {
    #[default]
    Legacy,
    Structured,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseDecoder {
    mode: DecodeMode,
}

impl ResponseDecoder {
    pub fn new(mode: DecodeMode) -> Self {
        Self { mode }
    }

    pub fn decode(&self, output: &QuickPickOutput) -> ApiResponse {
        let mut response = ApiResponse {
            status: 200,
            success: true,
            error: None,
            data: Some(json!({ "P_MES": output.p_mes, "P_MES2": output.p_mes2 })),
        };

        match self.mode {
            DecodeMode::Legacy => decode_legacy(output, &mut response),
            DecodeMode::Structured => decode_structured(output, &mut response),
        }

        response.success = response.status == 200;
        response
    }
}

fn present(output: &QuickPickOutput) -> impl Iterator<Item = &str> {
    [output.p_mes.as_deref(), output.p_mes2.as_deref()]
        .into_iter()
        .flatten()
        .filter(|value| !value.is_empty())
}

fn apply_status(response: &mut ApiResponse, value: &str) {
    if value.contains("200") {
        response.status = 200;
        response.error = Some(CREATED.to_string());
    } else if value.contains("400") {
        response.status = 400;
    }
}

fn decode_legacy(output: &QuickPickOutput, response: &mut ApiResponse) {
    for (position, value) in present(output).enumerate() {
        let seen = position + 1;
        let joined = if seen == 2 { legacy_join(value) } else { None };

        apply_status(response, value);

        if let (400, Some(joined)) = (response.status, joined) {
            response.error = Some(format!("{BAD_REQUEST_PREFIX}{}", legacy_trim(&joined)));
        }
    }
}

/// Reverse-concatenates the row fragments after the fixed 20 character
/// prefix. The fold is seeded with the literal `null`.
fn legacy_join(value: &str) -> Option<String> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= LEGACY_PREFIX_CHARS {
        return None;
    }

    let inner: String = chars[LEGACY_PREFIX_CHARS..chars.len() - 1].iter().collect();
    let joined = inner
        .split(LEGACY_ROW_DELIMITER)
        .fold("null".to_string(), |acc, fragment| format!("{fragment}~{acc}"));
    Some(joined)
}

/// Drops the first `}` and then keeps `len - 6` characters, measured on the
/// string before the brace was removed.
fn legacy_trim(joined: &str) -> String {
    let keep = joined.chars().count().saturating_sub(6);
    joined.replacen('}', "", 1).chars().take(keep).collect()
}

fn decode_structured(output: &QuickPickOutput, response: &mut ApiResponse) {
    let mut descriptions = Vec::new();
    for value in present(output) {
        apply_status(response, value);
        descriptions.extend(error_descriptions(value));
    }

    if response.status == 400 && !descriptions.is_empty() {
        response.error = Some(format!("{BAD_REQUEST_PREFIX}{}", descriptions.join("~")));
    }

    if let Some(Value::Object(data)) = response.data.as_mut() {
        data.insert("errors".to_string(), json!(descriptions));
    }
}

/// Every `ERROR_DESCRIPTION` value found in a stringified row set, in order.
pub fn error_descriptions(value: &str) -> Vec<String> {
    rows(value)
        .into_iter()
        .flat_map(|row| fields(row).into_iter())
        .filter(|(name, _)| *name == ERROR_DESCRIPTION)
        .map(|(_, value)| value.to_string())
        .collect()
}

/// Bodies of the `{...}` groups. An unterminated trailing group is ignored.
fn rows(value: &str) -> Vec<&str> {
    let mut rows = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        rows.push(&after[..close]);
        rest = &after[close + 1..];
    }
    rows
}

/// Splits `NAME=value, OTHER=value` on separators that start a new field, so
/// commas inside a value survive.
fn fields(row: &str) -> Vec<(&str, &str)> {
    let mut starts = vec![0];
    let bytes = row.as_bytes();
    let mut index = 0;
    while let Some(offset) = row[index..].find(", ") {
        let candidate = index + offset + 2;
        if starts_field(&row[candidate..]) {
            starts.push(candidate);
        }
        index = candidate;
        if index >= bytes.len() {
            break;
        }
    }

    let mut parsed = Vec::with_capacity(starts.len());
    for (position, start) in starts.iter().enumerate() {
        let end = starts.get(position + 1).map(|next| next - 2).unwrap_or(row.len());
        if let Some((name, value)) = row[*start..end].split_once('=') {
            parsed.push((name.trim(), value));
        }
    }
    parsed
}

fn starts_field(segment: &str) -> bool {
    match segment.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{error_descriptions, DecodeMode, ResponseDecoder};
    use crate::ingest::ports::QuickPickOutput;

    fn output(p_mes: Option<&str>, p_mes2: Option<&str>) -> QuickPickOutput {
        QuickPickOutput { p_mes: p_mes.map(str::to_string), p_mes2: p_mes2.map(str::to_string) }
    }

    const TWO_ERRORS: &str = "[{ERROR_DESCRIPTION=Item 400 short}, {ERROR_DESCRIPTION=Lot expired}]";

    #[test]
    fn legacy_mode_reverses_fragments_behind_bad_request_prefix() {
        let response = ResponseDecoder::new(DecodeMode::Legacy)
            .decode(&output(Some("[{STATUS=200}]"), Some(TWO_ERRORS)));

        assert_eq!(response.status, 400);
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("BAD REQUEST~Lot expired~Item 400 short"));
    }

    #[test]
    fn legacy_mode_reports_created_when_only_success_is_seen() {
        let response =
            ResponseDecoder::new(DecodeMode::Legacy).decode(&output(Some("[{STATUS=200}]"), None));

        assert_eq!(response.status, 200);
        assert!(response.success);
        assert_eq!(response.error.as_deref(), Some("Created"));
    }

    #[test]
    fn legacy_mode_only_extracts_from_the_second_present_value() {
        let response = ResponseDecoder::new(DecodeMode::Legacy).decode(&output(None, Some(TWO_ERRORS)));

        assert_eq!(response.status, 400);
        assert_eq!(response.error, None);
    }

    #[test]
    fn legacy_mode_truncates_even_without_a_closing_brace() {
        let response = ResponseDecoder::new(DecodeMode::Legacy)
            .decode(&output(Some("400"), Some("[{ERROR_DESCRIPTION=Short pick!")));

        // "Short pick~null" loses six characters: "~null" and the final "k".
        assert_eq!(response.error.as_deref(), Some("BAD REQUEST~Short pic"));
    }

    #[test]
    fn legacy_mode_tolerates_short_and_garbled_values() {
        let response =
            ResponseDecoder::new(DecodeMode::Legacy).decode(&output(Some("400"), Some("}}{{")));

        assert_eq!(response.status, 400);
        assert_eq!(response.error, None);
    }

    #[test]
    fn structured_mode_keeps_received_order_and_exposes_list() {
        let response = ResponseDecoder::new(DecodeMode::Structured)
            .decode(&output(Some("[{STATUS=200}]"), Some(TWO_ERRORS)));

        assert_eq!(response.status, 400);
        assert_eq!(response.error.as_deref(), Some("BAD REQUEST~Item 400 short~Lot expired"));
        let errors = response.data.as_ref().and_then(|data| data.get("errors")).cloned();
        assert_eq!(errors, Some(serde_json::json!(["Item 400 short", "Lot expired"])));
    }

    #[test]
    fn descriptions_keep_embedded_commas() {
        let parsed =
            error_descriptions("[{CODE=E1, ERROR_DESCRIPTION=Bin A1, level 2 is full, QTY=3}]");
        assert_eq!(parsed, vec!["Bin A1, level 2 is full".to_string()]);
    }

    #[test]
    fn empty_values_are_skipped() {
        let response = ResponseDecoder::new(DecodeMode::Structured).decode(&output(Some(""), None));
        assert_eq!(response.status, 200);
        assert_eq!(response.error, None);
    }
}
