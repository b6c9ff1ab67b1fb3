use crate::error::GeolocationError;
use crate::types::GeolocationResult;

/// Value of the first `"<name>":` label in `body`, or `0.0` when the label
/// is missing or not followed by a number.
///
/// Nesting is ignored: only the first textual occurrence counts.
pub fn field_value(body: &[u8], name: &str) -> f64 {
    label_end(body, name)
        .and_then(|start| number_token(&body[start..]))
        .and_then(|token| core::str::from_utf8(token).ok())
        .and_then(|token| token.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// `(0, 0)` is read as "no fix" rather than as a position in the Gulf of
/// Guinea, so a device there is reported as a parse failure.
pub fn is_null_island(latitude: f64, longitude: f64) -> bool {
    latitude == 0.0 && longitude == 0.0
}

pub fn parse_location(body: &[u8]) -> Result<GeolocationResult, GeolocationError> {
    let latitude = field_value(body, "lat");
    let longitude = field_value(body, "lng");
    let accuracy = field_value(body, "accuracy") as f32;

    if is_null_island(latitude, longitude) {
        log::error!("geolocation: failed to parse location from response");
        return Err(GeolocationError::ParseError);
    }

    log::info!(
        "geolocation: location lat={:.6} lng={:.6} accuracy={:.1}m",
        latitude,
        longitude,
        accuracy
    );
    Ok(GeolocationResult {
        latitude,
        longitude,
        accuracy,
    })
}

/// Index just past `"<name>":` and any whitespace after it, line breaks
/// included.
fn label_end(body: &[u8], name: &str) -> Option<usize> {
    let name = name.as_bytes();
    let label_len = name.len() + 3;
    if body.len() < label_len {
        return None;
    }

    let at = (0..=body.len() - label_len).find(|&idx| {
        body[idx] == b'"'
            && &body[idx + 1..idx + 1 + name.len()] == name
            && &body[idx + 1 + name.len()..idx + label_len] == b"\":"
    })?;

    let mut pos = at + label_len;
    while matches!(body.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)) {
        pos += 1;
    }
    Some(pos)
}

/// Longest `[+-]?digits*(.digits*)?` prefix.
fn number_token(input: &[u8]) -> Option<&[u8]> {
    let mut len = 0usize;
    if matches!(input.first(), Some(b'+' | b'-')) {
        len += 1;
    }
    let int_start = len;
    while input.get(len).is_some_and(u8::is_ascii_digit) {
        len += 1;
    }
    let mut digits = len - int_start;
    if input.get(len) == Some(&b'.') {
        len += 1;
        let frac_start = len;
        while input.get(len).is_some_and(u8::is_ascii_digit) {
            len += 1;
        }
        digits += len - frac_start;
    }

    if digits == 0 {
        return None;
    }
    Some(&input[..len])
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOGLE_STYLE: &[u8] = br#"{
  "location": {
    "lat": 37.123456,
    "lng": -122.654321
  },
  "accuracy": 15.5
}"#;

    #[test]
    fn parses_exact_values() {
        let body = br#"{"lat":37.123456,"lng":-122.654321,"accuracy":15.5}"#;
        let result = parse_location(body).unwrap();
        assert_eq!(result.latitude, 37.123456);
        assert_eq!(result.longitude, -122.654321);
        assert_eq!(result.accuracy, 15.5);
    }

    #[test]
    fn nesting_and_whitespace_are_ignored() {
        // Provider bodies put a space after the colon.
        let result = parse_location(GOOGLE_STYLE).unwrap();
        assert_eq!(result.latitude, 37.123456);
        assert_eq!(result.longitude, -122.654321);
        assert_eq!(result.accuracy, 15.5);
    }

    #[test]
    fn line_breaks_after_the_colon_are_skipped() {
        let body = b"{\"location\":{\"lat\":\n    37.5,\"lng\":\r\n    -122.25},\"accuracy\":\n 15.5}";
        assert_eq!(field_value(body, "lat"), 37.5);
        let result = parse_location(body).unwrap();
        assert_eq!(result.latitude, 37.5);
        assert_eq!(result.longitude, -122.25);
        assert_eq!(result.accuracy, 15.5);
        assert_eq!(field_value(b"{\"lat\":\x0b\x0c\t 2.5}", "lat"), 2.5);
    }

    #[test]
    fn missing_coordinates_are_a_parse_error() {
        assert_eq!(
            parse_location(br#"{"error":{"code":404,"message":"Not Found"}}"#),
            Err(GeolocationError::ParseError)
        );
        assert_eq!(parse_location(b""), Err(GeolocationError::ParseError));
    }

    #[test]
    fn origin_coordinates_are_a_parse_error() {
        assert_eq!(
            parse_location(br#"{"lat":0,"lng":0,"accuracy":20}"#),
            Err(GeolocationError::ParseError)
        );
        assert_eq!(
            parse_location(br#"{"lat":-0.0,"lng":0.000}"#),
            Err(GeolocationError::ParseError)
        );
    }

    #[test]
    fn one_zero_axis_is_accepted() {
        let result = parse_location(br#"{"lat":0,"lng":8.5}"#).unwrap();
        assert_eq!(result.latitude, 0.0);
        assert_eq!(result.longitude, 8.5);
    }

    #[test]
    fn missing_accuracy_defaults_to_zero() {
        let result = parse_location(br#"{"lat":51.5,"lng":-0.12}"#).unwrap();
        assert_eq!(result.accuracy, 0.0);
    }

    #[test]
    fn first_occurrence_wins() {
        let body = br#"{"lat":10.5,"lng":20.25,"other":{"lat":99}}"#;
        assert_eq!(field_value(body, "lat"), 10.5);
    }

    #[test]
    fn labels_must_match_exactly() {
        // "lat" must not match inside "plate" or before a missing colon.
        let body = br#"{"plate":4,"lat" :7,"lng":1}"#;
        assert_eq!(field_value(body, "lat"), 0.0);
        assert_eq!(field_value(body, "lng"), 1.0);
    }

    #[test]
    fn non_numeric_values_default_to_zero() {
        assert_eq!(field_value(br#"{"lat":"north"}"#, "lat"), 0.0);
        assert_eq!(field_value(br#"{"lat":-}"#, "lat"), 0.0);
        assert_eq!(field_value(br#"{"lat":"#, "lat"), 0.0);
    }

    #[test]
    fn number_token_forms() {
        assert_eq!(number_token(b"+12.5,"), Some(&b"+12.5"[..]));
        assert_eq!(number_token(b"-.5}"), Some(&b"-.5"[..]));
        assert_eq!(number_token(b"7."), Some(&b"7."[..]));
        assert_eq!(number_token(b"1e5"), Some(&b"1"[..]));
        assert_eq!(number_token(b"."), None);
    }

    #[test]
    fn truncated_body_never_panics() {
        let full = br#"{"lat":37.5,"lng":-122.25,"accuracy":15.5}"#;
        for end in 0..=full.len() {
            let _ = parse_location(&full[..end]);
        }
        let cut = parse_location(&full[..21]).unwrap();
        assert_eq!(cut.latitude, 37.5);
        assert_eq!(cut.longitude, -12.0);
    }
}
