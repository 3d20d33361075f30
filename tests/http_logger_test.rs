//! Tests for http_logger module

use prompt_enhancer::http_logger::{
    format_body, format_exchange, is_sensitive_header, mask_sensitive_header, mask_token,
    truncate_utf8_safe, HttpLogger, HttpRequestLog, HttpResponseLog,
};

/// Fails if any four-character window of `secret` shows up in `text`
fn assert_no_fragment_of(text: &str, secret: &str) {
    let chars: Vec<char> = secret.chars().collect();
    for window in chars.windows(4) {
        let fragment: String = window.iter().collect();
        assert!(!text.contains(&fragment), "leaked {:?}", fragment);
    }
}

fn sample_request() -> HttpRequestLog {
    HttpRequestLog {
        method: "POST".to_string(),
        url: "https://api.openai.com/v1/chat/completions".to_string(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            (
                "Authorization".to_string(),
                "Bearer sk-proj-abcdefghijklmnop".to_string(),
            ),
        ],
        body: Some(r#"{"model":"gpt-3.5-turbo","max_tokens":1000}"#.to_string()),
    }
}

#[test]
fn test_truncate_utf8_safe_ascii() {
    let s = "Hello, World!";
    assert_eq!(truncate_utf8_safe(s, 100), s);
    assert!(truncate_utf8_safe(s, 5).starts_with("Hello"));
}

#[test]
fn test_truncate_utf8_safe_unicode() {
    let s = "你好世界Hello";
    // 4 three-byte chars then ASCII; 10 falls inside the fourth char
    let truncated = truncate_utf8_safe(s, 10);
    assert!(truncated.starts_with("你好世..."));
    assert!(truncated.contains("[truncated, total 17 bytes]"));
}

#[test]
fn test_mask_token_bearer() {
    assert_eq!(mask_token("Bearer abcdefghijklmnop"), "Bearer ****");
    assert_eq!(mask_token("Bearer short"), "Bearer ****");
}

#[test]
fn test_mask_token_generic() {
    assert_eq!(mask_token("abcdefghijklmnop"), "****");
    assert_eq!(mask_token("short"), "****");
    assert_eq!(mask_token("12345678"), "****");
}

#[test]
fn test_is_sensitive_header() {
    assert!(is_sensitive_header("Authorization"));
    assert!(is_sensitive_header("authorization"));
    assert!(is_sensitive_header("Set-Cookie"));
    assert!(is_sensitive_header("X-Api-Key"));
    assert!(!is_sensitive_header("Content-Type"));
    assert!(!is_sensitive_header("User-Agent"));
}

#[test]
fn test_mask_sensitive_header() {
    assert_eq!(
        mask_sensitive_header("x-api-key", "key-1234567890"),
        "****"
    );
    assert_eq!(mask_sensitive_header("Accept", "*/*"), "*/*");
}

#[test]
fn test_format_body_pretty_prints_json() {
    let formatted = format_body(r#"{"a":1}"#);
    assert!(formatted.contains("\"a\": 1"));
    assert_eq!(format_body("plain text"), "plain text");
}

#[test]
fn test_format_exchange_with_response() {
    let response = HttpResponseLog {
        status: 200,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(r#"{"choices":[]}"#.to_string()),
    };
    let text = format_exchange(&sample_request(), Some(&response), 42, None);

    assert!(text.contains("POST https://api.openai.com/v1/chat/completions"));
    assert!(text.contains("--- Response (42ms) ---"));
    assert!(text.contains("Status: 200"));
    assert!(text.contains("Authorization: Bearer ****"));
    assert!(!text.contains("sk-proj-abcdefghijklmnop"));
    assert!(!text.contains("--- Error"));
}

#[test]
fn test_logger_appends_masked_exchanges() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("http.log");
    let logger = HttpLogger::new(&path);
    assert_eq!(logger.path(), path.as_path());

    logger.log_exchange(&sample_request(), None, 5, Some("connection refused"));
    logger.log_exchange(&sample_request(), None, 7, Some("timed out"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("connection refused"));
    assert!(content.contains("timed out"));
    assert_no_fragment_of(&content, "sk-proj-abcdefghijklmnop");
    assert_eq!(content.matches("--- Request Headers ---").count(), 2);
}
