use crate::{header_value, DecodeError, HeaderMap};

/// Reads the declared `content-length` header, if any. A value that does not
/// parse as an integer is a hard error rather than a silent skip.
pub fn declared_content_length(headers: &HeaderMap) -> Result<Option<i64>, DecodeError> {
    match header_value(headers, "content-length") {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| DecodeError::ContentLength(raw.to_string())),
        None => Ok(None),
    }
}

/// A body is truncated when the peer declared more bytes than were actually
/// received. Parsing must stop before a partial representation can pass for
/// a complete one.
pub fn body_truncated(declared: Option<i64>, actual_len: usize) -> bool {
    match declared {
        Some(declared) => declared > actual_len as i64,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{body_truncated, declared_content_length};
    use crate::{DecodeError, HeaderMap};

    fn headers(content_length: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("content-length".to_string(), content_length.to_string());
        headers
    }

    #[test]
    fn declared_longer_than_actual_is_truncated() {
        assert!(body_truncated(Some(1000), 4));
        assert!(!body_truncated(Some(4), 4));
        assert!(!body_truncated(Some(3), 4));
        assert!(!body_truncated(None, 0));
    }

    #[test]
    fn missing_header_means_no_declaration() {
        assert_eq!(
            declared_content_length(&HeaderMap::new()).expect("no header"),
            None
        );
    }

    #[test]
    fn non_numeric_content_length_is_an_error() {
        let err = declared_content_length(&headers("ten")).expect_err("must fail");
        assert!(matches!(err, DecodeError::ContentLength(_)));
    }

    #[test]
    fn negative_declaration_never_flags_truncation() {
        let declared = declared_content_length(&headers("-5")).expect("parses");
        assert!(!body_truncated(declared, 0));
    }
}
