use memchr::{memchr, memchr2, memmem};

/// Scan a quoted literal whose opening delimiter is `bytes[0]`.
/// A doubled delimiter is an escaped delimiter; when `backslash` is set a
/// backslash escapes the next byte as well. Unterminated literals run to the
/// end of input. Returns the byte length including both delimiters.
pub(crate) fn scan_quoted(bytes: &[u8], backslash: bool) -> usize {
    let quote = bytes[0];
    let mut i = 1;
    while i < bytes.len() {
        let found = if backslash {
            memchr2(quote, b'\\', &bytes[i..])
        } else {
            memchr(quote, &bytes[i..])
        };
        let Some(offset) = found else {
            return bytes.len();
        };
        let pos = i + offset;
        if bytes[pos] == b'\\' {
            i = pos + 2;
            continue;
        }
        if pos + 1 < bytes.len() && bytes[pos + 1] == quote {
            i = pos + 2;
            continue;
        }
        return pos + 1;
    }
    bytes.len()
}

/// Scan a dollar-quoted string (`$$...$$` or `$tag$...$tag$`). `bytes` starts
/// at the opening `$`. Returns `None` if the opening tag is malformed.
pub(crate) fn scan_dollar_string(bytes: &[u8]) -> Option<usize> {
    let mut tag_end = 1;
    while tag_end < bytes.len() && (bytes[tag_end].is_ascii_alphanumeric() || bytes[tag_end] == b'_')
    {
        tag_end += 1;
    }
    if tag_end >= bytes.len() || bytes[tag_end] != b'$' {
        return None;
    }
    // A tag must not start with a digit: `$1` is a placeholder.
    if tag_end > 1 && bytes[1].is_ascii_digit() {
        return None;
    }
    let tag = &bytes[..=tag_end];
    let body_start = tag_end + 1;
    match memmem::find(&bytes[body_start..], tag) {
        Some(offset) => Some(body_start + offset + tag.len()),
        None => Some(bytes.len()),
    }
}

/// Scan a block comment. `bytes` starts at `/*`. Returns the byte length
/// including delimiters; unterminated comments run to the end of input.
pub(crate) fn scan_block_comment(bytes: &[u8]) -> usize {
    match memmem::find(&bytes[2..], b"*/") {
        Some(offset) => offset + 4,
        None => bytes.len(),
    }
}

/// Scan a line comment up to (not including) the line terminator.
pub(crate) fn scan_line_comment(bytes: &[u8]) -> usize {
    let end = memchr(b'\n', bytes).unwrap_or(bytes.len());
    if end > 0 && bytes[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_single_quoted_string() {
        assert_eq!(scan_quoted(b"'hello' rest", true), 7);
    }

    #[test]
    fn test_scan_doubled_quote() {
        assert_eq!(scan_quoted(b"'it''s' rest", true), 7);
    }

    #[test]
    fn test_scan_backslash_escape() {
        assert_eq!(scan_quoted(b"'it\\'s' rest", true), 7);
        // Without backslash escapes the backslash is an ordinary byte.
        assert_eq!(scan_quoted(b"\"a\\\" b", false), 4);
    }

    #[test]
    fn test_scan_unterminated() {
        assert_eq!(scan_quoted(b"'never closed", true), 13);
    }

    #[test]
    fn test_scan_dollar_string() {
        assert_eq!(scan_dollar_string(b"$$body$$ x"), Some(8));
        assert_eq!(scan_dollar_string(b"$fn$ a $$ b $fn$;"), Some(16));
        assert_eq!(scan_dollar_string(b"$1 + 2"), None);
        assert_eq!(scan_dollar_string(b"$$open"), Some(6));
    }

    #[test]
    fn test_scan_comments() {
        assert_eq!(scan_block_comment(b"/* a */ b"), 7);
        assert_eq!(scan_block_comment(b"/* a"), 4);
        assert_eq!(scan_line_comment(b"-- a\nb"), 4);
        assert_eq!(scan_line_comment(b"-- a\r\nb"), 4);
        assert_eq!(scan_line_comment(b"-- a"), 4);
    }
}
