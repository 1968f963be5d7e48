//! Buffer splicing.

use crate::error::SubstitutionError;

/// Replaces `len` bytes of `buffer` starting at `offset` with `value`.
///
/// Everything before `offset` and after `offset + len` is kept as is; the
/// tail moves left or right by `value.len() - len`.
///
/// # Errors
///
/// Returns [`SubstitutionError::InvalidSpan`] if the span is out of range
/// or does not fall on character boundaries.
pub fn splice(
    buffer: &mut String,
    offset: usize,
    len: usize,
    value: &str,
) -> Result<(), SubstitutionError> {
    let end = offset
        .checked_add(len)
        .filter(|end| *end <= buffer.len())
        .filter(|end| buffer.is_char_boundary(offset) && buffer.is_char_boundary(*end))
        .ok_or(SubstitutionError::InvalidSpan {
            offset,
            end: offset.saturating_add(len),
            len: buffer.len(),
        })?;

    buffer.replace_range(offset..end, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorter_value() {
        let mut buf = String::from("The path is ${root}/bin");
        splice(&mut buf, 12, 7, "/").unwrap();
        assert_eq!(buf, "The path is //bin");
    }

    #[test]
    fn equal_length_value() {
        let mut buf = String::from("a $xy b");
        splice(&mut buf, 2, 3, "123").unwrap();
        assert_eq!(buf, "a 123 b");
    }

    #[test]
    fn longer_value() {
        let mut buf = String::from("The path is ${root}/bin");
        splice(&mut buf, 12, 7, "/opt/app").unwrap();
        assert_eq!(buf, "The path is /opt/app/bin");
    }

    #[test]
    fn empty_value_removes_token() {
        let mut buf = String::from("x${e}y");
        splice(&mut buf, 1, 4, "").unwrap();
        assert_eq!(buf, "xy");
    }

    #[test]
    fn token_at_end() {
        let mut buf = String::from("Listen $port");
        splice(&mut buf, 7, 5, "8080").unwrap();
        assert_eq!(buf, "Listen 8080");
    }

    #[test]
    fn out_of_range_span() {
        let mut buf = String::from("abc");
        assert_eq!(
            splice(&mut buf, 2, 5, "x"),
            Err(SubstitutionError::InvalidSpan {
                offset: 2,
                end: 7,
                len: 3
            })
        );
        assert_eq!(buf, "abc");
    }

    #[test]
    fn span_inside_multibyte_char() {
        let mut buf = String::from("é$x");
        assert!(splice(&mut buf, 1, 1, "y").is_err());
        splice(&mut buf, 2, 2, "y").unwrap();
        assert_eq!(buf, "éy");
    }
}
