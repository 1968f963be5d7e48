//! Reference scanner.
//!
//! Finds the next `$name` or `${name}` in a line with a small state
//! machine driven by character classes. The meta characters are passed in
//! on every call so that overrides take effect for the very next scan.

use crate::error::SubstitutionError;

use super::meta::MetaChars;

/// A located variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    /// Byte offset of the sigil.
    pub offset: usize,
    /// Byte length of the whole reference, sigil and braces included.
    pub len: usize,
    /// Name between the braces, or after the sigil.
    pub name: String,
}

impl VarRef {
    /// Byte offset one past the end of the reference.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Result of one [`find_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A well-formed reference.
    Found(VarRef),
    /// Reached the end of the text without finding one.
    NotFound,
    /// A braced reference contained an illegal character or was never
    /// closed. The scan stops there.
    Malformed {
        /// Byte offset of the sigil that started the bad reference.
        offset: usize,
        /// Why the reference was rejected.
        error: SubstitutionError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Escape,
    Sigil,
    BraceOpen,
    BraceClose,
    IdFirst,
    IdRest,
    Other,
    End,
}

impl CharClass {
    fn of(ch: Option<char>, meta: MetaChars) -> Self {
        let Some(ch) = ch else {
            return Self::End;
        };
        if ch == meta.escape {
            Self::Escape
        } else if ch == meta.sigil {
            Self::Sigil
        } else if ch == meta.brace_open {
            Self::BraceOpen
        } else if ch == meta.brace_close {
            Self::BraceClose
        } else if ch.is_ascii_alphabetic() {
            Self::IdFirst
        } else if ch.is_ascii_digit() || matches!(ch, '_' | ':' | '-') {
            Self::IdRest
        } else {
            Self::Other
        }
    }

    const fn is_ident(self) -> bool {
        matches!(self, Self::IdFirst | Self::IdRest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    None,
    Skip,
    Dollar { sigil: usize },
    BracedToken { sigil: usize, name_start: usize },
    UnbracedToken { sigil: usize, name_start: usize },
}

/// Finds the first unescaped reference at or after byte `start`.
///
/// An escape character makes the following character literal, so `\$x`
/// and `$\{` never start a reference. The escape itself stays in the text.
/// For unbraced references the terminating character is not part of the
/// reference.
#[must_use]
pub fn find_next(text: &str, start: usize, meta: MetaChars) -> ScanOutcome {
    let Some(tail) = text.get(start..) else {
        return ScanOutcome::NotFound;
    };

    let chars = tail
        .char_indices()
        .map(|(i, c)| (start + i, Some(c)))
        .chain(std::iter::once((text.len(), None)));

    let mut state = ScanState::None;
    for (offset, ch) in chars {
        let class = CharClass::of(ch, meta);
        state = match state {
            ScanState::None => match class {
                CharClass::Escape => ScanState::Skip,
                CharClass::Sigil => ScanState::Dollar { sigil: offset },
                _ => ScanState::None,
            },
            ScanState::Skip => ScanState::None,
            ScanState::Dollar { sigil } => match class {
                CharClass::BraceOpen => ScanState::BracedToken {
                    sigil,
                    name_start: offset + meta.brace_open.len_utf8(),
                },
                CharClass::IdFirst => ScanState::UnbracedToken {
                    sigil,
                    name_start: offset,
                },
                CharClass::Escape => ScanState::Skip,
                _ => ScanState::None,
            },
            ScanState::BracedToken { sigil, name_start } => match class {
                c if c.is_ident() => state,
                CharClass::BraceClose => {
                    let end = offset + meta.brace_close.len_utf8();
                    return ScanOutcome::Found(VarRef {
                        offset: sigil,
                        len: end - sigil,
                        name: text[name_start..offset].to_string(),
                    });
                }
                CharClass::End => {
                    return ScanOutcome::Malformed {
                        offset: sigil,
                        error: SubstitutionError::UnterminatedReference {
                            close: meta.brace_close,
                        },
                    };
                }
                _ => {
                    return ScanOutcome::Malformed {
                        offset: sigil,
                        error: SubstitutionError::IllegalCharacter {
                            ch: ch.unwrap_or_default(),
                        },
                    };
                }
            },
            ScanState::UnbracedToken { sigil, name_start } => {
                if class.is_ident() {
                    state
                } else {
                    return ScanOutcome::Found(VarRef {
                        offset: sigil,
                        len: offset - sigil,
                        name: text[name_start..offset].to_string(),
                    });
                }
            }
        };
    }

    ScanOutcome::NotFound
}

/// Collects every reference in `text`, skipping over each one found.
///
/// Stops at the first malformed reference.
#[must_use]
pub fn find_all(text: &str, meta: MetaChars) -> Vec<VarRef> {
    let mut refs = Vec::new();
    let mut pos = 0;
    while let ScanOutcome::Found(var) = find_next(text, pos, meta) {
        pos = var.end();
        refs.push(var);
    }
    refs
}
