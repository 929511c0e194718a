//! Template notation for declaration text.
//!
//! `%` is the declaration's own name, `@Ident(.Member)*` is a reference, and
//! `%%` / `@@` escape the marker characters. The reference kind is inferred from
//! the text immediately before the reference.

use thiserror::Error;

use super::{Reference, ReferenceKind, Segment};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("expected an identifier after '@' at offset {offset}")]
    MissingIdentifier { offset: usize },
}

pub(super) fn parse(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let chars: Vec<char> = template.chars().collect();
    let mut segments = Vec::new();
    let mut text = String::new();
    // All literal text seen so far, for kind inference.
    let mut preceding = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '%' | '@' if chars.get(i + 1) == Some(&ch) => {
                text.push(ch);
                preceding.push(ch);
                i += 2;
            }
            '%' => {
                flush(&mut segments, &mut text);
                segments.push(Segment::Name);
                i += 1;
            }
            '@' => {
                let (name, next) = read_identifier(&chars, i + 1)
                    .ok_or(TemplateError::MissingIdentifier { offset: i })?;
                i = next;

                let mut qualifier = Vec::new();
                while chars.get(i) == Some(&'.') {
                    match read_identifier(&chars, i + 1) {
                        Some((member, next)) => {
                            qualifier.push(member);
                            i = next;
                        }
                        None => break,
                    }
                }

                let kind = if qualifier.is_empty() {
                    infer_kind(&preceding)
                } else {
                    ReferenceKind::NamespaceMember
                };

                flush(&mut segments, &mut text);
                segments.push(Segment::Ref(Reference {
                    name,
                    qualifier,
                    kind,
                }));
            }
            _ => {
                text.push(ch);
                preceding.push(ch);
                i += 1;
            }
        }
    }

    flush(&mut segments, &mut text);
    Ok(segments)
}

fn flush(segments: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn read_identifier(chars: &[char], start: usize) -> Option<(String, usize)> {
    let first = *chars.get(start)?;
    if !is_ident_start(first) {
        return None;
    }
    let mut end = start + 1;
    while end < chars.len() && is_ident_continue(chars[end]) {
        end += 1;
    }
    Some((chars[start..end].iter().collect(), end))
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word)
        .is_some_and(|before| !before.chars().next_back().is_some_and(is_ident_continue))
}

/// Net `<` nesting of the text, ignoring the `>` of `=>` arrows.
fn angle_depth(text: &str) -> i32 {
    let mut depth = 0;
    let mut prev = '\0';
    for ch in text.chars() {
        match ch {
            '<' => depth += 1,
            '>' if prev != '=' => depth -= 1,
            _ => {}
        }
        prev = ch;
    }
    depth
}

fn infer_kind(preceding: &str) -> ReferenceKind {
    let trimmed = preceding.trim_end();
    let in_type_parameters = angle_depth(preceding) > 0;

    if ends_with_word(trimmed, "typeof") {
        ReferenceKind::TypeQuery
    } else if trimmed.ends_with('[') {
        ReferenceKind::ComputedKey
    } else if ends_with_word(trimmed, "implements") {
        ReferenceKind::Heritage
    } else if ends_with_word(trimmed, "extends") {
        if in_type_parameters || trimmed.contains('=') {
            ReferenceKind::Constraint
        } else {
            ReferenceKind::Heritage
        }
    } else if in_type_parameters && trimmed.ends_with('=') {
        ReferenceKind::Constraint
    } else {
        ReferenceKind::Type
    }
}
