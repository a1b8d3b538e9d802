//! List quoting and splitting.
//!
//! A list is an ordinary [`Value`] whose contents follow the standard
//! convention: elements are separated by single spaces, an element containing
//! whitespace or special syntax characters is wrapped in braces, and an empty
//! element is an empty brace pair.  Splitting uses the same field rule as the
//! script lexer, which is what makes a list round-trip exactly: appending
//! elements and re-extracting them reproduces the original bytes.

use crate::tokenizer::{Token, Tokenizer};
use crate::types::{ErrorKind, Exception, TclList};
use crate::value::Value;
use alloc::string::String;

/// Whether an element needs brace quoting to survive re-lexing.  A leading
/// `#` is quoted so the element can't be taken for a comment when the list
/// is re-lexed at the start of a command.
fn needs_braces(s: &str) -> bool {
    s.is_empty()
        || s.starts_with('#')
        || s.bytes().any(|c| {
            matches!(
                c,
                b' ' | b'\t' | b'\n' | b'\r' | b';' | b'"' | b'$' | b'[' | b']' | b'{' | b'}'
                    | b'\\' | 0
            )
        })
}

/// Encodes a slice of values as a list string.
pub fn list_to_string(list: &[Value]) -> String {
    let mut out = String::new();

    for (i, item) in list.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if needs_braces(item.as_str()) {
            out.push('{');
            out.push_str(item.as_str());
            out.push('}');
        } else {
            out.push_str(item.as_str());
        }
    }

    out
}

/// Splits a list string into its elements.
///
/// Fields are split exactly as the script lexer splits words; one layer of
/// brace quoting is removed from each braced element, and command terminators
/// (newlines, semicolons) act as plain separators so braced blocks can be
/// used as lists.  Unbalanced quoting is a brace-mismatch error.
pub fn parse_list(text: &str) -> Result<TclList, Exception> {
    let mut items = TclList::new();
    let mut tokenizer = Tokenizer::new(text);
    let mut item: Option<Value> = None;

    loop {
        match tokenizer.next() {
            Some(Token::Field(frag)) => {
                let mut value = item.take().unwrap_or_default();
                value.append(strip_braces(frag));
                items.push(value);
            }
            Some(Token::Partial(frag)) => {
                item.get_or_insert_with(Value::empty)
                    .append(strip_braces(frag));
            }
            Some(Token::ExecPoint) => (),
            Some(Token::Error) => {
                return Err(Exception::error(
                    ErrorKind::BraceMismatch,
                    Value::from("unbalanced quoting in list"),
                ));
            }
            None => break,
        }
    }

    // A trailing open fragment can't occur: the tokenizer errors on an
    // unterminated quote before reporting the end of input.
    debug_assert!(item.is_none());

    Ok(items)
}

/// Removes one layer of brace quoting from a lexed list fragment.
fn strip_braces(frag: &str) -> Value {
    if frag.len() >= 2 && frag.starts_with('{') && frag.ends_with('}') {
        Value::from(&frag[1..frag.len() - 1])
    } else {
        Value::from(frag)
    }
}
