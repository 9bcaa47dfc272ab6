use alloc::borrow::Cow;

use super::error::{TextError, located};

/// Byte cursor over one line of property text.
///
/// Tokens end at `,` or `)` when nested inside parentheses. Quoted strings
/// take `\"`, `\\`, `\n`, `\r`, `\t` and `\'` escapes.
pub(super) struct Cursor<'t> {
    text: &'t str,
    pos: usize,
}

impl<'t> Cursor<'t> {
    #[inline]
    pub fn new(text: &'t str) -> Self {
        Self { text, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn rest(&self) -> &'t str {
        &self.text[self.pos..]
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consumes `c` after optional whitespace.
    pub fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, c: char, expected: &'static str) -> Result<(), TextError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.syntax(expected))
        }
    }

    /// Consumes the separator after a list item. Returns `true` at the closing
    /// parenthesis.
    pub fn list_separator(&mut self) -> Result<bool, TextError> {
        if self.eat(',') {
            // A trailing comma before `)` is allowed.
            Ok(self.eat(')'))
        } else if self.eat(')') {
            Ok(true)
        } else {
            Err(self.syntax("`,` or `)`"))
        }
    }

    pub fn syntax(&self, expected: &'static str) -> TextError {
        located(TextError::Syntax {
            position: self.pos,
            expected,
        })
    }

    /// An unquoted token, trimmed.
    ///
    /// At top level the token is the rest of the input; nested, it stops at
    /// `,` or an unbalanced `)`. Parentheses and quotes inside the token are
    /// kept balanced so that struct hook text can be skipped as one token.
    pub fn token(&mut self, nested: bool) -> Result<&'t str, TextError> {
        self.skip_whitespace();
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let mut depth = 0usize;
        let mut quoted = false;
        let mut escaped = false;

        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if quoted {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => quoted = false,
                    _ => {}
                }
            } else {
                match b {
                    b'"' => quoted = true,
                    b'(' => depth += 1,
                    b')' if depth > 0 => depth -= 1,
                    b')' | b',' if nested && depth == 0 => break,
                    _ => {}
                }
            }
            self.pos += 1;
        }

        if quoted || depth > 0 {
            return Err(self.syntax("balanced quotes and parentheses"));
        }
        Ok(self.text[start..self.pos].trim())
    }

    /// A quoted string with escapes resolved. The cursor must be on `"`.
    pub fn quoted(&mut self) -> Result<Cow<'t, str>, TextError> {
        if !self.eat('"') {
            return Err(self.syntax("`\"`"));
        }
        let start = self.pos;
        let mut owned: Option<String> = None;
        let mut chars = self.rest().char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    let raw = &self.text[start..start + offset];
                    self.pos = start + offset + 1;
                    return Ok(match owned {
                        Some(text) => Cow::Owned(text),
                        None => Cow::Borrowed(raw),
                    });
                }
                '\\' => {
                    let text = owned.get_or_insert_with(|| self.text[start..start + offset].into());
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 'r')) => '\r',
                        Some((_, 't')) => '\t',
                        Some((_, other)) => other,
                        None => break,
                    };
                    text.push(escaped);
                }
                c => {
                    if let Some(text) = owned.as_mut() {
                        text.push(c);
                    }
                }
            }
        }

        self.pos = self.text.len();
        Err(self.syntax("closing `\"`"))
    }

    /// An identifier up to `=`, trimmed.
    pub fn field_name(&mut self) -> Result<&'t str, TextError> {
        self.skip_whitespace();
        let rest = self.rest();
        match rest.find(['=', ',', ')']) {
            Some(end) if rest.as_bytes()[end] == b'=' && end > 0 => {
                self.pos += end + 1;
                Ok(rest[..end].trim())
            }
            _ => Err(self.syntax("`Name=`")),
        }
    }

    /// Text of a string-like value: quoted, or an unquoted token.
    pub fn string(&mut self, nested: bool) -> Result<Cow<'t, str>, TextError> {
        self.skip_whitespace();
        if self.peek() == Some('"') {
            self.quoted()
        } else if nested {
            self.token(true).map(Cow::Borrowed)
        } else {
            let rest = self.rest();
            self.pos = self.text.len();
            Ok(Cow::Borrowed(rest))
        }
    }

    /// Skips one value of any shape.
    pub fn skip_value(&mut self) -> Result<(), TextError> {
        self.token(true).map(|_| ())
    }

    pub fn finish(mut self) -> Result<(), TextError> {
        self.skip_whitespace();
        if self.rest().is_empty() {
            Ok(())
        } else {
            Err(located(TextError::TrailingCharacters(self.rest().into())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn nested_tokens_stop_at_delimiters() {
        let mut cursor = Cursor::new(" 12 , (a,\"b)\"),x)");
        assert_eq!(cursor.token(true).unwrap(), "12");
        assert!(cursor.eat(','));
        assert_eq!(cursor.token(true).unwrap(), "(a,\"b)\")");
        assert!(!cursor.list_separator().unwrap());
        assert_eq!(cursor.token(true).unwrap(), "x");
        assert!(cursor.list_separator().unwrap());
        cursor.finish().unwrap();
    }

    #[test]
    fn quoted_strings_unescape() {
        let mut cursor = Cursor::new(r#""plain" "say \"hi\"\n""#);
        assert_eq!(cursor.quoted().unwrap(), "plain");
        assert_eq!(cursor.quoted().unwrap(), "say \"hi\"\n");
        assert!(Cursor::new("\"open").quoted().is_err());
    }

    #[test]
    fn field_names() {
        let mut cursor = Cursor::new("Health = 3");
        assert_eq!(cursor.field_name().unwrap(), "Health");
        assert_eq!(cursor.token(true).unwrap(), "3");
        assert!(Cursor::new("3,").field_name().is_err());
    }
}
