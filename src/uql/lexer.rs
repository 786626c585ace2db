//! A small, quote-aware word lexer for UQL query text.
//!
//! It does not know about keywords or sections; it only splits raw text into
//! a flat list of tokens, keeping quoted string literals opaque (so a
//! quoted value like `"ORDER"` never gets mistaken for a keyword further up
//! the pipeline) and recording the byte position each token started at for
//! diagnostics.

use super::error::{ParseError, ParseResult};

#[derive(Debug, Clone, PartialEq)]
pub struct LexToken {
    pub text: String,
    pub quoted: bool,
    pub pos: usize,
}

impl LexToken {
    pub fn eq_ignore_case(&self, s: &str) -> bool {
        !self.quoted && self.text.eq_ignore_ascii_case(s)
    }
}

const PUNCT: &[char] = &['(', ')', '[', ']', ',', ':', '*'];
const OP_CHARS: &[char] = &['=', '!', '<', '>'];

pub fn tokenize(src: &str) -> ParseResult<Vec<LexToken>> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    let mut tokens = Vec::new();

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            let start = i;
            let quote = c;
            i += 1;
            let content_start = i;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            if i >= chars.len() {
                return Err(ParseError::LexicalError { position: start });
            }
            let content: String = chars[content_start..i].iter().collect();
            i += 1; // closing quote
            tokens.push(LexToken {
                text: content,
                quoted: true,
                pos: start,
            });
            continue;
        }

        if PUNCT.contains(&c) {
            tokens.push(LexToken {
                text: c.to_string(),
                quoted: false,
                pos: i,
            });
            i += 1;
            continue;
        }

        if OP_CHARS.contains(&c) {
            let start = i;
            let mut run = String::new();
            while i < chars.len() && OP_CHARS.contains(&chars[i]) && run.len() < 2 {
                run.push(chars[i]);
                i += 1;
            }
            tokens.push(LexToken {
                text: run,
                quoted: false,
                pos: start,
            });
            continue;
        }

        // identifier-ish run: letters, digits, '_', '.', '-'
        let start = i;
        let mut word = String::new();
        while i < chars.len() {
            let ch = chars[i];
            if ch.is_whitespace() || PUNCT.contains(&ch) || OP_CHARS.contains(&ch) || ch == '\'' || ch == '"' {
                break;
            }
            word.push(ch);
            i += 1;
        }
        tokens.push(LexToken {
            text: word,
            quoted: false,
            pos: start,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[LexToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_simple_query() {
        let tokens = tokenize("FIND users WHERE status = \"active\"").unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["FIND", "users", "WHERE", "status", "=", "active"]
        );
        assert!(tokens[5].quoted);
    }

    #[test]
    fn dotted_identifier_stays_whole() {
        let tokens = tokenize("FIND public.users").unwrap();
        assert_eq!(texts(&tokens), vec!["FIND", "public.users"]);
    }

    #[test]
    fn parens_and_commas_split_even_without_spaces() {
        let tokens = tokenize("FIELDS (id,name)").unwrap();
        assert_eq!(texts(&tokens), vec!["FIELDS", "(", "id", ",", "name", ")"]);
    }

    #[test]
    fn multi_char_operators() {
        let tokens = tokenize("age >= 18 AND age != 65").unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["age", ">=", "18", "AND", "age", "!=", "65"]
        );
    }

    #[test]
    fn unterminated_quote_is_lexical_error() {
        let err = tokenize("WHERE name = \"unterminated").unwrap_err();
        assert!(matches!(err, ParseError::LexicalError { .. }));
    }

    #[test]
    fn aggregate_alias_colon_form() {
        let tokens = tokenize("count: COUNT(*)").unwrap();
        assert_eq!(texts(&tokens), vec!["count", ":", "COUNT", "(", "*", ")"]);
    }

    #[test]
    fn brackets_split_even_without_spaces() {
        let tokens = tokenize("role IN [a,b]").unwrap();
        assert_eq!(texts(&tokens), vec!["role", "IN", "[", "a", ",", "b", "]"]);
    }
}
