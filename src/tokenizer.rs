//! Tokenizer (spec §6, consumed external interface — implemented here so
//! the core's module boundaries match the blackbox seam the spec describes).
//! Splits a command line into operand words and the sentinel redirection
//! markers `{T_INPUT, T_OUTPUT, T_PIPE, T_BGJOB}`. Quoting beyond simple
//! single/double-quote grouping, variable substitution, and command
//! substitution are all out of scope (spec §1 Non-goals).

use crate::errors::Result;

/// One element of a tokenized command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// An argument word, already quote-stripped.
    Word(String),
    /// `<`
    Input,
    /// `>`
    Output,
    /// `|`
    Pipe,
    /// `&`
    BgJob,
}

/// Splits `line` into tokens. Simple whitespace-delimited splitting with
/// single/double quote grouping (quotes are stripped, not interpreted —
/// no escape sequences, no expansion).
pub fn tokenize(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        match c {
            '<' => {
                chars.next();
                tokens.push(Token::Input);
            }
            '>' => {
                chars.next();
                tokens.push(Token::Output);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '&' => {
                chars.next();
                tokens.push(Token::BgJob);
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut word = String::new();
                let mut closed = false;
                while let Some(&c) = chars.peek() {
                    chars.next();
                    if c == quote {
                        closed = true;
                        break;
                    }
                    word.push(c);
                }
                if !closed {
                    return Err(crate::errors::Error::syntax(line));
                }
                append_to_word(&mut tokens, word);
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || "<>|&'\"".contains(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                append_to_word(&mut tokens, word);
            }
        }
    }

    Ok(tokens)
}

/// Merges adjacent unquoted/quoted text into the same `Word` token, so
/// `foo"bar baz"` tokenizes as one word `foobar baz`.
fn append_to_word(tokens: &mut Vec<Token>, text: String) {
    if let Some(Token::Word(prev)) = tokens.last_mut() {
        prev.push_str(&text);
    } else {
        tokens.push(Token::Word(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_words_and_markers() {
        let tokens = tokenize("cat file.txt | tr a A > out.txt &").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Word("cat".into()),
                Token::Word("file.txt".into()),
                Token::Pipe,
                Token::Word("tr".into()),
                Token::Word("a".into()),
                Token::Word("A".into()),
                Token::Output,
                Token::Word("out.txt".into()),
                Token::BgJob,
            ]
        );
    }

    #[test]
    fn quoted_text_keeps_spaces() {
        let tokens = tokenize("echo \"hello world\"").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Word("echo".into()), Token::Word("hello world".into())]
        );
    }

    #[test]
    fn unterminated_quote_is_a_syntax_error() {
        assert!(tokenize("echo \"unterminated").is_err());
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert_eq!(tokenize("   ").unwrap(), Vec::new());
    }
}
