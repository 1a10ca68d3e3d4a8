//! Parsing of interface configuration chains.
//!
//! A chain names a module and optionally carries options for it:
//! `name{option=value,flag,other="quoted, value"}:next`. Everything after a
//! top-level `:` is handed back untouched so callers can build pipelines.

use thiserror::Error;

/// One `name[=value]` entry of a chain's option block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOption {
    pub name: String,
    pub value: Option<String>,
}

/// Options parsed from a chain, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChain {
    options: Vec<ConfigOption>,
}

impl ConfigChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.options.push(ConfigOption {
            name: name.into(),
            value,
        });
    }

    /// Value of the last occurrence of `name`. Flags have no value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .rev()
            .find(|option| option.name == name)
            .and_then(|option| option.value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|option| option.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Result of splitting a chain string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedChain {
    /// Module name or shortcut list; `None` when the chain has no name.
    pub name: Option<String>,
    pub config: ConfigChain,
    /// Remainder after the first top-level `:`.
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("unterminated option block in `{0}`")]
    UnterminatedBlock(String),
    #[error("unterminated quoted value in `{0}`")]
    UnterminatedQuote(String),
    #[error("empty option name in `{0}`")]
    EmptyOptionName(String),
    #[error("unexpected `{found}` in `{chain}`")]
    TrailingInput { chain: String, found: String },
}

pub fn parse_chain(chain: &str) -> Result<ParsedChain, ChainError> {
    let input = chain.trim_start();
    let name_end = input.find(['{', ':']).unwrap_or(input.len());
    let name = input[..name_end].trim();

    let mut parsed = ParsedChain {
        name: (!name.is_empty()).then(|| name.to_string()),
        ..ParsedChain::default()
    };

    let mut rest = &input[name_end..];
    if let Some(block) = rest.strip_prefix('{') {
        let mut cursor = Cursor {
            text: block,
            pos: 0,
            chain,
        };
        cursor.parse_options(&mut parsed.config)?;
        rest = cursor.remaining().trim_start();

        // `name{...},other,none` keeps the shortcuts that follow the block.
        if rest.starts_with(',') {
            let end = rest.find(':').unwrap_or(rest.len());
            let shortcuts = rest[..end].trim_end();
            let list = if name.is_empty() {
                shortcuts.trim_start_matches(',').trim_start().to_string()
            } else {
                format!("{name}{shortcuts}")
            };
            parsed.name = (!list.is_empty()).then_some(list);
            rest = &rest[end..];
        }
    }

    if let Some(next) = rest.strip_prefix(':') {
        let next = next.trim();
        parsed.next = (!next.is_empty()).then(|| next.to_string());
    } else if !rest.trim().is_empty() {
        return Err(ChainError::TrailingInput {
            chain: chain.to_string(),
            found: rest.trim().to_string(),
        });
    }
    Ok(parsed)
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
    chain: &'a str,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn remaining(&self) -> &'a str {
        let text = self.text;
        &text[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn take_until(&mut self, stop: &[char]) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|ch| !stop.contains(&ch)) {
            self.bump();
        }
        let text = self.text;
        &text[start..self.pos]
    }

    fn unterminated_block(&self) -> ChainError {
        ChainError::UnterminatedBlock(self.chain.to_string())
    }

    /// Consumes options up to and including the closing `}`.
    fn parse_options(&mut self, config: &mut ConfigChain) -> Result<(), ChainError> {
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.unterminated_block()),
                Some('}') => {
                    self.bump();
                    return Ok(());
                }
                Some(_) => {}
            }

            let name = self.take_until(&['=', ',', '}']).trim();
            if name.is_empty() {
                return Err(ChainError::EmptyOptionName(self.chain.to_string()));
            }
            let value = if self.peek() == Some('=') {
                self.bump();
                self.skip_whitespace();
                Some(self.parse_value()?)
            } else {
                None
            };
            config.push(name, value);

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                None => return Err(self.unterminated_block()),
                Some(_) => {
                    return Err(ChainError::TrailingInput {
                        chain: self.chain.to_string(),
                        found: self.take_until(&[',', '}']).to_string(),
                    })
                }
            }
        }
    }

    fn parse_value(&mut self) -> Result<String, ChainError> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some('\\') => match self.bump() {
                            Some(escaped) => value.push(escaped),
                            None => {
                                return Err(ChainError::UnterminatedQuote(self.chain.to_string()))
                            }
                        },
                        Some(ch) if ch == quote => return Ok(value),
                        Some(ch) => value.push(ch),
                        None => {
                            return Err(ChainError::UnterminatedQuote(self.chain.to_string()))
                        }
                    }
                }
            }
            Some('{') => {
                let start = self.pos;
                let mut depth = 0usize;
                while let Some(ch) = self.bump() {
                    match ch {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return Ok(self.text[start..self.pos].to_string());
                            }
                        }
                        _ => {}
                    }
                }
                Err(self.unterminated_block())
            }
            _ => Ok(self.take_until(&[',', '}']).trim_end().to_string()),
        }
    }
}
