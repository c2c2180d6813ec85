//! Output descriptor canonicalization
//!
//! A multisig descriptor lists its cosigner keys in whatever order the
//! exporting wallet chose. Canonicalization tokenizes the descriptor, pulls the
//! keys out of its key-list function, validates and re-encodes them, sorts them
//! and rebuilds the text, so the same wallet always yields the same string.
//!
//! ```text
//! sh(sortedmulti(2,[abcd1234/0]xpubB...,[ef001122/0]xpubA...))
//! \____________________________/                             \/
//!        skeleton prefix               key entries        closing
//! ```

use std::fmt;

use crate::extended_key::ExtendedPublicKey;
use crate::{Error, Result};

/// Deepest function/branch nesting accepted; parsing, search and rendering
/// all recurse per level
pub const MAX_NESTING: usize = 64;

/// Functions whose arguments after the threshold are cosigner keys
pub const KEY_LIST_FUNCTIONS: &[&str] = &["multi", "sortedmulti", "multi_a", "sortedmulti_a"];

/// One cosigner slot of a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorKeyEntry {
    /// Key origin block including brackets (`[fingerprint/path]`), or empty
    pub path: String,
    /// Canonical base58check extended public key
    pub extended_key: String,
}

impl DescriptorKeyEntry {
    /// Render as it appears in a descriptor
    pub fn render(&self) -> String {
        format!("{}{}", self.path, self.extended_key)
    }
}

/// Non-key text surrounding the key list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skeleton {
    /// Everything up to and including the threshold argument
    pub prefix: String,
    /// Closing syntax following the last key
    pub closing: String,
}

/// Descriptor rebuilt with sorted, canonically encoded keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalDescriptor {
    text: String,
    skeleton: Skeleton,
    entries: Vec<DescriptorKeyEntry>,
}

impl CanonicalDescriptor {
    /// Canonical descriptor text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// UTF-8 bytes of the canonical text
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Skeleton the keys were spliced into
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Sorted key entries
    pub fn entries(&self) -> &[DescriptorKeyEntry] {
        &self.entries
    }

    /// Consume into the canonical text
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CanonicalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Canonicalize a descriptor string
///
/// Fails with [`Error::DescriptorParse`] when the text does not parse, when the
/// threshold is malformed, or when any key in the key list fails to decode.
pub fn canonicalize(descriptor: &str) -> Result<CanonicalDescriptor> {
    let tokens = tokenize(descriptor)?;
    let root = Parser::new(tokens).parse_descriptor()?;

    let mut entries = match find_key_list(&root) {
        Some(args) => extract_entries(args)?,
        None => Vec::new(),
    };
    entries.sort_by(|a, b| {
        a.extended_key
            .as_bytes()
            .cmp(b.extended_key.as_bytes())
            .then_with(|| a.path.as_bytes().cmp(b.path.as_bytes()))
    });

    let mut rendered = String::with_capacity(descriptor.len());
    let mut split = None;
    render(&root, &mut rendered, &mut split);
    let split = split.unwrap_or(rendered.len());
    let closing = rendered.split_off(split);
    let skeleton = Skeleton {
        prefix: rendered,
        closing,
    };

    let mut text = skeleton.prefix.clone();
    for entry in &entries {
        text.push(',');
        text.push_str(&entry.render());
    }
    text.push_str(&skeleton.closing);

    tracing::debug!(keys = entries.len(), "Canonicalized descriptor");

    Ok(CanonicalDescriptor {
        text,
        skeleton,
        entries,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    BraceOpen,
    BraceClose,
    Comma,
    Hash,
    Origin(String),
    Word(String),
}

fn parse_error(msg: impl Into<String>) -> Error {
    Error::DescriptorParse(msg.into())
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ',' | '#')
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' | ')' | '{' | '}' | ',' | '#' => {
                chars.next();
                tokens.push(match c {
                    '(' => Token::Open,
                    ')' => Token::Close,
                    '{' => Token::BraceOpen,
                    '}' => Token::BraceClose,
                    ',' => Token::Comma,
                    _ => Token::Hash,
                });
            }
            '[' => {
                chars.next();
                let mut end = None;
                for (i, c) in chars.by_ref() {
                    match c {
                        ']' => {
                            end = Some(i);
                            break;
                        }
                        '[' => return Err(parse_error(format!("nested '[' at offset {}", i))),
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| parse_error("unterminated key origin"))?;
                tokens.push(Token::Origin(input[start..=end].to_string()));
            }
            ']' => return Err(parse_error(format!("unbalanced ']' at offset {}", start))),
            _ => {
                let mut end = input.len();
                while let Some(&(i, c)) = chars.peek() {
                    if !is_word_char(c) {
                        end = i;
                        break;
                    }
                    chars.next();
                }
                tokens.push(Token::Word(input[start..end].to_string()));
            }
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Call { name: String, args: Vec<Expr> },
    Branch(Vec<Expr>),
    Leaf { origin: Option<String>, text: String },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse a nested argument list, bounding recursion depth
    fn parse_nested(&mut self, close: Token) -> Result<Vec<Expr>> {
        if self.depth >= MAX_NESTING {
            return Err(parse_error(format!(
                "nesting deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.depth += 1;
        let args = self.parse_args(close);
        self.depth -= 1;
        args
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_descriptor(&mut self) -> Result<Expr> {
        let root = self.parse_expr()?;
        if !matches!(root, Expr::Call { .. }) {
            return Err(parse_error("descriptor must start with a script function"));
        }

        // Checksum no longer matches once keys are reordered, so it is dropped
        if self.peek() == Some(&Token::Hash) {
            self.next();
            match self.next() {
                Some(Token::Word(_)) => {}
                _ => return Err(parse_error("missing checksum after '#'")),
            }
        }

        match self.next() {
            None => Ok(root),
            Some(token) => Err(parse_error(format!("unexpected trailing {:?}", token))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Word(word)) => {
                if self.peek() == Some(&Token::Open) {
                    self.next();
                    let args = self.parse_nested(Token::Close)?;
                    Ok(Expr::Call { name: word, args })
                } else {
                    Ok(Expr::Leaf {
                        origin: None,
                        text: word,
                    })
                }
            }
            Some(Token::Origin(origin)) => match self.next() {
                Some(Token::Word(text)) if self.peek() != Some(&Token::Open) => Ok(Expr::Leaf {
                    origin: Some(origin),
                    text,
                }),
                _ => Err(parse_error(format!("key origin {} must precede a key", origin))),
            },
            Some(Token::BraceOpen) => Ok(Expr::Branch(self.parse_nested(Token::BraceClose)?)),
            Some(token) => Err(parse_error(format!("unexpected {:?}", token))),
            None => Err(parse_error("unexpected end of descriptor")),
        }
    }

    fn parse_args(&mut self, close: Token) -> Result<Vec<Expr>> {
        let mut args = vec![self.parse_expr()?];
        loop {
            match self.next() {
                Some(Token::Comma) => args.push(self.parse_expr()?),
                Some(token) if token == close => return Ok(args),
                Some(token) => return Err(parse_error(format!("unexpected {:?}", token))),
                None => return Err(parse_error("unbalanced brackets")),
            }
        }
    }
}

/// Strip miniscript wrappers (`v:multi` -> `multi`)
fn base_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn is_key_list(name: &str) -> bool {
    KEY_LIST_FUNCTIONS.contains(&base_name(name))
}

fn find_key_list(expr: &Expr) -> Option<&[Expr]> {
    match expr {
        Expr::Call { name, args } if is_key_list(name) => Some(args),
        Expr::Call { args, .. } | Expr::Branch(args) => args.iter().find_map(find_key_list),
        Expr::Leaf { .. } => None,
    }
}

fn extract_entries(args: &[Expr]) -> Result<Vec<DescriptorKeyEntry>> {
    let (threshold, keys) = match args.split_first() {
        Some(split) => split,
        None => return Err(parse_error("empty key list")),
    };

    let threshold = match threshold {
        Expr::Leaf { origin: None, text } if text.bytes().all(|b| b.is_ascii_digit()) => text
            .parse::<usize>()
            .map_err(|_| parse_error(format!("threshold out of range: {}", text)))?,
        _ => return Err(parse_error("threshold must be a decimal number")),
    };
    if !keys.is_empty() && (threshold == 0 || threshold > keys.len()) {
        return Err(parse_error(format!(
            "threshold {} not satisfiable with {} keys",
            threshold,
            keys.len()
        )));
    }

    keys.iter()
        .enumerate()
        .map(|(i, key)| match key {
            Expr::Leaf { origin, text } => {
                // Derivation suffix (`/0/*`, `/<0;1>/*`) is positional, not key material
                let raw = text.split('/').next().unwrap_or(text);
                let decoded: ExtendedPublicKey = raw
                    .parse()
                    .map_err(|e| parse_error(format!("key {}: {}", i + 1, e)))?;
                Ok(DescriptorKeyEntry {
                    path: origin.clone().unwrap_or_default(),
                    extended_key: decoded.to_string(),
                })
            }
            _ => Err(parse_error(format!("key {} is not a key expression", i + 1))),
        })
        .collect()
}

/// Render `expr` into `out`, recording in `split` the offset just past the
/// threshold of the first key-list call; its keys are left out.
fn render(expr: &Expr, out: &mut String, split: &mut Option<usize>) {
    match expr {
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            if split.is_none() && is_key_list(name) {
                if let Some(threshold) = args.first() {
                    render(threshold, out, split);
                }
                *split = Some(out.len());
            } else {
                render_list(args, out, split);
            }
            out.push(')');
        }
        Expr::Branch(args) => {
            out.push('{');
            render_list(args, out, split);
            out.push('}');
        }
        Expr::Leaf { origin, text } => {
            if let Some(origin) = origin {
                out.push_str(origin);
            }
            out.push_str(text);
        }
    }
}

fn render_list(args: &[Expr], out: &mut String, split: &mut Option<usize>) {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        render(arg, out, split);
    }
}
