use crate::ast::{self, AstNode};
use crate::error::{Error, Result};
use tracing::debug;

/// Parses a stylesheet into a flat list of root nodes.
///
/// The scan is a single forward pass with an explicit stack of open blocks,
/// so deeply nested input cannot overflow the call stack.
pub fn parse(input: &str) -> Result<Vec<AstNode>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let input = input.replace("\r\n", "\n");

    let mut parser = Parser::new(input.as_bytes());
    parser.run()?;

    debug!(
        nodes = parser.ast.len(),
        license_comments = parser.license_comments.len(),
        "parsed stylesheet"
    );

    let mut nodes = parser.license_comments;
    nodes.append(&mut parser.ast);
    Ok(nodes)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    ast: Vec<AstNode>,
    license_comments: Vec<AstNode>,
    /// Open blocks, innermost last.
    stack: Vec<AstNode>,
    buffer: Vec<u8>,
    /// Closing brackets we are waiting for: `}` per open block, `)` per open paren.
    closing: Vec<u8>,
}

impl<'a> Parser<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            ast: Vec::new(),
            license_comments: Vec::new(),
            stack: Vec::new(),
            buffer: Vec::new(),
            closing: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        let len = self.bytes.len();

        while self.pos < len {
            let current = self.bytes[self.pos];
            let next = self.bytes.get(self.pos + 1).copied();

            match current {
                b'\\' => {
                    let end = (self.pos + 2).min(len);
                    self.buffer.extend_from_slice(&self.bytes[self.pos..end]);
                    self.pos = end;
                }
                b'/' if next == Some(b'*') => self.comment()?,
                b'\'' | b'"' => self.string(current)?,
                _ if current.is_ascii_whitespace() => {
                    if !self.buffer.is_empty() && self.buffer.last() != Some(&b' ') {
                        self.buffer.push(b' ');
                    }
                    self.pos += 1;
                }
                b'-' if next == Some(b'-') && self.buffer.is_empty() => self.custom_property()?,
                b';' | b'{' | b'}' if self.in_parens() => {
                    self.buffer.push(current);
                    self.pos += 1;
                }
                b';' => {
                    self.semicolon()?;
                    self.pos += 1;
                }
                b'{' => {
                    let header = self.take_buffer();
                    self.closing.push(b'}');
                    self.stack.push(ast::rule(&header, Vec::new()));
                    self.pos += 1;
                }
                b'}' => {
                    self.close_block()?;
                    self.pos += 1;
                }
                b'(' => {
                    self.closing.push(b')');
                    self.buffer.push(current);
                    self.pos += 1;
                }
                b')' => {
                    if !self.in_parens() {
                        return Err(Error::syntax("Missing opening ("));
                    }
                    self.closing.pop();
                    self.buffer.push(current);
                    self.pos += 1;
                }
                _ => {
                    self.buffer.push(current);
                    self.pos += 1;
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::syntax(format!("Missing closing }} at {}", open.header())));
        }

        let rest = self.take_buffer();
        if rest.starts_with('@') {
            self.ast.push(ast::parse_at_rule(&rest, Vec::new()));
        } else if !rest.is_empty() {
            let declaration =
                parse_declaration(&rest, None).ok_or_else(|| invalid_declaration(&rest))?;
            self.ast.push(declaration);
        }

        Ok(())
    }

    fn in_parens(&self) -> bool {
        self.closing.last() == Some(&b')')
    }

    fn take_buffer(&mut self) -> String {
        let buffer = std::mem::take(&mut self.buffer);
        text(&buffer).trim().to_string()
    }

    fn append(&mut self, node: AstNode) {
        match self.stack.last_mut().and_then(AstNode::nodes_mut) {
            Some(nodes) => nodes.push(node),
            None => self.ast.push(node),
        }
    }

    fn comment(&mut self) -> Result<()> {
        let start = self.pos;
        let end = comment_end(self.bytes, start)?;
        if self.bytes.get(start + 2) == Some(&b'!') {
            self.license_comments
                .push(ast::comment(text(&self.bytes[start + 2..end - 1])));
        }
        self.pos = end + 1;
        Ok(())
    }

    fn string(&mut self, quote: u8) -> Result<()> {
        let start = self.pos;
        let mut j = start + 1;
        loop {
            let Some(&ch) = self.bytes.get(j) else {
                return Err(unterminated_string(&self.bytes[start..], quote));
            };
            match ch {
                b'\\' => j += 1,
                _ if ch == quote => break,
                b';' if self.bytes.get(j + 1) == Some(&b'\n') => {
                    return Err(unterminated_string(&self.bytes[start..=j], quote));
                }
                b'\n' => return Err(unterminated_string(&self.bytes[start..j], quote)),
                _ => {}
            }
            j += 1;
        }
        self.buffer.extend_from_slice(&self.bytes[start..=j]);
        self.pos = j + 1;
        Ok(())
    }

    /// `--name: value`, where the value is raw text bounded only by bracket balance.
    fn custom_property(&mut self) -> Result<()> {
        let bytes = self.bytes;
        let start = self.pos;
        let mut brackets: Vec<u8> = Vec::new();
        let mut colon = None;
        let mut j = start + 2;

        // (end of the declaration text, where scanning resumes)
        let (end, resume) = loop {
            let Some(&ch) = bytes.get(j) else {
                break (bytes.len(), bytes.len());
            };
            match ch {
                b'\\' => j += 1,
                b'/' if bytes.get(j + 1) == Some(&b'*') => j = comment_end(bytes, j)?,
                b':' if colon.is_none() => colon = Some(j - start),
                b';' if brackets.is_empty() => break (j, j + 1),
                b'}' if brackets.is_empty() => break (j, j),
                b'(' => brackets.push(b')'),
                b'[' => brackets.push(b']'),
                b'{' => brackets.push(b'}'),
                b')' | b']' | b'}' => {
                    if brackets.last() == Some(&ch) {
                        brackets.pop();
                    }
                }
                _ => {}
            }
            j += 1;
        };

        let source = text(&bytes[start..end]);
        let declaration = colon
            .and_then(|colon| parse_declaration(&source, Some(colon)))
            .ok_or_else(|| Error::syntax("Invalid custom property, expected a value"))?;
        self.append(declaration);
        self.pos = resume;
        Ok(())
    }

    fn semicolon(&mut self) -> Result<()> {
        let statement = self.take_buffer();
        if statement.is_empty() {
            return Err(Error::syntax("Unexpected semicolon"));
        }
        let node = if statement.starts_with('@') {
            ast::parse_at_rule(&statement, Vec::new())
        } else {
            parse_declaration(&statement, None).ok_or_else(|| invalid_declaration(&statement))?
        };
        self.append(node);
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        if self.closing.pop().is_none() {
            return Err(Error::syntax("Missing opening {"));
        }

        // A trailing child without its `;`.
        let trailing = self.take_buffer();
        if trailing.starts_with('@') {
            self.append(ast::parse_at_rule(&trailing, Vec::new()));
        } else if !trailing.is_empty() {
            let declaration =
                parse_declaration(&trailing, None).ok_or_else(|| invalid_declaration(&trailing))?;
            self.append(declaration);
        }

        let node = self
            .stack
            .pop()
            .ok_or_else(|| Error::syntax("Missing opening {"))?;
        self.append(node);
        Ok(())
    }
}

/// Index of the `/` that closes the comment opened at `start`.
fn comment_end(bytes: &[u8], start: usize) -> Result<usize> {
    let mut k = start + 2;
    while k < bytes.len() {
        match bytes[k] {
            b'\\' => k += 1,
            b'*' if bytes.get(k + 1) == Some(&b'/') => return Ok(k + 1),
            _ => {}
        }
        k += 1;
    }
    Err(Error::syntax(format!(
        "Unterminated comment: {}",
        text(&bytes[start..]).trim_end()
    )))
}

/// Splits `property: value [!important]` at the first colon.
fn parse_declaration(source: &str, colon: Option<usize>) -> Option<AstNode> {
    let colon = colon.or_else(|| source.find(':'))?;
    let rest = &source[colon + 1..];
    let important = rest.find("!important");
    let value = important.map_or(rest, |idx| &rest[..idx]);

    Some(AstNode::Declaration {
        property: source[..colon].trim().to_string(),
        value: value.trim().to_string(),
        important: important.is_some(),
    })
}

fn invalid_declaration(source: &str) -> Error {
    Error::syntax(format!("Invalid declaration: `{}`", source.trim()))
}

fn unterminated_string(partial: &[u8], quote: u8) -> Error {
    Error::syntax(format!("Unterminated string: {}{}", text(partial), quote as char))
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
