//! Recursive descent XML parser
//!
//! The parser reads one element at a time from a [`Cursor`] and attaches
//! finished elements to their parent. An [`ElementHandler`] sees every
//! element as soon as it is complete and may take it out of the tree, which
//! keeps memory flat for documents with very long sibling lists.

use std::io::Read;

use tracing::{debug, warn};

use crate::{
    config::ParserConfig,
    cursor::{is_delimiter, Cursor},
    error::{Error, ErrorKind, Result},
    escape::unescape,
    node::{Attribute, Node},
};

/// Caller hooks invoked for every completed element
pub trait ElementHandler {
    /// Checks that `element` may appear under `parent`. Returning false
    /// aborts the parse with [`ErrorKind::ElementRejected`].
    fn element_located_correctly(&mut self, element: &Node, parent: &Node) -> bool {
        let _ = (element, parent);
        true
    }

    /// Receives the finished element. Return it to keep it in the tree, or
    /// `None` after taking ownership of it.
    fn element_finished(&mut self, element: Node) -> Option<Node>;
}

/// XML parser over a byte stream
pub struct Parser<'h, R> {
    cursor: Cursor<R>,
    config: ParserConfig,
    handler: Option<&'h mut dyn ElementHandler>,
}

impl<'h, R: Read> Parser<'h, R> {
    /// Creates a parser with the default configuration
    pub fn new(reader: R) -> Self {
        let config = ParserConfig::default();
        Self {
            cursor: Cursor::new(reader, config.lookahead_limit),
            config,
            handler: None,
        }
    }

    /// Setter method to configure the parser
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.cursor = self.cursor.with_limit(config.lookahead_limit);
        self.config = config;
        self
    }

    /// Route every completed element through `handler`
    pub fn with_handler(mut self, handler: &'h mut dyn ElementHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Parses the whole stream and returns the synthetic document root.
    pub fn parse(mut self) -> Result<Node> {
        let mut root = Node::root();
        self.parse_document(&mut root).map_err(|e| {
            if e.is_exhausted() {
                Error::malformed("unexpected end of input").with_source(e)
            } else {
                e
            }
        })?;
        debug!(
            elements = root.children.len(),
            bytes = self.cursor.offset(),
            "document parsed"
        );
        Ok(root)
    }

    fn parse_document(&mut self, root: &mut Node) -> Result<()> {
        loop {
            self.cursor.skip_whitespace()?;
            if self.cursor.starts_with(b"<?xml")? {
                self.skip_past(b"?>", "XML declaration")?;
                debug!("skipped XML declaration");
            }
            self.cursor.skip_whitespace()?;
            if self.cursor.starts_with(b"<!DOCTYPE")? {
                self.skip_past(b">", "DOCTYPE declaration")?;
                debug!("skipped DOCTYPE declaration");
            }
            self.cursor.skip_whitespace()?;
            if !self.cursor.available()? {
                return Ok(());
            }
            if self.cursor.starts_with(b"</")? {
                return Err(Error::malformed("closing tag without a matching element")
                    .with_context(format!("at byte {}", self.cursor.offset())));
            }
            self.parse_element(root, 0)?;
        }
    }

    fn skip_past(&mut self, token: &[u8], what: &str) -> Result<()> {
        match self.cursor.find(token)? {
            Some(index) => self.cursor.advance(index + token.len()),
            None => Err(Error::malformed(format!("unterminated {what}"))),
        }
    }

    /// Parses one element and hands it to `parent`.
    fn parse_element(&mut self, parent: &mut Node, depth: usize) -> Result<()> {
        self.cursor.skip_whitespace()?;
        if self.cursor.peek(0)? != b'<' {
            return Err(Error::malformed("expected '<'")
                .with_context(format!("at byte {}", self.cursor.offset())));
        }
        // A closing tag belongs to the enclosing element.
        if self.cursor.peek(1)? == b'/' {
            return Ok(());
        }
        if depth >= self.config.max_depth {
            return Err(Error::new(ErrorKind::MaxDepthExceeded {
                max: self.config.max_depth,
            }));
        }

        let name_end = self.name_end()?;
        let name = self.cursor.slice(1, name_end)?.to_string();
        if name.is_empty() {
            return Err(Error::malformed("element without a name")
                .with_context(format!("at byte {}", self.cursor.offset())));
        }
        self.cursor.advance(name_end)?;
        let mut node = Node::new(name);

        loop {
            self.cursor.skip_whitespace()?;
            match self.cursor.peek(0)? {
                b'>' => {
                    self.cursor.advance(1)?;
                    break;
                }
                b'/' if self.cursor.peek(1)? == b'>' => {
                    self.cursor.advance(2)?;
                    return self.finish(node, parent);
                }
                _ => self.parse_attribute(&mut node)?,
            }
        }

        loop {
            let Some(start) = self.cursor.find(b"<")? else {
                if self.cursor.drain_is_blank()? {
                    break;
                }
                return Err(Error::malformed(format!(
                    "text after the last tag inside <{}>",
                    node.name
                )));
            };

            node.body = text_run(self.cursor.slice(0, start)?);
            self.cursor.advance(start)?;

            if self.cursor.peek(1)? == b'/' {
                self.cursor.advance(2)?;
                self.expect_close(&node.name)?;
                break;
            }
            self.parse_element(&mut node, depth + 1)?;
        }

        self.finish(node, parent)
    }

    /// Offset one past the element name that starts after `<`.
    fn name_end(&mut self) -> Result<usize> {
        let mut i = 1;
        loop {
            let b = self.cursor.peek(i)?;
            if is_delimiter(b) || b == b'>' {
                return Ok(i);
            }
            if matches!(b, b'/' | b'?') && self.cursor.peek(i + 1)? == b'>' {
                return Ok(i);
            }
            i += 1;
        }
    }

    fn parse_attribute(&mut self, node: &mut Node) -> Result<()> {
        let mut len = 0;
        while !matches!(self.cursor.peek(len)?, b'=' | b'>' | b'/' | b'<')
            && !is_delimiter(self.cursor.peek(len)?)
        {
            len += 1;
        }
        if len == 0 {
            return Err(Error::malformed(format!(
                "unexpected '{}' in tag <{}>",
                char::from(self.cursor.peek(0)?),
                node.name
            )));
        }
        let name = self.cursor.slice(0, len)?.to_string();
        self.cursor.advance(len)?;

        self.cursor.skip_whitespace()?;
        if self.cursor.peek(0)? != b'=' {
            return Err(Error::malformed(format!(
                "attribute '{name}' of <{}> has no value",
                node.name
            )));
        }
        self.cursor.advance(1)?;
        self.cursor.skip_whitespace()?;

        let quote = self.cursor.peek(0)?;
        if quote != b'"' && quote != b'\'' {
            return Err(Error::malformed(format!(
                "value of attribute '{name}' of <{}> is not quoted",
                node.name
            )));
        }
        self.cursor.advance(1)?;

        let Some(end) = self.cursor.find(&[quote])? else {
            return Err(Error::malformed(format!(
                "unterminated value of attribute '{name}' of <{}>",
                node.name
            )));
        };
        let value = unescape(self.cursor.slice(0, end)?).into_owned();
        self.cursor.advance(end + 1)?;

        node.attributes.push(Attribute {
            name,
            value: Some(value),
        });
        Ok(())
    }

    /// Consumes `name>` after `</`.
    fn expect_close(&mut self, name: &str) -> Result<()> {
        let matches = self.cursor.starts_with(name.as_bytes())?
            && self.cursor.peek(name.len())? == b'>';
        if !matches {
            let found = self.cursor.find(b">")?.unwrap_or(0);
            let found = self.cursor.slice(0, found).unwrap_or_default().to_string();
            return Err(Error::malformed(format!(
                "mismatched closing tag: expected </{name}>, found </{found}>"
            )));
        }
        self.cursor.advance(name.len() + 1)
    }

    fn finish(&mut self, node: Node, parent: &mut Node) -> Result<()> {
        let Some(handler) = self.handler.as_deref_mut() else {
            parent.children.push(node);
            return Ok(());
        };

        if !handler.element_located_correctly(&node, parent) {
            warn!(element = %node.name, parent = %parent.name, "element rejected by handler");
            return Err(Error::new(ErrorKind::ElementRejected { name: node.name }));
        }
        if let Some(node) = handler.element_finished(node) {
            parent.children.push(node);
        }
        Ok(())
    }
}

/// Trimmed, unescaped text; blank runs carry no body.
fn text_run(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| u8::try_from(c).is_ok_and(is_delimiter));
    if trimmed.is_empty() {
        None
    } else {
        Some(unescape(trimmed).into_owned())
    }
}
