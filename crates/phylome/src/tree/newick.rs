//! Newick parsing and writing for [`Tree`].

use crate::{Error, Result};

use super::Tree;

/// A byte cursor over a newick string.
struct Cursor<'a> {
    /// The input bytes.
    input: &'a [u8],
    /// Current position.
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of the input.
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    /// The byte under the cursor, if any.
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Moves past the current byte.
    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    /// Skips whitespace.
    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.advance();
        }
    }

    /// Consumes `expected` or fails.
    fn expect(&mut self, expected: u8) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.advance();
            Ok(())
        } else {
            Err(Error::input(format!(
                "newick: expected '{}' at byte {}",
                expected as char, self.pos
            )))
        }
    }

    /// Reads an unquoted token: anything up to a structural character.
    fn token(&mut self) -> String {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !matches!(b, b'(' | b')' | b',' | b':' | b';') && !b.is_ascii_whitespace())
        {
            self.advance();
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Reads a branch length after an optional ':'.
    fn branch_length(&mut self) -> Result<f64> {
        self.skip_ws();
        if self.peek() == Some(b':') {
            self.advance();
            let token = self.token();
            token
                .parse()
                .map_err(|_| Error::input(format!("newick: bad branch length '{token}'")))
        } else {
            Ok(0.0)
        }
    }
}

impl Tree {
    /// Parses a tree from newick text.
    ///
    /// Internal-node labels that parse as numbers are taken as bootstrap
    /// support values, per the usual convention.
    ///
    /// # Errors
    ///
    /// On malformed input.
    pub fn from_newick(text: &str) -> Result<Self> {
        let mut tree = Self::new();
        let mut cursor = Cursor::new(text);
        cursor.skip_ws();
        if cursor.peek().is_none() {
            return Err(Error::input("newick: empty input"));
        }
        let root = tree.root();
        parse_node(&mut cursor, &mut tree, root)?;
        cursor.expect(b';')?;
        cursor.skip_ws();
        if cursor.peek().is_some() {
            return Err(Error::input("newick: trailing characters after ';'"));
        }
        Ok(tree)
    }

    /// Writes the tree as a newick string, terminated by ';'.
    #[must_use]
    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root(), &mut out);
        out.push(';');
        out
    }

    /// Writes the tree as a nexus trees block holding one tree.
    #[must_use]
    pub fn to_nexus(&self, name: &str) -> String {
        format!("#NEXUS\nbegin trees;\n  tree {name} = {}\nend;\n", self.to_newick())
    }

    /// Recursively writes one node.
    fn write_node(&self, idx: usize, out: &mut String) {
        let node = self.node(idx);
        if !node.children.is_empty() {
            out.push('(');
            for (k, &child) in node.children.iter().enumerate() {
                if k > 0 {
                    out.push(',');
                }
                self.write_node(child, out);
            }
            out.push(')');
            if let Some(support) = node.support {
                if (support - support.round()).abs() < 1e-9 {
                    out.push_str(&format!("{}", support.round() as i64));
                } else {
                    out.push_str(&format!("{support}"));
                }
            }
        }
        if let Some(label) = &node.label {
            out.push_str(label);
        }
        if node.parent.is_some() {
            out.push_str(&format!(":{}", node.branch_length));
        }
    }
}

/// Parses one subtree into the node at `idx`.
fn parse_node(cursor: &mut Cursor<'_>, tree: &mut Tree, idx: usize) -> Result<()> {
    cursor.skip_ws();
    if cursor.peek() == Some(b'(') {
        cursor.advance();
        loop {
            let child = tree.add_child(idx, None, 0.0);
            parse_node(cursor, tree, child)?;
            cursor.skip_ws();
            match cursor.peek() {
                Some(b',') => cursor.advance(),
                Some(b')') => {
                    cursor.advance();
                    break;
                }
                _ => return Err(Error::input(format!("newick: expected ',' or ')' at byte {}", cursor.pos))),
            }
        }
        // After the children: an optional support-or-label, then a length.
        let token = cursor.token();
        if !token.is_empty() {
            if let Ok(support) = token.parse::<f64>() {
                tree.node_mut(idx).support = Some(support);
            } else {
                tree.node_mut(idx).label = Some(token);
            }
        }
    } else {
        let token = cursor.token();
        if token.is_empty() {
            return Err(Error::input(format!("newick: missing leaf label at byte {}", cursor.pos)));
        }
        tree.node_mut(idx).label = Some(token);
    }
    tree.node_mut(idx).branch_length = cursor.branch_length()?;
    Ok(())
}
