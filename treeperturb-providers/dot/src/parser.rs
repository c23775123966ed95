//! Recursive-descent parser turning DOT tokens into a [`LabeledTree`].

use std::collections::{HashMap, HashSet};

use treeperturb_core::{LabelSet, LabeledTree, LabeledTreeBuilder};

use crate::{
    errors::DotError,
    lexer::{Lexer, Token, TokenKind},
};

/// Attribute carrying a node's comma-joined label payload.
const LABEL_ATTRIBUTE: &str = "label";

#[derive(Debug, Default)]
struct PendingNode {
    label: Option<String>,
}

/// Graph content collected while walking the statements.
#[derive(Debug, Default)]
struct GraphContent {
    order: Vec<String>,
    nodes: HashMap<String, PendingNode>,
    edges: Vec<(String, String)>,
    default_label: Option<String>,
    strict: bool,
}

impl GraphContent {
    /// Returns the node named `name`, creating it with the current defaults.
    fn touch(&mut self, name: &str) -> &mut PendingNode {
        if !self.nodes.contains_key(name) {
            self.order.push(name.to_owned());
        }
        let default_label = self.default_label.clone();
        self.nodes
            .entry(name.to_owned())
            .or_insert_with(|| PendingNode {
                label: default_label,
            })
    }

    fn into_tree(self) -> Result<LabeledTree, DotError> {
        let mut builder = LabeledTreeBuilder::new();
        let mut nodes = self.nodes;
        for name in self.order {
            let label = nodes
                .remove(&name)
                .and_then(|node| node.label)
                .ok_or_else(|| DotError::MissingLabel { node: name.clone() })?;
            builder.add_node(name, LabelSet::parse(&label));
        }
        let mut seen = HashSet::new();
        for (parent, child) in self.edges {
            if self.strict && !seen.insert((parent.clone(), child.clone())) {
                continue;
            }
            builder.add_named_edge(parent, child);
        }
        builder.build().map_err(DotError::from)
    }
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: (usize, usize),
}

impl Parser {
    pub(crate) fn new(text: &str) -> Result<Self, DotError> {
        let end = text
            .lines()
            .enumerate()
            .last()
            .map_or((1, 1), |(index, line)| (index + 1, line.chars().count() + 1));
        Ok(Self {
            tokens: Lexer::new(text).tokenize()?,
            position: 0,
            end,
        })
    }

    /// Parses one `[strict] digraph [id] { ... }` graph.
    pub(crate) fn parse(mut self) -> Result<LabeledTree, DotError> {
        let mut content = GraphContent {
            strict: self.eat_keyword("strict"),
            ..GraphContent::default()
        };
        if self.eat_keyword("graph") {
            return Err(DotError::UndirectedGraph);
        }
        if !self.eat_keyword("digraph") {
            return Err(self.unexpected("`digraph`"));
        }
        if self.peek_id().is_some() {
            self.position += 1;
        }
        self.expect(&TokenKind::LBrace, "`{`")?;
        self.statements(&mut content)?;
        self.expect(&TokenKind::RBrace, "`}`")?;
        if self.peek().is_some() {
            return Err(self.unexpected("end of input"));
        }
        content.into_tree()
    }

    fn statements(&mut self, content: &mut GraphContent) -> Result<(), DotError> {
        loop {
            match self.peek().map(|token| &token.kind) {
                None | Some(TokenKind::RBrace) => return Ok(()),
                Some(TokenKind::Semicolon) => self.position += 1,
                Some(TokenKind::LBrace) => {
                    return Err(self.unexpected("a statement (subgraphs are not supported)"));
                }
                _ => self.statement(content)?,
            }
        }
    }

    fn statement(&mut self, content: &mut GraphContent) -> Result<(), DotError> {
        if self.at_keyword("subgraph") {
            return Err(self.unexpected("a statement (subgraphs are not supported)"));
        }
        if self.eat_keyword("node") {
            let attributes = self.attribute_lists()?;
            if let Some(label) = label_of(attributes) {
                content.default_label = Some(label);
            }
            return Ok(());
        }
        if self.eat_keyword("graph") || self.eat_keyword("edge") {
            self.attribute_lists()?;
            return Ok(());
        }
        let first = self.node_id()?;
        if self.eat(&TokenKind::Equals) {
            // Graph attribute assignment such as `rankdir=LR`.
            self.id("a value")?;
            return Ok(());
        }
        let mut chain = vec![first];
        loop {
            if self.eat(&TokenKind::Arrow) {
                chain.push(self.node_id()?);
            } else if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::UndirectedEdge)) {
                return Err(self.unexpected("`->` (undirected edges are not allowed in a digraph)"));
            } else {
                break;
            }
        }
        let attributes = self.attribute_lists()?;
        if let [name] = chain.as_slice() {
            let node = content.touch(name);
            if let Some(label) = label_of(attributes) {
                node.label = Some(label);
            }
            return Ok(());
        }
        for name in &chain {
            content.touch(name);
        }
        content.edges.extend(
            chain
                .windows(2)
                .filter_map(|pair| match pair {
                    [parent, child] => Some((parent.clone(), child.clone())),
                    _ => None,
                }),
        );
        Ok(())
    }

    /// Reads a node identifier, skipping any `:port` suffix.
    fn node_id(&mut self) -> Result<String, DotError> {
        let name = self.id("a node identifier")?;
        while self.eat(&TokenKind::Colon) {
            self.id("a port")?;
        }
        Ok(name)
    }

    fn attribute_lists(&mut self) -> Result<Vec<(String, String)>, DotError> {
        let mut attributes = Vec::new();
        while self.eat(&TokenKind::LBracket) {
            loop {
                if self.eat(&TokenKind::RBracket) {
                    break;
                }
                let key = self.id("an attribute name")?;
                self.expect(&TokenKind::Equals, "`=`")?;
                let value = self.id("an attribute value")?;
                attributes.push((key, value));
                if !self.eat(&TokenKind::Comma) {
                    self.eat(&TokenKind::Semicolon);
                }
            }
        }
        Ok(attributes)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_id(&self) -> Option<&str> {
        match self.peek().map(|token| &token.kind) {
            Some(TokenKind::Id(value) | TokenKind::Quoted(value)) => Some(value),
            _ => None,
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        let matched = self.peek().is_some_and(|token| &token.kind == kind);
        if matched {
            self.position += 1;
        }
        matched
    }

    /// Whether the next token is a bare identifier equal to `keyword`,
    /// ignoring case.
    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.peek().map(|token| &token.kind),
            Some(TokenKind::Id(value)) if value.eq_ignore_ascii_case(keyword)
        )
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let matched = self.at_keyword(keyword);
        if matched {
            self.position += 1;
        }
        matched
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), DotError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn id(&mut self, expected: &str) -> Result<String, DotError> {
        let value = self.peek_id().map(str::to_owned);
        match value {
            Some(value) => {
                self.position += 1;
                Ok(value)
            }
            None => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &str) -> DotError {
        let (line, column, found) = match self.peek() {
            Some(token) => (token.line, token.column, describe(&token.kind)),
            None => (self.end.0, self.end.1, "end of input".to_owned()),
        };
        DotError::Syntax {
            line,
            column,
            message: format!("expected {expected}, found {found}"),
        }
    }
}

fn label_of(attributes: Vec<(String, String)>) -> Option<String> {
    attributes
        .into_iter()
        .rev()
        .find_map(|(key, value)| (key == LABEL_ATTRIBUTE).then_some(value))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Id(value) => format!("`{value}`"),
        TokenKind::Quoted(value) => format!("\"{value}\""),
        TokenKind::LBrace => "`{`".to_owned(),
        TokenKind::RBrace => "`}`".to_owned(),
        TokenKind::LBracket => "`[`".to_owned(),
        TokenKind::RBracket => "`]`".to_owned(),
        TokenKind::Equals => "`=`".to_owned(),
        TokenKind::Semicolon => "`;`".to_owned(),
        TokenKind::Comma => "`,`".to_owned(),
        TokenKind::Colon => "`:`".to_owned(),
        TokenKind::Arrow => "`->`".to_owned(),
        TokenKind::UndirectedEdge => "`--`".to_owned(),
    }
}
