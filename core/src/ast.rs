//! Arena-backed syntax tree for docopt help texts.
//!
//! Nodes live in a single `Vec` owned by [`Ast`] and are addressed by
//! [`NodeId`]. Each node owns its ordered child list and keeps a non-owning
//! parent index, so the tree can be walked in both directions without
//! reference counting. Nodes are never removed once attached; the only
//! structural edit is [`Ast::replace_children_with_group`], which reparents an
//! existing child run under a freshly inserted interior node.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::token::Token;

/// Index of a node inside its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node kinds, grouped by family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    // structural
    Root,
    Prologue,
    PrologueNode,
    UsageSection,
    UsageLine,
    OptionsSection,
    OptionsNode,
    FreeSection,
    SectionName,
    SectionNode,

    // usage expressions
    ProgName,
    UsageExpr,
    UsageShortOption,
    UsageLongOption,
    UsageArgument,
    UsageCommand,
    UsageOptionalGroup,
    UsageRequiredGroup,
    GroupAlternative,
    UsageUnmatchedPunct,

    // option grammar
    OptionLine,
    OptionShort,
    OptionLong,
    OptionArgument,
    OptionAlternativeGroup,
    OptionDescription,
    DescriptionNode,
    OptionDefault,
}

impl NodeKind {
    /// Kinds that may appear inside a usage line below its `ProgName`.
    pub const fn is_usage_expression(self) -> bool {
        matches!(
            self,
            NodeKind::UsageExpr
                | NodeKind::UsageShortOption
                | NodeKind::UsageLongOption
                | NodeKind::UsageArgument
                | NodeKind::UsageCommand
                | NodeKind::UsageOptionalGroup
                | NodeKind::UsageRequiredGroup
                | NodeKind::GroupAlternative
                | NodeKind::UsageUnmatchedPunct
        )
    }

    /// Kinds that accept an `=ARGUMENT` assignment.
    pub const fn accepts_assignment(self) -> bool {
        matches!(
            self,
            NodeKind::UsageLongOption | NodeKind::OptionLong | NodeKind::OptionShort
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub kind: NodeKind,
    pub token: Option<Token>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Set when an ellipsis applies to this node.
    pub repeat: bool,
}

impl AstNode {
    fn new(kind: NodeKind, token: Option<Token>, parent: Option<NodeId>) -> Self {
        Self {
            kind,
            token,
            children: Vec::new(),
            parent,
            repeat: false,
        }
    }

    /// Literal text of the originating token, if any.
    pub fn text(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.value.as_str())
    }
}

/// Rooted syntax tree.
///
/// # Examples
///
/// ```
/// use docopt_grammar_core::{Ast, NodeKind};
///
/// let mut ast = Ast::new(NodeKind::Root);
/// let line = ast.add_child(ast.root(), NodeKind::UsageLine, None);
/// let a = ast.add_child(line, NodeKind::UsageCommand, None);
/// let b = ast.add_child(line, NodeKind::UsageCommand, None);
///
/// let group = ast.replace_children_with_group(line, NodeKind::GroupAlternative);
/// assert_eq!(ast.children(line), &[group]);
/// assert_eq!(ast.children(group), &[a, b]);
/// assert_eq!(ast.parent(a), Some(group));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    /// Creates a tree holding only a root node of `kind`.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            nodes: vec![AstNode::new(kind, None, None)],
        }
    }

    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&AstNode> {
        self.nodes.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn token(&self, id: NodeId) -> Option<&Token> {
        self.node(id).token.as_ref()
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text()
    }

    pub fn is_repeated(&self, id: NodeId) -> bool {
        self.node(id).repeat
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).children.last().copied()
    }

    /// Iterates over all node ids in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Appends a new node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, token: Option<Token>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode::new(kind, token, Some(parent)));
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Marks `id` as repeatable (ellipsis applied).
    pub fn set_repeat(&mut self, id: NodeId) {
        self.nodes[id.0].repeat = true;
    }

    /// Moves every child of `node` under a new interior node of `kind`, which
    /// becomes `node`'s sole child. Returns the interior node.
    pub fn replace_children_with_group(&mut self, node: NodeId, kind: NodeKind) -> NodeId {
        self.replace_children_with_group_from(node, kind, 0)
    }

    /// Like [`replace_children_with_group`](Self::replace_children_with_group),
    /// but the first `keep` children stay in place ahead of the new group.
    pub fn replace_children_with_group_from(
        &mut self,
        node: NodeId,
        kind: NodeKind,
        keep: usize,
    ) -> NodeId {
        let split = keep.min(self.nodes[node.0].children.len());
        let moved = self.nodes[node.0].children.split_off(split);

        let group = NodeId(self.nodes.len());
        self.nodes.push(AstNode::new(kind, None, Some(node)));
        for child in &moved {
            self.nodes[child.0].parent = Some(group);
        }
        self.nodes[group.0].children = moved;
        self.nodes[node.0].children.push(group);
        group
    }

    /// Pre-order list of every node below `id` (excluding `id`).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// First node of `kind` in pre-order from the root.
    pub fn find_first(&self, kind: NodeKind) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self.kind(*id) == kind)
    }

    /// Every node of `kind` in pre-order from the root.
    pub fn find_all(&self, kind: NodeKind) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.kind(*id) == kind)
            .collect()
    }

    /// Children of `id` that have the given kind.
    pub fn children_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.kind(*c) == kind)
            .collect()
    }

    /// The canonical program name (text of the first `ProgName` node).
    pub fn prog_name(&self) -> Option<&str> {
        self.find_first(NodeKind::ProgName)
            .and_then(|id| self.text(id))
    }

    pub fn usage_lines(&self) -> Vec<NodeId> {
        self.find_all(NodeKind::UsageLine)
    }

    pub fn option_lines(&self) -> Vec<NodeId> {
        self.find_all(NodeKind::OptionLine)
    }

    /// Words of an `OptionDescription` joined by single spaces.
    pub fn description_text(&self, description: NodeId) -> String {
        self.children(description)
            .iter()
            .filter_map(|id| self.text(*id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Embedded `[default: ...]` value of an option line, if any.
    pub fn option_default(&self, line: NodeId) -> Option<&str> {
        self.children_of_kind(line, NodeKind::OptionDescription)
            .into_iter()
            .flat_map(|d| self.children_of_kind(d, NodeKind::OptionDefault))
            .find_map(|id| self.text(id))
            .and_then(default_value)
    }

    /// Option names (`-h`, `--help`) declared by an option line, in order.
    pub fn option_names(&self, line: NodeId) -> Vec<&str> {
        self.descendants(line)
            .into_iter()
            .filter(|id| matches!(self.kind(*id), NodeKind::OptionShort | NodeKind::OptionLong))
            .filter_map(|id| self.text(id))
            .collect()
    }

    fn view(&self, id: NodeId) -> NodeView<'_> {
        let node = self.node(id);
        NodeView {
            kind: node.kind,
            text: node.text(),
            repeat: node.repeat,
            children: node.children.iter().map(|c| self.view(*c)).collect(),
        }
    }
}

/// Extracts the value from a `[default: value]` marker.
///
/// # Examples
///
/// ```
/// use docopt_grammar_core::default_value;
///
/// assert_eq!(default_value("[default: ----]"), Some("----"));
/// assert_eq!(default_value("[Default:3]"), Some("3"));
/// assert_eq!(default_value("plain"), None);
/// ```
pub fn default_value(marker: &str) -> Option<&str> {
    let inner = marker.strip_prefix('[')?.strip_suffix(']')?;
    let (label, value) = inner.split_once(':')?;
    if !label.trim().eq_ignore_ascii_case("default") {
        return None;
    }
    Some(value.trim())
}

#[derive(Serialize)]
struct NodeView<'a> {
    kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    repeat: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeView<'a>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Serialize for Ast {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view(self.root()).serialize(serializer)
    }
}
