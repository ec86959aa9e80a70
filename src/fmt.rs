use std::fmt::{Display, Write};

use crate::{node::NodeContent, NodeId, ShorTree};

/// How an empty table is written in indented mode. Compact mode always
/// writes `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyTable {
    /// The closing brace goes on its own line, at the table's depth:
    ///
    /// ```text
    /// http: {
    /// }
    /// ```
    #[default]
    Expanded,

    /// The braces stay together: `http: {}`.
    Collapsed,
}

/// Options for [`ShorTree::format_with`].
///
/// A negative `depth` selects compact (single-line) output. A depth of zero
/// or more selects indented output, where `depth` is the indentation level
/// of the node being formatted and `indent` is repeated once per level.
///
/// ```rust
/// use shor::{EmptyTable, FormatConfig, ShorTree};
///
/// let tree: ShorTree = "a: { b: {} }".parse().unwrap();
/// let config = FormatConfig::new().indent("  ").empty_table(EmptyTable::Collapsed);
/// assert_eq!(tree.format_with(tree.root(), &config), "a: {\n  b: {}\n}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatConfig<'a> {
    /// String used to indent one level. Defaults to a tab.
    pub indent: &'a str,
    /// Depth of the formatted node; negative for compact output.
    pub depth: isize,
    /// Layout of empty tables in indented output.
    pub empty_table: EmptyTable,
}

impl Default for FormatConfig<'_> {
    fn default() -> Self {
        FormatConfig {
            indent: "\t",
            depth: 0,
            empty_table: EmptyTable::default(),
        }
    }
}

impl<'a> FormatConfig<'a> {
    /// Indented output at depth 0, indenting with tabs.
    pub fn new() -> Self {
        Default::default()
    }

    /// Single-line output.
    pub fn compact() -> Self {
        FormatConfig {
            indent: "",
            depth: -1,
            empty_table: EmptyTable::default(),
        }
    }

    /// Sets the string used to indent one level.
    pub fn indent(mut self, indent: &'a str) -> Self {
        self.indent = indent;
        self
    }

    /// Sets the depth; negative for compact output.
    pub fn depth(mut self, depth: isize) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the layout of empty tables.
    pub fn empty_table(mut self, empty_table: EmptyTable) -> Self {
        self.empty_table = empty_table;
        self
    }

    /// Whether this config produces single-line output.
    pub fn is_compact(&self) -> bool {
        self.depth < 0
    }
}

struct Formatted<'a> {
    tree: &'a ShorTree,
    id: NodeId,
    config: &'a FormatConfig<'a>,
}

impl Display for Formatted<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.tree.stringify(f, self.id, self.config)
    }
}

impl ShorTree {
    /// Renders a node and its subtree.
    ///
    /// A negative `depth` gives single-line output: table elements are
    /// separated by one space and keys are written as `key:value`. Otherwise
    /// every table child goes on its own line, indented by `indent` repeated
    /// once per level, and keys are written as `key: value`.
    ///
    /// The root never renders its own braces: only its children, separated
    /// by a space or a newline. No trailing newline is added.
    ///
    /// ```rust
    /// # use shor::ShorTree;
    /// let tree: ShorTree = r#"user: "www" events: { worker_connections: 1024 }"#.parse().unwrap();
    /// assert_eq!(
    ///     tree.format(tree.root(), -1, ""),
    ///     r#"user:"www" events:{worker_connections:1024}"#
    /// );
    /// assert_eq!(
    ///     tree.format(tree.root(), 0, "  "),
    ///     "user: \"www\"\nevents: {\n  worker_connections: 1024\n}"
    /// );
    /// ```
    pub fn format(&self, id: NodeId, depth: isize, indent: &str) -> String {
        self.format_with(id, &FormatConfig::new().indent(indent).depth(depth))
    }

    /// Renders a node and its subtree with explicit options.
    pub fn format_with(&self, id: NodeId, config: &FormatConfig<'_>) -> String {
        Formatted {
            tree: self,
            id,
            config,
        }
        .to_string()
    }

    /// Writes a node and its subtree. Pending work lives on an explicit
    /// stack, so deep trees don't exhaust the call stack.
    pub(crate) fn stringify(
        &self,
        f: &mut impl Write,
        id: NodeId,
        config: &FormatConfig<'_>,
    ) -> std::fmt::Result {
        // `None` in compact mode.
        let depth = usize::try_from(config.depth).ok();
        let mut stack = vec![Step::Node(id, depth)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Node(id, depth) => self.write_node(f, id, depth, config, &mut stack)?,
                Step::Separator(c) => f.write_char(c)?,
                Step::Close(depth) => {
                    if let Some(depth) = depth {
                        write_indent(f, config.indent, depth)?;
                    }
                    f.write_char('}')?;
                }
            }
        }
        Ok(())
    }

    /// Writes everything up to a table's children, queueing those and the
    /// closing brace onto `stack`.
    fn write_node(
        &self,
        f: &mut impl Write,
        id: NodeId,
        depth: Option<usize>,
        config: &FormatConfig<'_>,
        stack: &mut Vec<Step>,
    ) -> std::fmt::Result {
        let Some(data) = self.data(id) else {
            return Ok(());
        };

        if id == self.root {
            let separator = if depth.is_some() { '\n' } else { ' ' };
            push_children(stack, data.children(), depth, separator);
            return Ok(());
        }

        if let Some(depth) = depth {
            write_indent(f, config.indent, depth)?;
        }
        if !data.key.is_empty() {
            write!(f, "{}:", data.key)?;
            if depth.is_some() {
                f.write_char(' ')?;
            }
        }
        match &data.content {
            NodeContent::Leaf {
                repr: Some(repr), ..
            } => f.write_str(repr),
            NodeContent::Leaf { value, .. } => write!(f, "{}", value),
            NodeContent::Table(children) => {
                f.write_char('{')?;
                match depth {
                    None => {
                        stack.push(Step::Close(None));
                        push_children(stack, children, None, ' ');
                    }
                    Some(depth) if children.is_empty() => {
                        if config.empty_table == EmptyTable::Expanded {
                            f.write_char('\n')?;
                            write_indent(f, config.indent, depth)?;
                        }
                        f.write_char('}')?;
                    }
                    Some(depth) => {
                        f.write_char('\n')?;
                        stack.push(Step::Close(Some(depth)));
                        for child in children.iter().rev() {
                            stack.push(Step::Separator('\n'));
                            stack.push(Step::Node(*child, Some(depth + 1)));
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

/// Pending output, popped off the end of the stack.
enum Step {
    Node(NodeId, Option<usize>),
    Separator(char),
    /// A table's closing brace, indented to the table's depth.
    Close(Option<usize>),
}

/// Queues `children` so they pop in order, with `separator` between them.
fn push_children(
    stack: &mut Vec<Step>,
    children: &[NodeId],
    depth: Option<usize>,
    separator: char,
) {
    for (i, child) in children.iter().enumerate().rev() {
        stack.push(Step::Node(*child, depth));
        if i > 0 {
            stack.push(Step::Separator(separator));
        }
    }
}

fn write_indent(f: &mut impl Write, indent: &str, depth: usize) -> std::fmt::Result {
    if indent.is_empty() {
        return Ok(());
    }
    for _ in 0..depth {
        f.write_str(indent)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    const DOC: &str = r#"
# nginx-ish
user: "www"
events: { worker_connections: 1024 }
http: {
    gzip: true
    empty: {}
    "keyless" -2.5e3
}
"#;

    #[test]
    fn compact() -> miette::Result<()> {
        let tree: ShorTree = DOC.parse()?;
        assert_eq!(
            tree.format(tree.root(), -1, "ignored"),
            r#"user:"www" events:{worker_connections:1024} http:{gzip:true empty:{} "keyless" -2.5e3}"#
        );
        Ok(())
    }

    #[test]
    fn indented() -> miette::Result<()> {
        let tree: ShorTree = DOC.parse()?;
        assert_eq!(
            tree.format(tree.root(), 0, "  "),
            r#"user: "www"
events: {
  worker_connections: 1024
}
http: {
  gzip: true
  empty: {
  }
  "keyless"
  -2.5e3
}"#
        );
        Ok(())
    }

    #[test]
    fn nested_depth_offsets_everything() -> miette::Result<()> {
        let tree: ShorTree = "a: { b: 1 }".parse()?;
        let a = tree.children(tree.root())[0];
        assert_eq!(tree.format(a, 2, "-"), "--a: {\n---b: 1\n--}");
        // The root ignores its own depth for braces but still indents its children.
        assert_eq!(tree.format(tree.root(), 1, "-"), "-a: {\n--b: 1\n-}");
        Ok(())
    }

    #[test]
    fn empty_tables() -> miette::Result<()> {
        let tree: ShorTree = "a: {} { }".parse()?;
        let expanded = FormatConfig::new().indent("  ");
        let collapsed = expanded.clone().empty_table(EmptyTable::Collapsed);

        assert_eq!(tree.format_with(tree.root(), &expanded), "a: {\n}\n{\n}");
        assert_eq!(tree.format_with(tree.root(), &collapsed), "a: {}\n{}");
        assert_eq!(
            tree.format_with(tree.root(), &FormatConfig::compact()),
            "a:{} {}"
        );
        Ok(())
    }

    #[test]
    fn empty_document() {
        let tree = ShorTree::new();
        assert_eq!(tree.format(tree.root(), 0, "\t"), "");
        assert_eq!(tree.to_string(), "");
    }

    #[test]
    fn strings_are_requoted() -> miette::Result<()> {
        let tree: ShorTree = r#"s: "tab\there \"quoted\" \u{1F600} back\\slash""#.parse()?;
        assert_eq!(
            tree.to_string(),
            r#"s:"tab\there \"quoted\" 😀 back\\slash""#
        );
        Ok(())
    }

    #[test]
    fn deep_tables() -> miette::Result<()> {
        let depth = 20_000;
        let nested = format!("{}{}", "a:{".repeat(depth), "}".repeat(depth));
        let tree: ShorTree = nested.parse()?;

        assert_eq!(tree.to_string(), nested);
        let flat = tree.format(tree.root(), 0, "");
        assert_eq!(
            flat,
            format!("{}{}}}", "a: {\n".repeat(depth), "}\n".repeat(depth - 1))
        );
        assert_eq!(ShorTree::parse(&flat)?, tree);
        Ok(())
    }
}
