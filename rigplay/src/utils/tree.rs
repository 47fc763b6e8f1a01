//! Tree rendering for node hierarchies

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Short annotations printed after the name
    pub tags: Vec<String>,
}

/// Role of a scene node in the rendered tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Scene root
    Root,
    /// Node referenced by at least one mesh bone
    Bone,
    /// Node placing rigid meshes
    Mesh,
    /// Any other node
    Group,
}

/// Options for tree rendering
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add an annotation
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

impl NodeType {
    /// Marker printed before the node name
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Root => "◆",
            NodeType::Bone => "●",
            NodeType::Mesh => "■",
            NodeType::Group => "○",
        }
    }

    /// Get color style for node type
    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Bone => Style::new().yellow(),
                NodeType::Mesh => Style::new().green(),
                NodeType::Group => Style::new().dim(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{}{}{} {}",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));
    if !node.tags.is_empty() {
        let tag_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        output.push_str(&format!(
            " {}",
            tag_style.apply_to(format!("[{}]", node.tags.join(", ")))
        ));
    }
    output.push('\n');

    let new_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &new_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> TreeNode {
        TreeNode::new("Armature", NodeType::Root)
            .add_child(
                TreeNode::new("Hips", NodeType::Bone)
                    .with_tag("animated")
                    .add_child(TreeNode::new("Spine", NodeType::Bone)),
            )
            .add_child(TreeNode::new("Prop", NodeType::Mesh).with_tag("meshes: 1"))
    }

    #[test]
    fn test_tree_rendering() {
        let options = TreeOptions {
            no_color: true,
            ..TreeOptions::default()
        };
        let output = render_tree(&sample_tree(), &options);

        assert_eq!(
            output,
            "◆ Armature\n\
             ├── ● Hips [animated]\n\
             │   └── ● Spine\n\
             └── ■ Prop [meshes: 1]\n"
        );
    }

    #[test]
    fn test_tree_depth_limit() {
        let options = TreeOptions {
            max_depth: Some(1),
            no_color: true,
        };
        let output = render_tree(&sample_tree(), &options);
        assert!(output.contains("Hips"));
        assert!(!output.contains("Spine"));
    }
}
