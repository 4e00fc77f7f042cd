use std::collections::BTreeMap;

use crate::model::PageSummary;

/// Anything that can be placed in a path tree.
pub trait TreeItem {
    fn tree_path(&self) -> &str;
    fn tree_label(&self) -> &str;
    fn tree_id(&self) -> String;
}

impl TreeItem for PageSummary {
    fn tree_path(&self) -> &str {
        &self.path
    }

    fn tree_label(&self) -> &str {
        if self.title.is_empty() {
            &self.path
        } else {
            &self.title
        }
    }

    fn tree_id(&self) -> String {
        self.id.to_string()
    }
}

struct TreeNode<'a, T> {
    children: BTreeMap<&'a str, TreeNode<'a, T>>,
    items: Vec<&'a T>,
}

impl<T> Default for TreeNode<'_, T> {
    fn default() -> Self {
        Self {
            children: BTreeMap::new(),
            items: Vec::new(),
        }
    }
}

/// Render items as a box-drawing tree keyed by `/`-separated path segments.
/// At each level the items attached there come first, then subdirectories
/// in name order.
pub fn render_tree<T: TreeItem>(items: &[T]) -> String {
    let mut root = TreeNode::default();
    for item in items {
        let mut node = &mut root;
        let segments = item
            .tree_path()
            .split('/')
            .filter(|segment| !segment.is_empty());
        for segment in segments {
            node = node.children.entry(segment).or_default();
        }
        node.items.push(item);
    }

    let mut lines = Vec::new();
    render_node(&root, "", &mut lines);
    lines.join("\n")
}

fn render_node<T: TreeItem>(node: &TreeNode<'_, T>, prefix: &str, lines: &mut Vec<String>) {
    let total = node.items.len() + node.children.len();
    let mut position = 0usize;

    for item in &node.items {
        position += 1;
        let connector = if position == total { "└── " } else { "├── " };
        lines.push(format!(
            "{prefix}{connector}{} ({})",
            item.tree_label(),
            item.tree_id()
        ));
    }

    for (name, child) in &node.children {
        position += 1;
        let last = position == total;
        let connector = if last { "└── " } else { "├── " };
        lines.push(format!("{prefix}{connector}{name}/"));
        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        render_node(child, &child_prefix, lines);
    }
}

#[cfg(test)]
mod tests {
    use super::render_tree;
    use crate::model::PageSummary;

    fn page(id: u64, path: &str, title: &str) -> PageSummary {
        PageSummary {
            id,
            path: path.to_string(),
            title: title.to_string(),
            ..PageSummary::default()
        }
    }

    #[test]
    fn single_page_shows_label_and_id() {
        let rendered = render_tree(&[page(1, "page", "T")]);
        assert!(rendered.contains('T'));
        assert!(rendered.contains("(1)"));
    }

    #[test]
    fn items_render_before_subdirectories() {
        let pages = vec![
            page(3, "docs/api/auth", "Auth"),
            page(4, "docs", "Docs"),
            page(2, "docs/intro", "Intro"),
        ];
        assert_eq!(
            render_tree(&pages),
            [
                "└── docs/",
                "    ├── Docs (4)",
                "    ├── api/",
                "    │   └── auth/",
                "    │       └── Auth (3)",
                "    └── intro/",
                "        └── Intro (2)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn tree_layout_uses_last_sibling_connectors() {
        let pages = vec![page(1, "a", "A"), page(2, "a/b", "B"), page(3, "c", "")];
        assert_eq!(
            render_tree(&pages),
            [
                "├── a/",
                "│   ├── A (1)",
                "│   └── b/",
                "│       └── B (2)",
                "└── c/",
                "    └── c (3)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert_eq!(render_tree::<PageSummary>(&[]), "");
    }
}
