use super::PlanNode;

/// Render a plan as an indented tree, one node per line.
///
/// ```text
/// └─ Project(name)
///    └─ Filter(expression: age > 30)
///       └─ Scan(table: default)
/// ```
pub fn format_plan(node: &PlanNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, "", true);
    out
}

fn write_node(out: &mut String, node: &PlanNode, prefix: &str, is_last: bool) {
    out.push_str(prefix);
    out.push_str(if is_last { "└─ " } else { "├─ " });
    out.push_str(&node.explain());
    out.push('\n');

    let child_prefix = format!("{}{}", prefix, if is_last { "   " } else { "│  " });
    let children = node.children();
    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        write_node(out, child, &child_prefix, i == last);
    }
}
