//! Path hierarchies for treemap display

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use super::Row;

pub const ROOT_LABEL: &str = "Total";

/// A node of a path hierarchy. Its value is the sum of the leaves below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub label: String,
    pub value: Decimal,
    /// Secondary metric, set on leaves only
    pub color: Option<Decimal>,
    pub children: Vec<HierarchyNode>,
}

/// Flat id/parent representation of a hierarchy node, as treemap charts take it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapEntry {
    pub id: String,
    pub parent: String,
    pub label: String,
    pub value: Decimal,
    pub color: Option<Decimal>,
}

impl HierarchyNode {
    fn leaf(label: &str, value: Decimal, color: Option<Decimal>) -> Self {
        Self {
            label: label.to_string(),
            value,
            color,
            children: Vec::new(),
        }
    }

    fn branch(label: &str, children: Vec<HierarchyNode>) -> Self {
        Self {
            label: label.to_string(),
            value: children.iter().map(|c| c.value).sum(),
            color: None,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of levels below this node
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn leaves(&self) -> Vec<&HierarchyNode> {
        if self.is_leaf() {
            return vec![self];
        }
        self.children.iter().flat_map(|c| c.leaves()).collect()
    }

    /// Flatten the descendants (root excluded) into id/parent entries.
    ///
    /// Ids are the `/`-joined labels from the top level down; sibling leaves
    /// sharing a label get a `#n` suffix so every id stays unique. A `/`, `#`
    /// or `\` inside a label is backslash-escaped in the id.
    pub fn to_treemap(&self) -> Vec<TreemapEntry> {
        let mut entries = Vec::new();
        flatten_children(self, "", &mut entries);
        entries
    }
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '/' | '#' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn flatten_children(node: &HierarchyNode, parent_id: &str, out: &mut Vec<TreemapEntry>) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for child in &node.children {
        let count = seen.entry(child.label.as_str()).or_insert(0);
        *count += 1;
        let base = if parent_id.is_empty() {
            escape_label(&child.label)
        } else {
            format!("{}/{}", parent_id, escape_label(&child.label))
        };
        let id = if *count > 1 {
            format!("{}#{}", base, count)
        } else {
            base
        };

        out.push(TreemapEntry {
            id: id.clone(),
            parent: parent_id.to_string(),
            label: child.label.clone(),
            value: child.value,
            color: child.color,
        });
        flatten_children(child, &id, out);
    }
}

/// Build a tree of depth `path.len()` whose leaves are the input rows.
///
/// Intermediate levels group rows by the label of the corresponding path
/// column, in first-seen order. Each leaf carries the row's `measure` (missing
/// counts as zero) and, when requested, the row's `color` metric unaggregated.
pub fn build_hierarchy<R: Row>(
    rows: &[R],
    path: &[R::Column],
    measure: R::Measure,
    color: Option<R::Measure>,
) -> HierarchyNode {
    let refs: Vec<&R> = rows.iter().collect();
    if path.is_empty() {
        let total = refs
            .iter()
            .map(|r| r.value(measure).unwrap_or(Decimal::ZERO))
            .sum();
        return HierarchyNode::leaf(ROOT_LABEL, total, None);
    }
    HierarchyNode::branch(ROOT_LABEL, build_level(&refs, path, measure, color))
}

fn build_level<R: Row>(
    rows: &[&R],
    path: &[R::Column],
    measure: R::Measure,
    color: Option<R::Measure>,
) -> Vec<HierarchyNode> {
    let Some((column, rest)) = path.split_first() else {
        return Vec::new();
    };

    if rest.is_empty() {
        return rows
            .iter()
            .map(|r| {
                HierarchyNode::leaf(
                    r.label(*column),
                    r.value(measure).unwrap_or(Decimal::ZERO),
                    color.and_then(|c| r.value(c)),
                )
            })
            .collect();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&R>> = HashMap::new();
    for row in rows {
        let label = row.label(*column);
        groups
            .entry(label)
            .or_insert_with(|| {
                order.push(label);
                Vec::new()
            })
            .push(*row);
    }

    order
        .into_iter()
        .map(|label| {
            let members = groups.remove(label).unwrap_or_default();
            HierarchyNode::branch(label, build_level(&members, rest, measure, color))
        })
        .collect()
}
