use crate::io::InternalLabels;
use crate::tree::mutable_tree::{MutableTree, TreeIndex};
use crate::tree::{quote_annotation_text, AnnotationValue};

// names containing any of these have to be quoted
const RESERVED: &str = ",:;()[]'\"";

pub fn write_newick(tree: &MutableTree, internal_labels: InternalLabels) -> String {
    let mut s = match tree.get_root() {
        Some(root) => write_node(tree, root, internal_labels),
        None => String::new(),
    };
    s.push(';');
    s
}

enum Step {
    Enter(TreeIndex),
    Leave(TreeIndex),
    Comma,
}

// Walks the tree with an explicit stack so deep trees do not exhaust the call stack.
fn write_node(tree: &MutableTree, node_ref: TreeIndex, internal_labels: InternalLabels) -> String {
    let mut s = String::new();
    let mut stack = vec![Step::Enter(node_ref)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(node) if tree.is_external(node) => {
                if let Some(taxon) = tree.get_taxon(node) {
                    s.push_str(&quote_name(taxon));
                }
                write_branch(&mut s, tree, node);
            }
            Step::Enter(node) => {
                s.push('(');
                stack.push(Step::Leave(node));
                for (i, child) in tree.get_children(node).iter().enumerate().rev() {
                    stack.push(Step::Enter(*child));
                    if i > 0 {
                        stack.push(Step::Comma);
                    }
                }
            }
            Step::Leave(node) => {
                s.push(')');
                match internal_labels {
                    InternalLabels::Names => {
                        if let Some(label) = tree.get_label(node) {
                            s.push_str(&quote_name(label));
                        }
                    }
                    InternalLabels::Support => {
                        if let Some(support) = tree.get_support(node) {
                            s.push_str(&support.to_string());
                        }
                    }
                    InternalLabels::Ignore => {}
                }
                write_branch(&mut s, tree, node);
            }
            Step::Comma => s.push(','),
        }
    }
    s
}

// annotations and length that follow a node's name
fn write_branch(s: &mut String, tree: &MutableTree, node_ref: TreeIndex) {
    s.push_str(&write_annotations(tree, node_ref));
    if let Some(length) = tree.get_length(node_ref) {
        s.push(':');
        s.push_str(&length.to_string());
    }
}

fn quote_name(name: &str) -> String {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || RESERVED.contains(c)) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}

fn write_annotations(tree: &MutableTree, node_ref: TreeIndex) -> String {
    let mut s = String::new();
    if let Some(annotations) = tree.get_annotations(node_ref) {
        let mut keys = annotations.keys().collect::<Vec<&String>>();
        keys.sort();
        let annotation_string = keys
            .into_iter()
            .map(|k| write_annotation(k, &annotations[k]))
            .collect::<Vec<String>>()
            .join(",");
        s.push_str("[&");
        s.push_str(annotation_string.as_str());
        s.push(']');
    }
    s
}

fn write_annotation(key: &str, value: &AnnotationValue) -> String {
    let key = if key.chars().any(|c| c.is_whitespace() || "=,[]{}\"'".contains(c)) {
        quote_annotation_text(key)
    } else {
        key.to_string()
    };
    match value {
        AnnotationValue::Boolean(true) => key,
        _ => format!("{}={}", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parser::newick_parser::NewickParser;

    #[test]
    fn round_trip() {
        let newick = "((A:0.1,B:0.25)X:1.5,(C:1e-7,D:2)Y:0.5)R;";
        let tree = NewickParser::parse_string(newick).unwrap();
        let written = write_newick(&tree, InternalLabels::Names);
        assert_eq!(written, "((A:0.1,B:0.25)X:1.5,(C:0.0000001,D:2)Y:0.5)R;");
        let again = NewickParser::parse_string(&written).unwrap();
        assert_eq!(write_newick(&again, InternalLabels::Names), written);
    }

    #[test]
    fn quotes_when_needed() {
        let tree = NewickParser::parse_string("('a b':1,'it''s':1,'c,d');").unwrap();
        assert_eq!(tree.to_string(), "('a b':1,'it''s':1,'c,d');");
    }

    #[test]
    fn annotations_sorted() {
        let tree =
            NewickParser::parse_string("(a[&z=1,host=\"dromedary camel\",R]:1,b);").unwrap();
        assert_eq!(
            tree.to_string(),
            "(a[&R,host=\"dromedary camel\",z=1]:1,b);"
        );
    }

    #[test]
    fn annotation_text_with_double_quotes() {
        let mut tree = NewickParser::parse_string("(a,b);").unwrap();
        let a = tree.find_node_by_name("a").unwrap();
        tree.annotate_node(
            a,
            "say \"hi\"".to_string(),
            AnnotationValue::Discrete("the \"B\" lineage".to_string()),
        );
        let written = tree.to_string();
        assert_eq!(written, "(a[&'say \"hi\"'='the \"B\" lineage'],b);");

        let again = NewickParser::parse_string(&written).unwrap();
        let a = again.find_node_by_name("a").unwrap();
        assert_eq!(
            again.get_annotation(a, "say \"hi\""),
            Some(&AnnotationValue::Discrete("the \"B\" lineage".to_string()))
        );
    }

    #[test]
    fn deeply_nested() {
        let tips = 50_000;
        let mut newick = "(".repeat(tips - 1);
        newick.push_str("t0");
        for i in 1..tips {
            newick.push_str(&format!(",t{}:1)", i));
        }
        newick.push(';');

        let tree = NewickParser::parse_string(&newick).unwrap();
        assert_eq!(write_newick(&tree, InternalLabels::Names), newick);
    }

    #[test]
    fn label_conventions() {
        let tree = NewickParser::parse_with_labels("((a,b)99:1,c);", InternalLabels::Support)
            .unwrap();
        assert_eq!(write_newick(&tree, InternalLabels::Support), "((a,b)99:1,c);");
        assert_eq!(write_newick(&tree, InternalLabels::Ignore), "((a,b):1,c);");
        let tree = NewickParser::parse_string("((a,b)x:1,c)y;").unwrap();
        assert_eq!(write_newick(&tree, InternalLabels::Ignore), "((a,b):1,c);");
    }

    #[test]
    fn empty_tree() {
        assert_eq!(write_newick(&MutableTree::new(), InternalLabels::Names), ";");
    }
}
