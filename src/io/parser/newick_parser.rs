use crate::io::error::IoError;
use crate::io::parser::annotation_parser::AnnotationParser;
use crate::io::InternalLabels;
use crate::tree::mutable_tree::{MutableTree, TreeIndex};
use crate::tree::AnnotationValue;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::CharIndices;

type Result<T> = std::result::Result<T, IoError>;

// characters that end an unquoted name or branch length
const DELIMINATORS: &str = ",:;()[";

/*
Newick reader modeled on the newick importer in BEAST, without recursion.
Comments may sit between any two tokens; `[&...]` comments are annotations
and are attached to the node they follow.
 */
#[derive(Debug)]
pub struct NewickParser<'a> {
    input: &'a str,
    reader: Peekable<CharIndices<'a>>,
    tree: MutableTree,
    internal_labels: InternalLabels,
    last_annotation: Option<HashMap<String, AnnotationValue>>,
}

impl<'a> NewickParser<'a> {
    pub fn new(input: &'a str, internal_labels: InternalLabels) -> Self {
        NewickParser {
            input,
            reader: input.char_indices().peekable(),
            tree: MutableTree::new(),
            internal_labels,
            last_annotation: None,
        }
    }

    /// Parses a single tree with internal labels read as node names.
    pub fn parse_string(input: &str) -> Result<MutableTree> {
        NewickParser::parse_with_labels(input, InternalLabels::Names)
    }

    /// Parses a single tree. Anything but whitespace after the closing `;` is an error.
    pub fn parse_with_labels(input: &str, internal_labels: InternalLabels) -> Result<MutableTree> {
        let mut parser = NewickParser::new(input, internal_labels);
        let tree = parser.read_tree()?;
        parser.skip_space();
        match parser.reader.peek() {
            None => Ok(tree),
            Some((i, _)) => Err(IoError::Format(format!(
                "unexpected text after the end of the tree at position {}",
                i
            ))),
        }
    }

    /// Number of bytes of the input read so far.
    pub fn consumed(&mut self) -> usize {
        match self.reader.peek() {
            Some((i, _)) => *i,
            None => self.input.len(),
        }
    }

    /// Reads the next `;` terminated tree, leaving the reader just after the `;`.
    pub fn read_tree(&mut self) -> Result<MutableTree> {
        let start = std::time::Instant::now();
        self.tree = MutableTree::new();

        // comments ahead of the tree, such as [&R], do not belong to a node
        self.skip_space_and_comments()?;
        self.last_annotation = None;

        let root = self.read_subtree()?;
        self.tree.set_root(Some(root));

        match self.read()? {
            ';' => {
                trace!(
                    "Tree parsed in {} milli seconds ",
                    start.elapsed().as_millis()
                );
                Ok(std::mem::take(&mut self.tree))
            }
            ')' => Err(IoError::Format("unbalanced ')' in tree".to_string())),
            c => Err(IoError::Format(format!("expected ';' but found '{}'", c))),
        }
    }

    // Clades that are still open are kept on an explicit stack, each with the
    // children read so far, so nesting depth is bounded by the heap only.
    fn read_subtree(&mut self) -> Result<TreeIndex> {
        let mut open: Vec<Vec<TreeIndex>> = Vec::new();
        loop {
            self.skip_space_and_comments()?;
            if self.next_token()? == '(' {
                self.read()?;
                open.push(Vec::new());
                continue;
            }
            let tip = self.read_external_node()?;
            let mut branch = self.read_branch_length(tip)?;

            loop {
                let children = match open.last_mut() {
                    Some(children) => children,
                    None => return Ok(branch),
                };
                children.push(branch);
                match self.read()? {
                    ',' => break,
                    ')' => {
                        let children = open.pop().unwrap_or_default();
                        let node = self.read_internal_node(children)?;
                        branch = self.read_branch_length(node)?;
                    }
                    c => {
                        return Err(IoError::Format(format!(
                            "expected ',' or ')' but found '{}'",
                            c
                        )))
                    }
                }
            }
        }
    }

    /// Builds the clade once its closing ')' has been read.
    fn read_internal_node(&mut self, children: Vec<TreeIndex>) -> Result<TreeIndex> {
        let label = self.read_label()?;
        let node = self.tree.make_internal_node(children);
        if let Some(label) = label {
            match self.internal_labels {
                InternalLabels::Names => self.tree.label_node(node, label),
                InternalLabels::Support => {
                    let support = label.parse::<f64>().map_err(|_| {
                        IoError::Format(format!("support value '{}' is not a number", label))
                    })?;
                    self.tree.set_support(node, support);
                }
                InternalLabels::Ignore => {}
            }
        }
        self.annotation_node(node);
        Ok(node)
    }

    fn read_external_node(&mut self) -> Result<TreeIndex> {
        let label = self.read_label()?;
        let node = self.tree.make_external_node(label.as_deref());
        self.annotation_node(node);
        Ok(node)
    }

    fn read_branch_length(&mut self, branch: TreeIndex) -> Result<TreeIndex> {
        self.skip_space_and_comments()?;
        if self.next_token()? == ':' {
            self.read()?;
            let length = self.read_double()?;
            self.tree.set_length(branch, length);
            self.skip_space_and_comments()?;
            self.annotation_node(branch);
        }
        self.skip_space_and_comments()?;
        Ok(branch)
    }

    /// Reads an optionally quoted name. Returns `None` when there is none.
    fn read_label(&mut self) -> Result<Option<String>> {
        self.skip_space_and_comments()?;
        let first = self.next_token()?;
        let token = if first == '\'' || first == '"' {
            self.read()?;
            let mut token = String::new();
            loop {
                let ch = self.read()?;
                if ch == first {
                    // a doubled quote is a literal quote
                    if self.reader.peek().map(|(_, c)| *c) == Some(first) {
                        self.read()?;
                        token.push(ch);
                    } else {
                        break;
                    }
                } else {
                    token.push(ch);
                }
            }
            Some(token)
        } else {
            let token = self.read_to_token()?;
            if token.is_empty() {
                None
            } else {
                Some(token)
            }
        };
        self.skip_space_and_comments()?;
        Ok(token)
    }

    fn read_to_token(&mut self) -> Result<String> {
        let mut token = String::new();
        while let Some((_, ch)) = self.reader.peek() {
            if ch.is_whitespace() || DELIMINATORS.contains(*ch) {
                break;
            }
            token.push(*ch);
            self.reader.next();
        }
        Ok(token)
    }

    fn read_double(&mut self) -> Result<f64> {
        self.skip_space_and_comments()?;
        let s = self.read_to_token()?;
        s.parse::<f64>()
            .map_err(|_| IoError::Format(format!("branch length '{}' is not a number", s)))
    }

    fn read(&mut self) -> Result<char> {
        self.reader.next().map(|(_, c)| c).ok_or(IoError::Eof)
    }

    fn next_token(&mut self) -> Result<char> {
        self.reader.peek().map(|(_, c)| *c).ok_or(IoError::Eof)
    }

    fn skip_space(&mut self) {
        while let Some((_, ch)) = self.reader.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.reader.next();
        }
    }

    fn skip_space_and_comments(&mut self) -> Result<()> {
        self.skip_space();
        while let Some((_, '[')) = self.reader.peek() {
            self.skip_comment()?;
            self.skip_space();
        }
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<()> {
        let mut comment = String::new();
        loop {
            let ch = self.read()?;
            comment.push(ch);
            if ch == ']' {
                break;
            }
        }
        if comment.starts_with("[&") {
            let annotation = AnnotationParser::parse_annotation(comment.as_str())
                .map_err(|e| IoError::Annotation(e.to_string()))?;
            self.last_annotation
                .get_or_insert_with(HashMap::new)
                .extend(annotation);
        } else {
            debug!("skipping comment {}", comment);
        }
        Ok(())
    }

    fn annotation_node(&mut self, node_ref: TreeIndex) {
        if let Some(annotation_map) = self.last_annotation.take() {
            for (key, value) in annotation_map.into_iter() {
                self.tree.annotate_node(node_ref, key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_parse() {
        let tree = NewickParser::parse_string("(a:1,b:4)l;").unwrap();
        let root = tree.get_root().unwrap();
        let label = tree.get_label(root).unwrap();
        assert_eq!(label, "l");
        let names: Vec<&str> = tree
            .get_children(root)
            .iter()
            .filter_map(|child| tree.get_taxon(*child))
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let bl: Vec<f64> = tree
            .get_children(root)
            .iter()
            .filter_map(|child| tree.get_length(*child))
            .collect();
        assert_eq!(bl, vec![1.0, 4.0]);
        assert_eq!(tree.get_length(root), None);
    }

    #[test]
    fn scientific() {
        let tree = NewickParser::parse_string("(a:1E1,b:2e-5)l;").unwrap();
        let root = tree.get_root().unwrap();
        let bl: Vec<f64> = tree
            .get_children(root)
            .iter()
            .filter_map(|child| tree.get_length(*child))
            .collect();
        assert_eq!(bl, vec![10.0, 0.00002]);
    }

    #[test]
    fn root_length() {
        let tree = NewickParser::parse_string("(a:1,b:1):0.5;").unwrap();
        assert_eq!(tree.get_length(tree.get_root().unwrap()), Some(0.5));
    }

    #[test]
    fn quoted() {
        let tree = NewickParser::parse_string("('234] ':1,'it''s here':1);").unwrap();
        let root = tree.get_root().unwrap();
        assert_eq!(tree.get_taxon(tree.get_child(root, 0).unwrap()), Some("234] "));
        assert_eq!(tree.get_taxon(tree.get_child(root, 1).unwrap()), Some("it's here"));
    }

    #[test]
    fn long_names() {
        let name = "lcl|Query_74706184901-8458MN514967.1DromedarycamelcoronavirusHKU23isolateDcCoV-HKU23/camel/Nigeria/NV1385/2016";
        let tree = NewickParser::parse_string(&format!("(({}:0.1,b:0.2):0.3,c:0.4);", name)).unwrap();
        assert!(tree.find_node_by_name(name).is_some());
    }

    #[test]
    fn comment() {
        let tree = NewickParser::parse_string("[&R] (a[&test=ok],b[plain comment]:1);").unwrap();
        let a = tree.find_node_by_name("a").unwrap();
        let b = tree.find_node_by_name("b").unwrap();
        assert_eq!(
            tree.get_annotation(a, "test"),
            Some(&AnnotationValue::Discrete("ok".to_string()))
        );
        assert!(tree.get_annotations(b).is_none());
        assert!(tree.get_annotations(tree.get_root().unwrap()).is_none());
    }

    #[test]
    fn annotation_after_length() {
        let tree = NewickParser::parse_string("(a:1[&rate=0.5],b:1);").unwrap();
        let a = tree.find_node_by_name("a").unwrap();
        assert_eq!(
            tree.get_annotation(a, "rate"),
            Some(&AnnotationValue::Continuous(0.5))
        );
    }

    #[test]
    fn whitespace() {
        let tree = NewickParser::parse_string("  (a, b :1,\n (c , d) x );\t").unwrap();
        assert_eq!(tree.get_external_node_count(), 4);
        assert!(tree.find_node_by_name("x").is_some());
    }

    #[test]
    fn unnamed_tips() {
        let tree = NewickParser::parse_string("(,,(,));").unwrap();
        assert_eq!(tree.get_external_node_count(), 4);
        assert_eq!(tree.get_internal_node_count(), 2);
    }

    #[test]
    fn support_labels() {
        let tree =
            NewickParser::parse_with_labels("((a,b)95:1,c);", InternalLabels::Support).unwrap();
        let a = tree.find_node_by_name("a").unwrap();
        let parent = tree.get_parent(a).unwrap();
        assert_eq!(tree.get_support(parent), Some(95.0));
        assert_eq!(tree.get_label(parent), None);
        assert!(
            NewickParser::parse_with_labels("((a,b)x,c);", InternalLabels::Support).is_err()
        );
    }

    #[test]
    fn ignored_labels() {
        let tree = NewickParser::parse_with_labels("((a,b)x,c)y;", InternalLabels::Ignore).unwrap();
        assert!(tree.find_node_by_name("x").is_none());
        assert!(tree.find_node_by_name("a").is_some());
    }

    #[test]
    fn should_error() {
        let out = NewickParser::parse_string("('234] ','here a *')");
        assert_eq!(out.unwrap_err(), IoError::Eof);
    }

    #[test]
    fn should_error_again() {
        let out = NewickParser::parse_string("(a,b));");
        assert!(matches!(out, Err(IoError::Format(_))));
    }

    #[test]
    fn bad_length() {
        let out = NewickParser::parse_string("(a:x,b);");
        assert!(matches!(out, Err(IoError::Format(_))));
    }

    #[test]
    fn bad_annotation() {
        let out = NewickParser::parse_string("(a[&=],b);");
        assert!(matches!(out, Err(IoError::Annotation(_))));
    }

    #[test]
    fn consumed_stops_after_tree() {
        let input = "(a,b);(c,d);";
        let mut parser = NewickParser::new(input, InternalLabels::Names);
        parser.read_tree().unwrap();
        assert_eq!(parser.consumed(), 6);
        let second = parser.read_tree().unwrap();
        assert!(second.find_node_by_name("c").is_some());
    }

    fn caterpillar(tips: usize) -> String {
        let mut newick = "(".repeat(tips - 1);
        newick.push_str("t0");
        for i in 1..tips {
            newick.push_str(&format!(",t{}:1)", i));
        }
        newick.push(';');
        newick
    }

    #[test]
    fn deeply_nested() {
        let tree = NewickParser::parse_string(&caterpillar(50_000)).unwrap();
        assert_eq!(tree.get_external_node_count(), 50_000);
        assert_eq!(tree.get_internal_node_count(), 49_999);
        let t0 = tree.find_node_by_name("t0").unwrap();
        let first_clade = tree.get_parent(t0).unwrap();
        assert_eq!(tree.get_children(first_clade).len(), 2);

        let unclosed = caterpillar(50_000).replacen(')', "", 1);
        assert!(NewickParser::parse_string(&unclosed).is_err());
    }
}
