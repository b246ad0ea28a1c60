use std::fmt;

pub mod mutable_tree;

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Discrete(String),
    Continuous(f64),
    Boolean(bool),
    Set(Vec<AnnotationValue>),
}

// characters that end an unquoted annotation value
const ANNOTATION_DELIMITERS: &str = "=,[]{}\"'";

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.parse::<f64>().is_ok()
        || s
            .chars()
            .any(|c| c.is_whitespace() || ANNOTATION_DELIMITERS.contains(c))
}

/// Wraps annotation text in double quotes, or in single quotes when the text
/// itself holds a double quote. Single quotes inside single quotes are doubled.
pub(crate) fn quote_annotation_text(s: &str) -> String {
    if s.contains('"') {
        format!("'{}'", s.replace('\'', "''"))
    } else {
        format!("\"{}\"", s)
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnnotationValue::Discrete(string) => {
                if needs_quotes(string) {
                    write!(f, "{}", quote_annotation_text(string))
                } else {
                    write!(f, "{}", string)
                }
            }
            AnnotationValue::Continuous(value) => write!(f, "{}", value),
            AnnotationValue::Boolean(value) => write!(f, "{}", value),
            AnnotationValue::Set(s) => {
                let s = s
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<String>>()
                    .join(",");
                write!(f, "{{{}}}", s)
            }
        }
    }
}
