use crate::tree::AnnotationValue;
use pest_consume::{match_nodes, Error, Parser};
use std::collections::HashMap;

type PestResult<T> = std::result::Result<T, Error<Rule>>;
type Node<'i> = pest_consume::Node<'i, Rule, ()>;

#[derive(Parser)]
#[grammar = "./io/parser/tree_annotation.pest"]
pub struct AnnotationParser;

#[pest_consume::parser]
impl AnnotationParser {
    fn EOI(_input: Node) -> PestResult<()> {
        Ok(())
    }
    fn node_annotation(input: Node) -> PestResult<HashMap<String, AnnotationValue>> {
        Ok(match_nodes!(input.into_children();
            [annotation_set(annotations), EOI(_)] => annotations.into_iter().collect()
        ))
    }
    fn annotation_set(input: Node) -> PestResult<Vec<(String, AnnotationValue)>> {
        Ok(match_nodes!(input.into_children();
            [annotation(a)..] => a.collect()
        ))
    }
    fn annotation(input: Node) -> PestResult<(String, AnnotationValue)> {
        Ok(match_nodes!(input.into_children();
            [key(k), value(v)] => (k, v),
            [key(k)] => (k, AnnotationValue::Boolean(true))
        ))
    }

    fn key(input: Node) -> PestResult<String> {
        Ok(match_nodes!(input.into_children();
          [unquoted_key(n)] => n,
          [quoted_name(n)] => n,
        ))
    }
    fn unquoted_key(input: Node) -> PestResult<String> {
        Ok(input.as_str().to_string())
    }

    fn value(input: Node) -> PestResult<AnnotationValue> {
        Ok(match_nodes!(input.into_children();
            [continuous(n)] => n,
            [discrete(n)] => n,
            [set(n)] => n
        ))
    }
    fn set(input: Node) -> PestResult<AnnotationValue> {
        Ok(match_nodes!(input.into_children();
            [value(v)..] => AnnotationValue::Set(v.collect()),
        ))
    }
    fn continuous(input: Node) -> PestResult<AnnotationValue> {
        input
            .as_str()
            .parse::<f64>()
            .map(AnnotationValue::Continuous)
            // `input.error` links the error to the location in the input file where it occurred.
            .map_err(|e| input.error(e))
    }
    fn discrete(input: Node) -> PestResult<AnnotationValue> {
        Ok(match_nodes!(input.into_children();
          [unquoted_name(n)] => AnnotationValue::Discrete(n),
          [quoted_name(n)] => AnnotationValue::Discrete(n),
        ))
    }

    fn unquoted_name(input: Node) -> PestResult<String> {
        Ok(input.as_str().to_string())
    }
    fn quoted_name(input: Node) -> PestResult<String> {
        Ok(match_nodes!(input.into_children();
          [single_inner(n)] => n,
          [double_inner(n)] => n,
        ))
    }
    fn single_inner(input: Node) -> PestResult<String> {
        Ok(input.as_str().replace("''", "'"))
    }
    fn double_inner(input: Node) -> PestResult<String> {
        Ok(input.as_str().to_string())
    }
}

impl AnnotationParser {
    /// Parses a whole `[&...]` comment into its key value pairs.
    pub fn parse_annotation(s: &str) -> PestResult<HashMap<String, AnnotationValue>> {
        let inputs = AnnotationParser::parse(Rule::node_annotation, s)?;
        // There should be a single root node in the parsed tree
        let input = inputs.single()?;
        AnnotationParser::node_annotation(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discrete() {
        let mut exp = HashMap::new();
        exp.insert(
            "location".to_owned(),
            AnnotationValue::Discrete("UK".to_owned()),
        );

        assert_eq!(
            AnnotationParser::parse_annotation("[&location=UK]").unwrap(),
            exp
        );
    }

    #[test]
    fn discrete_quotes() {
        let mut exp = HashMap::new();
        exp.insert(
            "location".to_owned(),
            AnnotationValue::Discrete("New York".to_owned()),
        );
        assert_eq!(
            AnnotationParser::parse_annotation("[&location=\"New York\"]").unwrap(),
            exp
        );
    }

    #[test]
    fn empty_quotes() {
        let mut exp = HashMap::new();
        exp.insert(
            "location".to_owned(),
            AnnotationValue::Discrete("".to_owned()),
        );
        assert_eq!(
            AnnotationParser::parse_annotation("[&location=\"\"]").unwrap(),
            exp
        );
    }

    #[test]
    fn single_quotes_around_double_quotes() {
        let parsed =
            AnnotationParser::parse_annotation("[&'say \"hi\"'='the \"B\" lineage',note='it''s']")
                .unwrap();
        assert_eq!(
            parsed.get("say \"hi\""),
            Some(&AnnotationValue::Discrete("the \"B\" lineage".to_owned()))
        );
        assert_eq!(
            parsed.get("note"),
            Some(&AnnotationValue::Discrete("it's".to_owned()))
        );
    }

    #[test]
    fn quoted_key() {
        let mut exp = HashMap::new();
        exp.insert(
            "location".to_owned(),
            AnnotationValue::Discrete("UK".to_owned()),
        );
        assert_eq!(
            AnnotationParser::parse_annotation("[&'location'=UK]").unwrap(),
            exp
        );
    }

    #[test]
    fn just_rooted() {
        let mut exp = HashMap::new();
        exp.insert("R".to_owned(), AnnotationValue::Boolean(true));
        assert_eq!(AnnotationParser::parse_annotation("[&R]").unwrap(), exp);
    }

    #[test]
    fn multiple() {
        let mut exp = HashMap::new();
        exp.insert(
            "location".to_owned(),
            AnnotationValue::Discrete("UK".to_owned()),
        );
        exp.insert("lat".to_owned(), AnnotationValue::Continuous(0.0));
        exp.insert("height".to_owned(), AnnotationValue::Continuous(-1.5e-3));
        assert_eq!(
            AnnotationParser::parse_annotation("[&location=UK, lat=0.0,height=-1.5E-3]").unwrap(),
            exp
        );
    }

    #[test]
    fn number_prefix_is_discrete() {
        let parsed = AnnotationParser::parse_annotation("[&id=1abc]").unwrap();
        assert_eq!(
            parsed.get("id"),
            Some(&AnnotationValue::Discrete("1abc".to_owned()))
        );
    }

    #[test]
    fn set() {
        let parsed = AnnotationParser::parse_annotation("[&range={0.5,1},hosts={camel,bat}]").unwrap();
        assert_eq!(
            parsed.get("range"),
            Some(&AnnotationValue::Set(vec![
                AnnotationValue::Continuous(0.5),
                AnnotationValue::Continuous(1.0)
            ]))
        );
        assert_eq!(
            parsed.get("hosts"),
            Some(&AnnotationValue::Set(vec![
                AnnotationValue::Discrete("camel".to_owned()),
                AnnotationValue::Discrete("bat".to_owned())
            ]))
        );
    }

    #[test]
    fn not_an_annotation() {
        assert!(AnnotationParser::parse_annotation("[just a comment]").is_err());
        assert!(AnnotationParser::parse_annotation("[&a=1").is_err());
    }
}
