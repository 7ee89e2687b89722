//! Tree-sitter walk over Python snippets.

use super::{numeric_value, AstAnalysisResult, AstAssertion, AstCalculation, AstConstant, AstReturn};
use crate::detection::expression::parse_numeric;
use tree_sitter::{Node, Parser};

/// unittest methods as `(name, index of the expected argument)`.
const UNITTEST_EQUALITY: &[(&str, usize)] = &[
    ("assertEqual", 1),
    ("assertEquals", 1),
    ("assertAlmostEqual", 1),
];

const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "//", "%", "**"];

pub fn analyze(text: &str, first_line: usize) -> Option<AstAnalysisResult> {
    // Method bodies arrive with their class indentation; removing the common
    // prefix keeps row numbers intact.
    let source = dedent(text);

    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_python::LANGUAGE.into()).ok()?;
    let tree = parser.parse(&source, None)?;

    let mut result = AstAnalysisResult::default();
    visit(tree.root_node(), &source, first_line, &mut result);
    (!tree.root_node().has_error() || !result.is_empty()).then_some(result)
}

fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn node_line(node: &Node, first_line: usize) -> usize {
    node.start_position().row + first_line
}

fn visit(node: Node, source: &str, first_line: usize, result: &mut AstAnalysisResult) {
    match node.kind() {
        "assert_statement" => {
            if let Some(assertion) = bare_assert(node, source, first_line) {
                result.assertions.push(assertion);
            }
        }
        "call" => {
            if let Some(assertion) = unittest_assert(node, source, first_line) {
                result.assertions.push(assertion);
            }
        }
        "return_statement" => {
            if let Some(expr) = node.named_child(0) {
                let raw = node_text(&expr, source).to_string();
                result.returns.push(AstReturn {
                    value: numeric_value(&raw),
                    raw,
                    line: node_line(&node, first_line),
                });
            }
        }
        "assignment" => {
            if let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                let name = node_text(&left, source);
                if left.kind() == "identifier" || left.kind() == "attribute" {
                    let raw = node_text(&right, source).to_string();
                    let bare = name.rsplit('.').next().unwrap_or(name);
                    result.constants.push(AstConstant {
                        name: name.to_string(),
                        value: numeric_value(&raw),
                        raw,
                        is_const: is_screaming_case(bare),
                        line: node_line(&node, first_line),
                    });
                }
            }
        }
        "binary_operator" => {
            let outermost = node.parent().is_none_or(|p| p.kind() != "binary_operator");
            let operator = node
                .child_by_field_name("operator")
                .map(|op| node_text(&op, source))
                .unwrap_or_default();
            if outermost && ARITHMETIC.contains(&operator) {
                result.calculations.push(AstCalculation {
                    expression: node_text(&node, source).to_string(),
                    operator: operator.to_string(),
                    variables: identifiers(node, source),
                    line: node_line(&node, first_line),
                });
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit(child, source, first_line, result);
    }
}

/// `assert actual == expected`
fn bare_assert(node: Node, source: &str, first_line: usize) -> Option<AstAssertion> {
    let comparison = node.named_child(0)?;
    if comparison.kind() != "comparison_operator" {
        return None;
    }
    let mut cursor = comparison.walk();
    let operands: Vec<Node> = comparison.named_children(&mut cursor).collect();
    let mut cursor = comparison.walk();
    let operators: Vec<&str> = comparison
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| node_text(&c, source))
        .collect();
    if operands.len() != 2 || operators != ["=="] {
        return None;
    }
    let expected = node_text(&operands[1], source).to_string();
    Some(AstAssertion {
        matcher: "==".to_string(),
        expected_value: parse_numeric(&expected),
        expected: Some(expected),
        line: node_line(&node, first_line),
    })
}

/// `self.assertEqual(actual, expected)`
fn unittest_assert(node: Node, source: &str, first_line: usize) -> Option<AstAssertion> {
    let function = node.child_by_field_name("function")?;
    if function.kind() != "attribute" {
        return None;
    }
    let method = node_text(&function.child_by_field_name("attribute")?, source);
    let (_, index) = UNITTEST_EQUALITY.iter().find(|(name, _)| *name == method)?;

    let arguments = node.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    let expected = arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "keyword_argument" && n.kind() != "comment")
        .nth(*index)
        .map(|n| node_text(&n, source).to_string());

    Some(AstAssertion {
        matcher: method.to_string(),
        expected_value: expected.as_deref().and_then(parse_numeric),
        expected,
        line: node_line(&node, first_line),
    })
}

fn identifiers(node: Node, source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        match current.kind() {
            "identifier" => {
                let name = node_text(&current, source);
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            // `self.rate` is one variable, not two.
            "attribute" => {
                let name = node_text(&current, source);
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
            _ => {
                let mut cursor = current.walk();
                let children: Vec<Node> = current.children(&mut cursor).collect();
                stack.extend(children.into_iter().rev());
            }
        }
    }
    names
}

fn is_screaming_case(name: &str) -> bool {
    name.len() > 1
        && name.chars().any(|c| c.is_ascii_uppercase())
        && name.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
