//! Tree-sitter walk over JavaScript and TypeScript snippets.

use super::{numeric_value, AstAnalysisResult, AstAssertion, AstCalculation, AstConstant, AstReturn};
use crate::core::Language;
use tree_sitter::{Language as TsLanguage, Node, Parser, Tree};

/// Matchers whose first argument is the expected value.
const EXPECT_MATCHERS: &[&str] = &[
    "toBe",
    "toEqual",
    "toStrictEqual",
    "toBeCloseTo",
    "equal",
    "equals",
    "eql",
    "closeTo",
];

/// `assert.*` calls whose second argument is the expected value.
const ASSERT_MATCHERS: &[&str] = &[
    "equal",
    "strictEqual",
    "deepEqual",
    "deepStrictEqual",
    "closeTo",
    "approximately",
];

const ARITHMETIC: &[&str] = &["+", "-", "*", "/", "%", "**"];

fn grammar(language: Language) -> TsLanguage {
    match language {
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        _ => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    }
}

fn parse(text: &str, language: Language) -> Option<Tree> {
    let mut parser = Parser::new();
    parser.set_language(&grammar(language)).ok()?;
    parser.parse(text, None)
}

/// `None` when neither the snippet nor its class-wrapped form parses into
/// anything useful.
pub fn analyze(text: &str, language: Language, first_line: usize) -> Option<AstAnalysisResult> {
    let tree = parse(text, language)?;
    // A bare method (`name(args) { ... }`) only parses inside a class body.
    // The prefix shares line 1, so row numbers are unchanged.
    let (tree, source) = if tree.root_node().has_error() {
        let wrapped = format!("class __Snippet {{ {text}\n}}");
        match parse(&wrapped, language) {
            Some(alt) if !alt.root_node().has_error() => (alt, wrapped),
            _ => (tree, text.to_string()),
        }
    } else {
        (tree, text.to_string())
    };

    let mut result = AstAnalysisResult::default();
    visit(tree.root_node(), &source, first_line, &mut result);
    result.constants.retain(|c| c.name != "__Snippet");

    (!tree.root_node().has_error() || !result.is_empty()).then_some(result)
}

fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

fn node_line(node: &Node, first_line: usize) -> usize {
    node.start_position().row + first_line
}

fn visit(node: Node, source: &str, first_line: usize, result: &mut AstAnalysisResult) {
    match node.kind() {
        "call_expression" => {
            if let Some(assertion) = assertion_from_call(node, source, first_line) {
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
        "lexical_declaration" | "variable_declaration" => {
            let is_const = node.child(0).is_some_and(|c| c.kind() == "const");
            let mut cursor = node.walk();
            for declarator in node.named_children(&mut cursor) {
                if declarator.kind() == "variable_declarator" {
                    push_constant(declarator, "name", is_const, source, first_line, result);
                }
            }
        }
        "public_field_definition" | "field_definition" => {
            let name_field = if node.kind() == "field_definition" { "property" } else { "name" };
            let is_const = node_text(&node, source).split_whitespace().any(|w| w == "readonly");
            push_constant(node, name_field, is_const, source, first_line, result);
        }
        "binary_expression" => {
            let outermost = node
                .parent()
                .is_none_or(|p| p.kind() != "binary_expression" || !is_arithmetic(&p, source));
            if outermost && is_arithmetic(&node, source) {
                result.calculations.push(AstCalculation {
                    expression: node_text(&node, source).to_string(),
                    operator: operator(&node, source).unwrap_or_default().to_string(),
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

fn push_constant(
    node: Node,
    name_field: &str,
    is_const: bool,
    source: &str,
    first_line: usize,
    result: &mut AstAnalysisResult,
) {
    let (Some(name), Some(value)) = (
        node.child_by_field_name(name_field),
        node.child_by_field_name("value"),
    ) else {
        return;
    };
    let raw = node_text(&value, source).to_string();
    result.constants.push(AstConstant {
        name: node_text(&name, source).to_string(),
        value: numeric_value(&raw),
        raw,
        is_const,
        line: node_line(&node, first_line),
    });
}

fn operator<'a>(node: &Node, source: &'a str) -> Option<&'a str> {
    node.child_by_field_name("operator").map(|op| node_text(&op, source))
}

fn is_arithmetic(node: &Node, source: &str) -> bool {
    operator(node, source).is_some_and(|op| ARITHMETIC.contains(&op))
}

fn identifiers(node: Node, source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "identifier" {
            let name = node_text(&current, source);
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<Node> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    names
}

fn assertion_from_call(call: Node, source: &str, first_line: usize) -> Option<AstAssertion> {
    let function = call.child_by_field_name("function")?;
    if function.kind() != "member_expression" {
        return None;
    }
    let matcher = node_text(&function.child_by_field_name("property")?, source);
    let object = function.child_by_field_name("object")?;
    let arguments = call.child_by_field_name("arguments")?;

    let expected_index = if EXPECT_MATCHERS.contains(&matcher) {
        match expect_chain(object, source) {
            Some(false) => 0,
            _ => return None,
        }
    } else if node_text(&object, source) == "assert" && ASSERT_MATCHERS.contains(&matcher) {
        1
    } else {
        return None;
    };

    let mut cursor = arguments.walk();
    let expected = arguments
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .nth(expected_index)
        .map(|n| node_text(&n, source).to_string());

    Some(AstAssertion {
        matcher: matcher.to_string(),
        expected_value: expected.as_deref().and_then(crate::detection::expression::parse_numeric),
        expected,
        line: node_line(&call, first_line),
    })
}

/// Walk a property chain down to its `expect(...)` root. `Some(negated)`
/// when one is found.
fn expect_chain(mut node: Node, source: &str) -> Option<bool> {
    let mut negated = false;
    loop {
        match node.kind() {
            "member_expression" => {
                if node
                    .child_by_field_name("property")
                    .is_some_and(|p| node_text(&p, source) == "not")
                {
                    negated = true;
                }
                node = node.child_by_field_name("object")?;
            }
            "call_expression" => {
                let function = node.child_by_field_name("function")?;
                if function.kind() == "identifier" && node_text(&function, source) == "expect" {
                    return Some(negated);
                }
                node = function;
            }
            "await_expression" | "parenthesized_expression" => {
                node = node.named_child(0)?;
            }
            _ => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expect_chains_and_negation() {
        let body = indoc! {r#"
            it('applies the premium discount', () => {
              const calc = new PriceCalculator();
              expect(calc.calculateDiscount(100, 'premium')).toBe(90);
              expect(calc.total()).not.toBe(0);
              expect(calc.ratio()).to.deep.equal(0.5);
              assert.strictEqual(calc.count(), 3);
            });
        "#};
        let result = analyze(body, Language::TypeScript, 10).unwrap();

        let found: Vec<(&str, Option<f64>, usize)> = result
            .assertions
            .iter()
            .map(|a| (a.matcher.as_str(), a.expected_value, a.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("toBe", Some(90.0), 12),
                ("equal", Some(0.5), 14),
                ("strictEqual", Some(3.0), 15),
            ]
        );
    }

    #[test]
    fn test_bare_method_is_wrapped_in_a_class() {
        let method = indoc! {r#"
            calculateDiscount(price: number, tier: string): number {
              const rate = 0.15;
              if (tier === 'premium') {
                return price * (1 - rate);
              }
              return 100;
            }
        "#};
        let result = analyze(method, Language::TypeScript, 4).unwrap();

        assert_eq!(result.constants.len(), 1);
        assert_eq!(result.constants[0].name, "rate");
        assert_eq!(result.constants[0].value, Some(0.15));
        assert!(result.constants[0].is_const);
        assert_eq!(result.constants[0].line, 5);

        assert_eq!(result.returns.len(), 2);
        assert_eq!(result.returns[0].value, None);
        assert_eq!(result.returns[1].value, Some(100.0));
        assert_eq!(result.returns[1].line, 9);

        assert_eq!(result.calculations.len(), 2);
        assert_eq!(result.calculations[0].operator, "*");
        assert_eq!(result.calculations[0].variables, vec!["price", "rate"]);
    }

    #[test]
    fn test_class_fields_are_constants() {
        let source = indoc! {r#"
            class Pricing {
              private readonly premiumRate = 0.1;
              count = 2;
            }
        "#};
        let result = analyze(source, Language::TypeScript, 1).unwrap();
        let fields: Vec<(&str, bool)> = result
            .constants
            .iter()
            .map(|c| (c.name.as_str(), c.is_const))
            .collect();
        assert_eq!(fields, vec![("premiumRate", true), ("count", false)]);
    }

    #[test]
    fn test_javascript_grammar() {
        let result = analyze("let total = 2 + 3;\nvar x = total;", Language::JavaScript, 1).unwrap();
        assert_eq!(result.constants[0].value, Some(5.0));
        assert!(!result.constants[0].is_const);
        assert_eq!(result.calculations[0].expression, "2 + 3");
    }
}
