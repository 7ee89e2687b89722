//! Candidate mutations for a method body.

use super::{Mutation, MutationType};
use crate::parsers::common::is_comment_line;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:^|[^\w.])(\d+(?:\.\d+)?)\b").unwrap());

static BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(true|false|True|False)\b").unwrap());

static ASSERT_BOOLEAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bassert(?:True|False|_true|_false)\b|\bIs(?:True|False)\b").unwrap());

static RETURN_ARITHMETIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\s*)return\s+([\w.()\s]+[-+*/%][\w.()\s+\-*/%]*?)\s*(;?)\s*$").unwrap()
});

static IF_CONDITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\s*\((.+)\)").unwrap());

/// Two-character tokens that contain operator characters but are not
/// operators worth swapping.
const NOT_OPERATORS: &[&str] = &["->", "=>", "++", "--", "+=", "-=", "*=", "/=", "::", "<<", ">>", "//", "/*", "*/", "**"];

fn swap_partner(op: &str) -> Option<(&'static str, MutationType)> {
    let swapped = match op {
        "+" => ("-", MutationType::OperatorSwap),
        "-" => ("+", MutationType::OperatorSwap),
        "*" => ("/", MutationType::OperatorSwap),
        "/" => ("*", MutationType::OperatorSwap),
        ">" => (">=", MutationType::BoundaryShift),
        "<" => ("<=", MutationType::BoundaryShift),
        ">=" => (">", MutationType::BoundaryShift),
        "<=" => ("<", MutationType::BoundaryShift),
        "==" => ("!=", MutationType::OperatorSwap),
        "!=" => ("==", MutationType::OperatorSwap),
        "&&" => ("||", MutationType::OperatorSwap),
        "||" => ("&&", MutationType::OperatorSwap),
        _ => return None,
    };
    Some(swapped)
}

/// Every mutation for `body`, whose first line is file line `first_line`.
pub fn generate_mutations(body: &str, first_line: usize) -> Vec<Mutation> {
    let mut mutations = Vec::new();
    for (offset, line) in body.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment_line(trimmed) {
            continue;
        }
        let line_no = first_line + offset;
        let cleaned = mask_literals(line);

        numeric_mutations(line, &cleaned, line_no, &mut mutations);
        operator_mutations(line, &cleaned, line_no, &mut mutations);
        boolean_mutations(line, &cleaned, line_no, &mut mutations);
        return_mutation(line, &cleaned, line_no, &mut mutations);
        condition_mutation(line, &cleaned, line_no, &mut mutations);
    }
    mutations
}

/// Blank out string contents and a trailing `//` comment, keeping byte
/// offsets so matches on the masked line splice into the original.
fn mask_literals(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = '\0';
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                    blank(&mut out, c);
                } else if c == '\\' {
                    escaped = true;
                    blank(&mut out, c);
                } else if c == q {
                    quote = None;
                    out.push(c);
                } else {
                    blank(&mut out, c);
                }
            }
            None => {
                let rest = &line[i + c.len_utf8()..];
                let opens_char = c == '\'' && prev != '&' && prev != '<' && rest.contains('\'');
                if c == '"' || c == '`' || opens_char {
                    quote = Some(c);
                    out.push(c);
                } else if c == '/' && rest.starts_with('/') {
                    line[i..].chars().for_each(|ch| blank(&mut out, ch));
                    break;
                } else {
                    out.push(c);
                }
            }
        }
        prev = c;
    }
    out
}

fn blank(out: &mut String, c: char) {
    out.extend(std::iter::repeat_n(' ', c.len_utf8()));
}

fn numeric_mutations(line: &str, cleaned: &str, line_no: usize, out: &mut Vec<Mutation>) {
    for caps in NUMBER.captures_iter(cleaned) {
        let Some(m) = caps.get(1) else { continue };
        let literal = m.as_str();
        let Ok(value) = literal.parse::<f64>() else { continue };
        if value == 0.0 || value == 1.0 {
            continue;
        }
        let is_integer = !literal.contains('.');
        for (factor, label) in [(1.1, "+10%"), (0.9, "-10%")] {
            let mutated_value = nudge(value, factor, is_integer);
            let mutated_literal = render(mutated_value, is_integer);
            out.push(Mutation {
                mutation_type: MutationType::NumericChange,
                line: line_no,
                original: line.trim().to_string(),
                mutated: splice(line, m.start(), m.end(), &mutated_literal).trim().to_string(),
                description: format!("Change {literal} to {mutated_literal} ({label})"),
                original_value: Some(value),
                mutated_value: Some(mutated_value),
            });
        }
    }
}

/// Scale by `factor`; integers move by at least one.
fn nudge(value: f64, factor: f64, is_integer: bool) -> f64 {
    let scaled = value * factor;
    if !is_integer {
        return scaled;
    }
    let rounded = scaled.round();
    if rounded != value {
        rounded
    } else if factor > 1.0 {
        value + 1.0
    } else {
        value - 1.0
    }
}

fn render(value: f64, is_integer: bool) -> String {
    if is_integer {
        format!("{}", value as i64)
    } else {
        let text = format!("{:.4}", value);
        let text = text.trim_end_matches('0');
        if text.ends_with('.') {
            format!("{text}0")
        } else {
            text.to_string()
        }
    }
}

fn splice(line: &str, start: usize, end: usize, replacement: &str) -> String {
    format!("{}{}{}", &line[..start], replacement, &line[end..])
}

/// Operators found by scanning the masked line. Single-character
/// operators only count when surrounded by whitespace, which keeps generics,
/// unary minus and pointer syntax out.
fn operators(cleaned: &str) -> Vec<(usize, &str)> {
    let bytes = cleaned.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let two = cleaned.get(i..i + 2);
        if let Some(pair) = two {
            if NOT_OPERATORS.contains(&pair) {
                i += 2;
                continue;
            }
            if swap_partner(pair).is_some() {
                let spaced_before = i == 0 || bytes[i - 1].is_ascii_whitespace();
                let spaced_after = bytes.get(i + 2).is_none_or(|b| b.is_ascii_whitespace());
                let is_logical = pair == "&&" || pair == "||";
                if is_logical || (spaced_before && spaced_after) || pair == "==" || pair == "!=" {
                    found.push((i, pair));
                }
                i += 2;
                continue;
            }
        }
        if let Some(single) = cleaned.get(i..i + 1) {
            if swap_partner(single).is_some() {
                let spaced_before = i > 0 && bytes[i - 1].is_ascii_whitespace();
                let spaced_after = bytes.get(i + 1).is_some_and(|b| b.is_ascii_whitespace());
                if spaced_before && spaced_after {
                    found.push((i, single));
                }
            }
        }
        i += 1;
    }
    found
}

fn operator_mutations(line: &str, cleaned: &str, line_no: usize, out: &mut Vec<Mutation>) {
    for (at, op) in operators(cleaned) {
        let Some((partner, mutation_type)) = swap_partner(op) else {
            continue;
        };
        out.push(Mutation {
            mutation_type,
            line: line_no,
            original: line.trim().to_string(),
            mutated: splice(line, at, at + op.len(), partner).trim().to_string(),
            description: format!("Replace {op} with {partner}"),
            original_value: None,
            mutated_value: None,
        });
    }
}

fn boolean_mutations(line: &str, cleaned: &str, line_no: usize, out: &mut Vec<Mutation>) {
    if ASSERT_BOOLEAN.is_match(cleaned) {
        return;
    }
    for m in BOOLEAN.find_iter(cleaned) {
        let flipped = match m.as_str() {
            "true" => "false",
            "false" => "true",
            "True" => "False",
            _ => "True",
        };
        out.push(Mutation {
            mutation_type: MutationType::BooleanFlip,
            line: line_no,
            original: line.trim().to_string(),
            mutated: splice(line, m.start(), m.end(), flipped).trim().to_string(),
            description: format!("Flip {} to {flipped}", m.as_str()),
            original_value: None,
            mutated_value: None,
        });
    }
}

fn return_mutation(line: &str, cleaned: &str, line_no: usize, out: &mut Vec<Mutation>) {
    let Some(caps) = RETURN_ARITHMETIC.captures(cleaned) else {
        return;
    };
    let Some(span) = caps.get(2) else { return };
    let expr = line[span.start()..span.end()].trim();
    out.push(Mutation {
        mutation_type: MutationType::ReturnValue,
        line: line_no,
        original: line.trim().to_string(),
        mutated: format!("return {expr} + 1{}", &caps[3]),
        description: format!("Return {expr} + 1 instead of {expr}"),
        original_value: None,
        mutated_value: None,
    });
}

fn condition_mutation(line: &str, cleaned: &str, line_no: usize, out: &mut Vec<Mutation>) {
    let Some(span) = IF_CONDITION.captures(cleaned).and_then(|caps| caps.get(1)) else {
        return;
    };
    let end = span.start() + balanced_prefix(span.as_str()).len();
    let condition = &line[span.start()..end];
    if condition.trim_start().starts_with('!') || condition.trim().is_empty() {
        return;
    }
    out.push(Mutation {
        mutation_type: MutationType::ConditionNegation,
        line: line_no,
        original: line.trim().to_string(),
        mutated: splice(line, span.start(), end, &format!("!({condition})"))
            .trim()
            .to_string(),
        description: format!("Negate condition {}", condition.trim()),
        original_value: None,
        mutated_value: None,
    });
}

/// The condition text up to the parenthesis that closes `if (`.
fn balanced_prefix(text: &str) -> &str {
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return &text[..i],
            ')' => depth -= 1,
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn of_type(mutations: &[Mutation], kind: MutationType) -> Vec<String> {
        mutations
            .iter()
            .filter(|m| m.mutation_type == kind)
            .map(|m| m.mutated.clone())
            .collect()
    }

    #[test]
    fn test_numeric_mutations_skip_zero_and_one() {
        let mutations = generate_mutations("double rate = 0.85;\nint step = 1;\nint n = 0;", 5);
        assert_eq!(
            of_type(&mutations, MutationType::NumericChange),
            vec!["double rate = 0.935;", "double rate = 0.765;"]
        );
        assert!(mutations.iter().all(|m| m.line == 5));
    }

    #[test]
    fn test_small_integers_move_by_at_least_one() {
        let mutations = generate_mutations("return n * 3;", 1);
        assert_eq!(
            of_type(&mutations, MutationType::NumericChange),
            vec!["return n * 4;", "return n * 2;"]
        );
    }

    #[test]
    fn test_operator_swaps_and_boundaries() {
        let mutations = generate_mutations("if (total >= 100 && vip) {", 1);
        assert_eq!(
            of_type(&mutations, MutationType::BoundaryShift),
            vec!["if (total > 100 && vip) {"]
        );
        assert_eq!(
            of_type(&mutations, MutationType::OperatorSwap),
            vec!["if (total >= 100 || vip) {"]
        );
        assert_eq!(
            of_type(&mutations, MutationType::ConditionNegation),
            vec!["if (!(total >= 100 && vip)) {"]
        );
    }

    #[test]
    fn test_generics_arrows_and_unary_are_not_operators() {
        let mutations = generate_mutations("List<String> xs = items.map(x -> -x);", 1);
        assert!(of_type(&mutations, MutationType::OperatorSwap).is_empty());
        assert!(of_type(&mutations, MutationType::BoundaryShift).is_empty());
    }

    #[test]
    fn test_return_arithmetic() {
        let mutations = generate_mutations("    return price * 0.85;", 1);
        assert_eq!(
            of_type(&mutations, MutationType::ReturnValue),
            vec!["return price * 0.85 + 1;"]
        );
    }

    #[test]
    fn test_boolean_flip_outside_boolean_assertions() {
        let mutations = generate_mutations("this.active = true;\nassertTrue(true);", 1);
        assert_eq!(
            of_type(&mutations, MutationType::BooleanFlip),
            vec!["this.active = false;"]
        );
    }

    #[test]
    fn test_negated_condition_is_left_alone() {
        let mutations = generate_mutations("if (!ready) {", 1);
        assert!(of_type(&mutations, MutationType::ConditionNegation).is_empty());
    }

    #[test]
    fn test_string_contents_are_not_mutated() {
        let mutations = generate_mutations("log(\"retry 5 times + more\");", 1);
        assert!(mutations.is_empty());
    }
}
