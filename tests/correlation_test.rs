use indoc::indoc;
use pretty_assertions::assert_eq;
use std::path::Path;
use testverdict::core::CorrelationType;
use testverdict::testkit::pair_from_sources;
use testverdict::{correlate, parse_source};

const CALCULATOR: &str = indoc! {"
    public class Calculator {
        public int add(int a, int b) {
            return a + b;
        }

        public int subtract(int a, int b) {
            return a - b;
        }
    }
"};

const CALCULATOR_TEST: &str = indoc! {"
    import org.junit.jupiter.api.Test;
    import static org.junit.jupiter.api.Assertions.assertEquals;

    class CalculatorTest {
        @Test
        void shouldReturnCorrectSum() {
            Calculator calc = new Calculator();
            assertEquals(5, calc.add(2, 3));
        }

        @Test
        void testSubtract() {
            assertEquals(1, new Calculator().subtract(3, 2));
        }
    }
"};

#[test]
fn call_site_is_the_fallback_correlation() {
    let pair = pair_from_sources(
        "CalculatorTest.java",
        CALCULATOR_TEST,
        "Calculator.java",
        CALCULATOR,
        "shouldReturnCorrectSum",
    )
    .expect("test should correlate");

    assert_eq!(pair.source.name, "add");
    assert_eq!(pair.correlation_type, CorrelationType::CallGraph);
    assert_eq!(pair.confidence, 0.8);
}

#[test]
fn naming_convention_wins_over_call_site() {
    let pair = pair_from_sources(
        "CalculatorTest.java",
        CALCULATOR_TEST,
        "Calculator.java",
        CALCULATOR,
        "testSubtract",
    )
    .expect("test should correlate");

    assert_eq!(pair.source.name, "subtract");
    assert_eq!(pair.correlation_type, CorrelationType::NamingConvention);
    assert_eq!(pair.confidence, 0.9);
}

#[test]
fn parsing_is_idempotent() {
    let path = Path::new("CalculatorTest.java");
    let first = parse_source(CALCULATOR_TEST, path);
    let second = parse_source(CALCULATOR_TEST, path);
    assert_eq!(first, second);
    assert_eq!(first.tests.len(), 2);
}

#[test]
fn uncorrelated_tests_are_dropped() {
    let tests = parse_source(
        indoc! {"
            def test_unrelated():
                assert compute_tax(10) == 1
        "},
        Path::new("test_tax.py"),
    )
    .tests;
    let methods = parse_source(CALCULATOR, Path::new("Calculator.java")).methods;
    assert!(correlate(&tests, &methods).is_empty());
}
