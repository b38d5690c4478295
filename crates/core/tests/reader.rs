//! Reader tests over multi-line scenario scripts.

use pretty_assertions::assert_eq;
use scenario_core::{parse_command, parse_script, Expression};

fn a(s: &str) -> Expression {
    Expression::atom(s)
}

#[test]
fn script_reads_one_command_per_line() {
    let src = "\
-- token checks
Equal (Erc20 TotalSupply ZRX) (Exactly 1e18)

(Equal LastGas Anything) -- trailing comment
Network
";
    let commands = parse_script(src).unwrap();
    assert_eq!(commands.len(), 3);
    assert_eq!(
        commands[1],
        Expression::list(vec![a("Equal"), a("LastGas"), a("Anything")])
    );
    assert_eq!(commands[2], a("Network"));
}

#[test]
fn script_errors_carry_line_numbers() {
    let err = parse_script("Network\nEqual (Exactly 0\n").unwrap_err();
    assert_eq!(err.line, 2);
}

#[test]
fn display_round_trips_through_the_reader() {
    let src = r#"(Map (name "Geoff Hayes") (amount (Exactly 5)))"#;
    let expr = parse_command(src).unwrap();
    assert_eq!(expr.to_string(), src);
    assert_eq!(parse_command(&expr.to_string()).unwrap(), expr);
}
