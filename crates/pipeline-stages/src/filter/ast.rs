//! The filter predicate's tagged-variant tree (spec §9: "Filter predicates
//! should be parsed once at stage construction into a tagged-variant tree
//! ... runtime evaluation walks this tree. Avoid re-parsing the source
//! string per record.").

// Layer 1: Standard library imports
// (none)

/// A parsed literal value: a quoted string, a numeric literal, or a
/// bracket-listed sequence (spec §4.6).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
    List(Vec<Literal>),
}

/// A comparison operator from the filter grammar (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    RegexMatch,
    In,
    NotIn,
    Contains,
    StartsWith,
    EndsWith,
}

/// The parsed predicate tree. `Exists` and `Compare` are the grammar's
/// `TERM`; `And`/`Or` fold in the `(( '&&' | '||' ) TERM)*` repetition,
/// already flattened into a left-associative binary tree by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Exists(String),
    Compare { field: String, op: Op, value: Literal },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}
