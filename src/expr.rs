use crate::token::Token;
use crate::value;
use astgen::generate_ast;

// An absent `Assign::name` or `Unary::op` means the node simply yields its
// operand.
generate_ast!(
    Expr,
    [
        Assign   => { name: Option<Token>, value: Box<Expr> };
        Binary   => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Call     => { callee: Box<Expr>, paren: Token, arguments: Vec<Expr> };
        Grouping => { expression: Box<Expr> };
        Literal  => { value: value::Literal };
        Logical  => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Unary    => { op: Option<Token>, right: Box<Expr> };
        Variable => { name: Token };
    ]
);
