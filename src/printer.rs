use crate::{
    expr::Expr,
    stmt::Stmt,
};

/// Renders an expression in a fully parenthesised prefix form.
pub fn print(e: &Expr) -> String {
    match e {
        Expr::Assign(a) => match &a.name {
            Some(name) => parenthesize(&format!("= {}", name.lexeme), &[a.value.as_ref()]),
            None => print(&a.value),
        },
        Expr::Binary(b) => parenthesize(
            b.op.lexeme.as_str(),
            &[b.left.as_ref(), b.right.as_ref()]
        ),
        Expr::Call(c) => {
            let mut exprs = vec![c.callee.as_ref()];
            exprs.extend(c.arguments.iter());
            parenthesize("call", &exprs)
        },
        Expr::Grouping(g) => parenthesize("group", &[g.expression.as_ref()]),
        Expr::Literal(l) => l.value.to_string(),
        Expr::Logical(l) => parenthesize(
            l.op.lexeme.as_str(),
            &[l.left.as_ref(), l.right.as_ref()]
        ),
        Expr::Unary(u) => match &u.op {
            Some(op) => parenthesize(op.lexeme.as_str(), &[u.right.as_ref()]),
            None => print(&u.right),
        },
        Expr::Variable(v) => v.name.lexeme.clone(),
    }
}

pub fn print_stmt(s: &Stmt) -> String {
    match s {
        Stmt::Block(b) => group("block", b.statements.iter().map(print_stmt)),
        Stmt::Expression(e) => parenthesize(";", &[&e.expression]),
        Stmt::Function(f) => {
            let params = f.params.iter()
                .map(|p| p.lexeme.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let header = format!("fun {} ({})", f.name.lexeme, params);
            group(&header, f.body.iter().map(print_stmt))
        },
        Stmt::If(i) => {
            let mut parts = vec![print(&i.condition), print_stmt(&i.then_branch)];
            if let Some(else_branch) = &i.else_branch {
                parts.push(print_stmt(else_branch));
            }
            group("if", parts.into_iter())
        },
        Stmt::Print(p) => parenthesize("print", &[&p.expression]),
        Stmt::Return(r) => match &r.value {
            Some(value) => parenthesize("return", &[value]),
            None => "(return)".to_string(),
        },
        Stmt::Var(v) => match &v.initializer {
            Some(initializer) => parenthesize(&format!("var {}", v.name.lexeme), &[initializer]),
            None => format!("(var {})", v.name.lexeme),
        },
        Stmt::While(w) => group(
            "while",
            vec![print(&w.condition), print_stmt(&w.body)].into_iter()
        ),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    group(name, exprs.iter().map(|e| print(e)))
}

fn group(name: &str, parts: impl Iterator<Item = String>) -> String {
    let mut s = String::new();
    s.push('(');
    s.push_str(name);

    for part in parts {
        s.push(' ');
        s.push_str(part.as_str());
    }

    s.push(')');
    s
}
