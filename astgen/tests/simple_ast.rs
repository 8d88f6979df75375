#![allow(dead_code)]

use astgen::*;

#[test]
fn can_generate_ast() {
    generate_ast!(
        TestAst,
        [ S => { s: String } ]
    );
    let _node = TestAst::S(S { s: "".into() });
}

#[test]
fn can_change_ast_name() {
    generate_ast!(
        OtherAst,
        [ S => { s: String } ]
    );
    let _node = OtherAst::S(S { s: "".into() });
}

#[test]
fn uses_field_names_for_struct_fields() {
    generate_ast!(
        Example,
        [ S => { s: String, i: isize } ]
    );
    let _node = Example::S(S { s: "".into(), i: 0 });
}

#[test]
fn can_clone_nodes() {
    generate_ast!(A, [N => {a: usize}]);
    let n = N { a: 0 };
    let clone = n.clone();
    assert_eq!(n, clone);
}

#[test]
fn uses_node_names_for_enum_variants() {
    generate_ast!(
        Example,
        [
            A => { a: isize };
            B => { b: String };
        ]
    );
    let _a_node = Example::A(A { a: 0 });
    let _b_node = Example::B(B { b: "".into() });
}

#[test]
fn generates_new_fns() {
    generate_ast!(
        Test,
        [
            A => { a: isize };
            B => { b: usize };
        ]
    );
    assert_eq!(Test::A(A { a: 1 }), Test::new_a(1));
    assert_eq!(Test::B(B { b: 8 }), Test::new_b(8));
}

#[test]
fn new_fns_use_snake_case_node_names() {
    generate_ast!(
        Stmt,
        [
            ExpressionStatement => { value: f64 };
        ]
    );
    let node = Stmt::new_expression_statement(1.5);
    assert_eq!(Stmt::ExpressionStatement(ExpressionStatement { value: 1.5 }), node);
}

#[test]
fn supports_recursive_and_optional_fields() {
    generate_ast!(
        Tree,
        [
            Leaf => { value: isize };
            Node => { left: Box<Tree>, right: Option<Box<Tree>> };
        ]
    );
    let tree = Tree::new_node(Box::new(Tree::new_leaf(1)), None);
    match tree {
        Tree::Node(Node { left, right }) => {
            assert_eq!(Tree::new_leaf(1), *left);
            assert!(right.is_none());
        }
        Tree::Leaf(_) => panic!("expected a node"),
    }
}
