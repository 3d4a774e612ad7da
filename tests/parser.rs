#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast_printer::AstPrinter;
    use lox::error::LoxError;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::Token;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes().to_vec())
            .collect::<Result<Vec<Token>, LoxError>>()
            .expect("test source must scan cleanly");

        Parser::new(tokens).parse()
    }

    fn printed(source: &str) -> String {
        match parse(source) {
            Ok(statements) => AstPrinter::print_program(&statements),

            Err(errors) => panic!("parse failed: {}", errors[0]),
        }
    }

    fn error_messages(source: &str) -> Vec<String> {
        match parse(source) {
            Ok(_) => Vec::new(),

            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(printed("1 + 2 * 3;"), "(expr (+ 1.0 (* 2.0 3.0)))");
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(printed("(1 + 2) * 3;"), "(expr (* (group (+ 1.0 2.0)) 3.0))");
    }

    #[test]
    fn unary_operators_nest() {
        assert_eq!(printed("!!true;"), "(expr (! (! true)))");
        assert_eq!(printed("--1;"), "(expr (- (- 1.0)))");
    }

    #[test]
    fn comparison_is_left_associative() {
        assert_eq!(printed("1 < 2 == true;"), "(expr (== (< 1.0 2.0) true))");
    }

    #[test]
    fn logical_or_binds_looser_than_and() {
        assert_eq!(
            printed("a or b and c;"),
            "(expr (or a (and b c)))"
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), "(expr (= a (= b 1.0)))");
    }

    #[test]
    fn calls_and_property_access_chain() {
        assert_eq!(
            printed("obj.field.method(1)(2);"),
            "(expr (call (call (get (get obj field) method) 1.0) 2.0))"
        );
    }

    #[test]
    fn property_assignment_becomes_set() {
        assert_eq!(
            printed("obj.field = 1;"),
            "(expr (set obj field 1.0))"
        );
    }

    #[test]
    fn for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (expr (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn for_with_empty_clauses_loops_forever() {
        assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn for_without_increment_keeps_bare_body() {
        assert_eq!(
            printed("for (; a;) print 1;"),
            "(while a (print 1.0))"
        );
    }

    #[test]
    fn anonymous_function_is_an_expression() {
        assert_eq!(
            printed("var f = fun (x) { return x; };"),
            "(var f (fun (x) (return x)))"
        );
    }

    #[test]
    fn named_function_declaration() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
    }

    #[test]
    fn class_with_superclass_and_class_method() {
        assert_eq!(
            printed("class Sub < Base { run() { } class make() { } }"),
            "(class Sub (< Base) (run ()) (class (make ())))"
        );
    }

    #[test]
    fn super_and_this_parse_in_expressions() {
        assert_eq!(
            printed("class A < B { go() { return super.go() + this.n; } }"),
            "(class A (< B) (go () (return (+ (call (super go)) (get this n)))))"
        );
    }

    #[test]
    fn invalid_assignment_target_is_reported() {
        let errors: Vec<String> = error_messages("1 = 2;");

        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
    }

    #[test]
    fn missing_semicolon_points_at_end() {
        let errors: Vec<String> = error_messages("print 1");

        assert_eq!(errors, vec!["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn synchronization_surfaces_later_errors() {
        let errors: Vec<String> = error_messages("var = 1;\nprint 2;\nvar = 3;");

        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("[line 1]"));
        assert!(errors[1].contains("[line 3]"));
    }

    #[test]
    fn error_inside_block_recovers_at_statement_boundary() {
        let errors: Vec<String> = error_messages("{ print ; print 1; var = 2; }");

        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("Expect expression."));
    }

    #[test]
    fn argument_list_caps_at_255() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source: String = format!("f({});", args.join(", "));

        let errors: Vec<String> = error_messages(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 arguments."));
    }

    #[test]
    fn parameter_list_caps_at_255() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source: String = format!("fun big({}) {{ }}", params.join(", "));

        let errors: Vec<String> = error_messages(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't have more than 255 parameters."));
    }

    #[test]
    fn ids_keep_counting_across_parser_instances() {
        let tokens = |src: &str| {
            Scanner::new(src.as_bytes().to_vec())
                .collect::<Result<Vec<Token>, LoxError>>()
                .expect("scan")
        };

        let mut first = Parser::new(tokens("var a = 1;"));
        first.parse().expect("parse");

        let mut second = Parser::with_id_offset(tokens("print a;"), first.next_id());
        second.parse().expect("parse");

        assert!(second.next_id() > first.next_id());
    }
}
