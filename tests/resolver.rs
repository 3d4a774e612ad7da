#[cfg(test)]
mod resolver_tests {
    use treelox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::Token;

    fn resolve_errors(source: &str) -> Vec<String> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes().to_vec())
            .collect::<Result<Vec<Token>, LoxError>>()
            .expect("test source must scan cleanly");

        let statements: Vec<Stmt> = Parser::new(tokens)
            .parse()
            .expect("test source must parse cleanly");

        let mut interpreter: Interpreter = Interpreter::new();

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),

            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn clean_program_resolves() {
        let source = "
            var a = 1;
            fun f(x) { return x + a; }
            { var b = f(2); print b; }
        ";

        assert!(resolve_errors(source).is_empty());
    }

    #[test]
    fn self_read_in_initializer_is_rejected_in_local_scope() {
        let errors: Vec<String> = resolve_errors("{ var a = a; }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn self_read_is_fine_at_global_scope() {
        // Globals may be redefined in terms of their old value.
        assert!(resolve_errors("var a = 1; var a = a;").is_empty());
    }

    #[test]
    fn duplicate_declaration_in_local_scope() {
        let errors: Vec<String> = resolve_errors("{ var a = 1; var a = 2; }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn duplicate_declaration_allowed_at_global_scope() {
        assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn return_outside_any_function() {
        let errors: Vec<String> = resolve_errors("return 1;");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn return_with_value_from_initializer() {
        let errors: Vec<String> =
            resolve_errors("class A { init() { return 1; } }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn bare_return_from_initializer_is_allowed() {
        assert!(resolve_errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn this_outside_a_class() {
        let errors: Vec<String> = resolve_errors("print this;");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn this_in_a_plain_function() {
        let errors: Vec<String> = resolve_errors("fun f() { return this; }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn super_outside_a_class() {
        let errors: Vec<String> = resolve_errors("fun f() { super.g(); }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
    }

    #[test]
    fn super_in_a_class_without_superclass() {
        let errors: Vec<String> =
            resolve_errors("class A { f() { return super.f(); } }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn super_in_a_subclass_is_fine() {
        let source = "
            class A { f() { return 1; } }
            class B < A { f() { return super.f(); } }
        ";

        assert!(resolve_errors(source).is_empty());
    }

    #[test]
    fn class_inheriting_from_itself() {
        let errors: Vec<String> = resolve_errors("class A < A { }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn class_methods_may_use_this() {
        let source = "
            class Registry {
                class tag() { return \"v1\"; }
                class describe() { return this.tag(); }
            }
        ";

        assert!(resolve_errors(source).is_empty());
    }

    #[test]
    fn resolution_continues_past_the_first_error() {
        let source = "
            return 1;
            { var a = 1; var a = 2; }
            print this;
        ";

        let errors: Vec<String> = resolve_errors(source);

        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("Can't return from top-level code."));
        assert!(errors[1].contains("Already a variable with this name in this scope."));
        assert!(errors[2].contains("Can't use 'this' outside of a class."));
    }

    #[test]
    fn parameters_share_the_function_scope() {
        let errors: Vec<String> = resolve_errors("fun f(a) { var a = 1; }");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Already a variable with this name in this scope."));
    }
}
