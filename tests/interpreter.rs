#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use treelox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::stmt::Stmt;
    use lox::token::Token;

    /// Run a program through the whole pipeline, capturing `print` output.
    fn run(source: &str) -> Result<String, LoxError> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes().to_vec())
            .collect::<Result<Vec<Token>, LoxError>>()?;

        let statements: Vec<Stmt> = Parser::new(tokens).parse().map_err(first)?;

        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));

        let mut interpreter: Interpreter = Interpreter::with_output(sink.clone());

        Resolver::new(&mut interpreter)
            .resolve(&statements)
            .map_err(first)?;

        interpreter.interpret(&statements)?;

        let bytes: Vec<u8> = sink.borrow().clone();

        Ok(String::from_utf8(bytes).expect("print output is UTF-8"))
    }

    fn first(mut errors: Vec<LoxError>) -> LoxError {
        errors.remove(0)
    }

    fn run_ok(source: &str) -> String {
        match run(source) {
            Ok(output) => output,

            Err(e) => panic!("program failed: {}", e),
        }
    }

    fn run_err(source: &str) -> String {
        match run(source) {
            Ok(output) => panic!("expected failure, got output: {:?}", output),

            Err(e) => e.to_string(),
        }
    }

    // ── arithmetic and printing ─────────────────────────────────────────

    #[test]
    fn addition_prints_sum() {
        assert_eq!(run_ok("print 1 + 2;"), "3\n");
    }

    #[test]
    fn integer_valued_numbers_print_without_fraction() {
        assert_eq!(run_ok("print 4 / 2; print 2.5; print 0.5 + 0.5;"), "2\n2.5\n1\n");
    }

    #[test]
    fn division_by_zero_is_ieee() {
        assert_eq!(run_ok("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn unary_negation_and_not() {
        assert_eq!(run_ok("print -3; print !nil; print !0;"), "-3\ntrue\nfalse\n");
    }

    // ── truthiness, equality and logic ──────────────────────────────────

    #[test]
    fn only_nil_and_false_are_falsy() {
        let source = "
            if (0) print \"zero\"; else print \"no\";
            if (\"\") print \"empty\"; else print \"no\";
            if (nil) print \"nil\"; else print \"no nil\";
            if (false) print \"false\"; else print \"no false\";
        ";

        assert_eq!(run_ok(source), "zero\nempty\nno nil\nno false\n");
    }

    #[test]
    fn equality_by_kind_and_value() {
        let source = "
            print 1 == 1;
            print 1 == \"1\";
            print nil == nil;
            print \"a\" != \"b\";
            print true == true;
        ";

        assert_eq!(run_ok(source), "true\nfalse\ntrue\ntrue\ntrue\n");
    }

    #[test]
    fn instances_compare_by_identity() {
        let source = "
            class A { }
            var x = A();
            var y = A();
            print x == x;
            print x == y;
        ";

        assert_eq!(run_ok(source), "true\nfalse\n");
    }

    #[test]
    fn logical_operators_return_operands() {
        let source = "
            print \"hi\" or 2;
            print nil or \"yes\";
            print nil and 1;
            print 1 and 2;
        ";

        assert_eq!(run_ok(source), "hi\nyes\nnil\n2\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        let source = "
            var touched = false;
            fun touch() { touched = true; return true; }
            var a = false and touch();
            print touched;
            var b = true or touch();
            print touched;
        ";

        assert_eq!(run_ok(source), "false\nfalse\n");
    }

    // ── variables, scoping and closures ─────────────────────────────────

    #[test]
    fn block_scope_shadows_and_restores() {
        assert_eq!(
            run_ok("var x = \"outer\"; { var x = \"inner\"; print x; } print x;"),
            "inner\nouter\n"
        );
    }

    #[test]
    fn resolver_pins_captured_globals() {
        let source = "
            var a = \"global\";
            {
                fun show() { print a; }
                show();
                var a = \"block\";
                show();
            }
        ";

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn closures_share_one_variable_slot() {
        let source = "
            fun make() {
                var i = 0;
                fun inc() { i = i + 1; return i; }
                return inc;
            }
            var c = make();
            print c();
            print c();
            print c();
        ";

        assert_eq!(run_ok(source), "1\n2\n3\n");
    }

    #[test]
    fn sibling_closures_see_the_same_slot() {
        let source = "
            fun pair() {
                var n = 0;
                fun bump() { n = n + 1; }
                fun read() { return n; }
                bump();
                bump();
                return read;
            }
            print pair()();
        ";

        assert_eq!(run_ok(source), "2\n");
    }

    #[test]
    fn while_loop_counts() {
        let source = "
            var i = 0;
            while (i < 3) { print i; i = i + 1; }
        ";

        assert_eq!(run_ok(source), "0\n1\n2\n");
    }

    #[test]
    fn for_loop_matches_desugared_while() {
        let for_source = "for (var i = 0; i < 4; i = i + 1) print i;";

        let while_source = "
            {
                var i = 0;
                while (i < 4) { print i; i = i + 1; }
            }
        ";

        assert_eq!(run_ok(for_source), run_ok(while_source));
    }

    #[test]
    fn recursion_through_globals() {
        let source = "
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        ";

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn return_unwinds_nested_blocks() {
        let source = "
            fun f() {
                var a = \"in\";
                { { return a; } }
            }
            print f();
        ";

        assert_eq!(run_ok(source), "in\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() { } print f();"), "nil\n");
    }

    #[test]
    fn anonymous_functions_are_values() {
        let source = "
            var twice = fun (x) { return x + x; };
            print twice(4);
        ";

        assert_eq!(run_ok(source), "8\n");
    }

    #[test]
    fn arguments_evaluate_left_to_right() {
        let source = "
            var trace = \"\";
            fun mark(tag) { trace = trace + tag; return tag; }
            fun take(a, b, c) { }
            take(mark(\"a\"), mark(\"b\"), mark(\"c\"));
            print trace;
        ";

        assert_eq!(run_ok(source), "abc\n");
    }

    // ── classes, instances and inheritance ──────────────────────────────

    #[test]
    fn fields_and_bound_methods() {
        let source = "
            class A { greet() { print \"hi \" + this.name; } }
            var a = A();
            a.name = \"lox\";
            a.greet();
        ";

        assert_eq!(run_ok(source), "hi lox\n");
    }

    #[test]
    fn extracted_methods_stay_bound() {
        let source = "
            class Counter {
                init() { this.n = 0; }
                bump() { this.n = this.n + 1; return this.n; }
            }
            var c = Counter();
            var bump = c.bump;
            bump();
            print bump();
        ";

        assert_eq!(run_ok(source), "2\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let source = "
            class A { tag() { return \"method\"; } }
            var a = A();
            a.tag = fun () { return \"field\"; };
            print a.tag();
        ";

        assert_eq!(run_ok(source), "field\n");
    }

    #[test]
    fn initializer_runs_on_construction() {
        let source = "
            class Point {
                init(x, y) { this.x = x; this.y = y; }
            }
            var p = Point(3, 4);
            print p.x + p.y;
        ";

        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn initializer_always_yields_the_instance() {
        let source = "
            class P {
                init() {
                    this.x = 1;
                    return;
                }
            }
            var p = P();
            print p.x;
            print p.init();
        ";

        assert_eq!(run_ok(source), "1\nP instance\n");
    }

    #[test]
    fn superclass_methods_are_inherited() {
        let source = "
            class Base { speak() { return \"base\"; } }
            class Sub < Base { }
            print Sub().speak();
        ";

        assert_eq!(run_ok(source), "base\n");
    }

    #[test]
    fn super_chains_initializers() {
        let source = "
            class B { init(n) { this.n = n; } }
            class C < B { init(n) { super.init(n); this.n = this.n + 1; } }
            print C(10).n;
        ";

        assert_eq!(run_ok(source), "11\n");
    }

    #[test]
    fn super_calls_the_overridden_method() {
        let source = "
            class A { m() { return \"A\"; } }
            class B < A { m() { return super.m() + \"B\"; } }
            class C < B { m() { return super.m() + \"C\"; } }
            print C().m();
        ";

        assert_eq!(run_ok(source), "ABC\n");
    }

    #[test]
    fn class_methods_dispatch_through_the_metaclass() {
        let source = "
            class Math {
                class square(n) { return n * n; }
            }
            print Math.square(3);
        ";

        assert_eq!(run_ok(source), "9\n");
    }

    #[test]
    fn class_methods_bind_this_to_the_class_object() {
        let source = "
            class Registry {
                class tag() { return \"v1\"; }
                class describe() { return \"registry \" + this.tag(); }
            }
            print Registry.describe();
        ";

        assert_eq!(run_ok(source), "registry v1\n");
    }

    #[test]
    fn methods_close_over_their_declaration_scope() {
        let source = "
            var prefix = \"<\";
            class Wrap {
                show(s) { return prefix + s + \">\"; }
            }
            print Wrap().show(\"x\");
        ";

        assert_eq!(run_ok(source), "<x>\n");
    }

    // ── stringification ─────────────────────────────────────────────────

    #[test]
    fn values_stringify_by_kind() {
        let source = "
            fun named() { }
            class Thing { }
            print nil;
            print true;
            print named;
            print Thing;
            print Thing();
            print clock;
        ";

        assert_eq!(
            run_ok(source),
            "nil\ntrue\n<fn named>\nThing\nThing instance\n<native fn clock>\n"
        );
    }

    #[test]
    fn clock_is_non_decreasing() {
        let source = "
            var before = clock();
            var after = clock();
            print after >= before;
        ";

        assert_eq!(run_ok(source), "true\n");
    }

    // ── runtime errors ──────────────────────────────────────────────────

    #[test]
    fn adding_string_and_number_fails() {
        assert_eq!(
            run_err("\"a\" + 1;"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn comparing_non_numbers_fails() {
        assert_eq!(run_err("1 < \"2\";"), "Operands must be numbers.\n[line 1]");
    }

    #[test]
    fn negating_a_string_fails() {
        assert_eq!(run_err("-\"oops\";"), "Operand must be a number.\n[line 1]");
    }

    #[test]
    fn calling_a_non_callable_fails() {
        assert_eq!(
            run_err("var x = 1;\nx();"),
            "Can only call functions and classes.\n[line 2]"
        );
    }

    #[test]
    fn arity_mismatch_fails() {
        assert_eq!(
            run_err("fun f(a, b) { } f(1);"),
            "Expected 2 arguments but got 1.\n[line 1]"
        );
    }

    #[test]
    fn reading_an_undefined_global_fails() {
        assert_eq!(run_err("print missing;"), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn assigning_an_undefined_global_fails() {
        assert_eq!(run_err("missing = 1;"), "Undefined variable 'missing'.\n[line 1]");
    }

    #[test]
    fn property_access_on_non_instance_fails() {
        assert_eq!(
            run_err("var s = \"str\";\nprint s.length;"),
            "Only instances have properties.\n[line 2]"
        );
    }

    #[test]
    fn field_write_on_non_instance_fails() {
        assert_eq!(run_err("true.x = 1;"), "Only instances have fields.\n[line 1]");
    }

    #[test]
    fn unknown_property_fails() {
        assert_eq!(
            run_err("class A { } A().missing;"),
            "Undefined property 'missing'.\n[line 1]"
        );
    }

    #[test]
    fn unknown_super_method_fails() {
        let source = "
            class A { }
            class B < A { go() { return super.missing(); } }
            B().go();
        ";

        assert!(run_err(source).contains("Undefined property 'missing'."));
    }

    #[test]
    fn inheriting_from_a_non_class_fails() {
        assert_eq!(
            run_err("var NotAClass = 1;\nclass Sub < NotAClass { }"),
            "Superclass must be a class.\n[line 2]"
        );
    }

    #[test]
    fn runtime_error_aborts_later_statements() {
        let result = run("print \"before\"; print missing; print \"after\";");

        assert!(result.is_err());
    }
}
