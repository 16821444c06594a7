#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox as lox;

    use lox::error::LoxError;
    use lox::interpreter::Interpreter;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use lox::token::Token;

    /// Drive the full pipeline against an in-memory output sink.
    fn run(source: &str) -> Result<String, LoxError> {
        let mut out: Vec<u8> = Vec::new();

        {
            let mut interpreter = Interpreter::new(&mut out);

            let tokens: Vec<Token> = Scanner::new(source.as_bytes().to_vec())
                .collect::<Result<Vec<_>, _>>()?;

            let mut parser = Parser::new(tokens, 0);
            let statements = parser.parse()?;

            Resolver::new(&mut interpreter).resolve(&statements)?;

            interpreter.interpret(&statements)?;
        }

        Ok(String::from_utf8(out).expect("print output is UTF-8"))
    }

    fn run_ok(source: &str) -> String {
        match run(source) {
            Ok(output) => output,
            Err(e) => panic!("program failed: {}\nsource: {}", e, source),
        }
    }

    fn run_err(source: &str) -> String {
        match run(source) {
            Err(e) => e.to_string(),
            Ok(output) => panic!("expected an error, got output: {:?}", output),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Closures and scoping
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_closure_captures_declaration_site_binding() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "local";
                show();
            }
        "#;

        assert_eq!(run_ok(source), "global\nglobal\n");
    }

    #[test]
    fn test_closure_shares_the_original_variable() {
        let source = r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }

            var counter = makeCounter();
            print counter();
            print counter();
            print counter();
        "#;

        assert_eq!(run_ok(source), "1\n2\n3\n");
    }

    #[test]
    fn test_block_bindings_do_not_leak() {
        let source = r#"
            var a = 1;
            {
                var a = 2;
                print a;
            }
            print a;
        "#;

        assert_eq!(run_ok(source), "2\n1\n");
    }

    #[test]
    fn test_bindings_do_not_leak_past_a_return() {
        let source = r#"
            var a = "outer";
            fun f() {
                var a = "inner";
                return a;
            }
            print f();
            print a;
        "#;

        assert_eq!(run_ok(source), "inner\nouter\n");
    }

    #[test]
    fn test_top_level_forward_references() {
        let source = r#"
            fun isEven(n) {
                if (n == 0) return true;
                return isOdd(n - 1);
            }
            fun isOdd(n) {
                if (n == 0) return false;
                return isEven(n - 1);
            }
            print isEven(4);
        "#;

        assert_eq!(run_ok(source), "true\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Control flow
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_for_loop_desugars_to_while() {
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_while_loop() {
        let source = r#"
            var n = 3;
            while (n > 0) {
                print n;
                n = n - 1;
            }
        "#;

        assert_eq!(run_ok(source), "3\n2\n1\n");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            run_ok("if (1 < 2) print \"yes\"; else print \"no\";"),
            "yes\n"
        );
        assert_eq!(
            run_ok("if (nil) print \"yes\"; else print \"no\";"),
            "no\n"
        );
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;

        assert_eq!(run_ok(source), "55\n");
    }

    #[test]
    fn test_function_returns_nil_by_default() {
        assert_eq!(run_ok("fun f() {} print f();"), "nil\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Truthiness and logical operators
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok("print \"hi\" or 2; print nil or \"yes\"; print nil and \"x\";"),
            "hi\nyes\nnil\n"
        );
    }

    #[test]
    fn test_zero_and_empty_string_are_truthy() {
        assert_eq!(run_ok("print 0 or 2;"), "0\n");
        assert_eq!(run_ok("print \"\" and \"tail\";"), "tail\n");
        assert_eq!(run_ok("if (0) print \"truthy\";"), "truthy\n");
    }

    #[test]
    fn test_bang_negates_truthiness() {
        assert_eq!(run_ok("print !nil; print !false; print !0;"), "true\ntrue\nfalse\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Numbers
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_integer_overflow_promotes_to_float() {
        assert_eq!(run_ok("print 2147483647 + 1;"), "2147483648\n");
        assert_eq!(run_ok("print -2147483648 - 1;"), "-2147483649\n");
        assert_eq!(run_ok("print 65536 * 65536;"), "4294967296\n");
    }

    #[test]
    fn test_arithmetic_stays_integer_when_in_range() {
        assert_eq!(run_ok("print 2 + 3 * 4;"), "14\n");
        assert_eq!(run_ok("print 10 - 20;"), "-10\n");
    }

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(run_ok("print 7 / 2;"), "3\n");
        assert_eq!(run_ok("print -7 / 2;"), "-3\n");
    }

    #[test]
    fn test_float_contaminates_arithmetic() {
        assert_eq!(run_ok("print 7 / 2.0;"), "3.5\n");
        assert_eq!(run_ok("print 1.5 + 1;"), "2.5\n");
    }

    #[test]
    fn test_unary_minus_promotes_on_overflow() {
        assert_eq!(run_ok("var m = -2147483648; print -m;"), "2147483648\n");
    }

    #[test]
    fn test_numeric_comparisons() {
        assert_eq!(
            run_ok("print 1 < 2; print 2 <= 2; print 3 > 2.5; print 2 >= 3;"),
            "true\ntrue\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_numeric_equality_crosses_tags() {
        assert_eq!(run_ok("print 10 == 10.0;"), "true\n");
        assert_eq!(run_ok("print 10 != 10.0;"), "false\n");
        assert_eq!(run_ok("print 1 == \"1\";"), "false\n");
        assert_eq!(run_ok("print nil == nil;"), "true\n");
        assert_eq!(run_ok("print nil == false;"), "false\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Strings
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_string_concatenation() {
        assert_eq!(run_ok("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn test_mixed_addition_is_an_error() {
        let message = run_err("print \"a\" + 1;");

        assert!(message.contains("Operands must be two numbers or two strings."));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Classes, instances, methods
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_method_call() {
        let source = r#"
            class Cake { taste() { print "yum"; } }
            var c = Cake();
            c.taste();
        "#;

        assert_eq!(run_ok(source), "yum\n");
    }

    #[test]
    fn test_bound_method_keeps_its_receiver() {
        let source = r#"
            class Person {
                sayName() { print this.name; }
            }
            var jane = Person();
            jane.name = "Jane";
            var method = jane.sayName;
            method();
        "#;

        assert_eq!(run_ok(source), "Jane\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class Box { contents() { return "method"; } }
            var b = Box();
            print b.contents();
            b.contents = "field";
            print b.contents;
        "#;

        assert_eq!(run_ok(source), "method\nfield\n");
    }

    #[test]
    fn test_initializer_runs_on_construction() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
            }
            var p = Point(3, 4);
            print p.x + p.y;
        "#;

        assert_eq!(run_ok(source), "7\n");
    }

    #[test]
    fn test_initializer_returns_this() {
        let source = r#"
            class Thing {
                init() {
                    this.tag = "made";
                    return;
                }
            }
            var t = Thing();
            print t.tag;
            print t.init().tag;
        "#;

        assert_eq!(run_ok(source), "made\nmade\n");
    }

    #[test]
    fn test_instance_display() {
        assert_eq!(run_ok("class Bagel {} print Bagel(); print Bagel;"), "Bagel instance\nBagel\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inheritance and super
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_super_calls_the_parent_method() {
        let source = r#"
            class A { say() { print "A"; } }
            class B < A { say() { super.say(); print "B"; } }
            B().say();
        "#;

        assert_eq!(run_ok(source), "A\nB\n");
    }

    #[test]
    fn test_methods_are_inherited() {
        let source = r#"
            class Doughnut { cook() { print "fry"; } }
            class BostonCream < Doughnut {}
            BostonCream().cook();
        "#;

        assert_eq!(run_ok(source), "fry\n");
    }

    #[test]
    fn test_super_skips_the_overriding_method() {
        let source = r#"
            class A { method() { print "A.method"; } }
            class B < A {
                method() { print "B.method"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
        "#;

        assert_eq!(run_ok(source), "A.method\n");
    }

    #[test]
    fn test_init_is_inherited_through_the_chain() {
        let source = r#"
            class Base { init(n) { this.n = n; } }
            class Derived < Base {}
            print Derived(5).n;
        "#;

        assert_eq!(run_ok(source), "5\n");
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        let message = run_err("var NotAClass = \"so not\"; class C < NotAClass {}");

        assert!(message.contains("Superclass must be a class."));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Calls and callables
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_arity_mismatch() {
        let message = run_err("fun f(a, b) {} f(1);");

        assert!(message.contains("Expected 2 arguments but got 1."));
    }

    #[test]
    fn test_calling_a_non_callable() {
        let message = run_err("var x = 1; x();");

        assert!(message.contains("Can only call functions and classes."));
    }

    #[test]
    fn test_function_display() {
        assert_eq!(run_ok("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run_ok("print clock;"), "<native fn clock>\n");
    }

    #[test]
    fn test_clock_returns_seconds() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
    }

    // ─────────────────────────────────────────────────────────────────────
    // Runtime errors
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_runtime_error_carries_the_line() {
        let message = run_err("\"a\" - 1;");

        assert!(message.contains("Operands must be numbers."));
        assert!(message.contains("[line 1]"));
    }

    #[test]
    fn test_runtime_error_line_tracks_the_source() {
        let message = run_err("var ok = 1;\nprint ok;\n\"a\" * 2;");

        assert!(message.contains("[line 3]"));
    }

    #[test]
    fn test_undefined_variable() {
        let message = run_err("print missing;");

        assert!(message.contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_assignment_to_undefined_variable() {
        let message = run_err("missing = 1;");

        assert!(message.contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_undefined_property() {
        let message = run_err("class C {} var c = C(); print c.missing;");

        assert!(message.contains("Undefined property 'missing'."));
    }

    #[test]
    fn test_property_access_on_non_instance() {
        let message = run_err("print (4).size;");

        assert!(message.contains("Only instances have properties."));
    }

    #[test]
    fn test_field_write_on_non_instance() {
        let message = run_err("var s = \"str\"; s.length = 1;");

        assert!(message.contains("Only instances have fields."));
    }

    // ─────────────────────────────────────────────────────────────────────
    // Printing and assignment results
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_assignment_is_an_expression() {
        assert_eq!(run_ok("var a = 1; print a = 2; print a;"), "2\n2\n");
    }

    #[test]
    fn test_value_display_forms() {
        assert_eq!(
            run_ok("print nil; print true; print 2; print 2.0; print 2.5; print \"s\";"),
            "nil\ntrue\n2\n2\n2.5\ns\n"
        );
    }
}
