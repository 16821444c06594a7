#[cfg(test)]
mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rox as lox;

    use lox::environment::Environment;
    use lox::token::{Token, TokenType};
    use lox::value::Value;

    fn name(lexeme: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, lexeme.to_string(), 1)
    }

    fn as_int(value: Value) -> i32 {
        match value {
            Value::Int(n) => n,
            other => panic!("expected an integer, got {:?}", other),
        }
    }

    #[test]
    fn test_define_then_get() {
        let mut env = Environment::new();

        env.define("a", Value::Int(1));

        assert_eq!(as_int(env.get(&name("a")).unwrap()), 1);
    }

    #[test]
    fn test_redefinition_is_allowed() {
        let mut env = Environment::new();

        env.define("a", Value::Int(1));
        env.define("a", Value::Int(2));

        assert_eq!(as_int(env.get(&name("a")).unwrap()), 2);
    }

    #[test]
    fn test_get_searches_the_enclosing_chain() {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Int(7));

        let inner = Environment::with_enclosing(globals);

        assert_eq!(as_int(inner.get(&name("a")).unwrap()), 7);
    }

    #[test]
    fn test_get_of_missing_name_fails() {
        let env = Environment::new();

        let message = env.get(&name("ghost")).unwrap_err().to_string();

        assert!(message.contains("Undefined variable 'ghost'."));
    }

    #[test]
    fn test_assign_never_creates_a_binding() {
        let mut env = Environment::new();

        let message = env
            .assign(&name("ghost"), Value::Int(1))
            .unwrap_err()
            .to_string();

        assert!(message.contains("Undefined variable 'ghost'."));
        assert!(env.get(&name("ghost")).is_err());
    }

    #[test]
    fn test_assign_writes_through_to_the_defining_scope() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Int(1));

        let mut inner = Environment::with_enclosing(outer.clone());
        inner.assign(&name("a"), Value::Int(2)).unwrap();

        assert_eq!(as_int(outer.borrow().get(&name("a")).unwrap()), 2);
    }

    #[test]
    fn test_get_at_walks_exactly_the_given_distance() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x", Value::Int(0));

        let middle = Rc::new(RefCell::new(Environment::with_enclosing(root)));
        middle.borrow_mut().define("x", Value::Int(1));

        let leaf = Environment::with_enclosing(middle);

        // distance 0 = the leaf itself, which has no `x`
        assert!(leaf.get_at(0, &name("x")).is_err());
        assert_eq!(as_int(leaf.get_at(1, &name("x")).unwrap()), 1);
        assert_eq!(as_int(leaf.get_at(2, &name("x")).unwrap()), 0);
    }

    #[test]
    fn test_assign_at_targets_one_scope_without_searching() {
        let root = Rc::new(RefCell::new(Environment::new()));
        root.borrow_mut().define("x", Value::Int(0));

        let middle = Rc::new(RefCell::new(Environment::with_enclosing(root.clone())));
        middle.borrow_mut().define("x", Value::Int(1));

        let mut leaf = Environment::with_enclosing(middle.clone());

        leaf.assign_at(2, &name("x"), Value::Int(42)).unwrap();

        assert_eq!(as_int(root.borrow().get_at(0, &name("x")).unwrap()), 42);
        assert_eq!(as_int(middle.borrow().get_at(0, &name("x")).unwrap()), 1);
    }

    #[test]
    fn test_shadowing_without_disturbing_the_outer_binding() {
        let outer = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("a", Value::Str("outer".to_string()));

        let mut inner = Environment::with_enclosing(outer.clone());
        inner.define("a", Value::Str("inner".to_string()));

        match inner.get(&name("a")).unwrap() {
            Value::Str(s) => assert_eq!(s, "inner"),
            other => panic!("expected a string, got {:?}", other),
        }

        match outer.borrow().get(&name("a")).unwrap() {
            Value::Str(s) => assert_eq!(s, "outer"),
            other => panic!("expected a string, got {:?}", other),
        };
    }
}
