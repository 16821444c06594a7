//! Polymorphic call surface: user functions, bound methods, classes used as
//! constructors, and native functions all expose arity, `call`, and a display
//! form through [`Callable`].

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result, Unwind};
use crate::interpreter::Interpreter;
use crate::token::{Token, TokenType};
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Callable {
    NativeFunction {
        name: &'static str,
        arity: usize,
        func: fn(&[Value]) -> Result<Value>,
    },

    Function(Rc<LoxFunction>),

    Class(Rc<LoxClass>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::NativeFunction { arity, .. } => *arity,

            Callable::Function(function) => function.arity(),

            Callable::Class(class) => class.arity(),
        }
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match self {
            Callable::NativeFunction { name, func, .. } => {
                debug!("Calling native function '{}'", name);

                func(&arguments)
            }

            Callable::Function(function) => function.call(interpreter, arguments),

            Callable::Class(class) => LoxClass::construct(class, interpreter, arguments),
        }
    }

    /// Callables compare by identity, never structurally.
    pub fn identity_eq(&self, other: &Callable) -> bool {
        match (self, other) {
            (
                Callable::NativeFunction { name: a, .. },
                Callable::NativeFunction { name: b, .. },
            ) => a == b,

            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),

            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Callable::Function(function) => write!(f, "<fn {}>", function.name()),

            Callable::Class(class) => write!(f, "{}", class),
        }
    }
}

/// A user function: its declaration plus the environment captured at the
/// declaration site. Binding an instance produces a new function whose
/// closure is one scope deeper, with `this` defined in it.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        debug!("Calling function '{}'", self.name());

        let environment = Rc::new(RefCell::new(Environment::with_enclosing(
            self.closure.clone(),
        )));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.borrow_mut().define(&param.lexeme, argument);
        }

        // The call boundary: a return signal raised anywhere in the body
        // stops unwinding here.
        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {}

            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    return self.bound_this();
                }

                return Ok(value);
            }

            Err(Unwind::Error(err)) => return Err(err),
        }

        if self.is_initializer {
            return self.bound_this();
        }

        Ok(Value::Nil)
    }

    /// A new function whose closure is a one-deep child scope defining
    /// `this`. The initializer flag carries through.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let environment = Rc::new(RefCell::new(Environment::with_enclosing(
            self.closure.clone(),
        )));

        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: environment,
            is_initializer: self.is_initializer,
        }
    }

    // Initializers always produce `this`, which lives in slot 0 of the
    // bound closure.
    fn bound_this(&self) -> Result<Value> {
        let this = Token::new(
            TokenType::THIS,
            "this".to_string(),
            self.declaration.name.line,
        );

        self.closure.borrow().get_at(0, &this)
    }
}

/// Native `clock()`: wall-clock seconds since the Unix epoch, as a float.
pub fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Float(timestamp))
}
