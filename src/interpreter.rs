//! Tree-walking evaluator.
//!
//! Executes statements and evaluates expressions against the environment
//! chain and the resolution side map filled in by the resolver. The current
//! environment is swapped on block entry and restored on every exit path,
//! including runtime errors and non-local returns, so bindings never leak
//! into outer scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::callable::{clock_native, Callable, LoxFunction};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{ExecResult, LoxError, Result, Unwind};
use crate::token::{Number, Token, TokenType};
use crate::value::Value;

pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    // Resolution map: expression identity → number of enclosing scopes to
    // skip. Absence means the variable lives in globals.
    locals: HashMap<ExprId, usize>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    /// An interpreter writing `print` output to `output`.
    pub fn new(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::Callable(Callable::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            }),
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolved lexical depth for an expression node. Called by the
    /// resolver.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Execute a resolved program. Runtime errors are caught exactly here;
    /// the driver reports them and sets the runtime-error flag.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(err)) => return Err(err),

                // The resolver rejects top-level `return`.
                Err(Unwind::Return(_)) => return Ok(()),
            }
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement execution
    // ─────────────────────────────────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> ExecResult<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let environment = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                let function =
                    LoxFunction::new(declaration.clone(), self.environment.clone(), false);

                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    /// Run `statements` inside `environment`, restoring the previous
    /// environment on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> ExecResult<()> {
        let previous: Rc<RefCell<Environment>> =
            std::mem::replace(&mut self.environment, environment);

        let mut result: ExecResult<()> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> ExecResult<()> {
        debug!("Declaring class '{}'", name.lexeme);

        // The class name exists (as nil) while the body is built, so the
        // body may reference it.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Callable(Callable::Class(class)) => Some(class),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(Unwind::Error(LoxError::runtime(
                        line,
                        "Superclass must be a class.",
                    )));
                }
            },

            None => None,
        };

        // Methods in a subclass close over a scope that binds `super`.
        let enclosing: Option<Rc<RefCell<Environment>>> = superclass.as_ref().map(|superclass| {
            let previous = self.environment.clone();

            let environment = Rc::new(RefCell::new(Environment::with_enclosing(previous.clone())));

            environment.borrow_mut().define(
                "super",
                Value::Callable(Callable::Class(superclass.clone())),
            );

            self.environment = environment;

            previous
        });

        let mut method_map: HashMap<String, LoxFunction> = HashMap::new();

        for method in methods {
            let is_initializer = method.name.lexeme == "init";

            let function = LoxFunction::new(method.clone(), self.environment.clone(), is_initializer);

            method_map.insert(method.name.lexeme.clone(), function);
        }

        let class = LoxClass::new(name.lexeme.clone(), superclass, method_map);

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Callable(Callable::Class(Rc::new(class))))?;

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression evaluation
    // ─────────────────────────────────────────────────────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> ExecResult<Value> {
        match expr {
            Expr::Literal(token) => Ok(Self::literal_value(token)?),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right: Value = self.evaluate(right)?;

                match operator.token_type {
                    TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

                    // Negation is subtraction from integer zero, with the
                    // same overflow promotion as binary minus.
                    TokenType::MINUS => Ok(Self::subtract(&Value::Int(0), operator, &right)?),

                    _ => Err(Unwind::Error(LoxError::runtime(
                        operator.line,
                        "Invalid unary operator.",
                    ))),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;
                let right: Value = self.evaluate(right)?;

                Ok(Self::binary(&left, operator, &right)?)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                // The result is whichever operand terminated the short
                // circuit, not a coerced boolean.
                if operator.token_type == TokenType::OR {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }

                self.evaluate(right)
            }

            Expr::Variable { id, name } => Ok(self.look_up_variable(name, *id)?),

            Expr::This { id, keyword } => Ok(self.look_up_variable(keyword, *id)?),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                if let Some(distance) = self.locals.get(id) {
                    self.environment
                        .borrow_mut()
                        .assign_at(*distance, name, value.clone())?;
                } else {
                    self.globals.borrow_mut().assign(name, value.clone())?;
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut argument_values: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                let callable = match callee {
                    Value::Callable(callable) => callable,

                    _ => {
                        return Err(Unwind::Error(LoxError::runtime(
                            paren.line,
                            "Can only call functions and classes.",
                        )))
                    }
                };

                if argument_values.len() != callable.arity() {
                    return Err(Unwind::Error(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            argument_values.len()
                        ),
                    )));
                }

                Ok(callable.call(self, argument_values)?)
            }

            Expr::Get { object, name } => {
                let object: Value = self.evaluate(object)?;

                match object {
                    Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),

                    _ => Err(Unwind::Error(LoxError::runtime(
                        name.line,
                        "Only instances have properties.",
                    ))),
                }
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let object: Value = self.evaluate(object)?;

                let instance = match object {
                    Value::Instance(instance) => instance,

                    _ => {
                        return Err(Unwind::Error(LoxError::runtime(
                            name.line,
                            "Only instances have fields.",
                        )))
                    }
                };

                let value: Value = self.evaluate(value)?;

                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::Super {
                id,
                keyword,
                method,
            } => Ok(self.evaluate_super(*id, keyword, method)?),
        }
    }

    /// `super.m`: the superclass lives at the resolved depth, the receiving
    /// instance one scope below it.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> Result<Value> {
        let distance: usize = match self.locals.get(&id) {
            Some(distance) => *distance,

            None => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Undefined variable 'super'.",
                ))
            }
        };

        let superclass = match self.environment.borrow().get_at(distance, keyword)? {
            Value::Callable(Callable::Class(class)) => class,

            _ => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Superclass must be a class.",
                ))
            }
        };

        let this = Token::new(TokenType::THIS, "this".to_string(), keyword.line);

        let instance = match self.environment.borrow().get_at(distance - 1, &this)? {
            Value::Instance(instance) => instance,

            _ => {
                return Err(LoxError::runtime(
                    keyword.line,
                    "Undefined variable 'this'.",
                ))
            }
        };

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Callable(Callable::Function(Rc::new(
                function.bind(instance),
            )))),

            None => Err(LoxError::runtime(
                method.line,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        if let Some(distance) = self.locals.get(&id) {
            self.environment.borrow().get_at(*distance, name)
        } else {
            self.globals.borrow().get(name)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Numeric and literal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn literal_value(token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(Number::Int(n)) => Ok(Value::Int(*n)),

            TokenType::NUMBER(Number::Float(n)) => Ok(Value::Float(*n)),

            TokenType::STRING(s) => Ok(Value::Str(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.")),
        }
    }

    fn binary(left: &Value, operator: &Token, right: &Value) -> Result<Value> {
        match operator.token_type {
            TokenType::PLUS => Self::add(left, operator, right),

            TokenType::MINUS => Self::subtract(left, operator, right),

            TokenType::STAR => Self::multiply(left, operator, right),

            TokenType::SLASH => Self::divide(left, operator, right),

            TokenType::GREATER => {
                let (x, y) = Self::numeric_operands(left, operator, right)?;

                Ok(Value::Bool(x > y))
            }

            // `>=` is "not less-than" and `<=` is "not greater-than".
            TokenType::GREATER_EQUAL => {
                let (x, y) = Self::numeric_operands(left, operator, right)?;

                Ok(Value::Bool(!(x < y)))
            }

            TokenType::LESS => {
                let (x, y) = Self::numeric_operands(left, operator, right)?;

                Ok(Value::Bool(x < y))
            }

            TokenType::LESS_EQUAL => {
                let (x, y) = Self::numeric_operands(left, operator, right)?;

                Ok(Value::Bool(!(x > y)))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left.equals(right))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!left.equals(right))),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.")),
        }
    }

    fn add(left: &Value, operator: &Token, right: &Value) -> Result<Value> {
        if let (Value::Str(a), Value::Str(b)) = (left, right) {
            return Ok(Value::Str(format!("{}{}", a, b)));
        }

        let (x, y) = match (left.as_f64(), right.as_f64()) {
            (Some(x), Some(y)) => (x, y),

            _ => {
                return Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                ))
            }
        };

        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            if let Some(sum) = a.checked_add(*b) {
                return Ok(Value::Int(sum));
            }
        }

        // Integer overflow promotes to the float result.
        Ok(Value::Float(x + y))
    }

    fn subtract(left: &Value, operator: &Token, right: &Value) -> Result<Value> {
        let (x, y) = Self::numeric_operands(left, operator, right)?;

        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            if let Some(difference) = a.checked_sub(*b) {
                return Ok(Value::Int(difference));
            }
        }

        Ok(Value::Float(x - y))
    }

    fn multiply(left: &Value, operator: &Token, right: &Value) -> Result<Value> {
        let (x, y) = Self::numeric_operands(left, operator, right)?;

        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            if let Some(product) = a.checked_mul(*b) {
                return Ok(Value::Int(product));
            }
        }

        Ok(Value::Float(x * y))
    }

    fn divide(left: &Value, operator: &Token, right: &Value) -> Result<Value> {
        let (x, y) = Self::numeric_operands(left, operator, right)?;

        if let (Value::Int(a), Value::Int(b)) = (left, right) {
            // Integer division truncates toward zero. The checked failure
            // cases (zero divisor, i32::MIN / -1) fall through to floats.
            if let Some(quotient) = a.checked_div(*b) {
                return Ok(Value::Int(quotient));
            }
        }

        Ok(Value::Float(x / y))
    }

    fn numeric_operands(left: &Value, operator: &Token, right: &Value) -> Result<(f64, f64)> {
        match (left.as_f64(), right.as_f64()) {
            (Some(x), Some(y)) => Ok((x, y)),

            _ => Err(LoxError::runtime(
                operator.line,
                "Operands must be numbers.",
            )),
        }
    }
}
