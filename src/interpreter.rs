//! Tree-walking evaluator.
//!
//! Executes a resolved statement list against a chain of environment frames.
//! Variable references annotated with a scope distance are fetched with a
//! fixed number of frame hops; unannotated references go to the globals frame
//! by name. Function invocation parents the fresh call frame on the callee's
//! *closure* (the frame captured at declaration), never on the caller's
//! environment, which is what keeps resolver distances valid at every call
//! site and lets closures outlive their declaring block.
//!
//! `return` is not an error and not a host-level unwind: statement execution
//! yields an explicit [`Flow`] value that every executor propagates, and the
//! invocation boundary absorbs `Flow::Return` into the call's result.

use std::cell::RefCell;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::environment::Environment;
use crate::error::{Result, VeeryError};
use crate::parser::{Expr, FunctionDecl, LiteralValue, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, NativeFn, Value};

/// Statement outcome: fall through to the next statement, or unwind to the
/// nearest enclosing call boundary carrying a value.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// Where `print` output goes. Production runs write straight to stdout;
/// tests capture into a buffer they can inspect afterwards.
enum Output {
    Stdout,
    Capture(Vec<u8>),
}

impl Output {
    fn write_value(&mut self, value: &Value) -> io::Result<()> {
        match self {
            Output::Stdout => {
                let mut out = io::stdout().lock();
                writeln!(out, "{value}")
            }

            Output::Capture(buf) => writeln!(buf, "{value}"),
        }
    }
}

pub struct Interpreter {
    /// The outermost frame; holds native callables and top-level bindings.
    globals: Rc<RefCell<Environment>>,

    /// The frame active for the statement currently executing.
    environment: Rc<RefCell<Environment>>,

    output: Output,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn clock_native(_args: &[Value]) -> std::result::Result<Value, String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| format!("clock error: {e}"))?;

    Ok(Value::Number(now.as_secs_f64()))
}

impl Interpreter {
    /// Create an interpreter whose globals frame carries the default native
    /// registry (currently `clock`). Output goes to stdout.
    pub fn new() -> Self {
        info!("Initializing interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            output: Output::Stdout,
        };

        interpreter.define_native("clock", 0, clock_native);

        interpreter
    }

    /// Like [`Interpreter::new`] but `print` output accumulates in memory;
    /// retrieve it with [`Interpreter::take_captured`].
    pub fn with_capture() -> Self {
        let mut interpreter = Self::new();
        interpreter.output = Output::Capture(Vec::new());
        interpreter
    }

    /// Drain and return everything printed so far. Empty for stdout-backed
    /// interpreters.
    pub fn take_captured(&mut self) -> String {
        match &mut self.output {
            Output::Capture(buf) => String::from_utf8_lossy(&mem::take(buf)).into_owned(),
            Output::Stdout => String::new(),
        }
    }

    /// Register a host callable in the globals frame. Must be called before
    /// user code that references it runs; redefinition overwrites.
    pub fn define_native(&mut self, name: &str, arity: usize, func: NativeFn) {
        debug!("Registering native function '{}' (arity {})", name, arity);

        self.globals.borrow_mut().define(
            name,
            Value::NativeFunction {
                name: name.to_string(),
                arity,
                func,
            },
        );
    }

    /// Execute a resolved program, top-level statement by statement. The
    /// first runtime error aborts the rest of the run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            // Top-level `return` is rejected by the resolver, so the flow
            // value here is always Normal.
            self.execute(stmt)?;
        }

        info!("Interpretation completed");

        Ok(())
    }

    // ───────────────────────── statements ─────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;

                self.output.write_value(&value)?;

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}'", name.lexeme);

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let child = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
                    &self.environment,
                ))));

                self.execute_block(statements, child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    if let ret @ Flow::Return(_) = self.execute(body)? {
                        return Ok(ret);
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);

                // The frame active *now* becomes the closure.
                let function = Value::Function(Rc::new(Function {
                    declaration: Rc::clone(declaration),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                }));

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, function);

                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                debug!("Defining class '{}'", name.lexeme);

                self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

                let mut table = std::collections::HashMap::new();

                for declaration in methods {
                    let method = Rc::new(Function {
                        declaration: Rc::clone(declaration),
                        closure: Rc::clone(&self.environment),
                        is_initializer: declaration.name.lexeme == "init",
                    });

                    // Duplicate names: last method wins.
                    table.insert(declaration.name.lexeme.clone(), method);
                }

                let class = Value::Class(Rc::new(Class {
                    name: name.lexeme.clone(),
                    methods: table,
                }));

                self.environment.borrow_mut().define(&name.lexeme, class);

                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `environment` as the active frame, restoring the
    /// previous frame on every exit path. Shared by block statements and the
    /// function calling convention.
    fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Flow> {
        let previous: Rc<RefCell<Environment>> =
            mem::replace(&mut self.environment, environment);

        let mut flow: Flow = Flow::Normal;

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Flow::Normal) => {}

                Ok(ret @ Flow::Return(_)) => {
                    flow = ret;
                    break;
                }

                Err(e) => {
                    self.environment = previous;
                    return Err(e);
                }
            }
        }

        self.environment = previous;

        Ok(flow)
    }

    // ───────────────────────── expressions ─────────────────────────

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { name, depth } => self.look_up_variable(name, depth.get()),

            Expr::Assign { name, value, depth } => {
                let value: Value = self.evaluate(value)?;

                match depth.get() {
                    Some(distance) => {
                        Environment::assign_at(
                            &self.environment,
                            distance,
                            &name.lexeme,
                            value.clone(),
                        );
                    }

                    None => {
                        self.globals.borrow_mut().assign(
                            &name.lexeme,
                            value.clone(),
                            name.line,
                        )?;
                    }
                }

                // Assignment is an expression yielding the assigned value.
                Ok(value)
            }

            Expr::This { keyword, depth } => self.look_up_variable(keyword, depth.get()),

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value: Value = self.evaluate(callee)?;

                let mut argument_values: Vec<Value> = Vec::with_capacity(arguments.len());

                for argument in arguments {
                    argument_values.push(self.evaluate(argument)?);
                }

                self.invoke_callable(callee_value, paren, argument_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),

                _ => Err(VeeryError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;

                    Instance::set(&instance, name, value.clone());

                    Ok(value)
                }

                _ => Err(VeeryError::runtime(
                    name.line,
                    "Only instances have fields.",
                )),
            },
        }
    }

    /// Resolved references hop exactly `depth` frames from the active one;
    /// unresolved references are late-bound in the globals frame.
    fn look_up_variable(&self, name: &Token, depth: Option<usize>) -> Result<Value> {
        match depth {
            Some(distance) => Ok(Environment::get_at(
                &self.environment,
                distance,
                &name.lexeme,
            )),

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(VeeryError::runtime(
                    operator.line,
                    "Operand must be a number.",
                )),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_value))),

            _ => Err(VeeryError::runtime(operator.line, "Invalid unary operator")),
        }
    }

    /// `and` / `or`: the left operand alone decides whether the right one is
    /// ever evaluated, and the result is one of the operand values, not a
    /// coerced boolean.
    fn evaluate_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_value: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if is_truthy(&left_value) {
                    return Ok(left_value);
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_value) {
                    return Ok(left_value);
                }
            }

            _ => {
                return Err(VeeryError::runtime(
                    operator.line,
                    "Invalid logical operator",
                ));
            }
        }

        self.evaluate(right)
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_value: Value = self.evaluate(left)?;
        let right_value: Value = self.evaluate(right)?;

        let line: usize = operator.line;

        match operator.token_type {
            TokenType::PLUS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(VeeryError::runtime(
                    line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::STAR => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::SLASH => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(VeeryError::runtime(line, "Division by zero."))
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }

                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::GREATER => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::GREATER_EQUAL => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::LESS => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::LESS_EQUAL => match (left_value, right_value) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(VeeryError::runtime(line, "Operands must be numbers.")),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_value == right_value)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_value != right_value)),

            _ => Err(VeeryError::runtime(line, "Invalid binary operator")),
        }
    }

    // ───────────────────── calling convention ─────────────────────

    /// One dispatch over the callable variants; everything else is a type
    /// error. Arity is checked exactly before any binding happens.
    fn invoke_callable(
        &mut self,
        callee: Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                self.check_arity(arity, arguments.len(), paren)?;

                func(&arguments).map_err(|message| VeeryError::runtime(paren.line, message))
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.declaration.name.lexeme);

                self.check_arity(function.arity(), arguments.len(), paren)?;

                self.call_function(&function, arguments)
            }

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);

                self.check_arity(class.arity(), arguments.len(), paren)?;

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

                if let Some(init) = class.find_method("init") {
                    let bound: Function = init.bind(Value::Instance(Rc::clone(&instance)));

                    self.call_function(&bound, arguments)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(VeeryError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(&self, expected: usize, actual: usize, paren: &Token) -> Result<()> {
        if expected != actual {
            return Err(VeeryError::runtime(
                paren.line,
                format!("Expected {expected} arguments but got {actual}"),
            ));
        }

        Ok(())
    }

    /// The calling convention: a fresh frame parented on the function's
    /// closure (not the caller's environment), parameters bound in order,
    /// body run against it. `Flow::Return` unwinds exactly to here.
    fn call_function(&mut self, function: &Function, arguments: Vec<Value>) -> Result<Value> {
        let frame = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &function.closure,
        ))));

        {
            let declaration: &FunctionDecl = &function.declaration;
            let mut frame = frame.borrow_mut();

            for (param, argument) in declaration.params.iter().zip(arguments) {
                frame.define(&param.lexeme, argument);
            }
        }

        let flow: Flow = self.execute_block(&function.declaration.body, frame)?;

        if function.is_initializer {
            // `init` yields the instance no matter how the body exits.
            return Ok(Environment::get_at(&function.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

/// Everything is truthy except `nil` and `false`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

fn literal_value(literal: &LiteralValue) -> Value {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}
