//! Static resolver pass.
//!
//! One walk over the parsed AST, strictly between parsing and execution. It
//! does three things:
//!
//! 1. Simulates lexical scope nesting with a stack of `HashMap<String, bool>`
//!    (`false` = declared, `true` = defined); names only, never values.
//! 2. Reports static errors: reading a local inside its own initializer,
//!    `return` outside a function, a value-carrying `return` inside an
//!    `init` method, `this` outside a class. Errors accumulate; the walk
//!    keeps going so one pass reports them all.
//! 3. Writes the scope distance of every variable occurrence into the AST
//!    node's depth cell: `Some(hops)` for a local, `None` for a reference
//!    that must be looked up by name in the globals frame at runtime.
//!
//! Redeclaring a name in a scope it already occupies is *not* an error; the
//! new binding simply replaces the old one, matching `Environment::define`.

use crate::error::VeeryError;
use crate::parser::{Expr, FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, info};
use std::cell::Cell;
use std::collections::HashMap;
use std::mem;

/// Are we inside a function body, and which kind? Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Are we inside a class body? Validates `this`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
}

/// Tracks scopes, enforces the static rules, and records binding distances
/// on the AST.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<VeeryError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements. Returns every static error found, or
    /// `Ok(())` when the program may proceed to execution.
    pub fn resolve(
        &mut self,
        statements: &[Stmt],
    ) -> std::result::Result<(), Vec<VeeryError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    fn error<S: Into<String>>(&mut self, line: usize, message: S) {
        self.errors.push(VeeryError::resolve(line, message));
    }

    // ─────────────────────── statement resolution ───────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define, so the initializer
                // sees the name as declared-but-unusable.
                self.declare(name);

                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }

                self.define(name);
            }

            Stmt::Function(declaration) => {
                // The name is visible inside its own body, enabling recursion.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword.line, "'return' used outside of function");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(
                            keyword.line,
                            "Cannot return a value from an initializer",
                        );
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Class { name, methods } => {
                let enclosing: ClassType = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                // Method bodies see `this` one scope out from their params.
                self.begin_scope();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert("this".to_string(), true);
                }

                for method in methods {
                    let function_type = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, function_type);
                }

                self.end_scope();

                self.current_class = enclosing;
            }
        }
    }

    // ─────────────────────── expression resolution ───────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { name, depth } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(
                            name.line,
                            "Cannot read local variable in its own initializer",
                        );
                    }
                }

                self.resolve_local(name, depth);
            }

            Expr::Assign { name, value, depth } => {
                // RHS first, then bind the target.
                self.resolve_expr(value);
                self.resolve_local(name, depth);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                // Property names are looked up dynamically on the instance;
                // only the receiver resolves statically.
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { keyword, depth } => {
                if self.current_class == ClassType::None {
                    self.error(keyword.line, "Cannot use 'this' outside of a class");
                    return;
                }

                self.resolve_local(keyword, depth);
            }
        }
    }

    // ───────────────────────── function helper ───────────────────────────

    /// Fresh scope pre-binding every parameter, then the body, with the
    /// enclosing function kind saved and restored around it.
    fn resolve_function(&mut self, declaration: &FunctionDecl, function_type: FunctionType) {
        let enclosing: FunctionType = self.current_function;
        self.current_function = function_type;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ───────────────────────── scope management ──────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Reserve `name` in the innermost scope. Redeclaration overwrites.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    // ─────────────────────── binding-distance helper ─────────────────────

    /// Record this occurrence as a local at some hop count, or leave it
    /// unresolved (global, looked up by name at runtime).
    fn resolve_local(&mut self, name: &Token, depth: &Cell<Option<usize>>) {
        for (hops, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, hops);

                depth.set(Some(hops));
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);

        depth.set(None);
    }
}
