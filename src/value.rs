//! Runtime values and the callable variants dispatched at invocation time.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{Result, VeeryError};
use crate::parser::FunctionDecl;
use crate::token::Token;

/// Host-provided operation backing a native callable.
pub type NativeFn = fn(&[Value]) -> std::result::Result<Value, String>;

/// Any value a Veery program can produce or store.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),

    /// Host-registered callable with a fixed arity.
    NativeFunction {
        name: String,
        arity: usize,
        func: NativeFn,
    },

    /// User-defined function or bound method.
    Function(Rc<Function>),

    /// Class object; calling it constructs an instance.
    Class(Rc<Class>),

    /// Instance of a class, with its own mutable field map.
    Instance(Rc<RefCell<Instance>>),
}

impl PartialEq for Value {
    /// Equality never raises: a value equals only a value of the same variant
    /// with equal content. Callables, classes, and instances compare by
    /// identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (
                Value::NativeFunction { func: a, .. },
                Value::NativeFunction { func: b, .. },
            ) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // 3.0 prints as "3", 3.14 as-is
                if n.fract() == 0.0 && n.is_finite() {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(function) => {
                write!(f, "<fn {}>", function.declaration.name.lexeme)
            }

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

/// A user-defined function: its declaration shared with the AST, plus the
/// environment frame that was active when the declaration executed. Multiple
/// function values may share one closure frame.
pub struct Function {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,

    /// `init` methods always yield the instance, never an explicit value.
    pub is_initializer: bool,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a method bound to `instance`: a copy of this function whose
    /// closure is a one-binding frame mapping `this` to the instance.
    pub fn bind(&self, instance: Value) -> Function {
        let env = Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(
            &self.closure,
        ))));

        env.borrow_mut().define("this", instance);

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: env,
            is_initializer: self.is_initializer,
        }
    }
}

// Closure frames can reach back to the function that owns them, so a derived
// Debug would recurse forever. Print the identity only.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.declaration.name.lexeme)
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

/// A class object: a name and its method table. Duplicate method names are
/// last-write-wins, like every other binding in the language.
pub struct Class {
    pub name: String,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    /// Constructor arity: the `init` method's arity, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Instance state: the owning class plus a mutable field map.
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property lookup: fields shadow methods; a method hit is bound to the
    /// instance before being returned.
    pub fn get(instance: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method: Option<Rc<Function>> = instance.borrow().class.find_method(&name.lexeme);

        if let Some(method) = method {
            let bound: Function = method.bind(Value::Instance(Rc::clone(instance)));

            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(VeeryError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Property write. Creates the field if absent.
    pub fn set(instance: &Rc<RefCell<Instance>>, name: &Token, value: Value) {
        instance
            .borrow_mut()
            .fields
            .insert(name.lexeme.clone(), value);
    }
}

// Fields may contain the instance itself; identity is enough for logs.
impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.len())
            .finish()
    }
}
