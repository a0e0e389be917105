use std::{collections::HashMap, fmt, rc::Rc};

use dyn_clone::DynClone;

use crate::{
    ast::Stmt,
    error::Result,
    scope::{Scope, ScopeRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Number,
    Boolean,
    Object,
    Function,
    NativeFunction,
    Variable,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Null => "null",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Object => "object",
            ValueKind::Function => "function",
            ValueKind::NativeFunction => "native function",
            ValueKind::Variable => "variable",
        })
    }
}

/// A callable implemented by the host rather than in script source.
pub trait NativeFunction: DynClone {
    fn name(&self) -> &str;

    fn call(&self, args: Vec<RuntimeValue>, scope: &Scope) -> Result<RuntimeValue>;
}

dyn_clone::clone_trait_object!(NativeFunction);

/// A function declared in script source, closed over the scope it was
/// declared in. The scope is held weakly since it usually binds this very
/// function.
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub name: String,
    pub params: Rc<[String]>,
    pub declaration_scope: ScopeRef,
    pub body: Rc<[Stmt]>,
}

#[derive(Clone)]
pub enum RuntimeValue {
    Null,
    Number(f64),
    Boolean(bool),
    Object(HashMap<String, RuntimeValue>),
    Function(FunctionValue),
    NativeFunction(Box<dyn NativeFunction>),
}

impl RuntimeValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            RuntimeValue::Null => ValueKind::Null,
            RuntimeValue::Number(_) => ValueKind::Number,
            RuntimeValue::Boolean(_) => ValueKind::Boolean,
            RuntimeValue::Object(_) => ValueKind::Object,
            RuntimeValue::Function(_) => ValueKind::Function,
            RuntimeValue::NativeFunction(_) => ValueKind::NativeFunction,
        }
    }

    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, RuntimeValue)>) -> Self {
        RuntimeValue::Object(
            properties
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RuntimeValue::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuntimeValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            RuntimeValue::Boolean(boolean) => Some(*boolean),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, RuntimeValue>> {
        match self {
            RuntimeValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            RuntimeValue::Function(function) => Some(function),
            _ => None,
        }
    }
}

impl fmt::Debug for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Null => f.write_str("Null"),
            RuntimeValue::Number(number) => f.debug_tuple("Number").field(number).finish(),
            RuntimeValue::Boolean(boolean) => f.debug_tuple("Boolean").field(boolean).finish(),
            RuntimeValue::Object(map) => f.debug_tuple("Object").field(map).finish(),
            RuntimeValue::Function(function) => fmt::Debug::fmt(function, f),
            RuntimeValue::NativeFunction(native) => {
                f.debug_tuple("NativeFunction").field(&native.name()).finish()
            }
        }
    }
}

impl PartialEq for RuntimeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Number(left), Self::Number(right)) => left == right,
            (Self::Boolean(left), Self::Boolean(right)) => left == right,
            (Self::Object(left), Self::Object(right)) => left == right,
            // functions are never equal
            _ => false,
        }
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeValue::Null => f.write_str("null"),
            RuntimeValue::Number(number) => write!(f, "{}", number),
            RuntimeValue::Boolean(boolean) => write!(f, "{}", boolean),
            RuntimeValue::Object(map) => {
                write!(
                    f,
                    "{{{}}}",
                    map.iter()
                        .map(|(key, value)| format!("\"{}\": {}", key, value))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            RuntimeValue::Function(function) => {
                write!(f, "[Function: {}({})]", function.name, function.params.join(", "))
            }
            RuntimeValue::NativeFunction(native) => {
                write!(f, "[Native Function: {}]", native.name())
            }
        }
    }
}

/// A named slot in a scope. Bindings live only inside scope storage and are
/// never the result of evaluating an expression.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub value: Box<RuntimeValue>,
    pub constant: bool,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: RuntimeValue, constant: bool) -> Self {
        Binding {
            name: name.into(),
            value: Box::new(value),
            constant,
        }
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::Variable
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.constant { "const" } else { "mut" };
        write!(f, "{} {} = {}", keyword, self.name, self.value)
    }
}
