// ABOUTME: Runtime object model - the tagged union every evaluated value belongs to

use crate::ast::{ExternArgType, Stmt, TypeName};
use crate::rca::{self, Handle};
use crate::scope::Scope;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;

pub type BuiltinFn = fn(&[Handle]) -> Result<Handle, crate::error::EvalError>;

#[derive(Debug)]
pub struct StructTypeObj {
    pub name: String,
    /// Ordered, unique field declarations as written in the `struct` statement.
    pub fields: Vec<(String, TypeName)>,
}

#[derive(Debug)]
pub struct StructValueObj {
    pub struct_type: Handle,
    pub fields: RefCell<HashMap<String, Handle>>,
}

#[derive(Debug)]
pub struct FunctionObj {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    /// Strong: a returned closure must keep its defining scope alive after
    /// the call that created it returns. A function stored back into its
    /// own defining scope does create an Rc cycle (scope -> function ->
    /// scope); per spec.md's §9 discussion, the RCA does not chase cycles,
    /// so such a scope simply outlives the program (leaked, not corrupted).
    pub closure: Rc<Scope>,
}

#[derive(Debug)]
pub struct ExternalFunctionObj {
    pub name: String,
    pub library_name: String,
    pub pointer: *const c_void,
    pub arg_types: Vec<ExternArgType>,
    pub return_type: TypeName,
}

#[derive(Debug)]
pub struct ExternalLibraryObj {
    pub path: String,
    /// Leaked deliberately: dynamic-library handles are opened on demand
    /// and never closed until process exit, so the handle must outlive
    /// ordinary Rc-governed Object lifetimes.
    pub library: &'static libloading::Library,
}

#[derive(Debug)]
pub enum Object {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(RefCell<Vec<u8>>),
    Array(RefCell<Vec<Handle>>),
    StructType(StructTypeObj),
    StructValue(StructValueObj),
    /// One-shot carrier for a `return` statement; unwinds enclosing blocks
    /// until a call frame unwraps it. Never user-visible.
    ReturnValue(Handle),
    SimpleError(String),
    DetailedError(String),
    Function(FunctionObj),
    BuiltIn(BuiltinFn),
    ExternalFunction(ExternalFunctionObj),
    ExternalLibrary(ExternalLibraryObj),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Int(_) => "int",
            Object::Float(_) => "float",
            Object::Bool(_) => "bool",
            Object::Str(_) => "string",
            Object::Array(_) => "array",
            Object::StructType(_) => "struct-type",
            Object::StructValue(_) => "struct-value",
            Object::ReturnValue(_) => "return-value",
            Object::SimpleError(_) | Object::DetailedError(_) => "error",
            Object::Function(_) => "function",
            Object::BuiltIn(_) => "builtin-function",
            Object::ExternalFunction(_) => "external-function",
            Object::ExternalLibrary(_) => "external-library",
        }
    }

    /// The name the `type_of` builtin reports: the struct's own name for a
    /// struct-value, and `type_name()` for everything else.
    pub fn type_of_name(&self) -> String {
        match self {
            Object::StructValue(s) => match &*s.struct_type {
                Object::StructType(t) => t.name.clone(),
                _ => self.type_name().to_string(),
            },
            other => other.type_name().to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::SimpleError(_) | Object::DetailedError(_))
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Bool(false) | Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Object::Null => "null".to_string(),
            Object::Int(n) => n.to_string(),
            Object::Float(n) => n.to_string(),
            Object::Bool(b) => b.to_string(),
            Object::Str(bytes) => String::from_utf8_lossy(&bytes.borrow()).into_owned(),
            Object::Array(items) => {
                let rendered: Vec<String> = items.borrow().iter().map(|h| h.display()).collect();
                format!("[{}]", rendered.join(", "))
            }
            Object::StructType(t) => format!("<struct-type {}>", t.name),
            Object::StructValue(s) => {
                let name = match &*s.struct_type {
                    Object::StructType(t) => t.name.clone(),
                    _ => "?".to_string(),
                };
                let fields = s.fields.borrow();
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.display()))
                    .collect();
                format!("{} {{{}}}", name, rendered.join(", "))
            }
            Object::ReturnValue(h) => h.display(),
            Object::SimpleError(m) | Object::DetailedError(m) => m.clone(),
            Object::Function(f) => format!("<function {}>", f.name.as_deref().unwrap_or("anon")),
            Object::BuiltIn(_) => "<builtin>".to_string(),
            Object::ExternalFunction(f) => format!("<external-function {}>", f.name),
            Object::ExternalLibrary(l) => format!("<external-library {}>", l.path),
        }
    }
}

/// Builds the three immortal singleton handles. Allocated once per thread
/// and never registered with the RCA registry.
pub fn null_obj() -> Handle {
    thread_local! {
        static NULL: Handle = rca::alloc(Object::Null);
    }
    NULL.with(|h| h.clone())
}

pub fn true_obj() -> Handle {
    thread_local! {
        static TRUE: Handle = rca::alloc(Object::Bool(true));
    }
    TRUE.with(|h| h.clone())
}

pub fn false_obj() -> Handle {
    thread_local! {
        static FALSE: Handle = rca::alloc(Object::Bool(false));
    }
    FALSE.with(|h| h.clone())
}

pub fn bool_obj(b: bool) -> Handle {
    if b {
        true_obj()
    } else {
        false_obj()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_stable_across_calls() {
        let a = null_obj();
        let b = null_obj();
        assert!(Handle::ptr_eq(&a, &b));
    }

    #[test]
    fn bool_obj_picks_the_right_singleton() {
        assert!(Handle::ptr_eq(&bool_obj(true), &true_obj()));
        assert!(Handle::ptr_eq(&bool_obj(false), &false_obj()));
    }

    #[test]
    fn display_formats_arrays_and_structs() {
        let arr = rca::alloc(Object::Array(RefCell::new(vec![
            rca::alloc(Object::Int(1)),
            rca::alloc(Object::Int(2)),
        ])));
        assert_eq!(arr.display(), "[1, 2]");
    }

    #[test]
    fn is_truthy_matches_the_unary_not_table() {
        assert!(!Object::Bool(false).is_truthy());
        assert!(!Object::Null.is_truthy());
        assert!(Object::Int(0).is_truthy());
        assert!(Object::Bool(true).is_truthy());
    }
}
