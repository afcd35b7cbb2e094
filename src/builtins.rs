// ABOUTME: Built-in function table - the fixed set of natively implemented callables

use crate::error::EvalError;
use crate::object::{BuiltinFn, Object};
use crate::rca::{self, Handle};
use std::cell::RefCell;
use std::io::{self, Write};

fn arity_error(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::simple(format!(
        "'{}' expects {} argument(s), got {}",
        name, expected, got
    ))
}

/// Resolves a built-in by name. Used as the fallback step of identifier
/// lookup, once the scope chain has come up empty.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    Some(match name {
        "len" => len,
        "os" => os,
        "lib" => lib,
        "type_of" => type_of,
        "to_int" => to_int,
        "to_float" => to_float,
        "print" => print_fn,
        "println" => println_fn,
        "push" => push,
        "pop" => pop,
        "slice" => slice,
        "read_int" => read_int,
        "read_float" => read_float,
        "read_string" => read_string,
        _ => return None,
    })
}

/// Length of a string (bytes) or array (elements).
fn len(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("len", "1", args.len()));
    }
    let n = match &*args[0] {
        Object::Str(b) => b.borrow().len(),
        Object::Array(items) => items.borrow().len(),
        other => {
            return Err(EvalError::simple(format!(
                "len: unsupported type {}",
                other.type_name()
            )))
        }
    };
    Ok(rca::alloc(Object::Int(n as i64)))
}

/// Host operating system: `linux` or `darwin`.
fn os(args: &[Handle]) -> Result<Handle, EvalError> {
    if !args.is_empty() {
        return Err(arity_error("os", "0", args.len()));
    }
    let name = if cfg!(target_os = "macos") {
        "darwin"
    } else {
        "linux"
    };
    Ok(rca::alloc(Object::Str(RefCell::new(name.as_bytes().to_vec()))))
}

/// Loads a shared library by path.
fn lib(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("lib", "1", args.len()));
    }
    let path = match &*args[0] {
        Object::Str(b) => String::from_utf8_lossy(&b.borrow()).into_owned(),
        other => {
            return Err(EvalError::simple(format!(
                "lib: expected a string path, got {}",
                other.type_name()
            )))
        }
    };
    crate::ffi::load_library(&path)
}

/// Type name of a value; a struct-value reports its struct's own name.
fn type_of(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("type_of", "1", args.len()));
    }
    let name = args[0].type_of_name();
    Ok(rca::alloc(Object::Str(RefCell::new(name.into_bytes()))))
}

/// Converts an int, float, or bool to an int.
fn to_int(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("to_int", "1", args.len()));
    }
    let n = match &*args[0] {
        Object::Int(n) => *n,
        Object::Float(f) => *f as i64,
        Object::Bool(b) => *b as i64,
        other => {
            return Err(EvalError::simple(format!(
                "to_int: cannot convert {}",
                other.type_name()
            )))
        }
    };
    Ok(rca::alloc(Object::Int(n)))
}

/// Converts an int or float to a float.
fn to_float(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("to_float", "1", args.len()));
    }
    let n = match &*args[0] {
        Object::Float(f) => *f,
        Object::Int(n) => *n as f64,
        other => {
            return Err(EvalError::simple(format!(
                "to_float: cannot convert {}",
                other.type_name()
            )))
        }
    };
    Ok(rca::alloc(Object::Float(n)))
}

/// Writes each argument's display form to stdout, with no separator.
fn print_fn(args: &[Handle]) -> Result<Handle, EvalError> {
    let mut out = io::stdout();
    for a in args {
        let _ = write!(out, "{}", a.display());
    }
    let _ = out.flush();
    Ok(crate::object::null_obj())
}

/// As `print`, then a trailing newline.
fn println_fn(args: &[Handle]) -> Result<Handle, EvalError> {
    print_fn(args)?;
    println!();
    Ok(crate::object::null_obj())
}

/// Appends a value to an array in place, returning the array.
fn push(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 2 {
        return Err(arity_error("push", "2", args.len()));
    }
    match &*args[0] {
        Object::Array(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(args[0].clone())
        }
        other => Err(EvalError::simple(format!(
            "push: expected an array, got {}",
            other.type_name()
        ))),
    }
}

/// Removes the last element of an array in place, returning the array.
fn pop(args: &[Handle]) -> Result<Handle, EvalError> {
    if args.len() != 1 {
        return Err(arity_error("pop", "1", args.len()));
    }
    match &*args[0] {
        Object::Array(items) => {
            if items.borrow_mut().pop().is_none() {
                return Err(EvalError::simple("pop: array is empty"));
            }
            Ok(args[0].clone())
        }
        other => Err(EvalError::simple(format!(
            "pop: expected an array, got {}",
            other.type_name()
        ))),
    }
}

/// Copies a whole array (1 argument), or a `[start, end)` slice of it (3
/// arguments); requires `start >= 0`, `end <= len`, `start < end`.
fn slice(args: &[Handle]) -> Result<Handle, EvalError> {
    let items = match args.first().map(|h| &**h) {
        Some(Object::Array(items)) => items,
        Some(other) => {
            return Err(EvalError::simple(format!(
                "slice: expected an array, got {}",
                other.type_name()
            )))
        }
        None => return Err(arity_error("slice", "1 or 3", args.len())),
    };
    let borrowed = items.borrow();
    let copy: Vec<Handle> = match args.len() {
        1 => borrowed.clone(),
        3 => {
            let start = args[1]
                .as_int()
                .ok_or_else(|| EvalError::simple("slice: start must be an int"))?;
            let end = args[2]
                .as_int()
                .ok_or_else(|| EvalError::simple("slice: end must be an int"))?;
            if start < 0 || end as usize > borrowed.len() || start >= end {
                return Err(EvalError::simple("slice: invalid bounds"));
            }
            borrowed[start as usize..end as usize].to_vec()
        }
        n => return Err(arity_error("slice", "1 or 3", n)),
    };
    Ok(rca::alloc(Object::Array(RefCell::new(copy))))
}

fn read_line() -> Result<String, EvalError> {
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|e| EvalError::simple(format!("failed to read from stdin: {}", e)))?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Reads a line from stdin and parses it as an int.
fn read_int(args: &[Handle]) -> Result<Handle, EvalError> {
    if !args.is_empty() {
        return Err(arity_error("read_int", "0", args.len()));
    }
    let line = read_line()?;
    let n: i64 = line
        .trim()
        .parse()
        .map_err(|_| EvalError::simple("read_int: not an integer"))?;
    Ok(rca::alloc(Object::Int(n)))
}

/// Reads a line from stdin and parses it as a float.
fn read_float(args: &[Handle]) -> Result<Handle, EvalError> {
    if !args.is_empty() {
        return Err(arity_error("read_float", "0", args.len()));
    }
    let line = read_line()?;
    let n: f64 = line
        .trim()
        .parse()
        .map_err(|_| EvalError::simple("read_float: not a float"))?;
    Ok(rca::alloc(Object::Float(n)))
}

/// Reads a line from stdin verbatim.
fn read_string(args: &[Handle]) -> Result<Handle, EvalError> {
    if !args.is_empty() {
        return Err(arity_error("read_string", "0", args.len()));
    }
    let line = read_line()?;
    Ok(rca::alloc(Object::Str(RefCell::new(line.into_bytes()))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn len_reports_string_byte_length() {
        let s = rca::alloc(Object::Str(RefCell::new(b"abc".to_vec())));
        let result = len(&[s]).unwrap();
        assert_eq!(result.as_int(), Some(3));
    }

    #[test]
    fn len_rejects_unsupported_types() {
        let n = rca::alloc(Object::Int(1));
        assert!(len(&[n]).is_err());
    }

    #[test]
    fn push_and_pop_mutate_the_same_array() {
        let arr = rca::alloc(Object::Array(RefCell::new(vec![rca::alloc(Object::Int(1))])));
        let pushed = push(&[arr.clone(), rca::alloc(Object::Int(2))]).unwrap();
        assert!(Handle::ptr_eq(&pushed, &arr));
        match &*arr {
            Object::Array(items) => assert_eq!(items.borrow().len(), 2),
            _ => unreachable!(),
        }
        pop(&[arr.clone()]).unwrap();
        match &*arr {
            Object::Array(items) => assert_eq!(items.borrow().len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn slice_with_three_args_validates_bounds() {
        let arr = rca::alloc(Object::Array(RefCell::new(vec![
            rca::alloc(Object::Int(0)),
            rca::alloc(Object::Int(1)),
            rca::alloc(Object::Int(2)),
        ])));
        let start = rca::alloc(Object::Int(0));
        let end = rca::alloc(Object::Int(2));
        let result = slice(&[arr, start, end]).unwrap();
        match &*result {
            Object::Array(items) => assert_eq!(items.borrow().len(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn slice_rejects_start_not_less_than_end() {
        let arr = rca::alloc(Object::Array(RefCell::new(vec![rca::alloc(Object::Int(0))])));
        let start = rca::alloc(Object::Int(1));
        let end = rca::alloc(Object::Int(1));
        assert!(slice(&[arr, start, end]).is_err());
    }

    #[test]
    fn to_int_truncates_floats() {
        let f = rca::alloc(Object::Float(3.9));
        assert_eq!(to_int(&[f]).unwrap().as_int(), Some(3));
    }

    #[test]
    fn type_of_reports_struct_name_for_struct_values() {
        let st = rca::alloc(Object::StructType(crate::object::StructTypeObj {
            name: "Point".to_string(),
            fields: vec![],
        }));
        let sv = rca::alloc(Object::StructValue(crate::object::StructValueObj {
            struct_type: st,
            fields: RefCell::new(std::collections::HashMap::new()),
        }));
        let result = type_of(&[sv]).unwrap();
        match &*result {
            Object::Str(b) => assert_eq!(&*b.borrow(), b"Point"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn lookup_resolves_all_builtin_names() {
        for name in [
            "len", "os", "lib", "type_of", "to_int", "to_float", "print", "println", "push",
            "pop", "slice", "read_int", "read_float", "read_string",
        ] {
            assert!(lookup(name).is_some(), "missing builtin '{}'", name);
        }
        assert!(lookup("not_a_builtin").is_none());
    }
}
