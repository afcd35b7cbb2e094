// ABOUTME: Foreign-function bridge - loads shared libraries and invokes their exported C functions
//
// Marshalling: int -> c int, float -> c double, bool -> c int,
// string -> char*. Struct-values are not marshalled. Built on libffi's
// `middle` layer rather than the raw ffi_cif/ffi_call API: the middle
// layer already builds the parallel type/value arrays a raw libffi
// caller would hand-assemble.

use crate::ast::{ExternArgType, TypeName};
use crate::error::EvalError;
use crate::object::{self, ExternalFunctionObj, ExternalLibraryObj, Object};
use crate::rca::{self, Handle};
use libffi::middle::{Arg, Cif, CodePtr, Type};
use std::cell::RefCell;
use std::ffi::{c_void, CStr, CString};
use std::os::raw::{c_char, c_int};

/// Opens a shared library by path. The handle is leaked deliberately and
/// lives until process exit.
pub fn load_library(path: &str) -> Result<Handle, EvalError> {
    let lib = unsafe { libloading::Library::new(path) }
        .map_err(|e| EvalError::simple(format!("cannot load library '{}': {}", path, e)))?;
    let leaked: &'static libloading::Library = Box::leak(Box::new(lib));
    Ok(rca::alloc(Object::ExternalLibrary(ExternalLibraryObj {
        path: path.to_string(),
        library: leaked,
    })))
}

/// Resolves `symbol` in `library`, producing an external-function Object
/// that records the native pointer and the declared signature.
pub fn resolve_symbol(
    library: &ExternalLibraryObj,
    symbol: &str,
    arg_types: Vec<ExternArgType>,
    return_type: TypeName,
) -> Result<Handle, EvalError> {
    let pointer = unsafe {
        library
            .library
            .get::<*const c_void>(symbol.as_bytes())
            .map(|sym| *sym)
    }
    .map_err(|e| EvalError::simple(format!("symbol '{}' not found: {}", symbol, e)))?;

    Ok(rca::alloc(Object::ExternalFunction(ExternalFunctionObj {
        name: symbol.to_string(),
        library_name: library.path.clone(),
        pointer,
        arg_types,
        return_type,
    })))
}

fn ffi_type_of(t: TypeName) -> Type {
    match t {
        TypeName::Int => Type::c_int(),
        TypeName::Float => Type::f64(),
        TypeName::Bool => Type::c_int(),
        TypeName::String => Type::pointer(),
        TypeName::Void => Type::void(),
    }
}

/// Marshalled storage for one evaluated argument, kept alive until after
/// the call so the pointers handed to libffi stay valid.
enum Storage {
    CInt(c_int),
    Double(f64),
    CStr(CString),
}

fn marshal(arg: &Handle, declared: Option<TypeName>) -> Result<Storage, EvalError> {
    match (&**arg, declared) {
        (Object::Int(n), Some(TypeName::Int) | None) => Ok(Storage::CInt(*n as c_int)),
        (Object::Float(n), Some(TypeName::Float) | None) => Ok(Storage::Double(*n)),
        (Object::Bool(b), Some(TypeName::Bool) | None) => {
            Ok(Storage::CInt(if *b { 1 } else { 0 }))
        }
        (Object::Str(bytes), Some(TypeName::String) | None) => {
            let s = String::from_utf8_lossy(&bytes.borrow()).into_owned();
            let cstr = CString::new(s)
                .map_err(|_| EvalError::simple("string argument contains an embedded NUL byte"))?;
            Ok(Storage::CStr(cstr))
        }
        (Object::StructValue(_), _) => Err(EvalError::simple(
            "passing struct-values to extern functions is not supported",
        )),
        (other, Some(expected)) => Err(EvalError::simple(format!(
            "extern argument type mismatch: expected {}, got {}",
            expected,
            other.type_name()
        ))),
        (other, None) => Err(EvalError::simple(format!(
            "unsupported extern variadic argument type {}",
            other.type_name()
        ))),
    }
}

fn ffi_type_of_storage(s: &Storage) -> Type {
    match s {
        Storage::CInt(_) => Type::c_int(),
        Storage::Double(_) => Type::f64(),
        Storage::CStr(_) => Type::pointer(),
    }
}

/// Invokes the resolved native function: arity/variadic check,
/// per-argument marshalling, call, and return-value
/// unmarshalling.
pub fn call(f: &ExternalFunctionObj, args: &[Handle]) -> Result<Handle, EvalError> {
    let is_variadic = matches!(f.arg_types.last(), Some(ExternArgType::Variadic));
    let fixed_count = if is_variadic {
        f.arg_types.len() - 1
    } else {
        f.arg_types.len()
    };

    if is_variadic {
        if args.len() < fixed_count {
            return Err(EvalError::simple(format!(
                "'{}' expects at least {} argument(s), got {}",
                f.name,
                fixed_count,
                args.len()
            )));
        }
    } else if args.len() != fixed_count {
        return Err(EvalError::simple(format!(
            "'{}' expects {} argument(s), got {}",
            f.name,
            fixed_count,
            args.len()
        )));
    }

    let mut storage = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let declared = f.arg_types.get(i).and_then(|t| match t {
            ExternArgType::Concrete(t) => Some(*t),
            ExternArgType::Variadic => None,
        });
        storage.push(marshal(arg, declared)?);
    }

    // Raw pointers into `storage`'s owned CStrings, bound to a named Vec so
    // they outlive the `Arg` values that reference them.
    let ptrs: Vec<*const c_char> = storage
        .iter()
        .map(|s| match s {
            Storage::CStr(cs) => cs.as_ptr(),
            _ => std::ptr::null(),
        })
        .collect();

    let ffi_args: Vec<Arg> = storage
        .iter()
        .zip(ptrs.iter())
        .map(|(s, ptr)| match s {
            Storage::CInt(n) => Arg::new(n),
            Storage::Double(n) => Arg::new(n),
            Storage::CStr(_) => Arg::new(ptr),
        })
        .collect();

    let fixed_types: Vec<Type> = f
        .arg_types
        .iter()
        .filter_map(|t| match t {
            ExternArgType::Concrete(t) => Some(ffi_type_of(*t)),
            ExternArgType::Variadic => None,
        })
        .collect();

    let ret_ty = ffi_type_of(f.return_type);
    let code_ptr = unsafe { CodePtr::from_ptr(f.pointer) };

    unsafe {
        if is_variadic {
            let mut all_types = fixed_types;
            all_types.extend(storage[fixed_count..].iter().map(ffi_type_of_storage));
            let cif = Cif::new_variadic(all_types, fixed_count, ret_ty);
            invoke(&cif, code_ptr, &ffi_args, f.return_type)
        } else {
            let cif = Cif::new(fixed_types, ret_ty);
            invoke(&cif, code_ptr, &ffi_args, f.return_type)
        }
    }
}

unsafe fn invoke(
    cif: &Cif,
    code: CodePtr,
    args: &[Arg],
    ret: TypeName,
) -> Result<Handle, EvalError> {
    match ret {
        TypeName::Void => {
            cif.call::<()>(code, args);
            Ok(object::null_obj())
        }
        TypeName::Int => {
            let v: c_int = cif.call(code, args);
            Ok(rca::alloc(Object::Int(v as i64)))
        }
        TypeName::Float => {
            let v: f64 = cif.call(code, args);
            Ok(rca::alloc(Object::Float(v)))
        }
        TypeName::Bool => {
            let v: c_int = cif.call(code, args);
            Ok(object::bool_obj(v != 0))
        }
        TypeName::String => {
            let v: *const c_char = cif.call(code, args);
            if v.is_null() {
                Ok(object::null_obj())
            } else {
                let s = CStr::from_ptr(v).to_string_lossy().into_owned();
                Ok(rca::alloc(Object::Str(RefCell::new(s.into_bytes()))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeName;

    #[test]
    fn load_library_reports_a_detailed_free_error_for_missing_paths() {
        let err = load_library("/no/such/library.so").unwrap_err();
        assert!(!err.is_detailed());
        assert!(err.message().contains("cannot load library"));
    }

    #[test]
    fn marshal_rejects_struct_values() {
        let h = rca::alloc(Object::StructValue(crate::object::StructValueObj {
            struct_type: rca::alloc(Object::Null),
            fields: RefCell::new(std::collections::HashMap::new()),
        }));
        let err = marshal(&h, Some(TypeName::Int)).unwrap_err();
        assert!(err.message().contains("not supported"));
    }

    #[test]
    fn marshal_accepts_a_matching_int_argument() {
        let h = rca::alloc(Object::Int(42));
        assert!(marshal(&h, Some(TypeName::Int)).is_ok());
    }

    #[test]
    fn marshal_rejects_a_type_mismatched_argument() {
        let h = rca::alloc(Object::Bool(true));
        let err = marshal(&h, Some(TypeName::Int)).unwrap_err();
        assert!(err.message().contains("mismatch"));
    }
}
