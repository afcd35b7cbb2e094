// ABOUTME: Tree-walking evaluator - executes a parsed Program against a Scope chain

use crate::ast::{BinaryOp, Expr, ExprKind, Program, Stmt, StmtKind, StructFieldInit, TypeName, UnaryOp};
use crate::builtins;
use crate::error::EvalError;
use crate::ffi;
use crate::lexer::Lexer;
use crate::object::{self, FunctionObj, Object, StructValueObj};
use crate::rca::{self, Handle};
use crate::scope::Scope;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Walks a Program against a Scope chain, producing the last evaluated
/// value or propagating the first error encountered.
///
/// Holds the Lexer that produced the Program purely for diagnostics: every
/// public entry point promotes a `Simple` error to `Detailed` using the
/// current node's Location before it escapes, so callers only ever see
/// already-located messages.
pub struct Evaluator<'a> {
    lexer: &'a Lexer,
}

impl<'a> Evaluator<'a> {
    pub fn new(lexer: &'a Lexer) -> Self {
        Evaluator { lexer }
    }

    pub fn eval_program(&self, program: &Program, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        self.eval_block(program, scope)
    }

    fn eval_block(&self, stmts: &[Stmt], scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let mut last = object::null_obj();
        for stmt in stmts {
            last = self.eval_stmt(stmt, scope)?;
            if matches!(&*last, Object::ReturnValue(_)) {
                return Ok(last);
            }
        }
        Ok(last)
    }

    fn eval_stmt(&self, stmt: &Stmt, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        self.eval_stmt_inner(stmt, scope)
            .map_err(|e| e.promote(self.lexer, stmt.loc))
    }

    fn eval_stmt_inner(&self, stmt: &Stmt, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        match &stmt.kind {
            StmtKind::Let { name, init } => {
                check_fresh_binding(scope, name)?;
                let v = self.eval_expr(init, scope)?;
                scope.set(name.clone(), v.clone());
                Ok(v)
            }
            StmtKind::StructDecl { name, fields } => {
                check_fresh_binding(scope, name)?;
                let mut decl_fields = Vec::with_capacity(fields.len());
                for f in fields {
                    let t = type_name_from_str(&f.type_name).ok_or_else(|| {
                        EvalError::simple(format!("unknown field type '{}'", f.type_name))
                    })?;
                    decl_fields.push((f.name.clone(), t));
                }
                let handle = rca::alloc(Object::StructType(crate::object::StructTypeObj {
                    name: name.clone(),
                    fields: decl_fields,
                }));
                scope.set(name.clone(), handle);
                Ok(object::null_obj())
            }
            StmtKind::Return(value) => {
                let v = match value {
                    Some(e) => self.eval_expr(e, scope)?,
                    None => object::null_obj(),
                };
                Ok(rca::alloc(Object::ReturnValue(v)))
            }
            StmtKind::Block(stmts) => {
                let child = Scope::child(scope);
                self.eval_block(stmts, &child)
            }
            StmtKind::If {
                cond,
                consequence,
                alternative,
            } => {
                let c = self.eval_expr(cond, scope)?;
                let c = c.as_bool().ok_or_else(|| {
                    EvalError::simple(format!(
                        "if condition must be boolean, got {}",
                        c.type_name()
                    ))
                })?;
                if c {
                    let child = Scope::child(scope);
                    self.eval_block(consequence, &child)
                } else if let Some(alt) = alternative {
                    let child = Scope::child(scope);
                    self.eval_block(alt, &child)
                } else {
                    Ok(object::null_obj())
                }
            }
            StmtKind::For {
                init,
                cond,
                post,
                body,
            } => self.eval_for(init.as_deref(), cond.as_ref(), post.as_deref(), body, scope),
            StmtKind::FuncDecl { name, params, body } => {
                check_fresh_binding(scope, name)?;
                let f = FunctionObj {
                    name: Some(name.clone()),
                    params: params.iter().map(|p| p.name.clone()).collect(),
                    body: Rc::new(body.clone()),
                    closure: Rc::clone(scope),
                };
                scope.set(name.clone(), rca::alloc(Object::Function(f)));
                Ok(object::null_obj())
            }
            StmtKind::ExternDecl {
                library,
                function,
                arg_types,
                return_type,
            } => {
                check_fresh_binding(scope, function)?;
                let lib_handle = scope
                    .get(library)
                    .ok_or_else(|| EvalError::simple(format!("undefined identifier '{}'", library)))?;
                match &*lib_handle {
                    Object::ExternalLibrary(lib_obj) => {
                        let f = ffi::resolve_symbol(
                            lib_obj,
                            function,
                            arg_types.clone(),
                            *return_type,
                        )?;
                        scope.set(function.clone(), f);
                        Ok(object::null_obj())
                    }
                    other => Err(EvalError::simple(format!(
                        "'{}' is not an external library, got {}",
                        library,
                        other.type_name()
                    ))),
                }
            }
            StmtKind::ExprStmt(e) => self.eval_expr(e, scope),
        }
    }

    /// The loop header owns `init`'s binding; every iteration gets its own
    /// fresh child scope so a closure captured inside the body sees that
    /// iteration's value rather than the final one.
    fn eval_for(
        &self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &[Stmt],
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let header_scope = Scope::child(scope);
        if let Some(init_stmt) = init {
            self.eval_stmt(init_stmt, &header_scope)?;
        }
        loop {
            if let Some(c) = cond {
                let cv = self.eval_expr(c, &header_scope)?;
                let keep_going = match &*cv {
                    Object::Null => false,
                    Object::Bool(b) => *b,
                    other => {
                        return Err(EvalError::simple(format!(
                            "for condition must be boolean, got {}",
                            other.type_name()
                        )))
                    }
                };
                if !keep_going {
                    break;
                }
            }
            let iter_scope = Scope::child(&header_scope);
            let result = self.eval_block(body, &iter_scope)?;
            if matches!(&*result, Object::ReturnValue(_)) {
                return Ok(result);
            }
            if let Some(p) = post {
                self.eval_stmt(p, &header_scope)?;
            }
        }
        Ok(object::null_obj())
    }

    fn eval_expr(&self, expr: &Expr, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        self.eval_expr_inner(expr, scope)
            .map_err(|e| e.promote(self.lexer, expr.loc))
    }

    fn eval_expr_inner(&self, expr: &Expr, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        match &expr.kind {
            ExprKind::Identifier(name) => {
                if let Some(v) = scope.get(name) {
                    return Ok(v);
                }
                if let Some(f) = builtins::lookup(name) {
                    return Ok(rca::alloc(Object::BuiltIn(f)));
                }
                Err(EvalError::simple(format!("undefined identifier '{}'", name)))
            }
            ExprKind::Null => Ok(object::null_obj()),
            ExprKind::Int(n) => Ok(rca::alloc(Object::Int(*n))),
            ExprKind::Float(n) => Ok(rca::alloc(Object::Float(*n))),
            ExprKind::Bool(b) => Ok(object::bool_obj(*b)),
            ExprKind::Str(s) => Ok(rca::alloc(Object::Str(RefCell::new(s.clone().into_bytes())))),
            ExprKind::Array(items) => {
                let mut vals = Vec::with_capacity(items.len());
                for it in items {
                    vals.push(self.eval_expr(it, scope)?);
                }
                Ok(rca::alloc(Object::Array(RefCell::new(vals))))
            }
            ExprKind::StructLiteral {
                struct_name,
                fields,
            } => self.eval_struct_literal(struct_name, fields, scope),
            ExprKind::Unary { op, operand } => self.eval_unary(*op, operand, scope),
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            ExprKind::Assign { target, value } => self.eval_assign(target, value, scope),
            ExprKind::CompoundAssign { op, target, value } => {
                self.eval_compound_assign(*op, target, value, scope)
            }
            ExprKind::Call { callee, args } => self.eval_call(callee, args, scope),
            ExprKind::Index { indexee, index } => self.eval_index(indexee, index, scope),
            ExprKind::Member { value, field } => self.eval_member(value, field, scope),
        }
    }

    fn eval_struct_literal(
        &self,
        struct_name: &str,
        fields: &[StructFieldInit],
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let st_handle = scope.get(struct_name).ok_or_else(|| {
            EvalError::simple(format!("undefined struct type '{}'", struct_name))
        })?;
        let st = match &*st_handle {
            Object::StructType(t) => t,
            other => {
                return Err(EvalError::simple(format!(
                    "'{}' is not a struct type, got {}",
                    struct_name,
                    other.type_name()
                )))
            }
        };
        if fields.len() != st.fields.len() {
            return Err(EvalError::simple(format!(
                "struct literal for '{}' does not match its field count",
                struct_name
            )));
        }
        // Fields are evaluated in the order written in the literal, not the
        // struct-type's declared order; each must name a declared field with
        // a matching type, and every declared field must appear exactly once.
        let mut values = HashMap::with_capacity(st.fields.len());
        for init in fields {
            let decl_type = st
                .fields
                .iter()
                .find(|(n, _)| n == &init.name)
                .map(|(_, t)| *t)
                .ok_or_else(|| {
                    EvalError::simple(format!(
                        "'{}' has no field '{}'",
                        struct_name, init.name
                    ))
                })?;
            if values.contains_key(&init.name) {
                return Err(EvalError::simple(format!(
                    "field '{}' is initialized more than once",
                    init.name
                )));
            }
            let v = self.eval_expr(&init.value, scope)?;
            if !type_matches(&v, decl_type) {
                return Err(EvalError::simple(format!(
                    "field '{}' expects type {}, got {}",
                    init.name,
                    decl_type,
                    v.type_name()
                )));
            }
            values.insert(init.name.clone(), v);
        }
        Ok(rca::alloc(Object::StructValue(StructValueObj {
            struct_type: st_handle.clone(),
            fields: RefCell::new(values),
        })))
    }

    fn eval_unary(&self, op: UnaryOp, operand: &Expr, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let v = self.eval_expr(operand, scope)?;
        match (op, &*v) {
            (UnaryOp::Not, _) => Ok(object::bool_obj(!v.is_truthy())),
            (UnaryOp::Neg, Object::Int(n)) => Ok(rca::alloc(Object::Int(-n))),
            (UnaryOp::Neg, Object::Float(n)) => Ok(rca::alloc(Object::Float(-n))),
            (UnaryOp::Neg, other) => Err(EvalError::simple(format!(
                "unary '-' requires a number, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let l = self.eval_expr(left, scope)?;
        let r = self.eval_expr(right, scope)?;
        match (&*l, &*r) {
            (Object::Int(a), Object::Int(b)) => int_binary(op, *a, *b),
            (Object::Float(a), Object::Float(b)) => float_binary(op, *a, *b),
            (Object::Str(a), Object::Str(b)) => string_binary(op, &a.borrow(), &b.borrow()),
            // Same type tag but no type-specific table (struct-value, array,
            // bool, null, function, ...): reference-identity equality only.
            _ if l.type_name() == r.type_name() && matches!(op, BinaryOp::Eq | BinaryOp::NotEq) => {
                let eq = Handle::ptr_eq(&l, &r);
                Ok(object::bool_obj(if op == BinaryOp::Eq { eq } else { !eq }))
            }
            (a, b) => Err(EvalError::simple(format!(
                "type mismatch: {} {} {}",
                a.type_name(),
                op,
                b.type_name()
            ))),
        }
    }

    fn eval_assign(&self, target: &Expr, value: &Expr, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let v = self.eval_expr(value, scope)?;
        match &target.kind {
            ExprKind::Identifier(name) => self.assign_identifier(name, v, scope),
            ExprKind::Index { indexee, index } => self.assign_index(indexee, index, v, scope),
            ExprKind::Member { value: base, field } => self.assign_member(base, field, v, scope),
            _ => Err(EvalError::simple("invalid assignment target")),
        }
    }

    fn assign_identifier(&self, name: &str, v: Handle, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let existing = scope
            .get(name)
            .ok_or_else(|| EvalError::simple(format!("undefined identifier '{}'", name)))?;
        if matches!(
            &*existing,
            Object::Function(_)
                | Object::BuiltIn(_)
                | Object::ExternalFunction(_)
                | Object::ExternalLibrary(_)
                | Object::StructType(_)
        ) {
            return Err(EvalError::simple(format!(
                "'{}' is a constant and cannot be assigned",
                name
            )));
        }
        if !matches!(&*existing, Object::Null) && existing.type_name() != v.type_name() {
            return Err(EvalError::simple(format!(
                "cannot assign a value of type {} to '{}' of type {}",
                v.type_name(),
                name,
                existing.type_name()
            )));
        }
        scope.update(name, v.clone());
        Ok(v)
    }

    fn assign_index(
        &self,
        indexee: &Expr,
        index: &Expr,
        v: Handle,
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let container = self.eval_expr(indexee, scope)?;
        let idx = self.eval_expr(index, scope)?;
        match &*container {
            Object::Array(items) => {
                let i = usize_index(&idx, items.borrow().len())?;
                items.borrow_mut()[i] = v.clone();
                Ok(v)
            }
            Object::Str(bytes) => {
                let i = usize_index(&idx, bytes.borrow().len())?;
                let repl = match &*v {
                    Object::Str(b) if b.borrow().len() == 1 => b.borrow()[0],
                    _ => {
                        return Err(EvalError::simple(
                            "string index assignment requires a length-1 string",
                        ))
                    }
                };
                bytes.borrow_mut()[i] = repl;
                Ok(v)
            }
            other => Err(EvalError::simple(format!(
                "cannot index-assign into {}",
                other.type_name()
            ))),
        }
    }

    fn assign_member(
        &self,
        base: &Expr,
        field: &str,
        v: Handle,
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let target = self.eval_expr(base, scope)?;
        match &*target {
            Object::StructValue(s) => {
                let declared = match &*s.struct_type {
                    Object::StructType(t) => {
                        t.fields.iter().find(|(n, _)| n == field).map(|(_, ty)| *ty)
                    }
                    _ => None,
                };
                let declared = declared
                    .ok_or_else(|| EvalError::simple(format!("struct has no field '{}'", field)))?;
                if !type_matches(&v, declared) {
                    return Err(EvalError::simple(format!(
                        "field '{}' expects type {}, got {}",
                        field,
                        declared,
                        v.type_name()
                    )));
                }
                s.fields.borrow_mut().insert(field.to_string(), v.clone());
                Ok(v)
            }
            other => Err(EvalError::simple(format!(
                "cannot assign a field on {}",
                other.type_name()
            ))),
        }
    }

    fn eval_compound_assign(
        &self,
        op: BinaryOp,
        target: &Expr,
        value: &Expr,
        scope: &Rc<Scope>,
    ) -> Result<Handle, EvalError> {
        let name = match &target.kind {
            ExprKind::Identifier(n) => n,
            _ => return Err(EvalError::simple("compound assignment target must be an identifier")),
        };
        let current = scope
            .get(name)
            .ok_or_else(|| EvalError::simple(format!("undefined identifier '{}'", name)))?;
        let rhs = self.eval_expr(value, scope)?;
        let result = match (&*current, &*rhs) {
            (Object::Int(a), Object::Int(b)) => int_binary(op, *a, *b)?,
            (Object::Float(a), Object::Float(b)) => float_binary(op, *a, *b)?,
            (Object::Str(a), Object::Str(b)) if op == BinaryOp::Add => {
                string_binary(op, &a.borrow(), &b.borrow())?
            }
            (a, b) => {
                return Err(EvalError::simple(format!(
                    "type mismatch: {} {}= {}",
                    a.type_name(),
                    op,
                    b.type_name()
                )))
            }
        };
        self.assign_identifier(name, result, scope)
    }

    fn eval_call(&self, callee: &Expr, args: &[Expr], scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let callee_v = self.eval_expr(callee, scope)?;
        let mut arg_vals = Vec::with_capacity(args.len());
        for a in args {
            arg_vals.push(self.eval_expr(a, scope)?);
        }
        match &*callee_v {
            Object::Function(f) => self.call_function(f, arg_vals),
            Object::BuiltIn(f) => f(&arg_vals),
            Object::ExternalFunction(f) => ffi::call(f, &arg_vals),
            other => Err(EvalError::simple(format!(
                "cannot call a value of type {}",
                other.type_name()
            ))),
        }
    }

    fn call_function(&self, f: &FunctionObj, args: Vec<Handle>) -> Result<Handle, EvalError> {
        if args.len() != f.params.len() {
            return Err(EvalError::simple(format!(
                "function '{}' expects {} argument(s), got {}",
                f.name.as_deref().unwrap_or("<anonymous>"),
                f.params.len(),
                args.len()
            )));
        }
        let call_scope = Scope::child(&f.closure);
        for (param, val) in f.params.iter().zip(args) {
            call_scope.set(param.clone(), val);
        }
        let result = self.eval_block(&f.body, &call_scope)?;
        Ok(unwrap_return(result))
    }

    fn eval_index(&self, indexee: &Expr, index: &Expr, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let container = self.eval_expr(indexee, scope)?;
        let idx = self.eval_expr(index, scope)?;
        match &*container {
            Object::Array(items) => {
                let i = usize_index(&idx, items.borrow().len())?;
                Ok(items.borrow()[i].clone())
            }
            Object::Str(bytes) => {
                let i = usize_index(&idx, bytes.borrow().len())?;
                Ok(rca::alloc(Object::Str(RefCell::new(vec![bytes.borrow()[i]]))))
            }
            other => Err(EvalError::simple(format!(
                "cannot index into {}",
                other.type_name()
            ))),
        }
    }

    fn eval_member(&self, value: &Expr, field: &str, scope: &Rc<Scope>) -> Result<Handle, EvalError> {
        let v = self.eval_expr(value, scope)?;
        match &*v {
            Object::StructValue(s) => s
                .fields
                .borrow()
                .get(field)
                .cloned()
                .ok_or_else(|| EvalError::simple(format!("struct has no field '{}'", field))),
            other => Err(EvalError::simple(format!(
                "cannot access member '{}' on {}",
                field,
                other.type_name()
            ))),
        }
    }
}

fn check_fresh_binding(scope: &Rc<Scope>, name: &str) -> Result<(), EvalError> {
    if scope.exists(name) {
        return Err(EvalError::simple(format!(
            "'{}' is already defined in this scope",
            name
        )));
    }
    if builtins::lookup(name).is_some() {
        return Err(EvalError::simple(format!(
            "'{}' shadows a built-in function",
            name
        )));
    }
    Ok(())
}

fn type_name_from_str(s: &str) -> Option<TypeName> {
    match s {
        "int" => Some(TypeName::Int),
        "float" => Some(TypeName::Float),
        "bool" => Some(TypeName::Bool),
        "string" => Some(TypeName::String),
        "void" => Some(TypeName::Void),
        _ => None,
    }
}

/// A declared `null` matches any field/assignment type; otherwise the
/// value's own tag must match the declared one exactly.
fn type_matches(value: &Handle, declared: TypeName) -> bool {
    matches!(
        (&**value, declared),
        (Object::Null, _)
            | (Object::Int(_), TypeName::Int)
            | (Object::Float(_), TypeName::Float)
            | (Object::Bool(_), TypeName::Bool)
            | (Object::Str(_), TypeName::String)
    )
}

fn usize_index(idx: &Handle, len: usize) -> Result<usize, EvalError> {
    let n = idx.as_int().ok_or_else(|| EvalError::simple("index must be an int"))?;
    if n < 0 || n as usize >= len {
        return Err(EvalError::simple("index out of bounds"));
    }
    Ok(n as usize)
}

fn unwrap_return(v: Handle) -> Handle {
    match &*v {
        Object::ReturnValue(inner) => inner.clone(),
        _ => v,
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> Result<Handle, EvalError> {
    match op {
        BinaryOp::Add => Ok(rca::alloc(Object::Int(a.wrapping_add(b)))),
        BinaryOp::Sub => Ok(rca::alloc(Object::Int(a.wrapping_sub(b)))),
        BinaryOp::Mul => Ok(rca::alloc(Object::Int(a.wrapping_mul(b)))),
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::simple("division by zero"));
            }
            Ok(rca::alloc(Object::Int(a.wrapping_div(b))))
        }
        BinaryOp::Lt => Ok(object::bool_obj(a < b)),
        BinaryOp::LtEq => Ok(object::bool_obj(a <= b)),
        BinaryOp::Gt => Ok(object::bool_obj(a > b)),
        BinaryOp::GtEq => Ok(object::bool_obj(a >= b)),
        BinaryOp::Eq => Ok(object::bool_obj(a == b)),
        BinaryOp::NotEq => Ok(object::bool_obj(a != b)),
    }
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> Result<Handle, EvalError> {
    match op {
        BinaryOp::Add => Ok(rca::alloc(Object::Float(a + b))),
        BinaryOp::Sub => Ok(rca::alloc(Object::Float(a - b))),
        BinaryOp::Mul => Ok(rca::alloc(Object::Float(a * b))),
        // Float division by zero follows IEEE 754 (inf/-inf/NaN) rather than
        // raising an error, unlike integer division.
        BinaryOp::Div => Ok(rca::alloc(Object::Float(a / b))),
        BinaryOp::Lt => Ok(object::bool_obj(a < b)),
        BinaryOp::LtEq => Ok(object::bool_obj(a <= b)),
        BinaryOp::Gt => Ok(object::bool_obj(a > b)),
        BinaryOp::GtEq => Ok(object::bool_obj(a >= b)),
        BinaryOp::Eq => Ok(object::bool_obj(a == b)),
        BinaryOp::NotEq => Ok(object::bool_obj(a != b)),
    }
}

fn string_binary(op: BinaryOp, a: &[u8], b: &[u8]) -> Result<Handle, EvalError> {
    match op {
        BinaryOp::Add => {
            let mut v = a.to_vec();
            v.extend_from_slice(b);
            Ok(rca::alloc(Object::Str(RefCell::new(v))))
        }
        BinaryOp::Lt => Ok(object::bool_obj(a < b)),
        BinaryOp::LtEq => Ok(object::bool_obj(a <= b)),
        BinaryOp::Gt => Ok(object::bool_obj(a > b)),
        BinaryOp::GtEq => Ok(object::bool_obj(a >= b)),
        BinaryOp::Eq => Ok(object::bool_obj(a == b)),
        BinaryOp::NotEq => Ok(object::bool_obj(a != b)),
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => Err(EvalError::simple(format!(
            "operator '{}' is not supported for strings",
            op
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn run(src: &str) -> Result<Handle, EvalError> {
        let mut parser = Parser::new("t.eta", src);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parse errors: {:?}", parser.errors());
        let lexer = parser.into_lexer();
        let evaluator = Evaluator::new(&lexer);
        let scope = Scope::root();
        evaluator.eval_program(&program, &scope)
    }

    #[test]
    fn evaluates_arithmetic_and_let_bindings() {
        let result = run("let x = 1 + 2 * 3; x;").unwrap();
        assert_eq!(result.as_int(), Some(7));
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let result = run("let x = 0; if x < 1 { x = 10; } else { x = 20; } x;").unwrap();
        assert_eq!(result.as_int(), Some(10));
    }

    #[test]
    fn if_condition_must_be_boolean() {
        let err = run("if 1 { println('no'); }").unwrap_err();
        assert!(err.message().contains("must be boolean"));
    }

    #[test]
    fn for_condition_null_terminates_the_loop() {
        let result = run("let x = 0; for (let i = 0; null; i = i + 1) { x = x + 1; } x;").unwrap();
        assert_eq!(result.as_int(), Some(0));
    }

    #[test]
    fn for_condition_must_be_boolean_or_null() {
        let err = run("for (let i = 0; i; i = i + 1) { println(i); }").unwrap_err();
        assert!(err.message().contains("must be boolean"));
    }

    #[test]
    fn for_loop_accumulates() {
        let result = run("let sum = 0; for (let i = 0; i < 5; i = i + 1) { sum = sum + i; } sum;")
            .unwrap();
        assert_eq!(result.as_int(), Some(10));
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let result = run(
            "func make_adder(n) { func add(x) { return x + n; } return add; } \
             let add5 = make_adder(5); add5(3);",
        )
        .unwrap();
        assert_eq!(result.as_int(), Some(8));
    }

    #[test]
    fn array_mutation_is_visible_through_aliases() {
        let result = run("let a = [1, 2, 3]; a[0] = 9; a[0];").unwrap();
        assert_eq!(result.as_int(), Some(9));
    }

    #[test]
    fn array_index_out_of_bounds_is_an_error() {
        let err = run("let a = [1, 2]; a[5];").unwrap_err();
        assert!(err.is_detailed());
        assert!(err.message().contains("out of bounds"));
    }

    #[test]
    fn struct_field_access_and_mutation() {
        let result = run(
            "struct Point { x: int, y: int, } \
             let p = Point{x: 1, y: 2}; p.x = 9; p.x;",
        )
        .unwrap();
        assert_eq!(result.as_int(), Some(9));
    }

    #[test]
    fn reassigning_a_different_type_is_an_error() {
        let err = run("let x = 1; x = 'oops';").unwrap_err();
        assert!(err.message().contains("cannot assign"));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = run("let x = 1 / 0;").unwrap_err();
        assert!(err.message().contains("division by zero"));
    }

    #[test]
    fn redefining_a_name_in_the_same_scope_is_an_error() {
        let err = run("let x = 1; let x = 2;").unwrap_err();
        assert!(err.message().contains("already defined"));
    }

    #[test]
    fn shadowing_a_builtin_with_let_is_an_error() {
        let err = run("let len = 1;").unwrap_err();
        assert!(err.message().contains("shadows a built-in"));
    }

    #[test]
    fn let_statement_evaluates_to_the_bound_value() {
        let result = run("let x = 41;").unwrap();
        assert_eq!(result.as_int(), Some(41));
    }

    #[test]
    fn cross_type_equality_is_a_type_mismatch_not_false() {
        let err = run("1 == true;").unwrap_err();
        assert!(err.message().contains("type mismatch"));
    }

    #[test]
    fn struct_literal_fields_may_be_written_out_of_declared_order() {
        let result = run(
            "struct P { x: int, y: int, } let p = P{y: 2, x: 1}; p.x;",
        )
        .unwrap();
        assert_eq!(result.as_int(), Some(1));
    }

    #[test]
    fn struct_values_compare_by_reference_identity() {
        let result = run(
            "struct P { x: int, } let a = P{x: 1}; let b = P{x: 1}; a == b;",
        )
        .unwrap();
        assert_eq!(result.as_bool(), Some(false));
    }

    #[test]
    fn calling_a_non_callable_value_is_an_error() {
        let err = run("let x = 1; x();").unwrap_err();
        assert!(err.message().contains("cannot call"));
    }
}
