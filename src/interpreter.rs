use std::collections::HashMap;

use crate::{
    ast::{
        AssignmentExpr, BinaryExpr, BinaryOp, BranchStmt, CallExpr, ComparisonExpr, ComparisonOp,
        Expr, FunctionDeclaration, MemberExpr, ObjectLiteral, Program, Stmt, VarDeclaration,
    },
    common::ensure_sufficient_stack,
    error::{Result, RuntimeError},
    scope::Scope,
    value::{FunctionValue, RuntimeValue},
};

/// Deepest chain of script function calls a program may build.
pub const MAX_CALL_DEPTH: usize = 1000;

/// Evaluates every top-level statement in `scope`, yielding the value of the
/// last one, or null for an empty program.
pub fn evaluate_program(program: &Program, scope: &Scope) -> Result<RuntimeValue> {
    tracing::debug!(statements = program.body.len(), "evaluating program");
    interpret_block(&program.body, scope)
}

pub fn evaluate(stmt: &Stmt, scope: &Scope) -> Result<RuntimeValue> {
    ensure_sufficient_stack(|| match stmt {
        Stmt::VarDeclaration(declaration) => interpret_var_declaration(declaration, scope),
        Stmt::FunctionDeclaration(declaration) => {
            interpret_function_declaration(declaration, scope)
        }
        Stmt::Branch(branch) => interpret_branch(branch, scope),
        Stmt::Expr(expr) => interpret_expr(expr, scope),
    })
}

pub fn interpret_expr(expr: &Expr, scope: &Scope) -> Result<RuntimeValue> {
    ensure_sufficient_stack(|| match expr {
        Expr::NumericLiteral(literal) => Ok(RuntimeValue::Number(literal.value)),
        Expr::BooleanLiteral(literal) => Ok(RuntimeValue::Boolean(literal.value)),
        Expr::NullLiteral(_) => Ok(RuntimeValue::Null),
        Expr::Identifier(ident) => scope.lookup(&ident.symbol),
        Expr::Binary(binary_expr) => interpret_binary(binary_expr, scope),
        Expr::Comparison(comparison_expr) => interpret_comparison(comparison_expr, scope),
        Expr::Object(object_lit) => interpret_object(object_lit, scope),
        Expr::Member(member_expr) => interpret_member(member_expr, scope),
        Expr::Call(call_expr) => interpret_call(call_expr, scope),
        Expr::Assignment(assignment_expr) => interpret_assignment(assignment_expr, scope),
    })
}

/// Runs statements in order in `scope` and keeps the last value.
fn interpret_block(stmts: &[Stmt], scope: &Scope) -> Result<RuntimeValue> {
    let mut block_result = RuntimeValue::Null;
    for stmt in stmts {
        block_result = evaluate(stmt, scope)?;
    }

    Ok(block_result)
}

fn interpret_var_declaration(declaration: &VarDeclaration, scope: &Scope) -> Result<RuntimeValue> {
    let value = match &declaration.value {
        Some(init) => interpret_expr(init, scope)?,
        None => RuntimeValue::Null,
    };

    scope.declare(&declaration.identifier, value, declaration.constant)
}

fn interpret_function_declaration(
    declaration: &FunctionDeclaration,
    scope: &Scope,
) -> Result<RuntimeValue> {
    let function = RuntimeValue::Function(FunctionValue {
        name: declaration.name.clone(),
        params: declaration.params.clone().into(),
        declaration_scope: scope.downgrade(),
        body: declaration.body.clone().into(),
    });

    scope.declare(&declaration.name, function, true)
}

fn interpret_branch(branch: &BranchStmt, scope: &Scope) -> Result<RuntimeValue> {
    let condition = interpret_expr(&branch.condition, scope)?;
    let taken = condition
        .as_boolean()
        .ok_or_else(|| RuntimeError::NonBooleanCondition(condition.kind()))?;

    let branch_scope = Scope::with_parent(scope);
    if taken {
        interpret_block(&branch.body, &branch_scope)
    } else {
        interpret_block(&branch.else_body, &branch_scope)
    }
}

fn interpret_binary(binary_expr: &BinaryExpr, scope: &Scope) -> Result<RuntimeValue> {
    let left_value = interpret_expr(&binary_expr.left, scope)?;
    let right_value = interpret_expr(&binary_expr.right, scope)?;

    match (left_value, right_value) {
        (RuntimeValue::Number(left), RuntimeValue::Number(right)) => {
            interpret_numeric_binary(left, right, binary_expr.operator)
        }
        // no implicit coercion between kinds
        _ => Ok(RuntimeValue::Null),
    }
}

fn interpret_numeric_binary(left: f64, right: f64, operator: BinaryOp) -> Result<RuntimeValue> {
    let number = match operator {
        BinaryOp::Add => left + right,
        BinaryOp::Sub => left - right,
        BinaryOp::Mul => left * right,
        BinaryOp::Div => left / right,
        BinaryOp::Mod => {
            // operands are truncated to integers first
            let (left, right) = (left.trunc() as i64, right.trunc() as i64);
            if right == 0 {
                return Err(RuntimeError::ModuloByZero.into());
            }
            left.wrapping_rem(right) as f64
        }
    };

    Ok(RuntimeValue::Number(number))
}

fn interpret_comparison(comparison_expr: &ComparisonExpr, scope: &Scope) -> Result<RuntimeValue> {
    let left_value = interpret_expr(&comparison_expr.left, scope)?;
    let right_value = interpret_expr(&comparison_expr.right, scope)?;

    let result = match (left_value, right_value) {
        (RuntimeValue::Boolean(left), RuntimeValue::Boolean(right)) => {
            match comparison_expr.operator {
                ComparisonOp::Equal => Some(left == right),
                ComparisonOp::NotEqual => Some(left != right),
                ComparisonOp::And => Some(left && right),
                ComparisonOp::Or => Some(left || right),
                _ => None,
            }
        }
        (RuntimeValue::Number(left), RuntimeValue::Number(right)) => {
            match comparison_expr.operator {
                ComparisonOp::Equal => Some(left == right),
                ComparisonOp::NotEqual => Some(left != right),
                ComparisonOp::Greater => Some(left > right),
                ComparisonOp::Lesser => Some(left < right),
                ComparisonOp::GreaterEqual => Some(left >= right),
                ComparisonOp::LesserEqual => Some(left <= right),
                _ => None,
            }
        }
        _ => None,
    };

    Ok(result.map_or(RuntimeValue::Null, RuntimeValue::Boolean))
}

fn interpret_object(object_lit: &ObjectLiteral, scope: &Scope) -> Result<RuntimeValue> {
    let mut obj_map = HashMap::new();
    for property in &object_lit.properties {
        let value = match &property.value {
            Some(value) => interpret_expr(value, scope)?,
            None => scope.lookup(&property.key)?,
        };
        obj_map.insert(property.key.clone(), value);
    }

    Ok(RuntimeValue::Object(obj_map))
}

fn interpret_member(member_expr: &MemberExpr, scope: &Scope) -> Result<RuntimeValue> {
    let object = interpret_expr(&member_expr.object, scope)?;
    let RuntimeValue::Object(map) = &object else {
        return Err(RuntimeError::NotAnObject(object.kind()).into());
    };

    let key = if member_expr.computed {
        match interpret_expr(&member_expr.field, scope)? {
            RuntimeValue::Number(number) => number.to_string(),
            other => return Err(RuntimeError::InvalidMemberKey(other.kind()).into()),
        }
    } else if let Expr::Identifier(ident) = &*member_expr.field {
        ident.symbol.clone()
    } else {
        return Err(RuntimeError::InvalidMemberField.into());
    };

    Ok(map.get(&key).cloned().unwrap_or(RuntimeValue::Null))
}

fn interpret_assignment(assignment_expr: &AssignmentExpr, scope: &Scope) -> Result<RuntimeValue> {
    let Expr::Identifier(ident) = &*assignment_expr.assignee else {
        return Err(RuntimeError::InvalidAssignmentTarget.into());
    };

    let value = interpret_expr(&assignment_expr.value, scope)?;
    scope.assign(&ident.symbol, value)
}

fn interpret_call(call_expr: &CallExpr, scope: &Scope) -> Result<RuntimeValue> {
    let callee = interpret_expr(&call_expr.caller, scope)?;

    let interpreted_args = call_expr
        .args
        .iter()
        .map(|expr| interpret_expr(expr, scope))
        .collect::<Result<Vec<_>>>()?;

    match callee {
        RuntimeValue::NativeFunction(native) => native.call(interpreted_args, scope),
        RuntimeValue::Function(function) => call_function(&function, interpreted_args, scope),
        other => Err(RuntimeError::NotCallable(other.kind()).into()),
    }
}

/// Runs a script function in a fresh scope whose parent is the scope the
/// function was declared in, not the caller's. `caller` only contributes its
/// call depth.
#[tracing::instrument(level = "trace", skip_all, fields(name = %function.name))]
pub fn call_function(
    function: &FunctionValue,
    args: Vec<RuntimeValue>,
    caller: &Scope,
) -> Result<RuntimeValue> {
    if args.len() != function.params.len() {
        return Err(RuntimeError::ArgumentCount {
            name: function.name.clone(),
            expected: function.params.len(),
            found: args.len(),
        }
        .into());
    }

    let call_depth = caller.call_depth() + 1;
    if call_depth > MAX_CALL_DEPTH {
        return Err(RuntimeError::RecursionLimit(MAX_CALL_DEPTH).into());
    }

    let declaration_scope = function
        .declaration_scope
        .upgrade()
        .ok_or_else(|| RuntimeError::DroppedScope(function.name.clone()))?;

    let call_scope = Scope::call_frame(&declaration_scope, call_depth);
    for (param, arg) in function.params.iter().zip(args) {
        call_scope.declare(param, arg, false)?;
    }

    interpret_block(&function.body, &call_scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{builtins, error::Error, parser::produce_ast, value::NativeFunction};

    fn eval(source: &str) -> Result<RuntimeValue> {
        let scope = Scope::new();
        builtins::setup_scope(&scope)?;
        evaluate_program(&produce_ast(source)?, &scope)
    }

    fn runtime_error(source: &str) -> RuntimeError {
        match eval(source) {
            Err(Error::Runtime(err)) => err,
            other => panic!("expected runtime error from {source:?}, got {other:?}"),
        }
    }

    #[test]
    fn empty_program_is_null() {
        assert_eq!(eval("").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn arithmetic_on_numbers() {
        assert_eq!(eval("1 + 2 * 3 - 4 / 2").unwrap(), RuntimeValue::Number(5.0));
        assert_eq!(eval("1 / 0").unwrap(), RuntimeValue::Number(f64::INFINITY));
    }

    #[test]
    fn modulo_truncates_operands() {
        assert_eq!(eval("7 % 2").unwrap(), RuntimeValue::Number(1.0));
        assert_eq!(eval("7.9 % 2").unwrap(), RuntimeValue::Number(1.0));
        assert_eq!(eval("9 % 2.5").unwrap(), RuntimeValue::Number(1.0));
        assert_eq!(runtime_error("5 % 0.5"), RuntimeError::ModuloByZero);
    }

    #[test]
    fn mixed_kinds_yield_null() {
        assert_eq!(eval("1 + true").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("null * 2").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("1 == true").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("1 && 2").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("true > false").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn comparisons_and_logic() {
        assert_eq!(eval("3 >= 3").unwrap(), RuntimeValue::Boolean(true));
        assert_eq!(eval("3 != 3").unwrap(), RuntimeValue::Boolean(false));
        assert_eq!(eval("1 < 2 && 2 < 1").unwrap(), RuntimeValue::Boolean(false));
        assert_eq!(eval("1 < 2 || 2 < 1").unwrap(), RuntimeValue::Boolean(true));
        assert_eq!(eval("true == false").unwrap(), RuntimeValue::Boolean(false));
    }

    #[test]
    fn var_declaration_without_value_is_null() {
        assert_eq!(eval("mut x; x").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn assignment_yields_assigned_value() {
        assert_eq!(eval("mut x = 1; x = 3").unwrap(), RuntimeValue::Number(3.0));
        assert_eq!(eval("mut a; mut b; a = b = 2; a + b").unwrap(), RuntimeValue::Number(4.0));
    }

    #[test]
    fn assignment_inside_branch_updates_outer_binding() {
        let source = "mut x = 1; if (true) { x = 2; } x";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(2.0));
    }

    #[test]
    fn branch_value_and_else() {
        assert_eq!(
            eval("if (1 > 2) { 10 } else { 20 }").unwrap(),
            RuntimeValue::Number(20.0)
        );
        assert_eq!(eval("if (false) { 10 }").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("if (true) { }").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn non_boolean_condition_fails() {
        assert_eq!(
            runtime_error("if (1) { 2 }"),
            RuntimeError::NonBooleanCondition(crate::value::ValueKind::Number)
        );
    }

    #[test]
    fn shorthand_property_must_resolve() {
        assert_eq!(
            runtime_error("{ missing }"),
            RuntimeError::UnresolvedVariable("missing".into())
        );
    }

    #[test]
    fn member_access() {
        assert_eq!(
            eval("const o = { a: 1, b: { c: 2 } }; o.b.c").unwrap(),
            RuntimeValue::Number(2.0)
        );
        assert_eq!(eval("const o = { a: 1 }; o.zzz").unwrap(), RuntimeValue::Null);
        assert_eq!(eval("const o = { a: 1 }; o[1]").unwrap(), RuntimeValue::Null);
        assert_eq!(
            runtime_error("mut n = 1; n.a"),
            RuntimeError::NotAnObject(crate::value::ValueKind::Number)
        );
        assert_eq!(
            runtime_error("const o = { a: 1 }; o[true]"),
            RuntimeError::InvalidMemberKey(crate::value::ValueKind::Boolean)
        );
    }

    #[test]
    fn functions_return_last_statement() {
        let source = "func add(a, b) { mut sum = a + b; sum * 2 } add(1, 2)";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(6.0));
        assert_eq!(eval("func nothing() { } nothing()").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn function_declarations_are_constant() {
        assert_eq!(
            runtime_error("func f() { 1 } f = 2;"),
            RuntimeError::ConstantAssignment("f".into())
        );
    }

    #[test]
    fn parameters_are_mutable_and_local() {
        let source = "mut x = 10; func bump(x) { x = x + 1; x } bump(1) + x";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(12.0));
    }

    #[test]
    fn argument_count_must_match() {
        assert_eq!(
            runtime_error("func f(a, b) { a } f(1)"),
            RuntimeError::ArgumentCount {
                name: "f".into(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn calling_a_non_function_fails() {
        assert_eq!(
            runtime_error("mut x = 3; x()"),
            RuntimeError::NotCallable(crate::value::ValueKind::Number)
        );
    }

    #[test]
    fn recursion_through_declaration_scope() {
        let source = "
            func fact(n) {
                if (n <= 1) { 1 } else { n * fact(n - 1) }
            }
            fact(5)
        ";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(120.0));
    }

    #[test]
    fn closures_keep_their_declaration_scope() {
        let source = "
            func counter() {
                mut count = 0;
                func next() { count = count + 1; count }
                next
            }
            const tick = counter();
            tick();
            tick();
            tick()
        ";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(3.0));
    }

    #[derive(Clone)]
    struct Seven;

    impl NativeFunction for Seven {
        fn name(&self) -> &str {
            "seven"
        }

        fn call(&self, _args: Vec<RuntimeValue>, _scope: &Scope) -> Result<RuntimeValue> {
            Ok(RuntimeValue::Number(7.0))
        }
    }

    #[test]
    fn native_functions_return_their_value() {
        let scope = Scope::new();
        scope
            .declare("seven", RuntimeValue::NativeFunction(Box::new(Seven)), true)
            .unwrap();

        let program = produce_ast("seven() + 1").unwrap();
        assert_eq!(evaluate_program(&program, &scope).unwrap(), RuntimeValue::Number(8.0));
        assert_eq!(eval("print(1)").unwrap(), RuntimeValue::Null);
    }

    #[test]
    fn runaway_recursion_is_a_runtime_error() {
        assert_eq!(
            runtime_error("func f(n) { f(n + 1) } f(0)"),
            RuntimeError::RecursionLimit(MAX_CALL_DEPTH)
        );
    }

    #[test]
    fn recursion_up_to_the_limit_succeeds() {
        let source = format!(
            "func down(n) {{ if (n == 0) {{ 0 }} else {{ down(n - 1) }} }} down({})",
            MAX_CALL_DEPTH - 1
        );
        assert_eq!(eval(&source).unwrap(), RuntimeValue::Number(0.0));
    }

    #[test]
    fn call_depth_resets_after_returning() {
        let source = "
            func down(n) { if (n == 0) { 0 } else { down(n - 1) } }
            down(900);
            down(900)
        ";
        assert_eq!(eval(source).unwrap(), RuntimeValue::Number(0.0));
    }

    #[test]
    fn calling_a_function_whose_scope_was_dropped_fails() {
        let function = {
            let scope = Scope::new();
            evaluate_program(&produce_ast("func f() { 1 }").unwrap(), &scope).unwrap();
            scope.lookup("f").unwrap()
        };
        let RuntimeValue::Function(function) = function else {
            panic!("expected a script function");
        };

        assert_eq!(
            call_function(&function, vec![], &Scope::new()),
            Err(Error::Runtime(RuntimeError::DroppedScope("f".into())))
        );
    }

    #[test]
    fn evaluate_single_statement() {
        let scope = Scope::new();
        let program = produce_ast("mut x = 4; x * x").unwrap();

        evaluate(&program.body[0], &scope).unwrap();
        assert_eq!(evaluate(&program.body[1], &scope).unwrap(), RuntimeValue::Number(16.0));
    }
}
