use std::{
    cell::RefCell,
    io::{self, Write},
    rc::Rc,
};

use crate::{
    error::{Result, RuntimeError},
    scope::Scope,
    value::{NativeFunction, RuntimeValue},
};

/// Where `print` writes its lines.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    /// Shared buffer, so a host can read back everything printed.
    Buffer(Rc<RefCell<String>>),
}

impl Output {
    pub fn buffer() -> (Self, Rc<RefCell<String>>) {
        let buffer = Rc::new(RefCell::new(String::new()));
        (Output::Buffer(buffer.clone()), buffer)
    }

    fn write_line(&self, line: &str) -> Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", line)
                    .map_err(|err| RuntimeError::Output(err.to_string()))?;
            }
            Output::Buffer(buffer) => {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(line);
                buffer.push('\n');
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Print {
    output: Output,
}

impl NativeFunction for Print {
    fn name(&self) -> &str {
        "print"
    }

    fn call(&self, args: Vec<RuntimeValue>, _scope: &Scope) -> Result<RuntimeValue> {
        let line = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        self.output.write_line(&line)?;

        Ok(RuntimeValue::Null)
    }
}

/// Seeds `scope` with the constants and native functions every program
/// starts with. `print` writes to stdout.
pub fn setup_scope(scope: &Scope) -> Result<()> {
    setup_scope_with_output(scope, Output::Stdout)
}

pub fn setup_scope_with_output(scope: &Scope, output: Output) -> Result<()> {
    scope.declare("true", RuntimeValue::Boolean(true), true)?;
    scope.declare("false", RuntimeValue::Boolean(false), true)?;
    scope.declare(
        "print",
        RuntimeValue::NativeFunction(Box::new(Print { output })),
        true,
    )?;

    tracing::debug!(names = ?scope.names(), "seeded root scope");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, value::ValueKind};

    #[test]
    fn seeds_constants_and_print() {
        let scope = Scope::new();
        setup_scope(&scope).unwrap();

        assert_eq!(scope.names(), vec!["false", "print", "true"]);
        assert_eq!(scope.lookup("true").unwrap(), RuntimeValue::Boolean(true));
        assert_eq!(scope.lookup("print").unwrap().kind(), ValueKind::NativeFunction);
        assert!(scope.binding("false").unwrap().constant);
    }

    #[test]
    fn seeded_names_cannot_be_reassigned() {
        let scope = Scope::new();
        setup_scope(&scope).unwrap();

        assert_eq!(
            scope.assign("print", RuntimeValue::Null),
            Err(Error::Runtime(RuntimeError::ConstantAssignment("print".into())))
        );
    }

    #[test]
    fn seeding_twice_is_a_redeclaration() {
        let scope = Scope::new();
        setup_scope(&scope).unwrap();
        assert!(setup_scope(&scope).is_err());
    }

    #[test]
    fn print_joins_arguments_with_spaces() {
        let scope = Scope::new();
        let (output, buffer) = Output::buffer();
        setup_scope_with_output(&scope, output).unwrap();

        let print = scope.lookup("print").unwrap();
        let RuntimeValue::NativeFunction(print) = print else {
            panic!("print should be native");
        };

        let result = print
            .call(
                vec![
                    RuntimeValue::Number(1.5),
                    RuntimeValue::Null,
                    RuntimeValue::object([("a", RuntimeValue::Boolean(true))]),
                ],
                &scope,
            )
            .unwrap();
        print.call(vec![], &scope).unwrap();

        assert_eq!(result, RuntimeValue::Null);
        assert_eq!(*buffer.borrow(), "1.5 null {\"a\": true}\n\n");
        assert_eq!(
            RuntimeValue::NativeFunction(print).to_string(),
            "[Native Function: print]"
        );
    }
}
