//! Public types used throughout the interpreter.
//!
//! The two central types are [`Value`], the string-like unit of TCL data, and
//! [`Exception`], which carries every non-normal way out of an evaluation:
//! errors, `return`, `break`, `continue`, and `exit`.  Most client code will
//! work in terms of [`TclResult`], the interpreter's standard result type.

use crate::interp::Interp;
pub use crate::value::Value;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::BuildHasherDefault;

#[cfg(feature = "closure-commands")]
use alloc::boxed::Box;

cfg_if::cfg_if! {
    if #[cfg(feature = "i64")] {
        /// The interpreter's integer type.
        pub type TclInt = i64;
    } else {
        /// The interpreter's integer type.
        pub type TclInt = i32;
    }
}

/// A TCL list at the Rust level: a vector of [`Value`]s.  Converting a
/// `TclList` to a `Value` applies the standard brace/space quoting.
pub type TclList = Vec<Value>;

/// The standard result of evaluating TCL code: a [`Value`] on normal
/// completion, an [`Exception`] otherwise.
pub type TclResult = Result<Value, Exception>;

/// The result type for native command functions.  `Ok(None)` is shorthand for
/// an empty result value.
pub type TclOptResult = Result<Option<Value>, Exception>;

/// The signature of a native command: the interpreter, the argument list
/// (including the command name as `argv[0]`), and the host context.
pub type CommandFunc<Ctx> = fn(&mut Interp<Ctx>, &[Value], &mut Ctx) -> TclOptResult;

/// The signature of a boxed closure command.
#[cfg(feature = "closure-commands")]
pub type CommandClosure<Ctx> = Box<dyn Fn(&mut Interp<Ctx>, &[Value], &mut Ctx) -> TclOptResult>;

/// The hasher used for the interpreter's variable tables.
pub type TclHasher = BuildHasherDefault<fnv::FnvHasher>;

/// The control-flow signal produced by evaluating a command or block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResultCode {
    /// The evaluation failed; the exception's value is the error message.
    Error,

    /// A `return` command was evaluated; the exception's value is the
    /// returned value.  Absorbed by the enclosing proc call (or the
    /// top-level eval).
    Return,

    /// A `break` command was evaluated.  Caught by the directly enclosing
    /// loop.
    Break,

    /// A `continue` command was evaluated.  Caught by the directly enclosing
    /// loop.
    Continue,

    /// An `exit` command was evaluated; the exception's value is the exit
    /// status.  Propagates out of the top-level eval; the embedding
    /// application decides what to do with it.
    Exit,
}

/// The kind of a TCL error, independent of its message text.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// A generic error, e.g. one raised by the `error` command.
    General,

    /// An allocation bound was exceeded (e.g. an array grown past the
    /// element limit).
    Memory,

    /// The lexer rejected the script.
    Syntax,

    /// Unbalanced or malformed braces in a word or list.
    BraceMismatch,

    /// The expression evaluator rejected or could not compute an expression.
    Expr,

    /// No command matched the given name and argument count.
    CmdUnknown,

    /// A variable or array element was read before being set.
    VarUnknown,

    /// An invalid variable name or array index.
    VarName,

    /// A command received an argument it cannot accept.
    BadParam,

    /// A scope rule was violated, e.g. `global` outside a proc body.
    Scope,
}

/// Details recorded for an error: its kind, the 1-based source line of the
/// statement that raised it (where known), and the symbol involved (the
/// unknown command or variable name, where there is one).
///
/// The first error recorded during a top-level evaluation is sticky: the data
/// captured at the raise site survives unwinding unmodified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ErrorData {
    kind: ErrorKind,
    line: Option<u32>,
    symbol: Option<String>,
    mapped: bool,
}

impl ErrorData {
    /// The error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The 1-based line number of the statement that raised the error, if
    /// position tracking captured one.  For errors raised inside a proc body
    /// this has been remapped into the coordinates of the `proc`
    /// declaration.
    pub fn line(&self) -> Option<u32> {
        self.line
    }

    /// The name the error is about, e.g. the unknown command or variable.
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }
}

/// An exceptional result of evaluating TCL code: an error or a control-flow
/// signal.  The embedded [`Value`] is the error message, returned value, or
/// exit status, according to the [`ResultCode`].
#[derive(Clone, Debug, PartialEq)]
pub struct Exception {
    code: ResultCode,
    value: Value,
    error: Option<ErrorData>,
}

impl Exception {
    /// Creates an error exception of the given kind.
    pub fn error(kind: ErrorKind, value: Value) -> Self {
        Self {
            code: ResultCode::Error,
            value,
            error: Some(ErrorData {
                kind,
                line: None,
                symbol: None,
                mapped: false,
            }),
        }
    }

    /// Creates an error exception of the given kind, recording the symbol it
    /// concerns (e.g. the unknown command name).
    pub fn error_for(kind: ErrorKind, value: Value, symbol: &str) -> Self {
        let mut exception = Self::error(kind, value);
        if let Some(data) = exception.error.as_mut() {
            data.symbol = Some(String::from(symbol));
        }
        exception
    }

    /// Creates a `return` exception carrying the returned value.
    pub fn tcl_return(value: Value) -> Self {
        Self {
            code: ResultCode::Return,
            value,
            error: None,
        }
    }

    /// Creates a `break` exception.
    pub fn tcl_break() -> Self {
        Self {
            code: ResultCode::Break,
            value: Value::empty(),
            error: None,
        }
    }

    /// Creates a `continue` exception.
    pub fn tcl_continue() -> Self {
        Self {
            code: ResultCode::Continue,
            value: Value::empty(),
            error: None,
        }
    }

    /// Creates an `exit` exception carrying the exit status.
    pub fn tcl_exit(status: TclInt) -> Self {
        Self {
            code: ResultCode::Exit,
            value: Value::from(status),
            error: None,
        }
    }

    /// The exception's control-flow code.
    pub fn code(&self) -> ResultCode {
        self.code
    }

    /// The exception's value: the error message, returned value, or exit
    /// status.
    pub fn value(&self) -> Value {
        self.value.clone()
    }

    /// Whether this exception is an error (as opposed to a control-flow
    /// signal).
    pub fn is_error(&self) -> bool {
        self.code == ResultCode::Error
    }

    /// The error's recorded details, if this exception is an error.
    pub fn error_data(&self) -> Option<&ErrorData> {
        self.error.as_ref()
    }

    /// Records the source line of the raising statement.  The first recorded
    /// line is sticky; later attempts during unwinding are ignored.
    pub(crate) fn attach_line(&mut self, line: u32) {
        if let Some(data) = self.error.as_mut() {
            if data.line.is_none() {
                data.line = Some(line);
            }
        }
    }

    /// Remaps a body-relative error line into the coordinates of the `proc`
    /// declaration that captured the body.  Applied once, at the innermost
    /// proc boundary the error crosses.
    pub(crate) fn remap_into_decl(&mut self, decl_line: u32) {
        if let Some(data) = self.error.as_mut() {
            if !data.mapped {
                if let Some(line) = data.line {
                    data.line = Some(decl_line + line.saturating_sub(1));
                }
                data.mapped = true;
            }
        }
    }
}

/// A subcommand record for ensemble commands such as `string` and `info`: the
/// subcommand's name and its implementation.
#[derive(Debug)]
pub struct Subcommand<Ctx>(pub &'static str, pub CommandFunc<Ctx>);

impl<Ctx> Subcommand<Ctx> {
    /// Looks up a subcommand by name, producing the standard error message
    /// listing the alternatives when the name matches none of them.
    pub fn find<'a>(
        subcommands: &'a [Subcommand<Ctx>],
        name: &str,
    ) -> Result<&'a Subcommand<Ctx>, Exception> {
        for subcommand in subcommands {
            if subcommand.0 == name {
                return Ok(subcommand);
            }
        }

        let mut msg = String::from("unknown or ambiguous subcommand \"");
        msg.push_str(name);
        msg.push_str("\": must be ");

        for (i, subcommand) in subcommands.iter().enumerate() {
            if i > 0 {
                msg.push_str(if i == subcommands.len() - 1 { ", or " } else { ", " });
            }
            msg.push_str(subcommand.0);
        }

        Err(Exception::error_for(
            ErrorKind::BadParam,
            Value::from(msg),
            name,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exception() {
        let e = Exception::error(ErrorKind::General, Value::from("oops"));
        assert!(e.is_error());
        assert_eq!(e.code(), ResultCode::Error);
        assert_eq!(e.value().as_str(), "oops");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::General);
        assert_eq!(e.error_data().unwrap().line(), None);
    }

    #[test]
    fn test_flow_exceptions() {
        assert_eq!(Exception::tcl_break().code(), ResultCode::Break);
        assert_eq!(Exception::tcl_continue().code(), ResultCode::Continue);
        assert_eq!(
            Exception::tcl_return(Value::from("x")).value().as_str(),
            "x"
        );
        let e = Exception::tcl_exit(2);
        assert_eq!(e.code(), ResultCode::Exit);
        assert_eq!(e.value().as_str(), "2");
        assert!(!e.is_error());
        assert!(e.error_data().is_none());
    }

    #[test]
    fn test_line_is_sticky() {
        let mut e = Exception::error(ErrorKind::Syntax, Value::from("bad"));
        e.attach_line(4);
        e.attach_line(9);
        assert_eq!(e.error_data().unwrap().line(), Some(4));
    }

    #[test]
    fn test_remap_applies_once() {
        let mut e = Exception::error(ErrorKind::General, Value::from("bad"));
        e.attach_line(3);
        e.remap_into_decl(10);
        assert_eq!(e.error_data().unwrap().line(), Some(12));
        e.remap_into_decl(50);
        assert_eq!(e.error_data().unwrap().line(), Some(12));
    }

    #[test]
    fn test_subcommand_find() {
        let subs: [Subcommand<()>; 2] = [Subcommand("length", |_, _, _| Ok(None)),
            Subcommand("index", |_, _, _| Ok(None))];
        assert!(Subcommand::find(&subs, "length").is_ok());
        let err = Subcommand::find(&subs, "bogus").unwrap_err();
        assert_eq!(
            err.value().as_str(),
            "unknown or ambiguous subcommand \"bogus\": must be length, or index"
        );
    }
}
