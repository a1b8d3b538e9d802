//! The Probetcl Interpreter
//!
//! The [`Interp`] struct is the primary API for embedding Probetcl into a Rust
//! application.  Given an `Interp`, the application may:
//!
//! * Evaluate scripts and expressions
//! * Check scripts for completeness
//! * Extend the language by defining new commands in Rust
//! * Set and get variables
//!
//! # Interp is not Sync!
//!
//! The `Interp` (and the rest of Probetcl) is intended for use in a single
//! thread.  It is safe to have `Interp`s in different threads, but use
//! `String` (or another `Sync` type) when passing data between them.
//!
//! # Creating an Interpreter
//!
//! [`Interp::new`] creates an interpreter populated with the standard command
//! set; the application then adds its own commands, typically the probe
//! primitives the scripts exist to drive (register reads and writes, memory
//! access, reset control).  Alternatively, [`Interp::empty`] creates an
//! interpreter with no commands at all, which is useful as the basis for a
//! restricted configuration-file reader.
//!
//! The interpreter is generic over a *host context* type.  A mutable borrow
//! of the context is passed to every command invocation, which is how probe
//! commands reach their transport without the interpreter knowing anything
//! about it.  Applications that don't need a context use `()`.
//!
//! ```
//! use probetcl::Interp;
//! let mut interp = Interp::<()>::new();
//!
//! // add commands, evaluate scripts, etc.
//! ```
//!
//! # Evaluating Scripts
//!
//! [`Interp::eval`] evaluates a string as a script and returns the result of
//! the last command executed, the value of any explicit `return`, or the
//! first error raised:
//!
//! ```
//! use probetcl::Interp;
//! use probetcl::tcl_ok;
//! use probetcl::types::*;
//!
//! # let _ = my_func();
//! fn my_func() -> TclResult {
//!     let mut glob_ctx = ();
//!     let mut interp = Interp::new();
//!
//!     let val = interp.eval("expr {2 + 2}", &mut glob_ctx)?;
//!     assert_eq!(val.as_str(), "4");
//!     assert_eq!(val.as_int()?, 4);
//!
//!     tcl_ok!()
//! }
//! ```
//!
//! Evaluation returns a [`TclResult`]:
//!
//! ```ignore
//! pub type TclResult = Result<Value, Exception>;
//! ```
//!
//! [`Value`] is the type of all Probetcl values (values that can be passed as
//! parameters and stored in variables).  [`Exception`] covers all the
//! exceptional returns: errors, `return`, `break`, `continue`, and `exit`.
//! At the top level `break` and `continue` are converted to errors and
//! `return` is absorbed; `exit` and errors are passed to the caller, with the
//! details of an error (kind, source line, offending symbol) latched where
//! [`Interp::error_info`] can retrieve them.
//!
//! # Defining New Commands
//!
//! A command is a Rust function of type [`CommandFunc`], registered together
//! with the inclusive argument-count window it accepts; the count includes
//! the command name itself, and a maximum of `0` means unbounded.  Arguments
//! outside the window don't reach the function; command resolution fails as
//! an unknown command, so the same name may be registered several times with
//! disjoint windows.
//!
//! ```
//! use probetcl::Interp;
//! use probetcl::{tcl_opt_ok, tcl_ok};
//! use probetcl::types::*;
//!
//! # let _ = dummy();
//! # fn dummy() -> TclResult {
//! let mut glob_ctx = ();
//! let mut interp = Interp::new();
//! interp.add_command("square", 2, 2, cmd_square);
//!
//! let val = interp.eval("square 5", &mut glob_ctx)?;
//! assert_eq!(val.as_str(), "25");
//! # tcl_ok!()
//! # }
//!
//! // The command: square intValue
//! fn cmd_square(_: &mut Interp, argv: &[Value], _ctx: &mut ()) -> TclOptResult {
//!     let x = argv[1].as_int()?;
//!     tcl_opt_ok!(x * x)
//! }
//! ```
//!
//! Commands that need host state take it through the context parameter:
//!
//! ```
//! use probetcl::Interp;
//! use probetcl::{tcl_opt_ok, tcl_ok};
//! use probetcl::types::*;
//!
//! struct Probe { regs: [TclInt; 16] }
//!
//! // The command: rdreg index
//! fn cmd_rdreg(_: &mut Interp<Probe>, argv: &[Value], probe: &mut Probe) -> TclOptResult {
//!     let index = argv[1].as_int()? as usize;
//!     tcl_opt_ok!(probe.regs[index])
//! }
//!
//! # let _ = dummy();
//! # fn dummy() -> TclResult {
//! let mut probe = Probe { regs: [0; 16] };
//! probe.regs[3] = 42;
//!
//! let mut interp = Interp::new();
//! interp.add_command("rdreg", 2, 2, cmd_rdreg);
//!
//! assert_eq!(interp.eval("rdreg 3", &mut probe)?.as_int()?, 42);
//! # tcl_ok!()
//! # }
//! ```
//!
//! # Accessing Variables
//!
//! Probetcl variables hold a vector of values: element 0 is the scalar, and
//! `name(n)` in script syntax addresses element `n`.  Commands use
//! [`Interp::var`]/[`Interp::set_var`] to access a variable named by a
//! command argument (parsing any `(n)` suffix), or
//! [`Interp::scalar`]/[`Interp::element`] and their setters to address
//! storage directly.
//!
//! # Checking Scripts for Completeness
//!
//! [`Interp::complete`] checks whether a script is complete, that it has no
//! unterminated quoted or braced string.  REPLs use this to decide whether
//! to evaluate the input or ask for another line.

use crate::commands;
#[cfg(feature = "expr")]
use crate::expr;
use crate::scope::ScopeStack;
use crate::tcl_err;
use crate::tokenizer::{Token, Tokenizer};
use crate::types::*;
use crate::util;
use crate::value::Value;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

/// The Probetcl interpreter.
///
/// The `Interp` owns a command registry and a stack of variable scopes, and
/// is the unit of isolation: independent interpreters share nothing.  See
/// the [module level documentation](index.html) for an overview.
///
/// # Example
///
/// ```
/// use probetcl::types::*;
/// use probetcl::Interp;
/// use probetcl::tcl_ok;
/// # fn dummy() -> TclResult {
/// let mut glob_ctx = ();
/// let mut interp = Interp::new();
/// let four = interp.eval("expr {2 + 2}", &mut glob_ctx)?;
/// assert_eq!(four, Value::from(4));
/// # tcl_ok!()
/// # }
/// # let _ = dummy();
/// ```
pub struct Interp<Ctx = ()> {
    // Command registry.  Resolution scans from the most recent registration
    // backward, so re-registrations shadow older entries with overlapping
    // argument windows.
    commands: Vec<CommandRec<Ctx>>,

    // Variable scopes.
    scopes: ScopeStack,

    // Defines the recursion limit for script evaluation.
    recursion_limit: usize,

    // Current number of eval levels.
    num_levels: usize,

    // Source line of the statement currently being dispatched.
    cur_line: u32,

    // Error details latched by the most recent failed top-level evaluation.
    last_error: Option<ErrorData>,
}

struct CommandRec<Ctx> {
    name: String,

    // Inclusive argument-count window, counting the command name itself.
    // A max of 0 means unbounded.
    min_args: usize,
    max_args: usize,

    cmd: Rc<Command<Ctx>>,
}

/// A command defined in the interpreter.
enum Command<Ctx> {
    /// A binary command implemented as a Rust CommandFunc.
    Native(CommandFunc<Ctx>),

    #[cfg(feature = "closure-commands")]
    Closure(CommandClosure<Ctx>),

    /// A user-defined procedure.
    Proc(Procedure),
}

impl<Ctx> Command<Ctx> {
    /// Execute the command according to its kind.
    fn execute(&self, interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclResult {
        match self {
            Command::Native(func) => Ok(func(interp, argv, ctx)?.unwrap_or_default()),
            #[cfg(feature = "closure-commands")]
            Command::Closure(func) => Ok(func(interp, argv, ctx)?.unwrap_or_default()),
            Command::Proc(proc) => proc.execute(interp, argv, ctx),
        }
    }

    /// Returns true if the command is a proc, and false otherwise.
    fn is_proc(&self) -> bool {
        matches!(self, Command::Proc(_))
    }
}

impl<Ctx> Default for Interp<Ctx> {
    fn default() -> Self {
        Self::empty()
    }
}

// NOTE: The order of methods in the generated RustDoc depends on the order in
// this block.  Consequently, methods are ordered pedagogically.
impl<Ctx> Interp<Ctx> {
    //--------------------------------------------------------------------------------------------
    // Constructors

    /// Creates a new interpreter with no commands defined.  Use this when
    /// crafting command languages that shouldn't include the normal TCL
    /// commands, or as a base to which specific command sets can be added.
    ///
    /// # Example
    ///
    /// ```
    /// # use probetcl::interp::Interp;
    /// let interp = Interp::<()>::empty();
    /// assert!(interp.command_names().is_empty());
    /// ```
    pub fn empty() -> Self {
        Self {
            commands: Vec::new(),
            scopes: ScopeStack::new(),
            recursion_limit: 1000,
            num_levels: 0,
            cur_line: 1,
            last_error: None,
        }
    }

    /// Creates a new interpreter pre-populated with the standard command
    /// set.  Use [`command_names`](#method.command_names) (or the
    /// `info commands` command) to retrieve the full list, and the
    /// [`add_command`](#method.add_command) family of methods to extend the
    /// interpreter with new commands.
    ///
    /// ```
    /// # use probetcl::types::*;
    /// # use probetcl::Interp;
    /// # use probetcl::tcl_ok;
    /// # fn dummy() -> TclResult {
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    /// let four = interp.eval("expr {2 + 2}", &mut glob_ctx)?;
    /// assert_eq!(four, Value::from(4));
    /// # tcl_ok!()
    /// # }
    /// # let _ = dummy();
    /// ```
    pub fn new() -> Self {
        let mut interp = Interp::empty();

        let new_commands: &[(&'static str, usize, usize, CommandFunc<Ctx>)] = &[
            ("append", 3, 0, commands::cmd_append),
            ("array", 3, 5, commands::cmd_array),
            ("break", 1, 1, commands::cmd_break),
            ("concat", 1, 0, commands::cmd_concat),
            ("continue", 1, 1, commands::cmd_continue),
            ("error", 2, 2, commands::cmd_error),
            ("exit", 1, 2, commands::cmd_exit),
            ("for", 5, 5, commands::cmd_for),
            ("foreach", 4, 4, commands::cmd_foreach),
            ("global", 2, 0, commands::cmd_global),
            ("if", 3, 0, commands::cmd_if),
            ("incr", 2, 3, commands::cmd_incr),
            ("join", 2, 3, commands::cmd_join),
            ("lappend", 2, 0, commands::cmd_lappend),
            ("lindex", 3, 3, commands::cmd_lindex),
            ("list", 1, 0, commands::cmd_list),
            ("llength", 2, 2, commands::cmd_llength),
            ("lrange", 4, 4, commands::cmd_lrange),
            ("lreplace", 4, 0, commands::cmd_lreplace),
            ("proc", 4, 4, commands::cmd_proc),
            ("return", 1, 2, commands::cmd_return),
            ("set", 2, 3, commands::cmd_set),
            ("split", 2, 3, commands::cmd_split),
            ("subst", 2, 2, commands::cmd_subst),
            ("switch", 3, 0, commands::cmd_switch),
            ("unset", 2, 0, commands::cmd_unset),
            ("while", 3, 3, commands::cmd_while),
            #[cfg(feature = "expr")]
            ("expr", 2, 0, commands::cmd_expr),
            #[cfg(feature = "info")]
            ("info", 2, 3, commands::cmd_info),
            #[cfg(feature = "string-command")]
            ("string", 3, 6, commands::cmd_string),
            #[cfg(feature = "string-command")]
            ("format", 2, 0, commands::cmd_format),
            #[cfg(feature = "string-command")]
            ("scan", 3, 0, commands::cmd_scan),
            #[cfg(feature = "std")]
            ("puts", 2, 3, commands::cmd_puts),
            #[cfg(feature = "std")]
            ("source", 2, 2, commands::cmd_source),
            #[cfg(feature = "std")]
            ("env", 2, 3, commands::cmd_env),
        ];

        for &(name, min_args, max_args, func) in new_commands {
            interp.add_command(name, min_args, max_args, func);
        }

        interp
    }

    //--------------------------------------------------------------------------------------------
    // Script and Expression Evaluation

    /// Evaluates a script one command at a time.  Returns the [`Value`] of
    /// the last command in the script, the value of any explicit `return`
    /// call, or the first error raised.
    ///
    /// At the top level, `break` and `continue` are converted to errors and
    /// `return` is absorbed into a normal result; an `exit` exception
    /// propagates to the caller, which decides how to honor it.  On error,
    /// the error's kind, source line, and symbol stay available from
    /// [`error_info`](#method.error_info) until the next top-level
    /// evaluation.
    ///
    /// # Example
    ///
    /// ```
    /// # use probetcl::types::*;
    /// # use probetcl::Interp;
    ///
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    ///
    /// match interp.eval("set a 1", &mut glob_ctx) {
    ///     Ok(val) => println!("Value: {}", val),
    ///     Err(exception) => {
    ///         if exception.is_error() {
    ///             println!("Error: {}", exception.value());
    ///         }
    ///     }
    /// }
    /// ```
    pub fn eval(&mut self, script: &str, ctx: &mut Ctx) -> TclResult {
        let top_level = self.num_levels == 0;

        if top_level {
            self.last_error = None;

            // A lexical error anywhere in the script prevents execution of
            // any of its commands.
            if let Err(exception) = prescan(script) {
                self.last_error = exception.error_data().cloned();
                return Err(exception);
            }
        }

        let mut result = self.eval_script(script, 1, ctx);

        if top_level {
            if let Err(exception) = result {
                result = match exception.code() {
                    ResultCode::Return => Ok(exception.value()),
                    ResultCode::Break => Err(Exception::error(
                        ErrorKind::General,
                        Value::from("invoked \"break\" outside of a loop"),
                    )),
                    ResultCode::Continue => Err(Exception::error(
                        ErrorKind::General,
                        Value::from("invoked \"continue\" outside of a loop"),
                    )),
                    ResultCode::Error | ResultCode::Exit => Err(exception),
                };
            }

            if let Err(exception) = &result {
                self.last_error = exception.error_data().cloned();
            }
        }

        result
    }

    /// Evaluates a stored block (a loop or proc body, or a branch of `if`)
    /// in the current scope.  Control-flow exceptions propagate to the
    /// calling construct.  Line numbers inside the block are relative to
    /// the block itself.
    pub(crate) fn eval_body(&mut self, body: &Value, ctx: &mut Ctx) -> TclResult {
        self.eval_script(body.as_str(), 1, ctx)
    }

    /// Evaluates script text with the given base line number, enforcing the
    /// recursion limit.  All evaluation (nested `[...]` substitution,
    /// control-flow bodies, proc bodies) funnels through here.
    fn eval_script(&mut self, text: &str, base_line: u32, ctx: &mut Ctx) -> TclResult {
        self.num_levels += 1;

        if self.num_levels > self.recursion_limit {
            self.num_levels -= 1;
            return tcl_err!("too many nested evaluations (infinite loop?)");
        }

        let result = self.eval_commands(text, base_line, ctx);
        self.num_levels -= 1;
        result
    }

    /// The evaluator proper: drives the lexer over the text, accumulating
    /// substituted fragments into words and words into an argument list,
    /// and dispatches the list at each execution point.
    fn eval_commands(&mut self, text: &str, base_line: u32, ctx: &mut Ctx) -> TclResult {
        let mut tokenizer = Tokenizer::new(text);
        let mut word: Option<Value> = None;
        let mut args: TclList = Vec::new();
        let mut result = Value::empty();
        let mut stmt_line = base_line;

        loop {
            let token = tokenizer.next();
            match token {
                Some(Token::Field(frag)) | Some(Token::Partial(frag)) => {
                    let frag_line = base_line + util::line_at(text, tokenizer.token_start()) - 1;
                    if word.is_none() && args.is_empty() {
                        // Re-anchor position tracking at the statement start.
                        stmt_line = frag_line;
                    }

                    let expanded = match self.substitute(frag, frag_line, ctx) {
                        Ok(value) => value,
                        Err(mut exception) => {
                            exception.attach_line(stmt_line);
                            return Err(exception);
                        }
                    };

                    word.get_or_insert_with(Value::empty).append(expanded);
                    if matches!(token, Some(Token::Field(_))) {
                        args.push(word.take().unwrap_or_default());
                    }
                }

                Some(Token::ExecPoint) | None => {
                    if word.is_some() {
                        return Err(syntax_error(stmt_line, false));
                    }

                    if !args.is_empty() {
                        self.cur_line = stmt_line;
                        let invocation = core::mem::take(&mut args);
                        match self.dispatch(&invocation, ctx) {
                            Ok(value) => result = value,
                            Err(mut exception) => {
                                exception.attach_line(stmt_line);
                                return Err(exception);
                            }
                        }
                    }

                    if token.is_none() {
                        break;
                    }
                }

                Some(Token::Error) => {
                    let line = base_line + util::line_at(text, tokenizer.token_start()) - 1;
                    return Err(syntax_error(line, tokenizer.truncated()));
                }
            }
        }

        Ok(result)
    }

    /// Resolves and invokes the command named by `argv[0]`.
    fn dispatch(&mut self, argv: &[Value], ctx: &mut Ctx) -> TclResult {
        let name = argv[0].as_str();
        let Some(rec) = self.lookup(name, argv.len()) else {
            return Err(Exception::error_for(
                ErrorKind::CmdUnknown,
                Value::from(format!("invalid command name \"{}\"", name)),
                name,
            ));
        };

        let cmd = Rc::clone(&rec.cmd);
        cmd.execute(self, argv, ctx)
    }

    /// Finds the most recently registered command matching the name whose
    /// argument window contains `argc`.  An `argc` of 0 matches any window
    /// (used for administrative lookups such as proc introspection).
    fn lookup(&self, name: &str, argc: usize) -> Option<&CommandRec<Ctx>> {
        self.commands.iter().rev().find(|rec| {
            rec.name == name
                && (argc == 0
                    || (argc >= rec.min_args && (rec.max_args == 0 || argc <= rec.max_args)))
        })
    }

    //--------------------------------------------------------------------------------------------
    // Substitution

    /// Expands one lexed fragment into its value: contracts a braced field,
    /// evaluates a bracketed field as a nested script, resolves a `$`
    /// splice, decodes a backslash escape, or copies a literal.
    fn substitute(&mut self, frag: &str, frag_line: u32, ctx: &mut Ctx) -> TclResult {
        match frag.as_bytes().first() {
            None => Ok(Value::empty()),

            Some(b'{') => {
                if frag.len() >= 2 && frag.ends_with('}') {
                    Ok(Value::from(&frag[1..frag.len() - 1]))
                } else {
                    Err(Exception::error(
                        ErrorKind::BraceMismatch,
                        Value::from(format!("malformed braces in \"{}\"", frag)),
                    ))
                }
            }

            Some(b'[') => {
                debug_assert!(frag.ends_with(']'));
                self.eval_script(&frag[1..frag.len() - 1], frag_line, ctx)
            }

            Some(b'$') => self.substitute_splice(frag, frag_line, ctx),

            Some(b'\\') => Ok(decode_escape(frag)),

            _ => Ok(Value::from(frag)),
        }
    }

    /// Resolves a `$` variable splice: `$name`, `$$name` (double
    /// dereference), `${name}`, `$[script]`, each with an optional
    /// parenthesized element index whose text is itself substituted before
    /// being parsed as an integer.
    fn substitute_splice(&mut self, frag: &str, frag_line: u32, ctx: &mut Ctx) -> TclResult {
        debug_assert!(frag.starts_with('$'));
        let rest = &frag[1..];

        // Doubled sigil: the inner splice's value names the variable.
        if rest.starts_with('$') {
            let name = self.substitute_splice(rest, frag_line, ctx)?;
            return self.var(&name);
        }

        let (designator, index_text) = split_splice(rest)?;

        let name = match designator {
            Designator::Literal(text) => Value::from(text),
            Designator::Script(script) => self.eval_script(script, frag_line, ctx)?,
        };

        match index_text {
            Some(text) => {
                // Substitutions inside the index are expanded first, then
                // the result is parsed as the element index.
                let index = self.subst_text(text, frag_line, ctx)?;
                self.element(name.as_str(), util::parse_index(index.as_str())?)
            }
            None => self.var(&name),
        }
    }

    /// Performs `$`, `[...]`, and backslash substitution over arbitrary
    /// text, leaving everything else (including whitespace and braces)
    /// untouched.  This backs the `subst` command and array-index
    /// expansion.
    pub(crate) fn subst_text(&mut self, text: &str, base_line: u32, ctx: &mut Ctx) -> TclResult {
        let bytes = text.as_bytes();
        let mut out = Value::empty();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'$' | b'[' | b'\\' => {
                    // Let the lexer find the extent of the splice, bracket
                    // region, or escape, then substitute that fragment.
                    let mut tokenizer = Tokenizer::new(&text[pos..]);
                    match tokenizer.next() {
                        Some(Token::Field(frag)) | Some(Token::Partial(frag))
                            if !frag.is_empty() =>
                        {
                            let frag_line = base_line + util::line_at(text, pos) - 1;
                            out.append(self.substitute(frag, frag_line, ctx)?);
                            pos += frag.len();
                        }
                        _ => {
                            return Err(syntax_error(
                                base_line + util::line_at(text, pos) - 1,
                                tokenizer.truncated(),
                            ));
                        }
                    }
                }
                _ => {
                    // Copy the literal run up to the next special character.
                    let run = bytes[pos..]
                        .iter()
                        .position(|&c| matches!(c, b'$' | b'[' | b'\\'))
                        .unwrap_or(bytes.len() - pos);
                    out.append(Value::from(&text[pos..pos + run]));
                    pos += run;
                }
            }
        }

        Ok(out)
    }

    /// Determines whether or not the script is syntactically complete, e.g.
    /// has no unmatched quotes, brackets, or braces.
    ///
    /// REPLs use this to determine whether or not to ask for another line of
    /// input.
    ///
    /// # Example
    ///
    /// ```
    /// # use probetcl::interp::Interp;
    /// let interp = Interp::<()>::new();
    /// assert!(interp.complete("set a [expr {1+1}]"));
    /// assert!(!interp.complete("set a [expr {1+1"));
    /// ```
    pub fn complete(&self, script: &str) -> bool {
        let mut tokenizer = Tokenizer::new(script);
        loop {
            match tokenizer.next() {
                Some(Token::Error) => return !tokenizer.truncated(),
                None => return true,
                _ => (),
            }
        }
    }

    /// Evaluates an expression and returns its value.
    ///
    /// # Example
    /// ```
    /// use probetcl::Interp;
    /// use probetcl::types::*;
    /// # fn dummy() -> Result<(), Exception> {
    /// let mut interp = Interp::<()>::new();
    /// let sum = interp.expr(&Value::from("2 + 2"))?.as_int()?;
    ///
    /// assert_eq!(sum, 4);
    /// # Ok(())
    /// # }
    /// # let _ = dummy();
    /// ```
    #[cfg(feature = "expr")]
    pub fn expr(&mut self, expr: &Value) -> TclResult {
        let result = expr::eval_expr(self, expr.as_str());

        if self.num_levels == 0 {
            if let Err(exception) = &result {
                self.last_error = exception.error_data().cloned();
            }
        }

        result
    }

    /// Evaluates an expression and returns its truth value: any nonzero
    /// result is true.  This is what the condition clauses of `if`, `while`,
    /// and `for` use.
    pub fn expr_bool(&mut self, expr: &Value) -> Result<bool, Exception> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "expr")] {
                Ok(self.expr(expr)?.as_int()? != 0)
            } else {
                // Without the expression evaluator, conditions must already
                // be plain integers.
                Ok(expr.as_int()? != 0)
            }
        }
    }

    /// Evaluates an expression and returns its value as an integer.
    #[cfg(feature = "expr")]
    pub fn expr_int(&mut self, expr: &Value) -> Result<TclInt, Exception> {
        self.expr(expr)?.as_int()
    }

    //--------------------------------------------------------------------------------------------
    // Variable Handling

    /// Retrieves the value of the named variable in the current scope.  The
    /// `var_name` may name a scalar variable, `a`, or an array element,
    /// `a(3)`.  This is the normal way to retrieve the value of a variable
    /// named by a command argument.
    ///
    /// # Example
    ///
    /// ```
    /// use probetcl::types::*;
    /// use probetcl::Interp;
    /// use probetcl::tcl_ok;
    /// # fn dummy() -> TclResult {
    /// let mut glob_ctx = ();
    /// let mut interp = Interp::new();
    ///
    /// interp.eval("set a 1", &mut glob_ctx)?;
    /// assert_eq!(interp.var(&Value::from("a"))?.as_str(), "1");
    ///
    /// interp.eval("set b(1) howdy", &mut glob_ctx)?;
    /// assert_eq!(interp.var(&Value::from("b(1)"))?.as_str(), "howdy");
    /// # tcl_ok!()
    /// # }
    /// # let _ = dummy();
    /// ```
    pub fn var(&self, var_name: &Value) -> TclResult {
        let (name, index) = util::split_var_name(var_name.as_str());
        match index {
            Some(text) => self.element(name, util::parse_index(text)?),
            None => self.scalar(name),
        }
    }

    /// Returns true if the named variable (or array element) exists in the
    /// current scope, and false otherwise.
    pub fn var_exists(&self, var_name: &Value) -> bool {
        let (name, index) = util::split_var_name(var_name.as_str());
        match index {
            Some(text) => match util::parse_index(text) {
                Ok(index) => self.scopes.elem_exists(name, index),
                Err(_) => false,
            },
            None => self.scopes.exists(name),
        }
    }

    /// Sets the value of the variable in the current scope, creating it if
    /// necessary.  The `var_name` may name a scalar variable or an array
    /// element.
    pub fn set_var(&mut self, var_name: &Value, value: Value) -> Result<(), Exception> {
        let (name, index) = util::split_var_name(var_name.as_str());
        match index {
            Some(text) => self.set_element(name, util::parse_index(text)?, value),
            None => self.set_scalar(name, value),
        }
    }

    /// Sets the value of the variable in the current scope, returning the
    /// value.  Convenient for commands that return what they assigned, such
    /// as `set` and `incr`.
    pub fn set_var_return(&mut self, var_name: &Value, value: Value) -> TclResult {
        self.set_var(var_name, value.clone())?;
        Ok(value)
    }

    /// Retrieves the value of the named scalar variable (element 0) in the
    /// current scope.  Returns an error if the variable is not found.
    pub fn scalar(&self, name: &str) -> TclResult {
        self.scopes.get(name)
    }

    /// Sets the named scalar variable (element 0) in the current scope,
    /// creating the variable if necessary.
    pub fn set_scalar(&mut self, name: &str, value: Value) -> Result<(), Exception> {
        self.scopes.set(name, value)
    }

    /// Retrieves element `index` of the named variable in the current
    /// scope.  Returns an error if the variable or element doesn't exist.
    pub fn element(&self, name: &str, index: usize) -> TclResult {
        self.scopes.get_elem(name, index)
    }

    /// Sets element `index` of the named variable in the current scope,
    /// creating the variable and growing its element storage as needed.
    pub fn set_element(&mut self, name: &str, index: usize, value: Value) -> Result<(), Exception> {
        self.scopes.set_elem(name, index, value)
    }

    /// Unsets a variable given its name in the current scope.  It is _not_
    /// an error to unset a variable that doesn't exist.
    pub fn unset(&mut self, name: &str) {
        self.scopes.unset(name);
    }

    /// Unsets the named variable or array element in the current scope.
    /// Unsetting an element clears it back to the empty value; element
    /// storage never shrinks.
    pub fn unset_var(&mut self, var_name: &Value) {
        let (name, index) = util::split_var_name(var_name.as_str());
        match index.map(util::parse_index) {
            Some(Ok(index)) => self.scopes.unset_elem(name, index),
            Some(Err(_)) => (),
            None => self.unset(name),
        }
    }

    /// Implements the `global` command: makes `name` in the current scope an
    /// alias for the global variable of the same name, creating the global
    /// if necessary.  Fails in the global scope, and if `name` already
    /// exists locally as an ordinary variable.
    pub fn global(&mut self, name: &str) -> Result<(), Exception> {
        self.scopes.link_global(name)
    }

    /// Gets a list of the names of the variables that are visible in the
    /// current scope, in the order they were first set.
    pub fn vars_in_scope(&self) -> TclList {
        self.scopes.vars_in_scope()
    }

    /// Gets a list of the names of the variables defined in the global
    /// scope.
    pub fn vars_in_global_scope(&self) -> TclList {
        self.scopes.vars_in_global_scope()
    }

    /// The number of elements of the named variable: 1 for a plain scalar,
    /// more for an array, 0 if the variable doesn't exist.
    pub fn array_size(&self, name: &str) -> usize {
        self.scopes.array_size(name)
    }

    /// Clones the elements of the named variable in the inclusive index
    /// range, clamped to the elements that exist.
    pub fn array_slice(&self, name: &str, first: usize, last: usize) -> TclList {
        self.scopes.array_slice(name, first, last)
    }

    /// Pushes a variable scope onto the scope stack.  Procs use this to
    /// define their local scope.
    ///
    /// **Note:** a command that pushes a scope must also call
    /// `Interp::pop_scope` before it exits!
    pub fn push_scope(&mut self) {
        self.scopes.push();
    }

    /// Pops a variable scope off the scope stack, dropping the variables it
    /// owns.  Calls to `Interp::push_scope` and `Interp::pop_scope` must
    /// exist in pairs.
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Return the current scope level.  The global scope is level `0`; each
    /// call to `Interp::push_scope` adds a level, and each call to
    /// `Interp::pop_scope` removes one.
    pub fn scope_level(&self) -> usize {
        self.scopes.current()
    }

    //--------------------------------------------------------------------------------------------
    // Command Definition and Handling

    /// Adds a command to the interpreter: a name, the inclusive
    /// argument-count window the command accepts (counting the command name
    /// itself; a max of `0` means unbounded), and the implementing function.
    ///
    /// Registering a name again shadows the earlier registration for the
    /// argument counts the new window covers; the same name with disjoint
    /// windows dispatches to whichever entry matches the call.
    pub fn add_command(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: usize,
        func: CommandFunc<Ctx>,
    ) {
        self.push_command(name, min_args, max_args, Command::Native(func));
    }

    /// Adds a command implemented by a closure, which may capture host
    /// state.
    #[cfg(feature = "closure-commands")]
    pub fn add_command_closure(
        &mut self,
        name: &str,
        min_args: usize,
        max_args: usize,
        func: impl (Fn(&mut Self, &[Value], &mut Ctx) -> TclOptResult) + 'static,
    ) {
        self.push_command(
            name,
            min_args,
            max_args,
            Command::Closure(alloc::boxed::Box::new(func)),
        );
    }

    /// Adds a procedure to the interpreter.  The registered argument window
    /// is exact: one more than the number of formal parameters.
    pub(crate) fn add_proc(
        &mut self,
        name: &str,
        params: Vec<String>,
        body: Value,
        decl_line: u32,
    ) {
        let arity = params.len() + 1;
        let proc = Procedure {
            params,
            body,
            decl_line,
        };
        self.push_command(name, arity, arity, Command::Proc(proc));
    }

    fn push_command(&mut self, name: &str, min_args: usize, max_args: usize, cmd: Command<Ctx>) {
        self.commands.push(CommandRec {
            name: String::from(name),
            min_args,
            max_args,
            cmd: Rc::new(cmd),
        });
    }

    /// Determines whether or not the interpreter contains a command with the
    /// given name, at any arity.
    pub fn has_command(&self, name: &str) -> bool {
        self.lookup(name, 0).is_some()
    }

    /// Gets a vector of the names of the existing commands, in registration
    /// order, without duplicates.
    pub fn command_names(&self) -> TclList {
        let mut names: Vec<&str> = Vec::new();
        for rec in &self.commands {
            if !names.contains(&rec.name.as_str()) {
                names.push(&rec.name);
            }
        }
        names.into_iter().map(Value::from).collect()
    }

    /// Gets a vector of the names of the existing procedures.
    pub fn proc_names(&self) -> TclList {
        let mut names: Vec<&str> = Vec::new();
        for rec in &self.commands {
            if rec.cmd.is_proc() && !names.contains(&rec.name.as_str()) {
                names.push(&rec.name);
            }
        }
        names.into_iter().map(Value::from).collect()
    }

    /// Returns the body of the named procedure, or an error if the name
    /// doesn't name a procedure.
    pub fn proc_body(&self, procname: &str) -> TclResult {
        if let Some(rec) = self.lookup(procname, 0) {
            if let Command::Proc(proc) = &*rec.cmd {
                return Ok(proc.body.clone());
            }
        }

        Err(Exception::error_for(
            ErrorKind::BadParam,
            Value::from(format!("\"{}\" isn't a procedure", procname)),
            procname,
        ))
    }

    /// Returns a list of the names of the arguments of the named procedure,
    /// or an error if the name doesn't name a procedure.
    pub fn proc_args(&self, procname: &str) -> TclResult {
        if let Some(rec) = self.lookup(procname, 0) {
            if let Command::Proc(proc) = &*rec.cmd {
                let args: TclList = proc.params.iter().map(Value::from).collect();
                return Ok(Value::from(args));
            }
        }

        Err(Exception::error_for(
            ErrorKind::BadParam,
            Value::from(format!("\"{}\" isn't a procedure", procname)),
            procname,
        ))
    }

    /// Calls a subcommand of the current command, looking up its name in an
    /// array of `Subcommand` tuples.
    ///
    /// `subc` is the index of the subcommand's name in the `argv` array; in
    /// most cases it will be `1`.  If the subcommand name is found, the
    /// matching function is called; otherwise the error message lists the
    /// valid options.  See the implementation of the `array` command in
    /// `commands.rs` for an example.
    pub fn call_subcommand(
        &mut self,
        argv: &[Value],
        subc: usize,
        subcommands: &[Subcommand<Ctx>],
        ctx: &mut Ctx,
    ) -> TclOptResult {
        crate::check_args(subc, argv, subc + 1, 0, "subcommand ?arg ...?")?;
        let rec = Subcommand::find(subcommands, argv[subc].as_str())?;
        (rec.1)(self, argv, ctx)
    }

    /// The source line (1-based, within the buffer being evaluated) of the
    /// statement currently being dispatched.  `proc` records this as the
    /// declaration position for error reporting.
    pub(crate) fn current_line(&self) -> u32 {
        self.cur_line
    }

    //--------------------------------------------------------------------------------------------
    // Interpreter Configuration

    /// The error details (kind, source line, offending symbol) latched by
    /// the most recent failed top-level evaluation, or `None` if it
    /// succeeded.
    ///
    /// The first error raised during an evaluation is sticky: unwinding
    /// doesn't overwrite it.
    pub fn error_info(&self) -> Option<&ErrorData> {
        self.last_error.as_ref()
    }

    /// Gets the interpreter's recursion limit: how deep the stack of script
    /// evaluations may be.
    ///
    /// # Example
    /// ```
    /// # use probetcl::interp::Interp;
    /// let interp = Interp::<()>::new();
    /// assert_eq!(interp.recursion_limit(), 1000);
    /// ```
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Sets the interpreter's recursion limit.  The default is 1000.
    ///
    /// A stack level is added by each nested script evaluation: `[...]`
    /// substitutions, control-flow bodies, and proc calls all count.
    ///
    /// # Example
    /// ```
    /// # use probetcl::interp::Interp;
    /// let mut interp = Interp::<()>::new();
    /// interp.set_recursion_limit(100);
    /// assert_eq!(interp.recursion_limit(), 100);
    /// ```
    pub fn set_recursion_limit(&mut self, limit: usize) {
        self.recursion_limit = limit;
    }
}

/// Builds the lexical-error exception used by evaluation and prescanning.
fn syntax_error(line: u32, truncated: bool) -> Exception {
    let mut exception = if truncated {
        Exception::error(
            ErrorKind::BraceMismatch,
            Value::from("unbalanced braces, brackets, or quotes"),
        )
    } else {
        Exception::error(ErrorKind::Syntax, Value::from("syntax error in script"))
    };
    exception.attach_line(line);
    exception
}

/// Lexes the whole script without evaluating anything, so that a script with
/// a lexical error executes none of its commands.
fn prescan(script: &str) -> Result<(), Exception> {
    let mut tokenizer = Tokenizer::new(script);
    loop {
        match tokenizer.next() {
            Some(Token::Error) => {
                let line = util::line_at(script, tokenizer.token_start());
                return Err(syntax_error(line, tokenizer.truncated()));
            }
            None => return Ok(()),
            _ => (),
        }
    }
}

/// How the name of a `$` splice is designated: literally, or by a nested
/// script whose result is the name.
enum Designator<'a> {
    Literal(&'a str),
    Script(&'a str),
}

/// Splits the text after a `$` sigil into the name designator and the
/// interior of the optional parenthesized index.
fn split_splice(rest: &str) -> Result<(Designator<'_>, Option<&str>), Exception> {
    let (designator, after) = match rest.as_bytes().first() {
        Some(b'{') => {
            let close = matching_delimiter(rest, b'{', b'}')?;
            (Designator::Literal(&rest[1..close]), &rest[close + 1..])
        }
        Some(b'[') => {
            let close = matching_delimiter(rest, b'[', b']')?;
            (Designator::Script(&rest[1..close]), &rest[close + 1..])
        }
        _ => {
            let split = rest.find('(').unwrap_or(rest.len());
            (Designator::Literal(&rest[..split]), &rest[split..])
        }
    };

    if after.is_empty() {
        return Ok((designator, None));
    }

    // The lexer only ever leaves a balanced index suffix behind.
    debug_assert!(after.starts_with('(') && after.ends_with(')'));
    Ok((designator, Some(&after[1..after.len() - 1])))
}

/// Finds the byte offset of the delimiter closing the region that opens at
/// offset 0, honoring backslash escapes.
fn matching_delimiter(text: &str, open: u8, close: u8) -> Result<usize, Exception> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => (),
        }
        i += 1;
    }

    Err(Exception::error(
        ErrorKind::BraceMismatch,
        Value::from("unbalanced braces, brackets, or quotes"),
    ))
}

/// Decodes one backslash escape, as consumed verbatim by the lexer: the
/// control escapes `\n`, `\r`, `\t`; a backslash-newline as a single space;
/// `\xHH` as the character with that code; anything else as the escaped
/// character itself.
fn decode_escape(frag: &str) -> Value {
    debug_assert!(frag.starts_with('\\'));
    let mut chars = frag.chars();
    chars.next();

    match chars.next() {
        Some('n') => Value::from('\n'),
        Some('r') => Value::from('\r'),
        Some('t') => Value::from('\t'),
        Some('\n') | Some('\r') => Value::from(' '),
        Some('x') if frag.len() == 4 => {
            let code = u32::from_str_radix(&frag[2..4], 16).unwrap_or(0);
            Value::from(char::from_u32(code).unwrap_or('\0'))
        }
        Some(c) => Value::from(c),
        None => Value::empty(),
    }
}

/// How a procedure is defined: a formal parameter list, a body script, and
/// the source line of its `proc` declaration.
///
/// NOTE: We do not save the procedure's name; the name exists only in the
/// command registry.  The procedure doesn't know what its name is except
/// when it is being executed.
struct Procedure {
    /// The formal parameter names, bound positionally.  The registered
    /// argument window is exact, so the evaluator never calls a proc with
    /// the wrong count.
    params: Vec<String>,

    /// The procedure's body text.
    body: Value,

    /// The source line of the `proc` declaration, used to remap the lines of
    /// errors raised inside the body.
    decl_line: u32,
}

impl Procedure {
    fn execute<Ctx>(&self, interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclResult {
        debug_assert_eq!(argv.len(), self.params.len() + 1);

        // FIRST, push the proc's local scope and bind the formals.
        interp.push_scope();

        let mut result = Ok(Value::empty());
        for (param, arg) in self.params.iter().zip(&argv[1..]) {
            if let Err(exception) = interp.set_scalar(param, arg.clone()) {
                result = Err(exception);
                break;
            }
        }

        // NEXT, evaluate the body in the new scope.
        if result.is_ok() {
            result = interp.eval_body(&self.body, ctx);
        }

        // NEXT, pop the scope; we're done with it either way.
        interp.pop_scope();

        match result {
            Err(mut exception) => match exception.code() {
                // An explicit return becomes the call's normal result.
                ResultCode::Return => Ok(exception.value()),

                // Loops consume break/continue before they reach a proc
                // boundary; one arriving here means the body used it
                // outside any loop.
                ResultCode::Break => Err(Exception::error(
                    ErrorKind::General,
                    Value::from("invoked \"break\" outside of a loop"),
                )),
                ResultCode::Continue => Err(Exception::error(
                    ErrorKind::General,
                    Value::from("invoked \"continue\" outside of a loop"),
                )),

                // Report body-relative error lines in the coordinates of
                // the proc declaration.
                ResultCode::Error => {
                    exception.remap_into_decl(self.decl_line);
                    Err(exception)
                }

                ResultCode::Exit => Err(exception),
            },
            ok => ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_ok(interp: &mut Interp<()>, script: &str) -> Value {
        interp.eval(script, &mut ()).expect("script evaluates")
    }

    fn eval_err(interp: &mut Interp<()>, script: &str) -> Exception {
        interp.eval(script, &mut ()).expect_err("script fails")
    }

    #[test]
    fn test_empty() {
        let interp = Interp::<()>::empty();
        assert!(interp.command_names().is_empty());
    }

    #[test]
    fn test_new() {
        let interp = Interp::<()>::new();
        assert!(!interp.command_names().is_empty());
        assert!(interp.has_command("set"));
        assert!(interp.has_command("while"));
    }

    #[test]
    fn test_eval() {
        let mut interp = Interp::new();

        assert_eq!(eval_ok(&mut interp, "set a 1").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "return 3").as_str(), "3");

        let e = eval_err(&mut interp, "error 2");
        assert!(e.is_error());
        assert_eq!(e.value().as_str(), "2");

        let e = eval_err(&mut interp, "break");
        assert_eq!(e.value().as_str(), "invoked \"break\" outside of a loop");
        let e = eval_err(&mut interp, "continue");
        assert_eq!(e.value().as_str(), "invoked \"continue\" outside of a loop");
    }

    #[test]
    fn test_substitution() {
        let mut interp = Interp::new();

        assert_eq!(
            eval_ok(&mut interp, "set a 5; set b \"val=$a\"").as_str(),
            "val=5"
        );
        assert_eq!(eval_ok(&mut interp, "set c [expr {1+1}]").as_str(), "2");
        assert_eq!(
            eval_ok(&mut interp, "set d [expr {[expr {1+1}]*2}]").as_str(),
            "4"
        );
    }

    #[test]
    fn test_brace_contraction() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set a {b c}").as_str(), "b c");
        // One layer only.
        assert_eq!(eval_ok(&mut interp, "set a {{b c}}").as_str(), "{b c}");
    }

    #[test]
    fn test_escapes() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, r"set a a\tb").as_str(), "a\tb");
        assert_eq!(eval_ok(&mut interp, r"set a \x41").as_str(), "A");
        assert_eq!(eval_ok(&mut interp, "set a b\\\nc").as_str(), "b c");
        assert_eq!(eval_ok(&mut interp, r"set a \$x").as_str(), "$x");
    }

    #[test]
    fn test_double_dereference() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set name target; set target 99");
        assert_eq!(eval_ok(&mut interp, "set v $$name").as_str(), "99");
    }

    #[test]
    fn test_dynamic_variable_names() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set ab 7");
        assert_eq!(eval_ok(&mut interp, "set x ${ab}").as_str(), "7");
        eval_ok(&mut interp, "set which ab");
        assert_eq!(eval_ok(&mut interp, "set x $[set which]").as_str(), "7");
    }

    #[test]
    fn test_array_elements() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set a(3) x");
        assert_eq!(eval_ok(&mut interp, "set a(3)").as_str(), "x");

        // Substitution inside the index.
        eval_ok(&mut interp, "set i 3");
        assert_eq!(eval_ok(&mut interp, "set v $a($i)").as_str(), "x");

        // Newly exposed slots read as empty.
        assert_eq!(eval_ok(&mut interp, "set v $a(1)").as_str(), "");
    }

    #[test]
    fn test_unknown_command() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set a before");

        let e = eval_err(&mut interp, "nosuchcommand 1 2");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::CmdUnknown);
        assert_eq!(e.error_data().unwrap().symbol(), Some("nosuchcommand"));

        // Prior state is untouched.
        assert_eq!(eval_ok(&mut interp, "set a").as_str(), "before");
    }

    #[test]
    fn test_unknown_variable() {
        let mut interp = Interp::new();
        let e = eval_err(&mut interp, "set x $missing");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::VarUnknown);
    }

    #[test]
    fn test_unbalanced_brace_executes_nothing() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set a 0");

        // The lexical error comes after a well-formed command, which must
        // not run.
        let e = eval_err(&mut interp, "set a 1\nset b {oops");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::BraceMismatch);
        assert_eq!(e.error_data().unwrap().line(), Some(2));
        assert_eq!(eval_ok(&mut interp, "set a").as_str(), "0");
    }

    #[test]
    fn test_error_line_tracking() {
        let mut interp = Interp::new();
        let e = eval_err(&mut interp, "set a 1\nset b 2\nbogus\nset c 3");
        assert_eq!(e.error_data().unwrap().line(), Some(3));

        // The latched info is available afterward.
        assert_eq!(interp.error_info().unwrap().line(), Some(3));
        assert_eq!(interp.error_info().unwrap().kind(), ErrorKind::CmdUnknown);
    }

    #[test]
    fn test_first_error_is_sticky() {
        let mut interp = Interp::new();
        let e = eval_err(&mut interp, "while {1} {bogus}");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::CmdUnknown);
    }

    #[test]
    fn test_proc_scoping() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc p {} { set inner 1 }; p");
        let e = eval_err(&mut interp, "set inner");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::VarUnknown);
    }

    #[test]
    fn test_proc_global() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set x 1");
        eval_ok(&mut interp, "proc bump {} { global x; incr x }");
        eval_ok(&mut interp, "bump; bump");
        assert_eq!(eval_ok(&mut interp, "set x").as_str(), "3");
    }

    #[test]
    fn test_proc_call() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc add {a b} { expr {$a + $b} }");
        assert_eq!(eval_ok(&mut interp, "add 2 3").as_str(), "5");
    }

    #[test]
    fn test_proc_arity_mismatch_is_unknown_command() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc add {a b} { expr {$a + $b} }");
        let e = eval_err(&mut interp, "add 2");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::CmdUnknown);
        let e = eval_err(&mut interp, "add 2 3 4");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::CmdUnknown);
    }

    #[test]
    fn test_proc_return_absorbed() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc f {} { return early; set never 1 }");
        assert_eq!(eval_ok(&mut interp, "f").as_str(), "early");
    }

    #[test]
    fn test_proc_error_line_remap() {
        let mut interp = Interp::new();
        // The proc declaration starts on line 2; the failing statement is
        // on line 2 of the body.
        eval_ok(
            &mut interp,
            "set pad 1\nproc f {} {\n    set ok 1\n    bogus\n}",
        );
        let e = eval_err(&mut interp, "f");
        // Body line 3 remaps to declaration line 2 + 3 - 1.
        assert_eq!(e.error_data().unwrap().line(), Some(4));
    }

    #[test]
    fn test_same_name_disjoint_arities() {
        let mut interp = Interp::new();
        interp.add_command("thing", 1, 1, |_, _, _| Ok(Some(Value::from("bare"))));
        interp.add_command("thing", 2, 2, |_, _, _| Ok(Some(Value::from("one"))));
        assert_eq!(eval_ok(&mut interp, "thing").as_str(), "bare");
        assert_eq!(eval_ok(&mut interp, "thing x").as_str(), "one");
    }

    #[test]
    fn test_later_registration_shadows() {
        let mut interp = Interp::new();
        interp.add_command("probe", 1, 0, |_, _, _| Ok(Some(Value::from("old"))));
        interp.add_command("probe", 1, 0, |_, _, _| Ok(Some(Value::from("new"))));
        assert_eq!(eval_ok(&mut interp, "probe").as_str(), "new");
    }

    #[test]
    fn test_exit_propagates() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "proc f {} { exit 3 }");
        let e = eval_err(&mut interp, "while {1} { f }");
        assert_eq!(e.code(), ResultCode::Exit);
        assert_eq!(e.value().as_int().unwrap(), 3);
    }

    #[test]
    fn test_recursion_limit() {
        let mut interp = Interp::new();
        interp.set_recursion_limit(100);

        eval_ok(&mut interp, "proc myproc {} { myproc }");
        let e = eval_err(&mut interp, "myproc");
        assert_eq!(
            e.value().as_str(),
            "too many nested evaluations (infinite loop?)"
        );
    }

    #[test]
    fn test_complete() {
        let interp = Interp::<()>::new();

        assert!(interp.complete("abc"));
        assert!(interp.complete("a {bc} [def] \"ghi\" xyz"));

        assert!(!interp.complete("a {bc"));
        assert!(!interp.complete("a [bc"));
        assert!(!interp.complete("a \"bc"));
    }

    #[test]
    fn test_comments() {
        let mut interp = Interp::new();
        assert_eq!(
            eval_ok(&mut interp, "# leading comment\nset a 1").as_str(),
            "1"
        );
    }

    #[test]
    fn test_semicolon_separators() {
        let mut interp = Interp::new();
        assert_eq!(eval_ok(&mut interp, "set a 1; set b 2; set a").as_str(), "1");
    }

    #[test]
    fn test_context_threading() {
        struct Probe {
            resets: usize,
        }

        let mut probe = Probe { resets: 0 };
        let mut interp: Interp<Probe> = Interp::new();
        interp.add_command("reset", 1, 1, |_, _, probe: &mut Probe| {
            probe.resets += 1;
            Ok(None)
        });

        interp.eval("reset; reset", &mut probe).unwrap();
        assert_eq!(probe.resets, 2);
    }

    #[cfg(feature = "closure-commands")]
    #[test]
    fn test_closure_command() {
        let mut interp = Interp::<()>::new();
        let greeting = Value::from("hello");
        interp.add_command_closure("greet", 1, 1, move |_, _, _| Ok(Some(greeting.clone())));
        assert_eq!(
            interp.eval("greet", &mut ()).unwrap().as_str(),
            "hello"
        );
    }

    #[test]
    fn test_expr_api() {
        let mut interp = Interp::<()>::new();
        assert_eq!(interp.expr(&Value::from("1 + 2")), Ok(Value::from(3)));
        assert!(interp.expr_bool(&Value::from("1 < 2")).unwrap());
        assert_eq!(interp.expr_int(&Value::from("6 * 7")).unwrap(), 42);
    }

    #[test]
    fn test_subst_text_preserves_layout() {
        let mut interp = Interp::new();
        eval_ok(&mut interp, "set a 5");
        let out = interp
            .subst_text("a = $a, next = [expr {$a + 1}]", 1, &mut ())
            .unwrap();
        assert_eq!(out.as_str(), "a = 5, next = 6");
    }
}
