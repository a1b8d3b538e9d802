use probetcl::types::ResultCode;
use probetcl::{Interp, TclList, Value};
use rustyline::{error::ReadlineError, history::MemHistory, Config, Editor};
use std::fs;

/// Invokes an interactive REPL for the given interpreter, using `rustyline` line editing.
///
/// The REPL will display a default prompt to the user.  Press `^C` to terminate
/// the REPL, returning control to the caller.  Entering `exit` terminates the
/// process with the given status (but the `exit` command can be removed or
/// redefined by the application).
///
/// Input that is syntactically incomplete (an open brace, bracket, or quote)
/// is carried over to a continuation prompt rather than evaluated, so multi-line
/// procs and loops can be typed directly.
///
/// To change the prompt, set the `tcl_prompt1` TCL variable to a script that returns
/// the desired prompt.
///
/// See [`probetcl::interp`](../probetcl/interp/index.html) for details on how to
/// configure and add commands to a Probetcl interpreter.
///
/// # Example
///
/// ```
/// use probetcl::Interp;
///
/// // FIRST, create and initialize the interpreter.
/// let mut glob_ctx = ();
/// let mut interp = Interp::new();
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, invoke the REPL.
/// probetcl_shell::repl(&mut interp, &mut glob_ctx);
/// ```
pub fn repl<Ctx>(interp: &mut Interp<Ctx>, glob_ctx: &mut Ctx) {
    let mut rl = Editor::<(), MemHistory>::with_history(Config::default(), MemHistory::new())
        .expect("failed to init rustyline");

    // Input carried over from incomplete lines.
    let mut buffer = String::new();

    loop {
        let readline = if !buffer.is_empty() {
            rl.readline("> ")
        } else if let Ok(pscript) = interp.scalar("tcl_prompt1") {
            match interp.eval(pscript.as_str(), glob_ctx) {
                Ok(prompt) => rl.readline(prompt.as_str()),
                Err(exception) => {
                    println!("{}", exception.value());
                    rl.readline("% ")
                }
            }
        } else {
            rl.readline("% ")
        };

        match readline {
            Ok(line) => {
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }

                // Wait for more input while a quote or brace is still open.
                if !interp.complete(&buffer) {
                    continue;
                }

                let input = std::mem::take(&mut buffer);
                let input = input.trim();
                match interp.eval(input, glob_ctx) {
                    Ok(value) => {
                        if let Err(e) = rl.add_history_entry(input) {
                            eprintln!("History error: {e}");
                        }

                        // Don't output empty values.
                        if !value.as_str().is_empty() {
                            println!("{}", value);
                        }
                    }
                    Err(exception) => {
                        if exception.code() == ResultCode::Exit {
                            std::process::exit(exit_status(&exception.value()));
                        }
                        println!("{}", exception.value());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("I/O Error: {:?}", err);
                break;
            }
        }
    }
}

/// Executes a script from a set of command line arguments.
///
/// `args[0]` is presumed to be the name of a Probetcl script file, with any
/// subsequent arguments being arguments to pass to the script.  The script will
/// be executed in the context of the given interpreter.
///
/// # Script Variables
///
/// The calling information will be passed to the interpreter in the form of
/// TCL variables:
///
/// * The variable `arg0` will be set to the `arg0` value.
/// * The variable `argv` will be set to a TCL list containing the remainder of
///   the `argv` array.
///
/// See [`probetcl::interp`](../probetcl/interp/index.html) for details on how to
/// configure and add commands to a Probetcl interpreter.
///
/// # Example
///
/// ```
/// use probetcl::Interp;
/// use std::env;
///
/// // FIRST, get the command line arguments.
/// let args: Vec<String> = env::args().collect();
///
/// // NEXT, create and initialize the interpreter.
/// let mut glob_ctx = ();
/// let mut interp = Interp::new();
///
/// // NOTE: commands can be added to the interpreter here.
///
/// // NEXT, evaluate the file, if any.
/// if args.len() > 1 {
///     probetcl_shell::script(&mut interp, &args[1..], &mut glob_ctx);
/// } else {
///     eprintln!("Usage: myshell *filename.tcl");
/// }
/// ```
pub fn script<Ctx>(interp: &mut Interp<Ctx>, args: &[String], glob_ctx: &mut Ctx) {
    let arg0 = &args[0];
    let argv = &args[1..];
    match fs::read_to_string(&args[0]) {
        Ok(script) => execute_script(interp, script, arg0, argv, glob_ctx),
        Err(e) => println!("{}", e),
    }
}

/// Executes a script read from a file, with any command-line arguments, in
/// the context of the given interpreter.  The `script` is the text of the
/// script, `arg0` is the name of the script file, and `argv` contains the script
/// arguments.
fn execute_script<Ctx>(
    interp: &mut Interp<Ctx>,
    script: String,
    arg0: &str,
    argv: &[String],
    ctx: &mut Ctx,
) {
    let argv: TclList = argv.iter().map(Value::from).collect();
    interp
        .set_scalar("arg0", Value::from(arg0))
        .expect("arg0 predefined as array!");
    interp
        .set_scalar("argv", Value::from(argv))
        .expect("argv predefined as array!");

    match interp.eval(&script, ctx) {
        Ok(_) => (),
        Err(exception) => {
            if exception.code() == ResultCode::Exit {
                std::process::exit(exit_status(&exception.value()));
            }

            // Report the error the way a compiler would: file, line, message.
            match interp.error_info().and_then(|data| data.line()) {
                Some(line) => eprintln!("{}:{}: {}", arg0, line, exception.value()),
                None => eprintln!("{}: {}", arg0, exception.value()),
            }
            std::process::exit(1);
        }
    }
}

/// Converts an `exit` command's status value to a process exit code.
fn exit_status(value: &Value) -> i32 {
    value.as_int().map_or(1, |status| status as i32)
}
