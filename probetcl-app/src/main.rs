//! The `probetclsh` shell: runs a script file given on the command line, or
//! an interactive REPL when invoked with no arguments.

use probetcl::Interp;
use std::env;

fn main() {
    // FIRST, get the command line arguments.
    let args: Vec<String> = env::args().collect();

    // NEXT, create and initialize the interpreter.
    let mut glob_ctx = ();
    let mut interp = Interp::new();

    // NEXT, evaluate the file, if any.
    if args.len() > 1 {
        probetcl_shell::script(&mut interp, &args[1..], &mut glob_ctx);
    } else {
        probetcl_shell::repl(&mut interp, &mut glob_ctx);
    }
}
