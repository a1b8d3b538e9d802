//! Probetcl: an embeddable TCL-dialect interpreter for debug probe hosts.
//!
//! Probetcl is the scripting core of a hardware debug toolchain: the host
//! embeds an interpreter, registers its probe primitives (register and
//! memory access, reset control, and the like) as commands, and then runs
//! target-specific initialization scripts written in a small TCL dialect.
//! The language covers what those scripts need (variables with integer
//! array indices, lists, procs, the usual control flow, an integer
//! expression evaluator, and string formatting) without channels,
//! namespaces, or an object system.
//!
//! The crate is `no_std` + `alloc` unless the `std` feature (on by
//! default) is enabled; `std` adds the `puts`, `source`, and `env`
//! commands.  The
//! other features gate optional command groups: `expr` (the expression
//! evaluator; without it, conditions must be plain integers),
//! `string-command` (`string`, `format`, `scan`), `info`, and
//! `closure-commands` (commands implemented as capturing closures).  The
//! `i64` feature selects 64-bit integers; without it values are 32-bit.
//!
//! # Example
//!
//! ```
//! use probetcl::Interp;
//! use probetcl::types::*;
//!
//! let mut glob_ctx = ();
//! let mut interp = Interp::new();
//!
//! let script = "
//!     proc mask {value bits} {
//!         expr {$value & ((1 << $bits) - 1)}
//!     }
//!     mask 0x1234 8
//! ";
//!
//! assert_eq!(interp.eval(script, &mut glob_ctx), Ok(Value::from(0x34)));
//! ```
//!
//! See the [`interp`] module for the embedding API: defining commands,
//! accessing variables, and handling results and errors.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod interp;
pub mod list;
pub mod types;
pub mod value;

mod commands;
#[cfg(feature = "expr")]
mod expr;
mod scope;
mod tokenizer;
mod util;

pub use interp::Interp;
pub use types::TclList;
pub use util::check_args;
pub use value::Value;

#[doc(hidden)]
pub use alloc::format as __format;

/// Returns a successful [`TclResult`](types::TclResult): `tcl_ok!()` with
/// the empty value, `tcl_ok!(value)` with anything a [`Value`] can be built
/// from.
#[macro_export]
macro_rules! tcl_ok {
    () => {
        Ok($crate::Value::empty())
    };
    ($value:expr) => {
        Ok($crate::Value::from($value))
    };
}

/// Returns a successful [`TclOptResult`](types::TclOptResult) from a native
/// command: `tcl_opt_ok!()` with the empty value, `tcl_opt_ok!(value)` with
/// anything a [`Value`] can be built from.
#[macro_export]
macro_rules! tcl_opt_ok {
    () => {
        Ok(Some($crate::Value::empty()))
    };
    ($value:expr) => {
        Ok(Some($crate::Value::from($value)))
    };
}

/// Returns a general error with a formatted message, e.g.
/// `tcl_err!("no probe at address {:#x}", addr)`.
#[macro_export]
macro_rules! tcl_err {
    ($($arg:tt)*) => {
        Err($crate::types::Exception::error(
            $crate::types::ErrorKind::General,
            $crate::Value::from($crate::__format!($($arg)*)),
        ))
    };
}
