//! The standard command set.
//!
//! Each command is an ordinary [`CommandFunc`] registered by `Interp::new`
//! with the argument window it accepts, so the functions here can assume
//! their `argv` is within bounds; ensemble subcommands re-check with
//! [`check_args`](crate::check_args) since the ensemble itself is registered
//! with a wide window.

use crate::check_args;
use crate::interp::Interp;
#[cfg(feature = "std")]
use crate::tcl_err;
use crate::types::*;
use crate::util;
use crate::value::Value;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Joins argument values with single spaces, the way `expr` and `concat`
/// accumulate their arguments.
fn join_args(args: &[Value]) -> Value {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(arg.as_str());
    }
    Value::from(out)
}

//--------------------------------------------------------------------------------------------
// Variable commands

/// set varName ?newValue?
pub fn cmd_set<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    if argv.len() == 3 {
        Ok(Some(interp.set_var_return(&argv[1], argv[2].clone())?))
    } else {
        Ok(Some(interp.var(&argv[1])?))
    }
}

/// unset varName ?varName ...?
pub fn cmd_unset<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    for name in &argv[1..] {
        interp.unset_var(name);
    }
    Ok(None)
}

/// global varName ?varName ...?
pub fn cmd_global<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    for name in &argv[1..] {
        interp.global(name.as_str())?;
    }
    Ok(None)
}

/// incr varName ?increment?
///
/// An unset variable is created as 0 and then incremented.
pub fn cmd_incr<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let increment = if argv.len() == 3 { argv[2].as_int()? } else { 1 };

    let current = if interp.var_exists(&argv[1]) {
        interp.var(&argv[1])?.as_int()?
    } else {
        0
    };

    let value = Value::from(current.wrapping_add(increment));
    Ok(Some(interp.set_var_return(&argv[1], value)?))
}

/// append varName value ?value ...?
pub fn cmd_append<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut value = if interp.var_exists(&argv[1]) {
        interp.var(&argv[1])?
    } else {
        Value::empty()
    };

    for arg in &argv[2..] {
        value.append(arg.clone());
    }

    Ok(Some(interp.set_var_return(&argv[1], value)?))
}

/// array subcommand arrayName ?arg ...?
pub fn cmd_array<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let subcommands: [Subcommand<Ctx>; 4] = [
        Subcommand("exists", cmd_array_exists),
        Subcommand("length", cmd_array_length),
        Subcommand("size", cmd_array_length),
        Subcommand("slice", cmd_array_slice),
    ];
    interp.call_subcommand(argv, 1, &subcommands, ctx)
}

fn cmd_array_exists<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 3, 3, "arrayName")?;
    Ok(Some(Value::from(interp.array_size(argv[2].as_str()) > 0)))
}

fn cmd_array_length<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 3, 3, "arrayName")?;
    Ok(Some(Value::from(interp.array_size(argv[2].as_str()) as TclInt)))
}

fn cmd_array_slice<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 4, 5, "arrayName first ?last?")?;

    let name = argv[2].as_str();
    let first = util::parse_index(argv[3].as_str())?;
    let last = match argv.get(4) {
        Some(arg) => util::parse_index(arg.as_str())?,
        None => interp.array_size(name).saturating_sub(1),
    };

    Ok(Some(Value::from(interp.array_slice(name, first, last))))
}

//--------------------------------------------------------------------------------------------
// Control flow

/// break
pub fn cmd_break<Ctx>(_interp: &mut Interp<Ctx>, _argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    Err(Exception::tcl_break())
}

/// continue
pub fn cmd_continue<Ctx>(
    _interp: &mut Interp<Ctx>,
    _argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    Err(Exception::tcl_continue())
}

/// return ?value?
pub fn cmd_return<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    Err(Exception::tcl_return(
        argv.get(1).cloned().unwrap_or_default(),
    ))
}

/// error message
pub fn cmd_error<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    Err(Exception::error(ErrorKind::General, argv[1].clone()))
}

/// exit ?status?
pub fn cmd_exit<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let status = match argv.get(1) {
        Some(arg) => arg.as_int()?,
        None => 0,
    };
    Err(Exception::tcl_exit(status))
}

/// if expr body ?elseif expr body ...? ?else body?
pub fn cmd_if<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let mut i = 1;
    loop {
        if i + 1 >= argv.len() {
            return Err(Exception::error(
                ErrorKind::BadParam,
                Value::from(format!(
                    "wrong # args: no script following \"{}\" argument",
                    argv[i].as_str()
                )),
            ));
        }

        if interp.expr_bool(&argv[i])? {
            return Ok(Some(interp.eval_body(&argv[i + 1], ctx)?));
        }

        i += 2;
        if i >= argv.len() {
            return Ok(None);
        }

        match argv[i].as_str() {
            "elseif" => i += 1,
            "else" => {
                if i + 2 != argv.len() {
                    return Err(Exception::error(
                        ErrorKind::BadParam,
                        Value::from("wrong # args: extra words after \"else\" clause"),
                    ));
                }
                return Ok(Some(interp.eval_body(&argv[i + 1], ctx)?));
            }
            word => {
                return Err(Exception::error(
                    ErrorKind::BadParam,
                    Value::from(format!(
                        "expected \"elseif\" or \"else\" but got \"{}\"",
                        word
                    )),
                ));
            }
        }
    }
}

/// while test body
pub fn cmd_while<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    while interp.expr_bool(&argv[1])? {
        match interp.eval_body(&argv[2], ctx) {
            Ok(_) => (),
            Err(exception) => match exception.code() {
                ResultCode::Break => break,
                ResultCode::Continue => (),
                _ => return Err(exception),
            },
        }
    }
    Ok(None)
}

/// for start test next body
pub fn cmd_for<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    interp.eval_body(&argv[1], ctx)?;

    while interp.expr_bool(&argv[2])? {
        match interp.eval_body(&argv[4], ctx) {
            Ok(_) => (),
            Err(exception) => match exception.code() {
                // break skips the post-step.
                ResultCode::Break => break,
                // continue still runs it.
                ResultCode::Continue => (),
                _ => return Err(exception),
            },
        }
        interp.eval_body(&argv[3], ctx)?;
    }
    Ok(None)
}

/// foreach varName list body
pub fn cmd_foreach<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    for item in argv[2].as_list()? {
        interp.set_var(&argv[1], item)?;
        match interp.eval_body(&argv[3], ctx) {
            Ok(_) => (),
            Err(exception) => match exception.code() {
                ResultCode::Break => break,
                ResultCode::Continue => (),
                _ => return Err(exception),
            },
        }
    }
    Ok(None)
}

/// switch string pattern body ?pattern body ...?
/// switch string {pattern body ?pattern body ...?}
///
/// Patterns match with the same glob rules as `string match`; `default`
/// matches anything, and a body of `-` falls through to the next body.
pub fn cmd_switch<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let inline_pairs;
    let pairs: &[Value] = if argv.len() == 3 {
        inline_pairs = argv[2].as_list()?;
        &inline_pairs
    } else {
        &argv[2..]
    };

    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(Exception::error(
            ErrorKind::BadParam,
            Value::from("extra switch pattern with no body"),
        ));
    }

    let text = argv[1].as_str();
    let mut i = 0;
    while i < pairs.len() {
        let pattern = pairs[i].as_str();
        let is_default = pattern == "default" && i + 2 == pairs.len();

        if is_default || util::glob_match(pattern, text) {
            // A body of "-" falls through to the next body.
            let mut body = i + 1;
            while body < pairs.len() && pairs[body].as_str() == "-" {
                body += 2;
            }
            if body >= pairs.len() {
                return Err(Exception::error(
                    ErrorKind::BadParam,
                    Value::from(format!(
                        "no body specified for pattern \"{}\"",
                        pattern
                    )),
                ));
            }
            return Ok(Some(interp.eval_body(&pairs[body], ctx)?));
        }

        i += 2;
    }

    Ok(None)
}

/// proc name params body
pub fn cmd_proc<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut params = Vec::new();
    for param in argv[2].as_list()? {
        let name = param.as_str();
        if name.is_empty() || name.contains(|c: char| c.is_whitespace()) {
            return Err(Exception::error(
                ErrorKind::BadParam,
                Value::from(format!(
                    "formal parameter \"{}\" must be a simple name",
                    name
                )),
            ));
        }
        params.push(String::from(name));
    }

    let decl_line = interp.current_line();
    interp.add_proc(argv[1].as_str(), params, argv[3].clone(), decl_line);
    Ok(None)
}

/// expr arg ?arg ...?
#[cfg(feature = "expr")]
pub fn cmd_expr<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let text = join_args(&argv[1..]);
    Ok(Some(interp.expr(&text)?))
}

//--------------------------------------------------------------------------------------------
// List commands

/// list ?arg ...?
pub fn cmd_list<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    Ok(Some(Value::from(&argv[1..])))
}

/// lindex list index
pub fn cmd_lindex<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let items = argv[1].as_list()?;
    let index = argv[2].as_int()?;

    if index >= 0 && (index as usize) < items.len() {
        Ok(Some(items[index as usize].clone()))
    } else {
        Ok(None)
    }
}

/// llength list
pub fn cmd_llength<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    Ok(Some(Value::from(argv[1].as_list()?.len() as TclInt)))
}

/// lrange list first last
pub fn cmd_lrange<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let items = argv[1].as_list()?;
    let first = argv[2].as_int()?.max(0) as usize;
    let last = argv[3].as_int()?;

    if last < 0 || first >= items.len() || first as TclInt > last {
        return Ok(Some(Value::empty()));
    }

    let last = (last as usize).min(items.len() - 1);
    Ok(Some(Value::from(items[first..=last].to_vec())))
}

/// lreplace list first last ?value ...?
pub fn cmd_lreplace<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut items = argv[1].as_list()?;
    let first = (argv[2].as_int()?.max(0) as usize).min(items.len());
    let last = argv[3].as_int()?;

    // A last below first deletes nothing; the values are inserted at first.
    let end = if last < 0 {
        first
    } else {
        ((last as usize) + 1).clamp(first, items.len())
    };

    items.splice(first..end, argv[4..].iter().cloned());
    Ok(Some(Value::from(items)))
}

/// lappend varName ?value ...?
pub fn cmd_lappend<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut items = if interp.var_exists(&argv[1]) {
        interp.var(&argv[1])?.as_list()?
    } else {
        TclList::new()
    };

    items.extend(argv[2..].iter().cloned());
    Ok(Some(interp.set_var_return(&argv[1], Value::from(items))?))
}

/// concat ?arg ...?
pub fn cmd_concat<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut out = String::new();
    for arg in &argv[1..] {
        let trimmed = arg.as_str().trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(trimmed);
    }
    Ok(Some(Value::from(out)))
}

/// split string ?splitChars?
pub fn cmd_split<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let text = argv[1].as_str();
    let seps = match argv.get(2) {
        Some(arg) => arg.as_str(),
        None => " \t\n\r",
    };

    let items: TclList = if seps.is_empty() {
        text.chars().map(Value::from).collect()
    } else {
        text.split(|c: char| seps.contains(c)).map(Value::from).collect()
    };

    Ok(Some(Value::from(items)))
}

/// join list ?joinString?
pub fn cmd_join<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let sep = match argv.get(2) {
        Some(arg) => arg.as_str(),
        None => " ",
    };

    let mut out = String::new();
    for (i, item) in argv[1].as_list()?.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        out.push_str(item.as_str());
    }

    Ok(Some(Value::from(out)))
}

//--------------------------------------------------------------------------------------------
// Text commands

/// subst text
pub fn cmd_subst<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    Ok(Some(interp.subst_text(argv[1].as_str(), 1, ctx)?))
}

/// string subcommand string ?arg ...?
#[cfg(feature = "string-command")]
pub fn cmd_string<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let subcommands: [Subcommand<Ctx>; 14] = [
        Subcommand("compare", cmd_string_compare),
        Subcommand("equal", cmd_string_equal),
        Subcommand("first", cmd_string_first),
        Subcommand("index", cmd_string_index),
        Subcommand("last", cmd_string_last),
        Subcommand("length", cmd_string_length),
        Subcommand("match", cmd_string_match),
        Subcommand("range", cmd_string_range),
        Subcommand("replace", cmd_string_replace),
        Subcommand("tolower", cmd_string_tolower),
        Subcommand("toupper", cmd_string_toupper),
        Subcommand("trim", cmd_string_trim),
        Subcommand("trimleft", cmd_string_trimleft),
        Subcommand("trimright", cmd_string_trimright),
    ];
    interp.call_subcommand(argv, 1, &subcommands, ctx)
}

#[cfg(feature = "string-command")]
fn cmd_string_compare<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "string1 string2")?;
    let ordering = argv[2].as_str().cmp(argv[3].as_str());
    Ok(Some(Value::from(ordering as TclInt)))
}

#[cfg(feature = "string-command")]
fn cmd_string_equal<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "string1 string2")?;
    Ok(Some(Value::from(argv[2].as_str() == argv[3].as_str())))
}

/// Converts a byte offset within `text` to a character index.
#[cfg(feature = "string-command")]
fn char_index_of(text: &str, byte_offset: usize) -> TclInt {
    text[..byte_offset].chars().count() as TclInt
}

#[cfg(feature = "string-command")]
fn cmd_string_first<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "needleString haystackString")?;
    let needle = argv[2].as_str();
    let haystack = argv[3].as_str();

    let index = match haystack.find(needle) {
        Some(offset) if !needle.is_empty() => char_index_of(haystack, offset),
        _ => -1,
    };
    Ok(Some(Value::from(index)))
}

#[cfg(feature = "string-command")]
fn cmd_string_last<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "needleString haystackString")?;
    let needle = argv[2].as_str();
    let haystack = argv[3].as_str();

    let index = match haystack.rfind(needle) {
        Some(offset) if !needle.is_empty() => char_index_of(haystack, offset),
        _ => -1,
    };
    Ok(Some(Value::from(index)))
}

#[cfg(feature = "string-command")]
fn cmd_string_index<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "string charIndex")?;
    let index = argv[3].as_int()?;
    if index < 0 {
        return Ok(None);
    }

    match argv[2].as_str().chars().nth(index as usize) {
        Some(c) => Ok(Some(Value::from(c))),
        None => Ok(None),
    }
}

#[cfg(feature = "string-command")]
fn cmd_string_length<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().chars().count() as TclInt)))
}

#[cfg(feature = "string-command")]
fn cmd_string_match<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 4, 4, "pattern string")?;
    Ok(Some(Value::from(util::glob_match(
        argv[2].as_str(),
        argv[3].as_str(),
    ))))
}

#[cfg(feature = "string-command")]
fn cmd_string_range<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 5, 5, "string first last")?;
    let chars: Vec<char> = argv[2].as_str().chars().collect();
    let first = argv[3].as_int()?.max(0) as usize;
    let last = argv[4].as_int()?;

    if last < 0 || first >= chars.len() || first as TclInt > last {
        return Ok(None);
    }

    let last = (last as usize).min(chars.len() - 1);
    let out: String = chars[first..=last].iter().collect();
    Ok(Some(Value::from(out)))
}

#[cfg(feature = "string-command")]
fn cmd_string_replace<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 5, 6, "string first last ?newstring?")?;
    let chars: Vec<char> = argv[2].as_str().chars().collect();
    let first = (argv[3].as_int()?.max(0) as usize).min(chars.len());
    let last = argv[4].as_int()?;

    let end = if last < 0 {
        first
    } else {
        ((last as usize) + 1).clamp(first, chars.len())
    };

    let mut out: String = chars[..first].iter().collect();
    if let Some(replacement) = argv.get(5) {
        out.push_str(replacement.as_str());
    }
    out.extend(&chars[end..]);
    Ok(Some(Value::from(out)))
}

#[cfg(feature = "string-command")]
fn cmd_string_tolower<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().to_lowercase())))
}

#[cfg(feature = "string-command")]
fn cmd_string_toupper<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 3, "string")?;
    Ok(Some(Value::from(argv[2].as_str().to_uppercase())))
}

#[cfg(feature = "string-command")]
fn trim_set(argv: &[Value]) -> &str {
    match argv.get(3) {
        Some(arg) => arg.as_str(),
        None => " \t\n\r",
    }
}

#[cfg(feature = "string-command")]
fn cmd_string_trim<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 4, "string ?chars?")?;
    let set = trim_set(argv);
    Ok(Some(Value::from(
        argv[2].as_str().trim_matches(|c: char| set.contains(c)),
    )))
}

#[cfg(feature = "string-command")]
fn cmd_string_trimleft<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 4, "string ?chars?")?;
    let set = trim_set(argv);
    Ok(Some(Value::from(
        argv[2].as_str().trim_start_matches(|c: char| set.contains(c)),
    )))
}

#[cfg(feature = "string-command")]
fn cmd_string_trimright<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 3, 4, "string ?chars?")?;
    let set = trim_set(argv);
    Ok(Some(Value::from(
        argv[2].as_str().trim_end_matches(|c: char| set.contains(c)),
    )))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "i64")] {
        #[cfg(feature = "string-command")]
        fn as_unsigned(x: TclInt) -> u64 {
            x as u64
        }
    } else {
        #[cfg(feature = "string-command")]
        fn as_unsigned(x: TclInt) -> u32 {
            x as u32
        }
    }
}

/// format formatString ?arg ...?
///
/// Supports the `%d %i %u %x %X %c %s %%` conversions with optional `-` and
/// `0` flags and a field width, the subset probe initialization scripts
/// use for register values and hex dumps.
#[cfg(feature = "string-command")]
pub fn cmd_format<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let mut out = String::new();
    let mut args = argv[2..].iter();
    let mut chars = argv[1].as_str().chars().peekable();

    let mut next_arg = || {
        args.next().ok_or_else(|| {
            Exception::error(
                ErrorKind::BadParam,
                Value::from("not enough arguments for all format specifiers"),
            )
        })
    };

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut left_justify = false;
        let mut zero_pad = false;
        loop {
            match chars.peek() {
                Some('-') => {
                    left_justify = true;
                    chars.next();
                }
                Some('0') => {
                    zero_pad = true;
                    chars.next();
                }
                _ => break,
            }
        }

        let mut width = 0usize;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            width = width * 10 + digit as usize;
            chars.next();
        }

        let Some(conversion) = chars.next() else {
            return Err(Exception::error(
                ErrorKind::BadParam,
                Value::from("format string ended in middle of field specifier"),
            ));
        };

        let field = match conversion {
            '%' => String::from("%"),
            'd' | 'i' => next_arg()?.as_int()?.to_string(),
            'u' => as_unsigned(next_arg()?.as_int()?).to_string(),
            'x' => format!("{:x}", as_unsigned(next_arg()?.as_int()?)),
            'X' => format!("{:X}", as_unsigned(next_arg()?.as_int()?)),
            'c' => match char::from_u32(next_arg()?.as_int()? as u32) {
                Some(c) => c.to_string(),
                None => String::new(),
            },
            's' => next_arg()?.as_str().to_string(),
            _ => {
                return Err(Exception::error(
                    ErrorKind::BadParam,
                    Value::from(format!("bad field specifier \"{}\"", conversion)),
                ));
            }
        };

        let len = field.chars().count();
        if len >= width {
            out.push_str(&field);
        } else if left_justify {
            out.push_str(&field);
            for _ in len..width {
                out.push(' ');
            }
        } else {
            let pad = if zero_pad { '0' } else { ' ' };
            for _ in len..width {
                out.push(pad);
            }
            out.push_str(&field);
        }
    }

    Ok(Some(Value::from(out)))
}

/// scan string formatString varName ?varName ...?
///
/// Supports `%d %x %c %s` and `%%`; whitespace in the format skips input
/// whitespace and other characters must match literally.  Returns the
/// number of conversions stored.
#[cfg(feature = "string-command")]
pub fn cmd_scan<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    let input = argv[1].as_str();
    let format = argv[2].as_str().as_bytes();
    let bytes = input.as_bytes();

    let mut count: TclInt = 0;
    let mut var = 3;
    let mut i = 0; // input position
    let mut f = 0; // format position

    while f < format.len() {
        let fc = format[f];

        if fc.is_ascii_whitespace() {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            f += 1;
            continue;
        }

        if fc != b'%' {
            if i < bytes.len() && bytes[i] == fc {
                i += 1;
                f += 1;
                continue;
            }
            break;
        }

        f += 1;
        let Some(&conversion) = format.get(f) else {
            break;
        };
        f += 1;

        if conversion == b'%' {
            if i < bytes.len() && bytes[i] == b'%' {
                i += 1;
                continue;
            }
            break;
        }

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match conversion {
            b'd' => match scan_int(bytes, &mut i, 10) {
                Some(v) => Value::from(v),
                None => break,
            },
            b'x' => match scan_int(bytes, &mut i, 16) {
                Some(v) => Value::from(v),
                None => break,
            },
            b'c' => match input[i..].chars().next() {
                Some(c) => {
                    i += c.len_utf8();
                    Value::from(c as TclInt)
                }
                None => break,
            },
            b's' => {
                let start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if i == start {
                    break;
                }
                Value::from(&input[start..i])
            }
            _ => {
                return Err(Exception::error(
                    ErrorKind::BadParam,
                    Value::from(format!(
                        "bad scan conversion character \"{}\"",
                        conversion as char
                    )),
                ));
            }
        };

        if var >= argv.len() {
            return Err(Exception::error(
                ErrorKind::BadParam,
                Value::from("different numbers of variable names and field specifiers"),
            ));
        }
        interp.set_var(&argv[var], value)?;
        var += 1;
        count += 1;
    }

    Ok(Some(Value::from(count)))
}

/// Scans a signed integer from `bytes` at `*pos`, advancing past it.  A
/// radix-16 scan also accepts an `0x` prefix.
#[cfg(feature = "string-command")]
fn scan_int(bytes: &[u8], pos: &mut usize, radix: u32) -> Option<TclInt> {
    let mut i = *pos;
    let mut negative = false;

    if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
        negative = bytes[i] == b'-';
        i += 1;
    }

    if radix == 16 && bytes[i..].starts_with(b"0x") {
        i += 2;
    }

    let digits_start = i;
    let mut value: TclInt = 0;
    while i < bytes.len() {
        let digit = match (bytes[i] as char).to_digit(radix) {
            Some(d) => d,
            None => break,
        };
        value = value
            .wrapping_mul(radix as TclInt)
            .wrapping_add(digit as TclInt);
        i += 1;
    }

    if i == digits_start {
        return None;
    }

    *pos = i;
    Some(if negative { value.wrapping_neg() } else { value })
}

//--------------------------------------------------------------------------------------------
// Introspection

/// info subcommand ?arg?
#[cfg(feature = "info")]
pub fn cmd_info<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let subcommands: [Subcommand<Ctx>; 6] = [
        Subcommand("commands", cmd_info_commands),
        Subcommand("exists", cmd_info_exists),
        Subcommand("globals", cmd_info_globals),
        Subcommand("procs", cmd_info_procs),
        Subcommand("tclversion", cmd_info_version),
        Subcommand("vars", cmd_info_vars),
    ];
    interp.call_subcommand(argv, 1, &subcommands, ctx)
}

#[cfg(feature = "info")]
fn cmd_info_commands<Ctx>(
    interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.command_names())))
}

#[cfg(feature = "info")]
fn cmd_info_exists<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 3, 3, "varName")?;
    Ok(Some(Value::from(interp.var_exists(&argv[2]))))
}

#[cfg(feature = "info")]
fn cmd_info_procs<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.proc_names())))
}

#[cfg(feature = "info")]
fn cmd_info_version<Ctx>(
    _interp: &mut Interp<Ctx>,
    argv: &[Value],
    _ctx: &mut Ctx,
) -> TclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from("8.1")))
}

#[cfg(feature = "info")]
fn cmd_info_globals<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.vars_in_global_scope())))
}

#[cfg(feature = "info")]
fn cmd_info_vars<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    check_args(2, argv, 2, 2, "")?;
    Ok(Some(Value::from(interp.vars_in_scope())))
}

//--------------------------------------------------------------------------------------------
// Host conveniences

/// puts ?-nonewline? string
#[cfg(feature = "std")]
pub fn cmd_puts<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    if argv.len() == 3 {
        if argv[1].as_str() != "-nonewline" {
            return Err(Exception::error(
                ErrorKind::BadParam,
                Value::from(format!("bad option \"{}\": should be -nonewline", argv[1])),
            ));
        }
        print!("{}", argv[2]);
    } else {
        println!("{}", argv[1]);
    }
    Ok(None)
}

/// source fileName
#[cfg(feature = "std")]
pub fn cmd_source<Ctx>(interp: &mut Interp<Ctx>, argv: &[Value], ctx: &mut Ctx) -> TclOptResult {
    let path = argv[1].as_str();
    match std::fs::read_to_string(path) {
        Ok(script) => Ok(Some(interp.eval(&script, ctx)?)),
        Err(error) => tcl_err!("couldn't read file \"{}\": {}", path, error),
    }
}

/// env name ?default?
///
/// Reads a process environment variable.  An unset variable yields the
/// default, or the empty string without one.
#[cfg(feature = "std")]
pub fn cmd_env<Ctx>(_interp: &mut Interp<Ctx>, argv: &[Value], _ctx: &mut Ctx) -> TclOptResult {
    match std::env::var(argv[1].as_str()) {
        Ok(value) => Ok(Some(Value::from(value))),
        Err(_) => Ok(Some(argv.get(2).cloned().unwrap_or_default())),
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

    fn interp() -> Interp<()> {
        Interp::new()
    }

    //----------------------------------------------------------------------
    // Variables

    #[test]
    fn test_set_and_read() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "set a 7").as_str(), "7");
        assert_eq!(eval_ok(&mut interp, "set a").as_str(), "7");
    }

    #[test]
    fn test_unset() {
        let mut interp = interp();
        eval_ok(&mut interp, "set a 1; unset a");
        let e = eval_err(&mut interp, "set a");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::VarUnknown);
        // Unsetting again is fine.
        eval_ok(&mut interp, "unset a nope");
    }

    #[test]
    fn test_incr() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "incr fresh").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "incr fresh 9").as_str(), "10");
        assert_eq!(eval_ok(&mut interp, "incr fresh -4").as_str(), "6");
    }

    #[test]
    fn test_append() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "append s ab cd").as_str(), "abcd");
        assert_eq!(eval_ok(&mut interp, "append s !").as_str(), "abcd!");
    }

    #[test]
    fn test_array_command() {
        let mut interp = interp();
        eval_ok(&mut interp, "set r(0) a; set r(1) b; set r(2) c");
        assert_eq!(eval_ok(&mut interp, "array length r").as_str(), "3");
        assert_eq!(eval_ok(&mut interp, "array size r").as_str(), "3");
        assert_eq!(eval_ok(&mut interp, "array exists r").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "array exists q").as_str(), "0");
        assert_eq!(eval_ok(&mut interp, "array slice r 1 2").as_str(), "b c");
        assert_eq!(eval_ok(&mut interp, "array slice r 1").as_str(), "b c");
    }

    //----------------------------------------------------------------------
    // Control flow

    #[test]
    fn test_while() {
        let mut interp = interp();
        eval_ok(&mut interp, "set i 0; while {$i < 3} {incr i}");
        assert_eq!(eval_ok(&mut interp, "set i").as_str(), "3");
    }

    #[test]
    fn test_while_break_continue() {
        let mut interp = interp();
        eval_ok(
            &mut interp,
            "set n 0; set i 0\n\
             while {$i < 10} {\n\
                 incr i\n\
                 if {$i == 3} { continue }\n\
                 if {$i == 5} { break }\n\
                 incr n\n\
             }",
        );
        assert_eq!(eval_ok(&mut interp, "set i").as_str(), "5");
        assert_eq!(eval_ok(&mut interp, "set n").as_str(), "3");
    }

    #[test]
    fn test_for() {
        let mut interp = interp();
        eval_ok(
            &mut interp,
            "set sum 0; for {set i 1} {$i <= 4} {incr i} {incr sum $i}",
        );
        assert_eq!(eval_ok(&mut interp, "set sum").as_str(), "10");
    }

    #[test]
    fn test_for_break_skips_post_step() {
        let mut interp = interp();
        eval_ok(
            &mut interp,
            "for {set i 0} {$i < 10} {incr i} { if {$i == 4} { break } }",
        );
        // The loop stopped before the post-step could run.
        assert_eq!(eval_ok(&mut interp, "set i").as_str(), "4");
    }

    #[test]
    fn test_foreach() {
        let mut interp = interp();
        eval_ok(
            &mut interp,
            "set sum 0; foreach x {1 2 3 4} { incr sum $x }",
        );
        assert_eq!(eval_ok(&mut interp, "set sum").as_str(), "10");
        assert_eq!(eval_ok(&mut interp, "set x").as_str(), "4");
    }

    #[test]
    fn test_if_elseif_else() {
        let mut interp = interp();
        eval_ok(&mut interp, "set x 7");
        assert_eq!(
            eval_ok(
                &mut interp,
                "if {$x < 5} {set r low} elseif {$x < 10} {set r mid} else {set r high}"
            )
            .as_str(),
            "mid"
        );
        assert_eq!(
            eval_ok(&mut interp, "if {$x > 100} {set r huge}").as_str(),
            ""
        );
    }

    #[test]
    fn test_switch_inline_and_block() {
        let mut interp = interp();
        assert_eq!(
            eval_ok(&mut interp, "switch abc a* {set r glob} default {set r none}").as_str(),
            "glob"
        );
        assert_eq!(
            eval_ok(
                &mut interp,
                "switch xyz {\n  a* {set r glob}\n  default {set r none}\n}"
            )
            .as_str(),
            "none"
        );
    }

    #[test]
    fn test_switch_fallthrough() {
        let mut interp = interp();
        assert_eq!(
            eval_ok(
                &mut interp,
                "switch b { a - b - c {set r abc} default {set r other} }"
            )
            .as_str(),
            "abc"
        );
    }

    #[test]
    fn test_switch_classes() {
        let mut interp = interp();
        assert_eq!(
            eval_ok(
                &mut interp,
                "switch r7 { r[0-9] {set r reg} default {set r other} }"
            )
            .as_str(),
            "reg"
        );
    }

    //----------------------------------------------------------------------
    // Lists

    #[test]
    fn test_list_round_trip() {
        let mut interp = interp();
        eval_ok(&mut interp, "set l [list a {b c} {}]");
        assert_eq!(eval_ok(&mut interp, "llength $l").as_str(), "3");
        assert_eq!(eval_ok(&mut interp, "lindex $l 0").as_str(), "a");
        assert_eq!(eval_ok(&mut interp, "lindex $l 1").as_str(), "b c");
        assert_eq!(eval_ok(&mut interp, "lindex $l 2").as_str(), "");
        // Out of range reads as empty.
        assert_eq!(eval_ok(&mut interp, "lindex $l 9").as_str(), "");
    }

    #[test]
    fn test_lappend_counts() {
        let mut interp = interp();
        for i in 0..5 {
            eval_ok(&mut interp, &format!("lappend accum item{}", i));
        }
        assert_eq!(eval_ok(&mut interp, "llength $accum").as_str(), "5");
        assert_eq!(eval_ok(&mut interp, "lindex $accum 3").as_str(), "item3");
    }

    #[test]
    fn test_quoting_idempotence() {
        let mut interp = interp();
        eval_ok(&mut interp, "set l [list {a b} c]");
        assert_eq!(eval_ok(&mut interp, "lindex $l 0").as_str(), "a b");
    }

    #[test]
    fn test_lrange() {
        let mut interp = interp();
        eval_ok(&mut interp, "set l {a b c d e}");
        assert_eq!(eval_ok(&mut interp, "lrange $l 1 3").as_str(), "b c d");
        assert_eq!(eval_ok(&mut interp, "lrange $l 3 99").as_str(), "d e");
        assert_eq!(eval_ok(&mut interp, "lrange $l 4 2").as_str(), "");
    }

    #[test]
    fn test_lreplace() {
        let mut interp = interp();
        eval_ok(&mut interp, "set l {a b c d}");
        assert_eq!(eval_ok(&mut interp, "lreplace $l 1 2 X Y Z").as_str(), "a X Y Z d");
        assert_eq!(eval_ok(&mut interp, "lreplace $l 1 2").as_str(), "a d");
    }

    #[test]
    fn test_concat_split_join() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "concat a {b c}  { d }").as_str(), "a b c d");
        assert_eq!(eval_ok(&mut interp, "split a:b:c :").as_str(), "a b c");
        assert_eq!(eval_ok(&mut interp, "split {a b}").as_str(), "a b");
        assert_eq!(eval_ok(&mut interp, "join {a b c} -").as_str(), "a-b-c");
        assert_eq!(eval_ok(&mut interp, "join {a b c}").as_str(), "a b c");
    }

    //----------------------------------------------------------------------
    // Text

    #[test]
    fn test_string_basics() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string length probe").as_str(), "5");
        assert_eq!(eval_ok(&mut interp, "string toupper swo").as_str(), "SWO");
        assert_eq!(eval_ok(&mut interp, "string tolower SWO").as_str(), "swo");
        assert_eq!(eval_ok(&mut interp, "string index probe 1").as_str(), "r");
        assert_eq!(eval_ok(&mut interp, "string index probe 99").as_str(), "");
    }

    #[test]
    fn test_string_compare_equal() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string compare a b").as_str(), "-1");
        assert_eq!(eval_ok(&mut interp, "string compare b a").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "string compare a a").as_str(), "0");
        assert_eq!(eval_ok(&mut interp, "string equal a a").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "string equal a b").as_str(), "0");
    }

    #[test]
    fn test_string_first_last() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string first ab xabxab").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "string last ab xabxab").as_str(), "4");
        assert_eq!(eval_ok(&mut interp, "string first zz xabxab").as_str(), "-1");
    }

    #[test]
    fn test_string_range_replace() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string range abcdef 1 3").as_str(), "bcd");
        assert_eq!(
            eval_ok(&mut interp, "string replace abcdef 1 3 XY").as_str(),
            "aXYef"
        );
        assert_eq!(eval_ok(&mut interp, "string replace abcdef 1 3").as_str(), "aef");
    }

    #[test]
    fn test_string_trim() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string trim {  hi  }").as_str(), "hi");
        assert_eq!(eval_ok(&mut interp, "string trimleft xxhixx x").as_str(), "hixx");
        assert_eq!(eval_ok(&mut interp, "string trimright xxhixx x").as_str(), "xxhi");
    }

    #[test]
    fn test_string_match() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "string match *.tcl init.tcl").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "string match *.tcl init.txt").as_str(), "0");
        assert_eq!(eval_ok(&mut interp, "string match {r[0-9]} r5").as_str(), "1");
    }

    #[test]
    fn test_format() {
        let mut interp = interp();
        assert_eq!(
            eval_ok(&mut interp, "format {reg %d = 0x%X} 3 48879").as_str(),
            "reg 3 = 0xBEEF"
        );
        assert_eq!(eval_ok(&mut interp, "format %08x 48879").as_str(), "0000beef");
        assert_eq!(eval_ok(&mut interp, "format {%-4d|} 7").as_str(), "7   |");
        assert_eq!(eval_ok(&mut interp, "format %c 65").as_str(), "A");
        assert_eq!(eval_ok(&mut interp, "format %s%% hi").as_str(), "hi%");
    }

    #[test]
    fn test_format_errors() {
        let mut interp = interp();
        let e = eval_err(&mut interp, "format %d");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::BadParam);
        let e = eval_err(&mut interp, "format %q 1");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::BadParam);
    }

    #[test]
    fn test_scan() {
        let mut interp = interp();
        assert_eq!(
            eval_ok(&mut interp, "scan {addr 0x1c len 12} {addr %x len %d} a n").as_str(),
            "2"
        );
        assert_eq!(eval_ok(&mut interp, "set a").as_str(), "28");
        assert_eq!(eval_ok(&mut interp, "set n").as_str(), "12");

        assert_eq!(eval_ok(&mut interp, "scan abc {%c} c").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "set c").as_str(), "97");

        // A failed conversion stops the scan.
        assert_eq!(eval_ok(&mut interp, "scan {x} {%d} v").as_str(), "0");
    }

    #[test]
    fn test_subst_command() {
        let mut interp = interp();
        eval_ok(&mut interp, "set a 5");
        assert_eq!(
            eval_ok(&mut interp, "subst {a = $a, twice = [expr {$a * 2}]}").as_str(),
            "a = 5, twice = 10"
        );
    }

    //----------------------------------------------------------------------
    // Introspection

    #[test]
    fn test_info_exists() {
        let mut interp = interp();
        eval_ok(&mut interp, "set a 1");
        assert_eq!(eval_ok(&mut interp, "info exists a").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "info exists b").as_str(), "0");
        eval_ok(&mut interp, "set arr(2) x");
        assert_eq!(eval_ok(&mut interp, "info exists arr(2)").as_str(), "1");
        assert_eq!(eval_ok(&mut interp, "info exists arr(9)").as_str(), "0");
    }

    #[test]
    fn test_info_tclversion() {
        let mut interp = interp();
        assert_eq!(eval_ok(&mut interp, "info tclversion").as_str(), "8.1");
    }

    #[test]
    fn test_info_procs_and_commands() {
        let mut interp = interp();
        eval_ok(&mut interp, "proc noop {} {}");
        let procs = eval_ok(&mut interp, "info procs");
        assert_eq!(procs.as_str(), "noop");
        let commands = eval_ok(&mut interp, "info commands");
        assert!(commands.as_str().contains("set"));
    }

    #[test]
    fn test_info_vars() {
        let mut interp = interp();
        eval_ok(&mut interp, "set alpha 1; set beta 2");
        assert_eq!(eval_ok(&mut interp, "info vars").as_str(), "alpha beta");
    }

    #[test]
    fn test_info_globals_from_proc() {
        let mut interp = interp();
        eval_ok(&mut interp, "set top 1");
        // A proc's locals don't show up in the global listing.
        eval_ok(
            &mut interp,
            "proc peek {} { set local 2; info globals }",
        );
        assert_eq!(eval_ok(&mut interp, "peek").as_str(), "top");
    }

    //----------------------------------------------------------------------
    // Error propagation

    #[test]
    fn test_error_command() {
        let mut interp = interp();
        let e = eval_err(&mut interp, "error {target not halted}");
        assert_eq!(e.value().as_str(), "target not halted");
        assert_eq!(e.error_data().unwrap().kind(), ErrorKind::General);
    }

    #[test]
    fn test_error_aborts_loop() {
        let mut interp = interp();
        eval_ok(&mut interp, "set n 0");
        let e = eval_err(
            &mut interp,
            "while {1} { incr n; if {$n == 2} { error stop } }",
        );
        assert_eq!(e.value().as_str(), "stop");
        assert_eq!(eval_ok(&mut interp, "set n").as_str(), "2");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_env() {
        let mut interp = interp();
        std::env::set_var("PROBETCL_TEST_VAR", "jtag");
        assert_eq!(eval_ok(&mut interp, "env PROBETCL_TEST_VAR").as_str(), "jtag");
        assert_eq!(
            eval_ok(&mut interp, "env PROBETCL_NO_SUCH_VAR swd").as_str(),
            "swd"
        );
        assert_eq!(eval_ok(&mut interp, "env PROBETCL_NO_SUCH_VAR").as_str(), "");
    }

    #[test]
    fn test_exit_status() {
        let mut interp = interp();
        let e = eval_err(&mut interp, "exit");
        assert_eq!(e.code(), ResultCode::Exit);
        assert_eq!(e.value().as_int().unwrap(), 0);
        let e = eval_err(&mut interp, "exit 7");
        assert_eq!(e.value().as_int().unwrap(), 7);
    }
}
