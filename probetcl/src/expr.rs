//! The expression evaluator used by `expr` and by the condition clauses of
//! the control-flow commands.
//!
//! This is a self-contained recursive-descent parser over a C-like integer
//! sub-language, independent of the script lexer.  Precedence, lowest to
//! highest: conditional (`?:`, right-associative), logical or/and, bitwise
//! or/xor/and, equality, relational, shift, additive, multiplicative, power
//! (`**`, right-associative), unary (`- + ! ~`), primary.  A primary is a
//! parenthesized or braced sub-expression, an integer literal (decimal or
//! `0x` hex), or a variable reference (bare or `$`-prefixed), with an
//! optional parenthesized index that is itself a full expression, evaluated
//! recursively.
//!
//! Division and modulo by zero are hard errors, as is a numeral running into
//! an alphabetic character and any unconsumed text after the expression has
//! been fully reduced.  All arithmetic wraps rather than trapping.

use crate::interp::Interp;
use crate::types::{ErrorKind, Exception, TclInt, TclResult};
use crate::value::Value;
use alloc::format;

/// Evaluates `text` as an expression, reading variables from the
/// interpreter's current scope.
pub(crate) fn eval_expr<Ctx>(interp: &Interp<Ctx>, text: &str) -> TclResult {
    let mut parser = ExprParser {
        text,
        pos: 0,
        interp,
    };

    let value = parser.conditional()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(expr_error("extra characters after expression"));
    }

    Ok(Value::from(value))
}

fn expr_error(msg: &str) -> Exception {
    Exception::error(ErrorKind::Expr, Value::from(msg))
}

struct ExprParser<'a, Ctx> {
    text: &'a str,
    pos: usize,
    interp: &'a Interp<Ctx>,
}

type IntResult = Result<TclInt, Exception>;

impl<'a, Ctx> ExprParser<'a, Ctx> {
    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes().get(self.pos + offset).copied()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Consumes `op` if it appears at the current position and is not a
    /// prefix of a longer operator (so `|` is not taken from `||`, nor `<`
    /// from `<<` or `<=`).
    fn accept_op(&mut self, op: &str) -> bool {
        self.skip_ws();
        if !self.text[self.pos..].starts_with(op) {
            return false;
        }

        let next = self.peek_at(op.len());
        let clashes = match op {
            "|" | "&" => next == Some(op.as_bytes()[0]),
            "<" | ">" => matches!(next, Some(b'=')) || next == Some(op.as_bytes()[0]),
            "*" => next == Some(b'*'),
            _ => false,
        };
        if clashes {
            return false;
        }

        self.pos += op.len();
        true
    }

    fn expect(&mut self, c: u8, msg: &str) -> Result<(), Exception> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(expr_error(msg))
        }
    }

    fn conditional(&mut self) -> IntResult {
        let cond = self.logical_or()?;
        if !self.accept_op("?") {
            return Ok(cond);
        }

        // Both branches are parsed (and therefore evaluated) regardless of
        // the condition; only the chosen result is kept.
        let then_value = self.conditional()?;
        self.expect(b':', "missing ':' in conditional expression")?;
        let else_value = self.conditional()?;

        Ok(if cond != 0 { then_value } else { else_value })
    }

    fn logical_or(&mut self) -> IntResult {
        let mut lhs = self.logical_and()?;
        while self.accept_op("||") {
            let rhs = self.logical_and()?;
            lhs = TclInt::from(lhs != 0 || rhs != 0);
        }
        Ok(lhs)
    }

    fn logical_and(&mut self) -> IntResult {
        let mut lhs = self.bit_or()?;
        while self.accept_op("&&") {
            let rhs = self.bit_or()?;
            lhs = TclInt::from(lhs != 0 && rhs != 0);
        }
        Ok(lhs)
    }

    fn bit_or(&mut self) -> IntResult {
        let mut lhs = self.bit_xor()?;
        while self.accept_op("|") {
            lhs |= self.bit_xor()?;
        }
        Ok(lhs)
    }

    fn bit_xor(&mut self) -> IntResult {
        let mut lhs = self.bit_and()?;
        while self.accept_op("^") {
            lhs ^= self.bit_and()?;
        }
        Ok(lhs)
    }

    fn bit_and(&mut self) -> IntResult {
        let mut lhs = self.equality()?;
        while self.accept_op("&") {
            lhs &= self.equality()?;
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> IntResult {
        let mut lhs = self.relational()?;
        loop {
            if self.accept_op("==") {
                lhs = TclInt::from(lhs == self.relational()?);
            } else if self.accept_op("!=") {
                lhs = TclInt::from(lhs != self.relational()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn relational(&mut self) -> IntResult {
        let mut lhs = self.shift()?;
        loop {
            if self.accept_op("<=") {
                lhs = TclInt::from(lhs <= self.shift()?);
            } else if self.accept_op(">=") {
                lhs = TclInt::from(lhs >= self.shift()?);
            } else if self.accept_op("<") {
                lhs = TclInt::from(lhs < self.shift()?);
            } else if self.accept_op(">") {
                lhs = TclInt::from(lhs > self.shift()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn shift(&mut self) -> IntResult {
        let mut lhs = self.additive()?;
        loop {
            if self.accept_op("<<") {
                lhs = lhs.wrapping_shl(self.additive()? as u32);
            } else if self.accept_op(">>") {
                lhs = lhs.wrapping_shr(self.additive()? as u32);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn additive(&mut self) -> IntResult {
        let mut lhs = self.multiplicative()?;
        loop {
            if self.accept_op("+") {
                lhs = lhs.wrapping_add(self.multiplicative()?);
            } else if self.accept_op("-") {
                lhs = lhs.wrapping_sub(self.multiplicative()?);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn multiplicative(&mut self) -> IntResult {
        let mut lhs = self.power()?;
        loop {
            if self.accept_op("*") {
                lhs = lhs.wrapping_mul(self.power()?);
            } else if self.accept_op("/") {
                let rhs = self.power()?;
                if rhs == 0 {
                    return Err(expr_error("divide by zero"));
                }
                lhs = lhs.wrapping_div(rhs);
            } else if self.accept_op("%") {
                let rhs = self.power()?;
                if rhs == 0 {
                    return Err(expr_error("divide by zero"));
                }
                lhs = lhs.wrapping_rem(rhs);
            } else {
                return Ok(lhs);
            }
        }
    }

    fn power(&mut self) -> IntResult {
        let base = self.unary()?;
        if !self.accept_op("**") {
            return Ok(base);
        }

        // Right-associative.
        let exponent = self.power()?;
        if exponent < 0 {
            return Err(expr_error("exponent must be non-negative"));
        }

        Ok(base.wrapping_pow(u32::try_from(exponent).unwrap_or(u32::MAX)))
    }

    fn unary(&mut self) -> IntResult {
        self.skip_ws();
        match self.peek() {
            Some(b'-') => {
                self.pos += 1;
                Ok(self.unary()?.wrapping_neg())
            }
            Some(b'+') => {
                self.pos += 1;
                self.unary()
            }
            Some(b'!') if self.peek_at(1) != Some(b'=') => {
                self.pos += 1;
                Ok(TclInt::from(self.unary()? == 0))
            }
            Some(b'~') => {
                self.pos += 1;
                Ok(!self.unary()?)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> IntResult {
        self.skip_ws();
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let value = self.conditional()?;
                self.expect(b')', "missing close parenthesis")?;
                Ok(value)
            }
            Some(b'{') => {
                self.pos += 1;
                let value = self.conditional()?;
                self.expect(b'}', "missing close brace")?;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(b'$') => {
                self.pos += 1;
                self.variable()
            }
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => self.variable(),
            Some(_) => Err(expr_error("syntax error in expression")),
            None => Err(expr_error("missing operand in expression")),
        }
    }

    fn number(&mut self) -> IntResult {
        let start = self.pos;
        let bytes = self.bytes();

        let radix = if bytes[start] == b'0'
            && matches!(self.peek_at(1), Some(b'x') | Some(b'X'))
        {
            self.pos += 2;
            16
        } else {
            10
        };

        let digits_start = self.pos;
        while let Some(c) = self.peek() {
            let is_digit = if radix == 16 {
                c.is_ascii_hexdigit()
            } else {
                c.is_ascii_digit()
            };
            if !is_digit {
                break;
            }
            self.pos += 1;
        }

        if self.pos == digits_start {
            return Err(expr_error("malformed number"));
        }

        // A numeral must end cleanly: running into a letter or a decimal
        // separator is an error, not a truncation.
        if let Some(c) = self.peek() {
            if c.is_ascii_alphabetic() || c == b'.' || c == b',' {
                return Err(expr_error("malformed number"));
            }
        }

        TclInt::from_str_radix(&self.text[digits_start..self.pos], radix)
            .map_err(|_| expr_error("integer constant too large"))
    }

    fn variable(&mut self) -> IntResult {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(expr_error("syntax error in expression"));
        }
        let name = &self.text[start..self.pos];

        let value = if self.peek() == Some(b'(') {
            self.pos += 1;
            let index = self.conditional()?;
            self.expect(b')', "missing close parenthesis in array index")?;
            if index < 0 {
                return Err(expr_error("array index must be non-negative"));
            }
            self.interp.element(name, index as usize)?
        } else {
            self.interp.scalar(name)?
        };

        value.as_int()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc(text: &str) -> TclResult {
        let interp = Interp::<()>::empty();
        eval_expr(&interp, text)
    }

    fn calc_int(text: &str) -> TclInt {
        calc(text).expect("expression evaluates").as_int().unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(calc_int("2 + 2"), 4);
        assert_eq!(calc_int("7 / 2"), 3);
        assert_eq!(calc_int("7 % 2"), 1);
        assert_eq!(calc_int("2 * 3 + 4"), 10);
        assert_eq!(calc_int("2 + 3 * 4"), 14);
        assert_eq!(calc_int("(2 + 3) * 4"), 20);
    }

    #[test]
    fn test_power() {
        assert_eq!(calc_int("2 ** 10"), 1024);
        // Right-associative: 2 ** (3 ** 2).
        assert_eq!(calc_int("2 ** 3 ** 2"), 512);
        assert!(calc("2 ** -1").is_err());
    }

    #[test]
    fn test_ternary() {
        assert_eq!(calc_int("1 ? 2 : 3"), 2);
        assert_eq!(calc_int("0 ? 2 : 3"), 3);
        assert_eq!(calc_int("1 ? 2 : 0 ? 3 : 4"), 2);
    }

    #[test]
    fn test_logical() {
        assert_eq!(calc_int("1 && 0"), 0);
        assert_eq!(calc_int("1 || 0"), 1);
        assert_eq!(calc_int("!3"), 0);
        assert_eq!(calc_int("!0"), 1);
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(calc_int("6 & 3"), 2);
        assert_eq!(calc_int("6 | 3"), 7);
        assert_eq!(calc_int("6 ^ 3"), 5);
        assert_eq!(calc_int("~0"), -1);
        assert_eq!(calc_int("1 << 4"), 16);
        assert_eq!(calc_int("256 >> 4"), 16);
    }

    #[test]
    fn test_relational() {
        assert_eq!(calc_int("1 < 2"), 1);
        assert_eq!(calc_int("2 <= 2"), 1);
        assert_eq!(calc_int("3 > 4"), 0);
        assert_eq!(calc_int("3 >= 4"), 0);
        assert_eq!(calc_int("5 == 5"), 1);
        assert_eq!(calc_int("5 != 5"), 0);
    }

    #[test]
    fn test_hex_literals() {
        assert_eq!(calc_int("0x10 + 0x0f"), 31);
        assert_eq!(calc_int("-0x10"), -16);
    }

    #[test]
    fn test_divide_by_zero() {
        let err = calc("1/0").unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::Expr);
        assert_eq!(err.value().as_str(), "divide by zero");
        assert!(calc("1%0").is_err());
    }

    #[test]
    fn test_malformed_number() {
        assert!(calc("12abc").is_err());
        assert!(calc("1.5").is_err());
        assert!(calc("3,4").is_err());
    }

    #[test]
    fn test_extra_characters() {
        let err = calc("1 + 2 )").unwrap_err();
        assert_eq!(err.value().as_str(), "extra characters after expression");
    }

    #[test]
    fn test_braced_subexpression() {
        assert_eq!(calc_int("{1 + 1} * 2"), 4);
    }

    #[test]
    fn test_unknown_variable() {
        let err = calc("$missing + 1").unwrap_err();
        assert_eq!(err.error_data().unwrap().kind(), ErrorKind::VarUnknown);
    }
}
