//! Restricted arithmetic for `action: "calculate"`
//!
//! Grammar:
//!   expr   := term (('+' | '-') term)*
//!   term   := factor (('*' | '/' | '%') factor)*
//!   factor := ('-' | '+') factor | number | '(' expr ')'
//!
//! Nothing else is accepted: no identifiers, no function calls.

/// Nesting limit for parentheses and unary signs
const MAX_DEPTH: usize = 64;

struct Parser<'a>
{   src: &'a [u8]
  , pos: usize
  , depth: usize
}

impl<'a> Parser<'a>
{   fn new(src: &'a str) -> Self
    {   Parser { src: src.as_bytes(), pos: 0, depth: 0 }
    }

    fn skip_ws(&mut self)
    {   while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace()
        {   self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8>
    {   self.skip_ws();
        self.src.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, crate::error::Error>
    {   let mut value = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek()
        {   self.pos += 1;
            let rhs = self.term()?;
            value = if op == b'+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, crate::error::Error>
    {   let mut value = self.factor()?;
        while let Some(op @ (b'*' | b'/' | b'%')) = self.peek()
        {   self.pos += 1;
            let rhs = self.factor()?;
            value = match op
            {   b'*' => value * rhs
              , _ if rhs == 0.0 => return Err(invalid("division by zero"))
              , b'/' => value / rhs
              , _ => value % rhs
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, crate::error::Error>
    {   self.depth += 1;
        if self.depth > MAX_DEPTH
        {   return Err(invalid("expression nested too deeply"));
        }
        let value = match self.peek()
        {   Some(b'-') => {
              self.pos += 1;
              -self.factor()?
            }
          , Some(b'+') => {
              self.pos += 1;
              self.factor()?
            }
          , Some(b'(') => {
              self.pos += 1;
              let inner = self.expr()?;
              if self.peek() != Some(b')')
              {   return Err(invalid("missing closing parenthesis"));
              }
              self.pos += 1;
              inner
            }
          , Some(c) if c.is_ascii_digit() || c == b'.' => self.number()?
          , Some(c) => {
              return Err(invalid(&format!("unexpected character '{}'", c as char)));
            }
          , None => return Err(invalid("unexpected end of expression"))
        };
        self.depth -= 1;
        Ok(value)
    }

    fn number(&mut self) -> Result<f64, crate::error::Error>
    {   let start = self.pos;
        while self.pos < self.src.len()
          && (self.src[self.pos].is_ascii_digit() || self.src[self.pos] == b'.')
        {   self.pos += 1;
        }
        let literal = std::str::from_utf8(&self.src[start..self.pos])
          .map_err(|_| invalid("invalid number"))?;
        literal.parse::<f64>()
          .map_err(|_| invalid(&format!("invalid number '{}'", literal)))
    }
}

fn invalid(msg: &str) -> crate::error::Error
{   crate::error::Error::InvalidExpression(msg.to_string())
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, crate::error::Error>
{   let mut parser = Parser::new(expr);
    let value = parser.expr()?;
    if let Some(c) = parser.peek()
    {   return Err(invalid(&format!("unexpected character '{}'", c as char)));
    }
    if !value.is_finite()
    {   return Err(invalid("result is not a finite number"));
    }
    Ok(value)
}

/// Render without a trailing `.0` for whole numbers.
pub fn format_number(value: f64) -> String
{   if value.fract() == 0.0 && value.abs() < 1e15
    {   format!("{}", value as i64)
    } else
    {   format!("{}", value)
    }
}
