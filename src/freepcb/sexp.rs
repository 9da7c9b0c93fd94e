use std::fmt::{self, Write};

/// KiCad S-expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    /// Bare symbol, written without quotes.
    Symbol(String),
    /// Quoted, escaped string.
    Str(String),
    Int(i64),
    Float(f64),
    List(Vec<Sexp>),
}

pub fn sym(s: &str) -> Sexp {
    Sexp::Symbol(s.to_string())
}

pub fn text(s: &str) -> Sexp {
    Sexp::Str(s.to_string())
}

/// `(head items...)`
pub fn list(head: &str, items: impl IntoIterator<Item = Sexp>) -> Sexp {
    let mut nodes = vec![sym(head)];
    nodes.extend(items);
    Sexp::List(nodes)
}

impl From<f64> for Sexp {
    fn from(value: f64) -> Self {
        Sexp::Float(value)
    }
}

impl From<i64> for Sexp {
    fn from(value: i64) -> Self {
        Sexp::Int(value)
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value == 0.0 {
        // 避免輸出 "-0"
        f.write_char('0')
    } else {
        write!(f, "{}", value)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_ascii() && !c.is_ascii_control() => f.write_char(c)?,
            c if (c as u32) <= 0xff => write!(f, "\\x{:02x}", c as u32)?,
            c if (c as u32) <= 0xffff => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "\\U{:08x}", c as u32)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Symbol(s) => f.write_str(s),
            Sexp::Str(s) => write_escaped(f, s),
            Sexp::Int(i) => write!(f, "{}", i),
            Sexp::Float(v) => write_float(f, *v),
            Sexp::List(items) => {
                f.write_char('(')?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_char(')')
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_list() {
        let node = list(
            "fp_text",
            [
                sym("reference"),
                text("REF**"),
                list("at", [Sexp::Int(0), Sexp::Int(0)]),
            ],
        );
        assert_eq!(node.to_string(), "(fp_text reference \"REF**\" (at 0 0))");
    }

    #[test]
    fn test_floats() {
        assert_eq!(Sexp::Float(-0.0).to_string(), "0");
        assert_eq!(Sexp::Float(0.45).to_string(), "0.45");
        assert_eq!(Sexp::Float(-1.27).to_string(), "-1.27");
        assert_eq!(Sexp::Float(2.0).to_string(), "2");
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(text("a\"b\\c").to_string(), "\"a\\\"b\\\\c\"");
        assert_eq!(text("µ").to_string(), "\"\\xb5\"");
    }
}
