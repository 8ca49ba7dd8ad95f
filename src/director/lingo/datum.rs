use crate::director::lingo::decompiler::code_writer::CodeWriter;

/// A literal value as it appears in decompiled source.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Void,
    Symbol(String),
    VarRef(String),
    String(String),
    Int(i32),
    Float(f64),
    List(Vec<Datum>),
}

impl Datum {
    pub fn to_int(&self) -> i32 {
        match self {
            Datum::Int(i) => *i,
            Datum::Float(f) => *f as i32,
            _ => 0,
        }
    }

    pub fn is_int(&self, value: i32) -> bool {
        matches!(self, Datum::Int(i) if *i == value)
    }

    pub fn write_script_text(&self, code: &mut CodeWriter) {
        match self {
            Datum::Void => code.write("VOID"),
            Datum::Symbol(s) => {
                code.write("#");
                code.write(s);
            }
            Datum::VarRef(s) => code.write(s),
            Datum::String(s) => write_string_literal(s, code),
            Datum::Int(i) => code.write(&i.to_string()),
            Datum::Float(f) => code.write(&float_to_string(*f)),
            Datum::List(items) => {
                code.write("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        code.write(", ");
                    }
                    item.write_script_text(code);
                }
                code.write("]");
            }
        }
    }
}

fn write_string_literal(s: &str, code: &mut CodeWriter) {
    if s.is_empty() {
        code.write("EMPTY");
        return;
    }
    let mut pieces = vec![];
    for (i, part) in s.split('"').enumerate() {
        if i > 0 {
            pieces.push("QUOTE".to_owned());
        }
        if !part.is_empty() {
            pieces.push(format!("\"{}\"", part));
        }
    }
    code.write(&pieces.join(" & "));
}

pub fn float_to_string(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
