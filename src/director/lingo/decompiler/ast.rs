use std::rc::Rc;

use crate::director::lingo::constants::{
    get_binary_op_name, get_binary_op_precedence, get_unary_op_name,
};
use crate::director::lingo::datum::Datum;
use crate::director::lingo::opcode::OpCode;

use super::code_writer::CodeWriter;
use super::enums::ChunkExprType;

#[derive(Clone, Debug, Default)]
pub struct BlockNode {
    pub children: Vec<Rc<AstNode>>,
}

impl BlockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_child(&mut self, node: Rc<AstNode>) {
        self.children.push(node);
    }
}

#[derive(Clone, Debug)]
pub enum AstNode {
    Block(BlockNode),
    Literal(Datum),
    Var(String),
    BinaryOp {
        opcode: OpCode,
        left: Rc<AstNode>,
        right: Rc<AstNode>,
    },
    UnaryOp {
        opcode: OpCode,
        operand: Rc<AstNode>,
    },
    Assignment {
        variable: Rc<AstNode>,
        value: Rc<AstNode>,
    },
    ArgList {
        args: Vec<Rc<AstNode>>,
        no_return: bool,
    },
    Call {
        name: String,
        args: Rc<AstNode>,
        statement: bool,
    },
    Return(Option<Rc<AstNode>>),
    ChunkExpr {
        chunk_type: ChunkExprType,
        first: Rc<AstNode>,
        last: Rc<AstNode>,
        string: Rc<AstNode>,
    },
    /// Placeholder for bytecode the translator does not model.
    UnknownOp {
        opcode_id: u8,
        obj: i64,
    },
}

impl AstNode {
    /// Whether the unparenthesized text of this node could be misread when
    /// embedded as an operand.
    pub fn has_spaces(&self) -> bool {
        match self {
            AstNode::BinaryOp { .. }
            | AstNode::UnaryOp { .. }
            | AstNode::Assignment { .. }
            | AstNode::Return(_)
            | AstNode::ChunkExpr { .. } => true,
            AstNode::ArgList { args, .. } => args_have_spaces(args),
            AstNode::Call { args, .. } => args.has_spaces(),
            AstNode::Block(_)
            | AstNode::Literal(_)
            | AstNode::Var(_)
            | AstNode::UnknownOp { .. } => false,
        }
    }

    pub fn is_int_literal(&self, value: i32) -> bool {
        matches!(self, AstNode::Literal(datum) if datum.is_int(value))
    }

    pub fn write_script_text(&self, code: &mut CodeWriter) {
        match self {
            AstNode::Block(block) => {
                for child in &block.children {
                    child.write_script_text(code);
                    code.end_line();
                }
            }
            AstNode::Literal(datum) => datum.write_script_text(code),
            AstNode::Var(name) => code.write(name),
            AstNode::BinaryOp { opcode, left, right } => {
                let precedence = get_binary_op_precedence(*opcode);
                write_operand(left, precedence, false, code);
                code.write(" ");
                code.write(get_binary_op_name(*opcode).unwrap_or("?"));
                code.write(" ");
                write_operand(right, precedence, true, code);
            }
            AstNode::UnaryOp { opcode, operand } => {
                code.write(get_unary_op_name(*opcode).unwrap_or("?"));
                write_parenthesized(operand, operand.has_spaces(), code);
            }
            AstNode::Assignment { variable, value } => {
                variable.write_script_text(code);
                code.write(" = ");
                value.write_script_text(code);
            }
            AstNode::ArgList { args, .. } => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        code.write(", ");
                    }
                    arg.write_script_text(code);
                }
            }
            AstNode::Call { name, args, statement } => {
                code.write(name);
                if *statement {
                    if !args.is_empty_arg_list() {
                        code.write(" ");
                        args.write_script_text(code);
                    }
                } else {
                    code.write("(");
                    args.write_script_text(code);
                    code.write(")");
                }
            }
            AstNode::Return(value) => match value {
                Some(value) => {
                    code.write("return ");
                    value.write_script_text(code);
                }
                None => code.write("return"),
            },
            AstNode::ChunkExpr { chunk_type, first, last, string } => {
                code.write(chunk_type.name());
                code.write(" ");
                write_parenthesized(first, first.has_spaces(), code);
                // a last of 0 means the chunk is a single unit
                if !last.is_int_literal(0) {
                    code.write(" to ");
                    write_parenthesized(last, last.has_spaces(), code);
                }
                code.write(" of ");
                let nested = matches!(
                    string.as_ref(),
                    AstNode::ChunkExpr { chunk_type: inner, .. } if inner > chunk_type
                );
                write_parenthesized(string, !nested && string.has_spaces(), code);
            }
            AstNode::UnknownOp { opcode_id, obj } => {
                code.write(&format!("-- unknown opcode 0x{:02x}", opcode_id));
                if *opcode_id >= 0x40 {
                    code.write(&format!(" {}", obj));
                }
            }
        }
    }

    fn is_empty_arg_list(&self) -> bool {
        matches!(self, AstNode::ArgList { args, .. } if args.is_empty())
    }
}

fn args_have_spaces(args: &[Rc<AstNode>]) -> bool {
    args.len() > 1 || args.iter().any(|arg| arg.has_spaces())
}

fn write_parenthesized(node: &AstNode, parenthesize: bool, code: &mut CodeWriter) {
    if parenthesize {
        code.write("(");
        node.write_script_text(code);
        code.write(")");
    } else {
        node.write_script_text(code);
    }
}

fn write_operand(operand: &AstNode, precedence: Option<u8>, is_right: bool, code: &mut CodeWriter) {
    let parenthesize = match operand {
        AstNode::BinaryOp { opcode, .. } => {
            match (precedence, get_binary_op_precedence(*opcode)) {
                (Some(outer), Some(inner)) if is_right => inner >= outer,
                (Some(outer), Some(inner)) => inner > outer,
                _ => true,
            }
        }
        AstNode::ChunkExpr { .. } => true,
        _ => false,
    };
    write_parenthesized(operand, parenthesize, code);
}
