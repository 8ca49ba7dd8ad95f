// Lingo bytecode decompiler: stack machine from handler bytecode to AST,
// then source text through the AST printer.

use std::rc::Rc;

use log::debug;

use crate::director::chunks::handler::{Bytecode, HandlerDef};
use crate::director::chunks::script::ScriptChunk;
use crate::director::lingo::constants::is_binary_op;
use crate::director::lingo::datum::Datum;
use crate::director::lingo::opcode::OpCode;
use crate::director::lingo::script::ScriptContext;

use super::ast::{AstNode, BlockNode};
use super::code_writer::CodeWriter;
use super::enums::ChunkExprType;

/// Result of decompiling a handler
#[derive(Clone, Debug)]
pub struct DecompiledHandler {
    pub name: String,
    pub arguments: Vec<String>,
    pub globals: Vec<String>,
    pub block: BlockNode,
}

/// Decompiler state
struct DecompilerState<'a> {
    handler: &'a HandlerDef,
    chunk: &'a ScriptChunk,
    lctx: &'a ScriptContext,
    multiplier: u32,

    stack: Vec<Rc<AstNode>>,
    root_block: BlockNode,
}

impl<'a> DecompilerState<'a> {
    fn new(handler: &'a HandlerDef, chunk: &'a ScriptChunk, lctx: &'a ScriptContext, multiplier: u32) -> Self {
        Self {
            handler,
            chunk,
            lctx,
            multiplier: multiplier.max(1),
            stack: Vec::new(),
            root_block: BlockNode::new(),
        }
    }

    fn get_name(&self, id: i64) -> String {
        self.lctx
            .get_name(id)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("UNKNOWN_{}", id))
    }

    fn get_local_name(&self, id: i64) -> String {
        let local_index = (id.max(0) as u32 / self.multiplier) as usize;
        self.handler
            .local_name_ids
            .get(local_index)
            .and_then(|&name_id| self.lctx.get_name(name_id as i64))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("local_{}", local_index))
    }

    fn get_argument_name(&self, id: i64) -> String {
        let arg_index = (id.max(0) as u32 / self.multiplier) as usize;
        self.handler
            .argument_name_ids
            .get(arg_index)
            .and_then(|&name_id| self.lctx.get_name(name_id as i64))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("arg_{}", arg_index))
    }

    fn get_handler_name(&self, index: i64) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.chunk.handlers.get(i))
            .and_then(|h| self.lctx.get_name(h.name_id as i64))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("handler_{}", index))
    }

    /// Pops an expression; an underflowing stack yields VOID.
    fn pop(&mut self) -> Rc<AstNode> {
        self.stack
            .pop()
            .unwrap_or_else(|| Rc::new(AstNode::Literal(Datum::Void)))
    }

    fn push(&mut self, node: AstNode) {
        self.stack.push(Rc::new(node));
    }

    fn add_statement(&mut self, node: AstNode) {
        self.root_block.add_child(Rc::new(node));
    }

    fn parse(&mut self) {
        self.stack.clear();
        for index in 0..self.handler.bytecode_array.len() {
            self.translate_bytecode(index);
        }
    }

    fn translate_bytecode(&mut self, index: usize) {
        let handler = self.handler;
        let bytecode = &handler.bytecode_array[index];
        let obj = bytecode.obj;
        let opcode = match bytecode.opcode {
            Some(opcode) => opcode,
            None => return self.translate_unknown(bytecode),
        };

        match opcode {
            OpCode::Ret | OpCode::RetFactory => {
                // the trailing ret closes the handler
                if index + 1 < self.handler.bytecode_array.len() {
                    self.add_statement(AstNode::Return(None));
                }
            }
            OpCode::PushZero => self.push(AstNode::Literal(Datum::Int(0))),
            _ if is_binary_op(opcode) => {
                let right = self.pop();
                let left = self.pop();
                self.push(AstNode::BinaryOp { opcode, left, right });
            }
            OpCode::Inv | OpCode::Not => {
                let operand = self.pop();
                self.push(AstNode::UnaryOp { opcode, operand });
            }
            OpCode::GetChunk => {
                let string = self.pop();
                let chunk = self.read_chunk_ref(string);
                self.stack.push(chunk);
            }
            OpCode::PushList => {
                let list = self.pop();
                match literal_list(&list) {
                    Some(items) => self.push(AstNode::Literal(Datum::List(items))),
                    None => self.translate_unknown(bytecode),
                }
            }
            OpCode::Swap => {
                let len = self.stack.len();
                if len >= 2 {
                    self.stack.swap(len - 1, len - 2);
                }
            }
            OpCode::PushInt8 | OpCode::PushInt16 | OpCode::PushInt32 => {
                self.push(AstNode::Literal(Datum::Int(obj as i32)));
            }
            OpCode::PushFloat32 => {
                let value = f32::from_bits(obj as u32);
                self.push(AstNode::Literal(Datum::Float(value as f64)));
            }
            OpCode::PushArgListNoRet | OpCode::PushArgList => {
                let arg_count = obj.max(0) as usize;
                let available = arg_count.min(self.stack.len());
                if available < arg_count {
                    debug!("Argument list of {} with {} values on the stack", arg_count, available);
                }
                let args = self.stack.split_off(self.stack.len() - available);
                let no_return = opcode == OpCode::PushArgListNoRet;
                self.push(AstNode::ArgList { args, no_return });
            }
            OpCode::PushCons => {
                let literal_id = (obj.max(0) as u32 / self.multiplier) as usize;
                let datum = match self.chunk.literals.get(literal_id) {
                    Some(literal) => literal.clone(),
                    None => {
                        debug!("Literal {} is out of range ({} literals)", literal_id, self.chunk.literals.len());
                        Datum::Void
                    }
                };
                self.push(AstNode::Literal(datum));
            }
            OpCode::PushSymb => self.push(AstNode::Literal(Datum::Symbol(self.get_name(obj)))),
            OpCode::PushVarRef => self.push(AstNode::Literal(Datum::VarRef(self.get_name(obj)))),
            OpCode::GetGlobal | OpCode::GetGlobal2 | OpCode::GetProp | OpCode::GetTopLevelProp => {
                self.push(AstNode::Var(self.get_name(obj)));
            }
            OpCode::GetParam => self.push(AstNode::Var(self.get_argument_name(obj))),
            OpCode::GetLocal => self.push(AstNode::Var(self.get_local_name(obj))),
            OpCode::SetGlobal | OpCode::SetGlobal2 | OpCode::SetProp => {
                let value = self.pop();
                let variable = Rc::new(AstNode::Var(self.get_name(obj)));
                self.add_statement(AstNode::Assignment { variable, value });
            }
            OpCode::SetParam => {
                let value = self.pop();
                let variable = Rc::new(AstNode::Var(self.get_argument_name(obj)));
                self.add_statement(AstNode::Assignment { variable, value });
            }
            OpCode::SetLocal => {
                let value = self.pop();
                let variable = Rc::new(AstNode::Var(self.get_local_name(obj)));
                self.add_statement(AstNode::Assignment { variable, value });
            }
            OpCode::LocalCall => {
                let args = self.pop();
                let name = self.get_handler_name(obj);
                self.add_call(name, args);
            }
            OpCode::ExtCall | OpCode::TellCall => {
                let args = self.pop();
                let name = self.get_name(obj);
                self.add_call(name, args);
            }
            OpCode::GetMovieProp => {
                self.push(AstNode::Var(format!("the {}", self.get_name(obj))));
            }
            OpCode::SetMovieProp => {
                let value = self.pop();
                let variable = Rc::new(AstNode::Var(format!("the {}", self.get_name(obj))));
                self.add_statement(AstNode::Assignment { variable, value });
            }
            OpCode::Pop => {
                for _ in 0..obj.max(0) {
                    self.pop();
                }
            }
            _ => self.translate_unknown(bytecode),
        }
    }

    fn translate_unknown(&mut self, bytecode: &Bytecode) {
        debug!("No translation for opcode {:#04x} at {}", bytecode.op_id, bytecode.pos);
        self.stack.clear();
        self.add_statement(AstNode::UnknownOp {
            opcode_id: bytecode.op_id,
            obj: bytecode.obj,
        });
    }

    fn add_call(&mut self, name: String, args: Rc<AstNode>) {
        let statement = matches!(args.as_ref(), AstNode::ArgList { no_return: true, .. });
        if !statement {
            self.push(AstNode::Call { name, args, statement });
            return;
        }
        if name == "return" {
            let value = match args.as_ref() {
                AstNode::ArgList { args, .. } => args.first().cloned(),
                _ => None,
            };
            self.add_statement(AstNode::Return(value));
            return;
        }
        self.add_statement(AstNode::Call { name, args, statement });
    }

    fn read_chunk_ref(&mut self, string: Rc<AstNode>) -> Rc<AstNode> {
        let last_line = self.pop();
        let first_line = self.pop();
        let last_item = self.pop();
        let first_item = self.pop();
        let last_word = self.pop();
        let first_word = self.pop();
        let last_char = self.pop();
        let first_char = self.pop();

        let mut result = string;

        // Build chunk expression from innermost to outermost
        for (chunk_type, first, last) in [
            (ChunkExprType::Line, first_line, last_line),
            (ChunkExprType::Item, first_item, last_item),
            (ChunkExprType::Word, first_word, last_word),
            (ChunkExprType::Char, first_char, last_char),
        ] {
            if first.is_int_literal(0) {
                continue;
            }
            result = Rc::new(AstNode::ChunkExpr { chunk_type, first, last, string: result });
        }

        result
    }

    fn generate_output(self) -> DecompiledHandler {
        let name = self
            .lctx
            .get_name(self.handler.name_id as i64)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("handler_{}", self.handler.name_id));

        let arguments = self
            .handler
            .argument_name_ids
            .iter()
            .enumerate()
            .map(|(i, &id)| {
                self.lctx
                    .get_name(id as i64)
                    .map(str::to_owned)
                    .unwrap_or_else(|| format!("arg_{}", i))
            })
            .collect();

        let globals = self
            .handler
            .global_name_ids
            .iter()
            .filter_map(|&id| self.lctx.get_name(id as i64).map(str::to_owned))
            .collect();

        DecompiledHandler {
            name,
            arguments,
            globals,
            block: self.root_block,
        }
    }
}

fn literal_list(list: &AstNode) -> Option<Vec<Datum>> {
    match list {
        AstNode::ArgList { args, .. } => args
            .iter()
            .map(|arg| match arg.as_ref() {
                AstNode::Literal(datum) => Some(datum.clone()),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

impl DecompiledHandler {
    pub fn write_script_text(&self, code: &mut CodeWriter) {
        code.write("on ");
        code.write(&self.name);
        if !self.arguments.is_empty() {
            code.write(" ");
            code.write(&self.arguments.join(", "));
        }
        code.end_line();
        code.indent();
        if !self.globals.is_empty() {
            code.write_line(&format!("global {}", self.globals.join(", ")));
        }
        AstNode::Block(self.block.clone()).write_script_text(code);
        code.unindent();
        code.write_line("end");
    }
}

/// Main entry point for decompiling a handler
pub fn decompile_handler(
    handler: &HandlerDef,
    chunk: &ScriptChunk,
    lctx: &ScriptContext,
    multiplier: u32,
) -> DecompiledHandler {
    let mut state = DecompilerState::new(handler, chunk, lctx, multiplier);
    state.parse();
    state.generate_output()
}

/// Decompiles every handler of a script into Lingo source.
pub fn decompile_script(
    chunk: &ScriptChunk,
    lctx: &ScriptContext,
    version: u16,
    line_ending: &str,
) -> String {
    let multiplier = lctx.variable_multiplier(version);
    let mut code = CodeWriter::new(line_ending);

    let properties: Vec<&str> = chunk
        .property_name_ids
        .iter()
        .filter_map(|&id| lctx.get_name(id as i64))
        .collect();
    if !properties.is_empty() {
        code.write_line(&format!("property {}", properties.join(", ")));
    }

    for (i, handler) in chunk.handlers.iter().enumerate() {
        if i > 0 || !properties.is_empty() {
            code.end_line();
        }
        decompile_handler(handler, chunk, lctx, multiplier).write_script_text(&mut code);
    }
    code.into_string()
}
