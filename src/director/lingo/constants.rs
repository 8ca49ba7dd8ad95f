use super::opcode::OpCode;

static BINARY_OP_NAMES: &[(OpCode, &str)] = &[
    (OpCode::Mul, "*"),
    (OpCode::Add, "+"),
    (OpCode::Sub, "-"),
    (OpCode::Div, "/"),
    (OpCode::Mod, "mod"),
    (OpCode::JoinStr, "&"),
    (OpCode::JoinPadStr, "&&"),
    (OpCode::Lt, "<"),
    (OpCode::LtEq, "<="),
    (OpCode::NtEq, "<>"),
    (OpCode::Eq, "="),
    (OpCode::Gt, ">"),
    (OpCode::GtEq, ">="),
    (OpCode::And, "and"),
    (OpCode::Or, "or"),
    (OpCode::ContainsStr, "contains"),
    (OpCode::Contains0Str, "starts"),
];

static UNARY_OP_NAMES: &[(OpCode, &str)] = &[(OpCode::Inv, "-"), (OpCode::Not, "not ")];

pub fn get_binary_op_name(opcode: OpCode) -> Option<&'static str> {
    BINARY_OP_NAMES
        .iter()
        .find(|(op, _)| *op == opcode)
        .map(|(_, name)| *name)
}

pub fn get_unary_op_name(opcode: OpCode) -> Option<&'static str> {
    UNARY_OP_NAMES
        .iter()
        .find(|(op, _)| *op == opcode)
        .map(|(_, name)| *name)
}

/// Binding strength of an infix operator; lower binds tighter. Concatenation
/// and string tests have no level and always parenthesize infix operands.
pub fn get_binary_op_precedence(opcode: OpCode) -> Option<u8> {
    match opcode {
        OpCode::Mul | OpCode::Div | OpCode::Mod => Some(1),
        OpCode::Add | OpCode::Sub => Some(2),
        OpCode::Lt | OpCode::LtEq | OpCode::NtEq | OpCode::Eq | OpCode::Gt | OpCode::GtEq => {
            Some(3)
        }
        OpCode::And => Some(4),
        OpCode::Or => Some(5),
        _ => None,
    }
}

pub fn is_binary_op(opcode: OpCode) -> bool {
    get_binary_op_name(opcode).is_some()
}
