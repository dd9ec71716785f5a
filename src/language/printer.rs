use crate::language::ast::*;
use crate::stack::ensure_sufficient_stack;

/// Renders the tree with one node tag per line, in the same shape the
/// `ast` subcommand shows.
pub fn print_unit(unit: &Unit) -> String {
    let mut out = String::new();
    render(&unit_node(unit), "", &mut out);
    out
}

struct TreeNode {
    label: String,
    kids: Vec<TreeNode>,
}

impl TreeNode {
    fn new(label: impl Into<String>, kids: Vec<TreeNode>) -> Self {
        Self {
            label: label.into(),
            kids,
        }
    }

    fn leaf(tag: &str, payload: &str) -> Self {
        Self::new(format!("{}[{}]", tag, payload), Vec::new())
    }
}

fn render(node: &TreeNode, prefix: &str, out: &mut String) {
    out.push_str(&node.label);
    out.push('\n');
    let count = node.kids.len();
    for (idx, kid) in node.kids.iter().enumerate() {
        let last = idx + 1 == count;
        out.push_str(prefix);
        out.push_str("+--");
        let nested = format!("{}{}", prefix, if last { "   " } else { "|  " });
        ensure_sufficient_stack(|| render(kid, &nested, out));
    }
}

fn unit_node(unit: &Unit) -> TreeNode {
    let kids = unit
        .items
        .iter()
        .map(|item| match item {
            TopLevel::Function(def) => function_node(def),
            TopLevel::Stmt(stmt) => stmt_node(stmt),
        })
        .collect();
    TreeNode::new("UNIT", kids)
}

fn function_node(def: &FunctionDef) -> TreeNode {
    let params = def.params.iter().map(ident_node).collect();
    TreeNode::new(
        "FUNCTION",
        vec![
            ident_node(&def.name),
            TreeNode::new("PARAMETER_LIST", params),
            block_node(&def.body),
        ],
    )
}

fn block_node(block: &Block) -> TreeNode {
    TreeNode::new("STATEMENT_LIST", block.stmts.iter().map(stmt_node).collect())
}

fn stmt_node(stmt: &Stmt) -> TreeNode {
    let inner = match stmt {
        Stmt::VarDef { name, .. } => TreeNode::new("VARDEF", vec![ident_node(name)]),
        Stmt::If {
            cond,
            then_block,
            else_block,
            ..
        } => {
            let mut kids = vec![expr_node(cond), block_node(then_block)];
            if let Some(block) = else_block {
                kids.push(block_node(block));
            }
            TreeNode::new("IF", kids)
        }
        Stmt::While { cond, body, .. } => {
            TreeNode::new("WHILE", vec![expr_node(cond), block_node(body)])
        }
        Stmt::Expr(expr) => expr_node(expr),
    };
    TreeNode::new("STATEMENT", vec![inner])
}

fn ident_node(ident: &Identifier) -> TreeNode {
    TreeNode::leaf("VARREF", &ident.name)
}

fn expr_node(expr: &Expr) -> TreeNode {
    ensure_sufficient_stack(|| expr_node_inner(expr))
}

fn expr_node_inner(expr: &Expr) -> TreeNode {
    match expr {
        Expr::IntLiteral { text, .. } => TreeNode::leaf("INT_LITERAL", text),
        Expr::StringLiteral { value, .. } => TreeNode::leaf("STRING_LITERAL", value),
        Expr::VarRef(ident) => ident_node(ident),
        Expr::Assign { target, value, .. } => {
            TreeNode::new("ASSIGN", vec![ident_node(target), expr_node(value)])
        }
        Expr::Binary {
            op, left, right, ..
        } => TreeNode::new(op_tag(*op), vec![expr_node(left), expr_node(right)]),
        Expr::Call { callee, args, .. } => TreeNode::new(
            "FNCALL",
            vec![
                ident_node(callee),
                TreeNode::new("ARGLIST", args.iter().map(expr_node).collect()),
            ],
        ),
    }
}

fn op_tag(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "ADD",
        BinaryOp::Sub => "SUB",
        BinaryOp::Mul => "MULTIPLY",
        BinaryOp::Div => "DIVIDE",
        BinaryOp::Lt => "LESS",
        BinaryOp::LtEq => "LESSEQUAL",
        BinaryOp::Gt => "GREATER",
        BinaryOp::GtEq => "GREATEREQUAL",
        BinaryOp::Eq => "ISEQUAL",
        BinaryOp::NotEq => "ISNOTEQUAL",
        BinaryOp::And => "LOGICAL_AND",
        BinaryOp::Or => "LOGICAL_OR",
    }
}
