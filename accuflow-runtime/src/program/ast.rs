use accuflow_common::value::Value;

/// Binary operator heads of the program language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "eq?",
            BinaryOp::Ne => "ne?",
            BinaryOp::Lt => "lt?",
            BinaryOp::Le => "le?",
            BinaryOp::Gt => "gt?",
            BinaryOp::Ge => "ge?",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Compiled form of a wire S-expression, one variant per node kind. The
/// compiler produces this tree once at submission; nothing re-parses JSON
/// during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Document id of the current vertex.
    This,
    /// Engine-assigned integer id of the current vertex.
    VertexUniqueId,
    GlobalSuperstep,
    AccumRef(String),
    VarRef(String),
    BindRef(String),
    Attrib {
        field: String,
        record: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    Seq(Vec<Expr>),
    If(Vec<IfClause>),
    /// Iteration over the current vertex's outbound edges, the loop variable
    /// bound to each edge record.
    ForOutbound {
        var: String,
        body: Box<Expr>,
    },
    /// Iteration over an explicit list value.
    ForEach {
        var: String,
        list: Box<Expr>,
        body: Box<Expr>,
    },
    /// Emit a message towards `target`'s accumulator; never touches local
    /// state.
    Update {
        accumulator: String,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// Overwrite the current vertex's own accumulator, visible to later
    /// expressions of the same evaluation.
    Set {
        accumulator: String,
        value: Box<Expr>,
    },
    Print(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfClause {
    pub condition: Expr,
    pub body: Expr,
}

impl IfClause {
    /// A literal-true guard, the conventional final clause.
    pub fn is_catch_all(&self) -> bool {
        matches!(self.condition, Expr::Literal(Value::Bool(true)))
    }
}

/// A phase program; `false` on the wire means "run nothing, vote halt".
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    NoOp,
    Run(Expr),
}

#[derive(Debug, Clone)]
pub struct CompiledPhase {
    pub name: String,
    pub init: Program,
    pub update: Program,
}
