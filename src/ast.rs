//! The typed IR: expressions, l-values, statements, declarations, and the
//! arena that owns them.
//!
//! Every node lives in the [`Ast`] arena and is referenced by a typed index
//! (`ExprId`, `StmtId`, `VarId`, `DefId`). Nodes are never freed
//! individually; the arena is dropped as a whole at the end of the compile
//! session. Passes rewrite nodes in place through the arena's mutable
//! accessors.

mod arena;
mod decl;
mod dump;
mod expr;
mod lvalue;
mod stmt;

pub use arena::{Ast, DefId, ExprId, StmtId, VarId};
pub use decl::{VarDecl, VarKind};
pub use dump::listing;
pub use expr::{BinOp, Expr, UnaryOp};
pub use lvalue::{LValue, SsaDef};
pub use stmt::{Stmt, StmtKind};
