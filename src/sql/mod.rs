//! The SQL compilation pipeline: lex, parse, analyze, plan.

pub mod analyzer;
pub mod ast;
pub mod plan;
pub mod parser;
pub mod token;

pub use analyzer::SemanticAnalyzer;
pub use plan::{LogicalPlan, Planner};
pub use token::Lexer;
