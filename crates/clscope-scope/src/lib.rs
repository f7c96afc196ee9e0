//! Lexical scope analysis for Common Lisp source.
//!
//! [`analyze`] scans a document, collects every definition and binding
//! form into a [`SymbolTable`] and answers position-sensitive lookups
//! through [`SymbolTable::resolve`].

pub mod analyze;
pub mod binding;
mod collect;
pub mod forms;
pub mod lambda_list;
pub mod resolve;
pub mod table;

pub use analyze::{analyze, analyze_cancellable, AnalysisResult};
pub use binding::{Binding, BindingKind};
pub use lambda_list::{parse_lambda_list, LambdaParam, Marker};
pub use resolve::{is_shadowed, Resolution};
pub use table::{BindingMap, Collection, SymbolTable};
