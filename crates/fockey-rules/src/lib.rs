//! Fockey Blocklist Importer
//!
//! This crate turns pasted or downloaded blocklists (plain domain lists,
//! hosts files, adblock-style `||domain^` lists) into Fockey rule sets.

pub mod parser;
pub mod optimizer;
pub mod builder;

pub use builder::{build_rule_set, merge_into};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_rule_list, ParseError, ParsedList, ParsedRule, Rejected};
