//! Referral core: code generation and commission estimation

pub mod codegen;
pub mod commission;
