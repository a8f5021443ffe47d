pub mod guardrail;
pub mod scope;
