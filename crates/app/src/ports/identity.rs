//! Identity port: who is behind a user-facing write.

use stovepanel_domain::operator::Operator;

/// Resolves the operator recorded in `updated_by` audit fields.
pub trait IdentityContext {
    fn operator(&self) -> Operator;
}

impl IdentityContext for Operator {
    fn operator(&self) -> Operator {
        self.clone()
    }
}
