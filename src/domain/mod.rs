// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Pure domain code: no I/O, no async. Time and randomness are passed in by
// the application layer.
//
// ============================================================================

pub mod cpf;
pub mod order;
