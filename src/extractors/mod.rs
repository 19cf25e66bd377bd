/*!
 * Handler-facing extractors
 *
 * Responsibility:
 * - middleware が request extensions に入れた値を handler に渡す
 * - state の型には依存しない (どのサービスの Router でも使える)
 *
 * Public API:
 * - CurrentIdentity / AuthenticatedUser
 * - CurrentCorrelationId
 */

mod correlation;
mod identity;

pub use correlation::CurrentCorrelationId;
pub use identity::{AuthenticatedUser, CurrentIdentity};
