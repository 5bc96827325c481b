/// Illegal state combination rejected at mutation time.
///
/// These never fire when the reconciliation engine operates correctly;
/// they catch misuse from any other code path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("Password is only allowed for LOCAL accounts")]
    PasswordOnSocialAccount,
    #[error("Cannot switch to LOCAL while a social identity is linked")]
    LocalWithLinkedIdentity,
    #[error("Cannot switch to a social provider while a password is set")]
    SocialWithPassword,
    #[error("LOCAL accounts cannot carry a social identity")]
    IdentityOnLocalAccount,
    #[error("Identity rows are only for social providers")]
    LocalIdentityProvider,
}

/// Expected, recoverable rejection of a reconcile attempt: the email is
/// already bound to another account. The call is guaranteed side-effect-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccountConflict {
    #[error(
        "An account with this email already exists. Please log in with your \
         password first, then link your social account from your profile."
    )]
    LocalAccountExists,
    #[error("This email is already associated with a different social login provider.")]
    OtherProviderLinked,
}
