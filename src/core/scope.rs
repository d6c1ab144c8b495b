use tokio_util::sync::{CancellationToken, DropGuard};

use crate::core::models::AccountId;

/// Lifetime of one shell instance. Dropping it (or calling
/// [`teardown`](Self::teardown)) invalidates every ticket and scoped
/// subscription handed out.
pub struct InstanceScope {
    account_id: AccountId,
    token: CancellationToken,
    _guard: DropGuard,
}

impl InstanceScope {
    pub fn new(account_id: AccountId) -> Self {
        let token = CancellationToken::new();
        let guard = token.clone().drop_guard();
        InstanceScope {
            account_id,
            token,
            _guard: guard,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Ticket to attach to an async request started by this instance.
    pub fn ticket(&self) -> Ticket {
        Ticket {
            account_id: self.account_id,
            token: self.token.child_token(),
        }
    }

    pub(crate) fn ticket_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn teardown(&self) {
        self.token.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }
}

/// Proof that a completion belongs to a still-live instance.
#[derive(Debug, Clone)]
pub struct Ticket {
    account_id: AccountId,
    token: CancellationToken,
}

impl Ticket {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Live while the issuing instance is, and only for the account it was
    /// issued under.
    pub fn is_current(&self, active: Option<AccountId>) -> bool {
        !self.token.is_cancelled() && active == Some(self.account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_follows_scope() {
        let scope = InstanceScope::new(3);
        let ticket = scope.ticket();
        assert!(ticket.is_current(Some(3)));
        assert!(!ticket.is_current(Some(4)));
        assert!(!ticket.is_current(None));
        scope.teardown();
        assert!(!scope.is_live());
        assert!(!ticket.is_current(Some(3)));
    }

    #[test]
    fn drop_cancels_outstanding_tickets() {
        let scope = InstanceScope::new(1);
        let ticket = scope.ticket();
        drop(scope);
        assert!(!ticket.is_current(Some(1)));
    }
}
