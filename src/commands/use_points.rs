use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{Balance, TransactionKind, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};

use super::{DomainLogic, Error};

/// Debit `amount` points from a user
///
/// Fails with [`Error::InsufficientBalance`] if the user holds fewer than `amount` points.
#[derive(Clone, Debug)]
pub struct UseRequest {
    pub user_id: UserId,
    pub amount: i64,
}

impl<B, H> Service<UseRequest> for DomainLogic<B, H>
where
    B: BalancePort + 'static,
    H: HistoryPort + 'static,
{
    type Response = Balance;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UseRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            logic
                .commit(req.user_id, req.amount, TransactionKind::Use)
                .await
        })
    }
}
