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

/// Credit `amount` points to a user
#[derive(Clone, Debug)]
pub struct ChargeRequest {
    pub user_id: UserId,
    pub amount: i64,
}

impl<B, H> Service<ChargeRequest> for DomainLogic<B, H>
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

    fn call(&mut self, req: ChargeRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move {
            logic
                .commit(req.user_id, req.amount, TransactionKind::Charge)
                .await
        })
    }
}
