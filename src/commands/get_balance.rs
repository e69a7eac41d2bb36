use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tower::Service;

use crate::{
    domain::{Balance, UserId},
    ports::{balance::BalancePort, history::HistoryPort},
};

use super::{DomainLogic, Error};

#[derive(Clone, Debug)]
pub struct GetBalanceRequest {
    pub user_id: UserId,
}

impl<B, H> Service<GetBalanceRequest> for DomainLogic<B, H>
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

    fn call(&mut self, req: GetBalanceRequest) -> Self::Future {
        let logic = self.clone();
        Box::pin(async move { logic.read_balance(req.user_id).await })
    }
}
