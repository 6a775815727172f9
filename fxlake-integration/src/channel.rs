//! Single-producer fan-in channel abstraction used by every worker that
//! emits events (broker sessions, the router, the batcher).
//!
//! A thin trait over `tokio::sync::mpsc::UnboundedSender` so call sites
//! don't need to know the concrete channel type.

use std::marker::PhantomData;

pub trait Tx
where
    Self: Clone + Send,
{
    type Item;
    type Error;
    fn send(&self, item: Self::Item) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone)]
pub struct UnboundedTx<T, Error> {
    tx: tokio::sync::mpsc::UnboundedSender<T>,
    phantom: PhantomData<Error>,
}

impl<T, Error> UnboundedTx<T, Error> {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<T>) -> Self {
        Self {
            tx,
            phantom: PhantomData,
        }
    }
}

impl<T, Error> Tx for UnboundedTx<T, Error>
where
    T: Clone + Send,
    Error: From<tokio::sync::mpsc::error::SendError<T>> + Clone + Send,
{
    type Item = T;
    type Error = Error;

    fn send(&self, item: Self::Item) -> Result<(), Self::Error> {
        self.tx.send(item).map_err(Error::from)
    }
}

/// Construct a connected `(UnboundedTx, UnboundedReceiver)` pair.
pub fn unbounded<T, Error>() -> (
    UnboundedTx<T, Error>,
    tokio::sync::mpsc::UnboundedReceiver<T>,
) {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    (UnboundedTx::new(tx), rx)
}
