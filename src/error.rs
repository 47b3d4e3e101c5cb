use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("WIF for the source wallet is required")]
    SourceKeyRequired,

    #[error("WIF for the receiving wallet is required")]
    ReceiverKeyRequired,

    #[error("Invalid WIF: {0}")]
    InvalidWif(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Indexer error: {0}")]
    Indexer(String),

    #[error("No funds or tokens found on the source wallet")]
    NothingToSweep,

    #[error("Not enough funds on the source or receiving wallet to pay transaction fees")]
    InsufficientFeeFunds,

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Transaction error: {0}")]
    Transaction(String),
}
