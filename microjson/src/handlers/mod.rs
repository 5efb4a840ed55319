pub mod notes;
pub mod response;
pub mod transactional;
pub mod tx;
pub mod up;
pub mod wrapper;

pub use response::send_object;
pub use transactional::{TxResult, TxWrapper};
pub use tx::Tx;
pub use wrapper::wrap;
