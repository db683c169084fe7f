mod message;
mod transport;

pub use message::PushMessage;
pub use transport::{
    push_url, CloseInfo, PushConnector, PushFrame, PushStream, TungsteniteConnector,
};
