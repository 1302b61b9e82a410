use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("endpoint {0} already exists, is an agent already running?")]
    EndpointInUse(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Session(#[from] hwkey_session::SessionError),
}
