use thiserror::Error;

use crate::bridge::callback::CallbackToken;
use crate::composer::SurfaceId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("invalid command id {0}")]
    UnknownCommand(u32),
    #[error("invalid command name `{0}`")]
    UnknownCommandName(String),
    #[error("malformed arguments for `{command}`: {reason}")]
    MalformedArguments {
        command: &'static str,
        reason: String,
    },
    #[error("index {index} out of range for surface {surface} holding {len} children")]
    IndexOutOfRange {
        surface: SurfaceId,
        index: usize,
        len: usize,
    },
    #[error("surface {0} has no registered children")]
    UnknownSurface(SurfaceId),
    #[error("callback token {0} is already pending")]
    TokenInUse(CallbackToken),
    #[error("callback token {0} has no pending call")]
    UnknownToken(CallbackToken),
    #[error("outbound event channel closed while resolving token {0}")]
    EventChannelClosed(CallbackToken),
}

impl BridgeError {
    pub fn malformed(command: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedArguments {
            command,
            reason: reason.into(),
        }
    }

    /// Protocol failures reject the host invocation outright; everything else
    /// is a programmer error on one side of the bridge.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownCommand(_)
                | BridgeError::UnknownCommandName(_)
                | BridgeError::MalformedArguments { .. }
                | BridgeError::TokenInUse(_)
        )
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
