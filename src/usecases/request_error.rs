use thiserror::Error;

use crate::service::ServiceError;

/// Failure of a service request issued by a session workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("not connected to the chat service")]
    NotConnected,
    #[error("chat not found")]
    ChatNotFound,
    #[error("request timed out")]
    TimedOut,
    #[error("chat service temporarily unavailable")]
    TemporarilyUnavailable,
}

pub type LoadOlderError = RequestError;
pub type OpenChatError = RequestError;
pub type SendMessageError = RequestError;
pub type RefreshChatsError = RequestError;

impl From<ServiceError> for RequestError {
    fn from(error: ServiceError) -> Self {
        map_service_error(error)
    }
}

pub fn map_service_error(error: ServiceError) -> RequestError {
    match error {
        ServiceError::NotConnected => RequestError::NotConnected,
        ServiceError::ChatNotFound(_) => RequestError::ChatNotFound,
        ServiceError::Timeout { .. } => RequestError::TimedOut,
        ServiceError::Unavailable(_) => RequestError::TemporarilyUnavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chat::ChatId;

    #[test]
    fn maps_every_service_error() {
        assert_eq!(
            map_service_error(ServiceError::NotConnected),
            RequestError::NotConnected
        );
        assert_eq!(
            map_service_error(ServiceError::ChatNotFound(ChatId::from("9"))),
            RequestError::ChatNotFound
        );
        assert_eq!(
            map_service_error(ServiceError::Timeout {
                operation: "get_messages",
                timeout_ms: 10
            }),
            RequestError::TimedOut
        );
        assert_eq!(
            map_service_error(ServiceError::Unavailable("down".to_owned())),
            RequestError::TemporarilyUnavailable
        );
    }
}
