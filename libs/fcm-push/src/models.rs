use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::FCMError;

/// Conventional prefix accepted on topic names
pub const TOPIC_PREFIX: &str = "/topics/";

/// Custom key/value pairs delivered alongside the notification
pub type DataPayload = HashMap<String, String>;

/// Notification content shown by the device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

/// Where a notification is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchTarget {
    Token(String),
    Tokens(Vec<String>),
    Topic(String),
}

/// Strip the `/topics/` prefix from a topic name if present
pub fn normalize_topic(topic: &str) -> &str {
    topic.strip_prefix(TOPIC_PREFIX).unwrap_or(topic)
}

/// FCM Message Request
#[derive(Debug, Serialize)]
pub struct FcmMessage<'a> {
    pub message: FcmMessageContent<'a>,
}

/// FCM Message Content
///
/// Exactly one of `token` and `topic` is set.
#[derive(Debug, Serialize)]
pub struct FcmMessageContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<&'a str>,
    pub notification: &'a Notification,
    pub data: &'a DataPayload,
}

impl<'a> FcmMessage<'a> {
    pub fn to_token(token: &'a str, notification: &'a Notification, data: &'a DataPayload) -> Self {
        Self {
            message: FcmMessageContent {
                token: Some(token),
                topic: None,
                notification,
                data,
            },
        }
    }

    pub fn to_topic(topic: &'a str, notification: &'a Notification, data: &'a DataPayload) -> Self {
        Self {
            message: FcmMessageContent {
                token: None,
                topic: Some(normalize_topic(topic)),
                notification,
                data,
            },
        }
    }
}

/// FCM API Response
///
/// `name` is the message resource, e.g. `projects/p/messages/1`. Any other
/// fields returned by the API are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Settlement of one dispatch within a multicast
#[derive(Debug)]
pub enum SendOutcome {
    Fulfilled(SendResponse),
    Rejected(FCMError),
}

impl SendOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, SendOutcome::Fulfilled(_))
    }

    pub fn response(&self) -> Option<&SendResponse> {
        match self {
            SendOutcome::Fulfilled(response) => Some(response),
            SendOutcome::Rejected(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FCMError> {
        match self {
            SendOutcome::Fulfilled(_) => None,
            SendOutcome::Rejected(err) => Some(err),
        }
    }
}

impl From<crate::errors::Result<SendResponse>> for SendOutcome {
    fn from(result: crate::errors::Result<SendResponse>) -> Self {
        match result {
            Ok(response) => SendOutcome::Fulfilled(response),
            Err(err) => SendOutcome::Rejected(err),
        }
    }
}

/// Multicast send result
///
/// `results` holds one outcome per input token, in input order.
#[derive(Debug, Default)]
pub struct MulticastSendResult {
    pub success_count: usize,
    pub failure_count: usize,
    pub results: Vec<SendOutcome>,
}

impl MulticastSendResult {
    pub fn push(&mut self, outcome: SendOutcome) {
        if outcome.is_fulfilled() {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        self.results.push(outcome);
    }
}

/// Result of a dispatch addressed through [`DispatchTarget`]
#[derive(Debug)]
pub enum DispatchOutcome {
    Single(SendResponse),
    Multicast(MulticastSendResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_topic() {
        assert_eq!(normalize_topic("/topics/news"), "news");
        assert_eq!(normalize_topic("news"), "news");
        assert_eq!(normalize_topic("/topics/"), "");
    }

    #[test]
    fn test_topic_message_identical_with_or_without_prefix() {
        let notification = Notification::new("Hi").with_body("there");
        let data = DataPayload::new();

        let prefixed = serde_json::to_value(FcmMessage::to_topic("/topics/news", &notification, &data)).unwrap();
        let bare = serde_json::to_value(FcmMessage::to_topic("news", &notification, &data)).unwrap();

        assert_eq!(prefixed, bare);
        assert_eq!(bare["message"]["topic"], "news");
        assert!(bare["message"].get("token").is_none());
    }

    #[test]
    fn test_token_message_shape() {
        let notification = Notification::new("Hi").with_body("there");
        let mut data = DataPayload::new();
        data.insert("order_id".to_string(), "42".to_string());

        let body = serde_json::to_value(FcmMessage::to_token("devtok", &notification, &data)).unwrap();

        assert_eq!(
            body,
            json!({
                "message": {
                    "token": "devtok",
                    "notification": {"title": "Hi", "body": "there"},
                    "data": {"order_id": "42"}
                }
            })
        );
    }

    #[test]
    fn test_send_response_keeps_extra_fields() {
        let response: SendResponse = serde_json::from_value(json!({
            "name": "projects/p/messages/1",
            "trace": "x"
        }))
        .unwrap();

        assert_eq!(response.name, "projects/p/messages/1");
        assert_eq!(response.extra["trace"], "x");
    }

    #[test]
    fn test_multicast_result_counts() {
        let mut result = MulticastSendResult::default();
        result.push(SendOutcome::Fulfilled(SendResponse::default()));
        result.push(SendOutcome::Rejected(FCMError::InvalidArgument("empty".to_string())));
        result.push(SendOutcome::Fulfilled(SendResponse::default()));

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert!(result.results[1].error().is_some());
        assert!(result.results[2].response().is_some());
    }
}
