//! FCM Push Library
//!
//! This library provides a Firebase Cloud Messaging (FCM) HTTP v1 client
//! for sending push notifications with Google service-account credentials.
//!
//! It handles:
//! - Service account credential loading and validation
//! - OAuth2 JWT-bearer token generation (RS256)
//! - Token caching with refresh ahead of expiry
//! - Single device, multicast and topic message delivery

pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod jwt;
pub mod models;
pub mod token;

pub use client::FCMClient;
pub use config::FcmConfig;
pub use credentials::ServiceAccountKey;
pub use errors::{FCMError, Result};
pub use models::{
    DataPayload, DispatchOutcome, DispatchTarget, MulticastSendResult, Notification, SendOutcome,
    SendResponse,
};
pub use token::{Clock, SystemClock};
