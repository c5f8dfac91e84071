// SPDX-FileCopyrightText: 2026 Linkio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared between the coordinator, the gateway, and the
//! external-collaborator traits.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable string key naming one bot identity (account session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(pub String);

impl Identity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Authentication method requested by the operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuthMethod {
    /// Device-linking via a scannable code image.
    Scan,
    /// Device-linking via a short code entered on the phone.
    Pairing,
}

/// Phase of one identity's current attempt, as tracked in its session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Attempt created, no code produced yet.
    Connecting,
    /// A scan or pairing code has been produced and is awaiting the operator.
    CodePending,
    /// The protocol reports the link established.
    Open,
    /// The connection closed retryably; the record is retained until the
    /// operator deliberately retries.
    Closed,
}

/// Why a close was surfaced to the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CloseReason {
    /// Terminal: credentials are purged, the record is removed.
    LoggedOut,
    /// Retryable: the operator must re-issue a request.
    Reconnecting,
}

/// Protocol-level cause attached to a close event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseCause {
    /// The remote end invalidated the session permanently.
    LoggedOut,
    /// The socket was deliberately replaced by a superseding attempt.
    Restarting,
    /// Transport dropped; the session may be resumed by a fresh attempt.
    Lost,
    /// Anything else the protocol layer reports.
    Other(String),
}

impl CloseCause {
    /// Terminal closes purge credentials; everything else is retryable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CloseCause::LoggedOut)
    }
}

/// Opaque credential material owned by the credential store.
///
/// The coordinator never inspects the contents; it only threads the blob
/// from the store into the socket factory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials(pub serde_json::Value);

/// A rendered, displayable form of a scan-code payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeImage {
    /// MIME type of the encoded image.
    pub mime: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// Link state reported by a connection-state event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Close,
}

/// One connection-state event from the protocol socket.
///
/// Mirrors the wire payload: the state transition (if any), the new-login
/// flag distinguishing a fresh credential handshake from a silent resume,
/// at most one code value, and the close cause when `state` is `Close`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub state: Option<LinkState>,
    pub new_login: bool,
    pub scan_code: Option<String>,
    pub pairing_code: Option<String>,
    pub close_cause: Option<CloseCause>,
}

/// An inbound chat message from the message stream.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Chat the message arrived in (reply target).
    pub chat: String,
    /// True when the bot itself authored the message.
    pub from_me: bool,
    /// Text content, if the message had any.
    pub text: Option<String>,
}

/// Event emitted by a live protocol socket.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// Connection-state change (code produced, link opened, link closed).
    Update(ConnectionUpdate),
    /// Credential material changed and should be persisted incrementally.
    CredentialsUpdated,
    /// A message arrived on the message stream.
    Message(ChatMessage),
}

/// Subscriber-facing status phase, the coarse vocabulary pushed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPhase {
    Connecting,
    Open,
    Close,
}

/// Push notification delivered to exactly one subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Connection status change, with an optional human hint and, on
    /// `close`, the reason classification.
    Status {
        phase: StatusPhase,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<CloseReason>,
    },
    /// A rendered scan-code image for display.
    ScanCode { image: CodeImage },
    /// A short code the operator types on the phone.
    PairingCode { code: String },
    /// A non-fatal failure the operator should see.
    Error { message: String },
}

impl Notification {
    /// A bare status with no hint or reason.
    pub fn status(phase: StatusPhase) -> Self {
        Notification::Status {
            phase,
            message: None,
            reason: None,
        }
    }

    /// A status with a human hint.
    pub fn status_with_message(phase: StatusPhase, message: impl Into<String>) -> Self {
        Notification::Status {
            phase,
            message: Some(message.into()),
            reason: None,
        }
    }

    /// A close status with its reason classification.
    pub fn close(reason: CloseReason) -> Self {
        Notification::Status {
            phase: StatusPhase::Close,
            message: None,
            reason: Some(reason),
        }
    }

    /// An error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_method_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&AuthMethod::Scan).unwrap(), "\"scan\"");
        assert_eq!(
            serde_json::from_str::<AuthMethod>("\"pairing\"").unwrap(),
            AuthMethod::Pairing
        );
    }

    #[test]
    fn close_reason_uses_camel_case() {
        assert_eq!(
            serde_json::to_string(&CloseReason::LoggedOut).unwrap(),
            "\"loggedOut\""
        );
        assert_eq!(
            serde_json::to_string(&CloseReason::Reconnecting).unwrap(),
            "\"reconnecting\""
        );
    }

    #[test]
    fn notification_frames_are_tagged() {
        let frame = serde_json::to_value(Notification::close(CloseReason::Reconnecting)).unwrap();
        assert_eq!(frame["type"], "status");
        assert_eq!(frame["phase"], "close");
        assert_eq!(frame["reason"], "reconnecting");

        let frame = serde_json::to_value(Notification::PairingCode {
            code: "ABCD-1234".into(),
        })
        .unwrap();
        assert_eq!(frame["type"], "pairing_code");
        assert_eq!(frame["code"], "ABCD-1234");
    }

    #[test]
    fn status_omits_absent_fields() {
        let json = serde_json::to_string(&Notification::status(StatusPhase::Connecting)).unwrap();
        assert!(!json.contains("message"));
        assert!(!json.contains("reason"));
    }

    #[test]
    fn only_logged_out_is_terminal() {
        assert!(CloseCause::LoggedOut.is_terminal());
        assert!(!CloseCause::Restarting.is_terminal());
        assert!(!CloseCause::Lost.is_terminal());
        assert!(!CloseCause::Other("417".into()).is_terminal());
    }
}
