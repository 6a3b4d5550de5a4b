use crate::services::gateway_relay::SessionRelay;
use crate::services::sbi_mapping::{
    decode_notify_session_id, partial_success_report, policy_reauth_request,
    subscriber_id_from_session_id,
};
use crate::types::error::SessionError;
use crate::types::pcf::{
    PartialSuccessReport, SmPolicyDecision, SmPolicyNotification, TerminationNotification,
};
use crate::types::session::{AbortCause, AbortSessionCode, AbortSessionRequest};
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum NotificationError {
    InvalidSessionId(SessionError),
    Relay(anyhow::Error),
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::InvalidSessionId(e) => write!(f, "{}", e),
            NotificationError::Relay(e) => write!(f, "Gateway relay failed: {:#}", e),
        }
    }
}

impl std::error::Error for NotificationError {}

/// Turns PCF-initiated notifications into gateway re-auth and abort calls.
pub struct NotificationRelay {
    relay: Arc<dyn SessionRelay>,
}

impl NotificationRelay {
    pub fn new(relay: Arc<dyn SessionRelay>) -> Self {
        Self { relay }
    }

    /// Pushes the notified decision to the gateway. A report comes back only
    /// when the gateway failed to install some of the rules.
    pub async fn policy_update(
        &self,
        encoded_session_id: &str,
        notification: &SmPolicyNotification,
    ) -> Result<Option<PartialSuccessReport>, NotificationError> {
        let session_id = decode_notify_session_id(encoded_session_id)
            .map_err(NotificationError::InvalidSessionId)?;
        let imsi = subscriber_id_from_session_id(&session_id);

        let default_decision = SmPolicyDecision::default();
        let decision = notification
            .sm_policy_decision
            .as_ref()
            .unwrap_or(&default_decision);

        let request = policy_reauth_request(&session_id, imsi, decision);
        tracing::info!(
            "Relaying SM policy update for session {}: {} static, {} dynamic, {} removed rules",
            session_id,
            request.rules_to_install.len(),
            request.dynamic_rules_to_install.len(),
            request.rules_to_remove.len()
        );

        let answer = self
            .relay
            .policy_reauth(&request)
            .await
            .map_err(NotificationError::Relay)?;

        if answer.is_success() {
            return Ok(None);
        }

        tracing::warn!(
            "Gateway failed to install {} rules for session {}",
            answer.failed_rules.len(),
            session_id
        );
        Ok(Some(partial_success_report(&answer)))
    }

    pub async fn policy_terminate(
        &self,
        encoded_session_id: &str,
        notification: &TerminationNotification,
    ) -> Result<AbortSessionCode, NotificationError> {
        let session_id = decode_notify_session_id(encoded_session_id)
            .map_err(NotificationError::InvalidSessionId)?;

        tracing::info!(
            "PCF terminated SM policy {} for session {} ({:?})",
            notification.resource_uri,
            session_id,
            notification.cause
        );

        let request = AbortSessionRequest {
            user_name: subscriber_id_from_session_id(&session_id).to_string(),
            session_id,
            cause: AbortCause::NetworkInitiated,
        };

        let result = self
            .relay
            .abort_session(&request)
            .await
            .map_err(NotificationError::Relay)?;

        if result.code != AbortSessionCode::SessionRemoved {
            tracing::warn!(
                "Gateway could not abort session {}: {:?} {}",
                request.session_id,
                result.code,
                result.error_message
            );
        }
        Ok(result.code)
    }
}
