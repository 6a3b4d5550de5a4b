use crate::services::health::CallOutcome;
use crate::services::sbi_mapping::{
    failed_usage_monitoring_response, sm_policy_update_contexts, usage_monitoring_responses,
    SmPolicyUpdateCtx,
};
use crate::services::session_controller::SessionController;
use crate::types::error::{PolicyOperation, SessionError};
use crate::types::pcf::SmPolicyDecision;
use crate::types::session::{
    UpdateSessionRequest, UpdateSessionResponse, UsageMonitoringUpdateRequest,
    UsageMonitoringUpdateResponse,
};
use futures::future::join_all;
use tokio::time::Instant;

impl SessionController {
    /// Reports a batch of usage to the PCF, one update per SmPolicyId, all
    /// sharing one deadline. A partition that fails only fails its own keys.
    pub async fn update_session(&self, request: &UpdateSessionRequest) -> UpdateSessionResponse {
        if self.config.n7_disabled {
            return UpdateSessionResponse {
                usage_monitor_responses: request
                    .usage_monitors
                    .iter()
                    .map(local_update_response)
                    .collect(),
            };
        }

        let (contexts, unresolved) = sm_policy_update_contexts(&request.usage_monitors);
        tracing::debug!(
            "Updating {} SM policies for {} usage reports",
            contexts.len(),
            request.usage_monitors.len()
        );

        let deadline = Instant::now() + self.config.request_timeout;
        let results = join_all(
            contexts
                .iter()
                .map(|ctx| self.update_partition(ctx, deadline)),
        )
        .await;

        let mut usage_monitor_responses: Vec<UsageMonitoringUpdateResponse> =
            results.into_iter().flatten().collect();
        usage_monitor_responses.extend(unresolved);

        UpdateSessionResponse {
            usage_monitor_responses,
        }
    }

    async fn update_partition(
        &self,
        ctx: &SmPolicyUpdateCtx,
        deadline: Instant,
    ) -> Vec<UsageMonitoringUpdateResponse> {
        let result = self.update_sm_policy(ctx, deadline).await;
        self.health.report_update(CallOutcome::of(&result));

        match result {
            Ok(decision) => usage_monitoring_responses(ctx, &decision),
            Err(e) => {
                tracing::error!(
                    "Failed to update SM policy {} for session {}: {}",
                    ctx.sm_policy_id,
                    ctx.session_id,
                    e
                );
                ctx.requests
                    .iter()
                    .map(failed_usage_monitoring_response)
                    .collect()
            }
        }
    }

    async fn update_sm_policy(
        &self,
        ctx: &SmPolicyUpdateCtx,
        deadline: Instant,
    ) -> Result<SmPolicyDecision, SessionError> {
        let response = tokio::time::timeout_at(
            deadline,
            self.policy_client
                .update_sm_policy(&ctx.sm_policy_id, &ctx.body),
        )
        .await
        .map_err(|_| SessionError::Timeout(PolicyOperation::Update))??;

        match (response.status, response.body) {
            (200, Some(decision)) => Ok(decision),
            (200, None) => Err(SessionError::Transport(format!(
                "PCF returned no decision for SM policy {}",
                ctx.sm_policy_id
            ))),
            (status, _) => Err(SessionError::Upstream {
                operation: PolicyOperation::Update,
                policy_id: Some(ctx.sm_policy_id.clone()),
                status,
            }),
        }
    }
}

fn local_update_response(request: &UsageMonitoringUpdateRequest) -> UsageMonitoringUpdateResponse {
    UsageMonitoringUpdateResponse {
        session_id: request.session_id.clone(),
        sid: request.sid.clone(),
        tgpp_ctx: request.tgpp_ctx.clone(),
        success: true,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pcf::PcfResponse;
    use crate::services::policy_db::tests::FakePolicyDb;
    use crate::services::session_controller::tests::{controller, controller_with, MockPolicyClient};
    use crate::types::session::{TgppContext, UsageMonitorUpdate};
    use std::collections::HashMap;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn decision(json: serde_json::Value) -> SmPolicyDecision {
        serde_json::from_value(json).unwrap()
    }

    fn usage(session_id: &str, policy_id: Option<&str>, key: &str) -> UsageMonitoringUpdateRequest {
        UsageMonitoringUpdateRequest {
            update: UsageMonitorUpdate {
                monitoring_key: key.to_string(),
                bytes_tx: 100,
                bytes_rx: 200,
                ..Default::default()
            },
            session_id: session_id.to_string(),
            sid: "IMSI001010000000001".to_string(),
            tgpp_ctx: policy_id.map(|id| TgppContext {
                gx_dest_host: format!("http://pcf/npcf-smpolicycontrol/v1/sm-policies/{}", id),
            }),
            ..Default::default()
        }
    }

    fn granting(key: &str) -> SmPolicyDecision {
        decision(serde_json::json!({
            "umDecs": {
                key: {"umId": key, "volumeThreshold": 1000}
            },
            "pccRules": {
                "rule1": {"pccRuleId": "rule1", "refUmData": [key], "precedence": 1}
            }
        }))
    }

    #[tokio::test]
    async fn test_batch_is_split_per_policy() {
        let (controller, client) = controller(MockPolicyClient {
            updates: HashMap::from([
                ("1".to_string(), (Duration::ZERO, Ok(PcfResponse::new(200, Some(granting("mk1")))))),
                ("2".to_string(), (Duration::ZERO, Ok(PcfResponse::new(200, Some(granting("mk3")))))),
            ]),
            ..Default::default()
        });

        let response = controller
            .update_session(&UpdateSessionRequest {
                usage_monitors: vec![
                    usage("s1", Some("1"), "mk1"),
                    usage("s2", Some("2"), "mk3"),
                    usage("s1", Some("1"), "mk2"),
                ],
            })
            .await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        let bodies = client.update_bodies.lock().unwrap();
        let first = bodies.iter().find(|(id, _)| id == "1").unwrap();
        assert_eq!(first.1.accu_usage_reports.as_ref().unwrap().len(), 2);

        let responses = &response.usage_monitor_responses;
        assert_eq!(responses.len(), 3);
        assert!(responses.iter().all(|r| r.success));

        let mk1 = responses
            .iter()
            .find(|r| r.credit.as_ref().map(|c| c.monitoring_key.as_str()) == Some("mk1"))
            .unwrap();
        assert_eq!(mk1.credit.as_ref().unwrap().granted_units.total.volume, 1000);
        assert_eq!(mk1.dynamic_rules_to_install.len(), 1);

        let mk2 = responses.iter().find(|r| r.credit.is_none()).unwrap();
        assert_eq!(mk2.session_id, "s1");
        assert!(mk2.dynamic_rules_to_install.is_empty());
    }

    #[tokio::test]
    async fn test_slow_policy_does_not_hold_back_others() {
        let (controller, _) = controller_with(
            MockPolicyClient {
                updates: HashMap::from([
                    (
                        "fast".to_string(),
                        (Duration::ZERO, Ok(PcfResponse::new(200, Some(granting("mk1"))))),
                    ),
                    (
                        "slow".to_string(),
                        (
                            Duration::from_secs(2),
                            Ok(PcfResponse::new(200, Some(granting("mk2")))),
                        ),
                    ),
                ]),
                ..Default::default()
            },
            FakePolicyDb::default(),
            false,
            Duration::from_millis(100),
        );

        let started = Instant::now();
        let response = controller
            .update_session(&UpdateSessionRequest {
                usage_monitors: vec![
                    usage("s1", Some("fast"), "mk1"),
                    usage("s2", Some("slow"), "mk2"),
                ],
            })
            .await;
        assert!(started.elapsed() < Duration::from_secs(1));

        let responses = &response.usage_monitor_responses;
        let fast = responses.iter().find(|r| r.session_id == "s1").unwrap();
        let slow = responses.iter().find(|r| r.session_id == "s2").unwrap();
        assert!(fast.success);
        assert!(!slow.success);
        assert_eq!(slow.credit.as_ref().unwrap().monitoring_key, "mk2");
        assert!(!slow.credit.as_ref().unwrap().granted_units.total.is_valid);

        let snapshot = controller.health().snapshot();
        assert_eq!(snapshot.update_requests, 2);
        assert_eq!(snapshot.timeouts, 1);
    }

    #[tokio::test]
    async fn test_rejected_and_unresolvable_requests_fail_individually() {
        let (controller, client) = controller(MockPolicyClient::default());

        let response = controller
            .update_session(&UpdateSessionRequest {
                usage_monitors: vec![usage("s1", Some("gone"), "mk1"), usage("s2", None, "mk2")],
            })
            .await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let responses = &response.usage_monitor_responses;
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| !r.success));
        assert_eq!(controller.health().snapshot().update_failures, 1);
    }

    #[tokio::test]
    async fn test_update_with_n7_disabled_acknowledges_locally() {
        let (controller, client) = controller_with(
            MockPolicyClient::default(),
            FakePolicyDb::default(),
            true,
            Duration::from_secs(2),
        );

        let response = controller
            .update_session(&UpdateSessionRequest {
                usage_monitors: vec![usage("s1", Some("1"), "mk1"), usage("s2", None, "mk2")],
            })
            .await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        let responses = &response.usage_monitor_responses;
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.success && r.credit.is_none()));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let (controller, client) = controller(MockPolicyClient::default());
        let response = controller
            .update_session(&UpdateSessionRequest::default())
            .await;
        assert!(response.usage_monitor_responses.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}
