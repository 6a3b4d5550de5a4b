use crate::services::health::{CallOutcome, HealthTracker};
use crate::services::pcf::PolicyClient;
use crate::services::policy_db::{omnipresent_rule_ids, PolicyDb};
use crate::services::sbi_mapping;
use crate::types::error::{PolicyOperation, SessionError};
use crate::types::pcf::SmPolicyDecision;
use crate::types::session::{
    CreateSessionRequest, CreateSessionResponse, SessionTerminateRequest,
    SessionTerminateResponse,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionControllerConfig {
    pub n7_disabled: bool,
    pub notify_api_root: String,
    pub request_timeout: Duration,
}

/// Drives SM policy sessions at the PCF on behalf of the gateway.
pub struct SessionController {
    pub(crate) config: SessionControllerConfig,
    pub(crate) policy_client: Arc<dyn PolicyClient>,
    policy_db: Arc<dyn PolicyDb>,
    pub(crate) health: Arc<HealthTracker>,
}

pub(crate) async fn with_timeout<T, F>(
    duration: Duration,
    operation: PolicyOperation,
    call: F,
) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    match tokio::time::timeout(duration, call).await {
        Ok(result) => result,
        Err(_) => Err(SessionError::Timeout(operation)),
    }
}

fn validate_ids(session_id: &str, subscriber_id: &str) -> Result<(), SessionError> {
    if subscriber_id.is_empty() {
        return Err(SessionError::Validation("missing subscriber id".to_string()));
    }
    if session_id.is_empty() {
        return Err(SessionError::Validation("missing session id".to_string()));
    }
    Ok(())
}

impl SessionController {
    pub fn new(
        config: SessionControllerConfig,
        policy_client: Arc<dyn PolicyClient>,
        policy_db: Arc<dyn PolicyDb>,
        health: Arc<HealthTracker>,
    ) -> Self {
        Self {
            config,
            policy_client,
            policy_db,
            health,
        }
    }

    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CreateSessionResponse, SessionError> {
        validate_ids(&request.session_id, request.subscriber_id())?;

        if self.config.n7_disabled {
            tracing::debug!(
                "N7 disabled, answering create for session {} locally",
                request.session_id
            );
            let mut response = CreateSessionResponse {
                session_id: request.session_id.clone(),
                ..Default::default()
            };
            let omnipresent = omnipresent_rule_ids(self.policy_db.as_ref()).await;
            sbi_mapping::inject_omnipresent_rules(&mut response, &omnipresent);
            return Ok(response);
        }

        let result = self.create_sm_policy(request).await;
        self.health.report_create(CallOutcome::of(&result));

        let (policy_url, decision) = result.map_err(|e| {
            tracing::error!(
                "Failed to create SM policy for session {}: {}",
                request.session_id,
                e
            );
            e
        })?;

        let mut response = sbi_mapping::create_session_response(request, &decision, &policy_url);
        let omnipresent = omnipresent_rule_ids(self.policy_db.as_ref()).await;
        sbi_mapping::inject_omnipresent_rules(&mut response, &omnipresent);

        tracing::info!(
            "Created SM policy {} for session {} ({} static, {} dynamic rules)",
            policy_url,
            request.session_id,
            response.static_rules.len(),
            response.dynamic_rules.len()
        );
        Ok(response)
    }

    async fn create_sm_policy(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<(String, SmPolicyDecision), SessionError> {
        let body = sbi_mapping::sm_policy_context_data(request, &self.config.notify_api_root);
        let response = with_timeout(
            self.config.request_timeout,
            PolicyOperation::Create,
            self.policy_client.create_sm_policy(&body),
        )
        .await?;

        if response.status != 200 && response.status != 201 {
            return Err(SessionError::Upstream {
                operation: PolicyOperation::Create,
                policy_id: None,
                status: response.status,
            });
        }

        let location = response
            .location
            .filter(|l| sbi_mapping::sm_policy_id_from_url(l).is_ok())
            .ok_or(SessionError::MissingLocation)?;

        Ok((location, response.body.unwrap_or_default()))
    }

    pub async fn terminate_session(
        &self,
        request: &SessionTerminateRequest,
    ) -> Result<SessionTerminateResponse, SessionError> {
        validate_ids(&request.session_id, request.subscriber_id())?;

        let response = SessionTerminateResponse {
            sid: request.subscriber_id().to_string(),
            session_id: request.session_id.clone(),
        };

        if self.config.n7_disabled {
            return Ok(response);
        }

        let sm_policy_id = sbi_mapping::get_sm_policy_id(request.tgpp_ctx.as_ref())?;
        let body = sbi_mapping::sm_policy_delete_data(request);

        let result = with_timeout(
            self.config.request_timeout,
            PolicyOperation::Delete,
            self.policy_client.delete_sm_policy(&sm_policy_id, &body),
        )
        .await
        .and_then(|pcf_response| match pcf_response.status {
            200 | 204 => Ok(()),
            status => Err(SessionError::Upstream {
                operation: PolicyOperation::Delete,
                policy_id: Some(sm_policy_id.clone()),
                status,
            }),
        });
        self.health.report_delete(CallOutcome::of(&result));

        match result {
            Ok(()) => {
                tracing::info!(
                    "Deleted SM policy {} for session {}",
                    sm_policy_id,
                    request.session_id
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to delete SM policy for session {}: {}",
                    request.session_id,
                    e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::health::HealthConfig;
    use crate::services::pcf::PcfResponse;
    use crate::services::policy_db::tests::FakePolicyDb;
    use crate::types::pcf::{SmPolicyContextData, SmPolicyDeleteData, SmPolicyUpdateContextData};
    use crate::types::session::{
        CommonSessionContext, GatewayRatType, Health, RedirectAddressType, SubscriberId,
        TgppContext, UsageMonitorUpdate,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub const POLICY_URL: &str = "http://pcf/npcf-smpolicycontrol/v1/sm-policies/12345";

    pub type Reply<T> = (Duration, Result<PcfResponse<T>, SessionError>);

    /// Scripted PCF. Update replies are keyed by SmPolicyId; unknown ids get 404.
    pub struct MockPolicyClient {
        pub create: Reply<SmPolicyDecision>,
        pub updates: HashMap<String, Reply<SmPolicyDecision>>,
        pub delete: Reply<()>,
        pub calls: AtomicUsize,
        pub update_bodies: Mutex<Vec<(String, SmPolicyUpdateContextData)>>,
        pub delete_bodies: Mutex<Vec<(String, SmPolicyDeleteData)>>,
    }

    impl Default for MockPolicyClient {
        fn default() -> Self {
            Self {
                create: (
                    Duration::ZERO,
                    Ok(PcfResponse::new(201, Some(SmPolicyDecision::default()))
                        .with_location(POLICY_URL)),
                ),
                updates: HashMap::new(),
                delete: (Duration::ZERO, Ok(PcfResponse::new(204, None))),
                calls: AtomicUsize::new(0),
                update_bodies: Mutex::new(Vec::new()),
                delete_bodies: Mutex::new(Vec::new()),
            }
        }
    }

    impl MockPolicyClient {
        async fn reply<T: Clone>(&self, reply: &Reply<T>) -> Result<PcfResponse<T>, SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !reply.0.is_zero() {
                tokio::time::sleep(reply.0).await;
            }
            reply.1.clone()
        }
    }

    #[async_trait]
    impl PolicyClient for MockPolicyClient {
        async fn create_sm_policy(
            &self,
            _context: &SmPolicyContextData,
        ) -> Result<PcfResponse<SmPolicyDecision>, SessionError> {
            self.reply(&self.create).await
        }

        async fn update_sm_policy(
            &self,
            sm_policy_id: &str,
            update: &SmPolicyUpdateContextData,
        ) -> Result<PcfResponse<SmPolicyDecision>, SessionError> {
            self.update_bodies
                .lock()
                .unwrap()
                .push((sm_policy_id.to_string(), update.clone()));
            match self.updates.get(sm_policy_id) {
                Some(reply) => self.reply(reply).await,
                None => self.reply(&(Duration::ZERO, Ok(PcfResponse::new(404, None)))).await,
            }
        }

        async fn delete_sm_policy(
            &self,
            sm_policy_id: &str,
            delete: &SmPolicyDeleteData,
        ) -> Result<PcfResponse<()>, SessionError> {
            self.delete_bodies
                .lock()
                .unwrap()
                .push((sm_policy_id.to_string(), delete.clone()));
            self.reply(&self.delete).await
        }
    }

    pub fn controller_with(
        client: MockPolicyClient,
        policy_db: FakePolicyDb,
        n7_disabled: bool,
        request_timeout: Duration,
    ) -> (SessionController, Arc<MockPolicyClient>) {
        let client = Arc::new(client);
        let health = Arc::new(HealthTracker::new(HealthConfig {
            failure_ratio_threshold: 0.5,
            minimum_request_threshold: 1,
            n7_disabled,
        }));
        let controller = SessionController::new(
            SessionControllerConfig {
                n7_disabled,
                notify_api_root: "http://proxy/npcf-smpolicycontrol/v1/notify".to_string(),
                request_timeout,
            },
            client.clone(),
            Arc::new(policy_db),
            health,
        );
        (controller, client)
    }

    pub fn controller(client: MockPolicyClient) -> (SessionController, Arc<MockPolicyClient>) {
        controller_with(client, FakePolicyDb::default(), false, Duration::from_secs(2))
    }

    fn common_context(imsi: &str) -> Option<CommonSessionContext> {
        Some(CommonSessionContext {
            sid: Some(SubscriberId { id: imsi.to_string() }),
            ..Default::default()
        })
    }

    fn create_request() -> CreateSessionRequest {
        CreateSessionRequest {
            session_id: "IMSI001010000000001-1234".to_string(),
            common_context: common_context("IMSI001010000000001"),
            ..Default::default()
        }
    }

    fn terminate_request(tgpp_ctx: Option<TgppContext>) -> SessionTerminateRequest {
        SessionTerminateRequest {
            session_id: "IMSI001010000000001-1234".to_string(),
            common_context: common_context("IMSI001010000000001"),
            tgpp_ctx,
            monitor_usages: vec![UsageMonitorUpdate {
                monitoring_key: "mk1".to_string(),
                bytes_tx: 10,
                bytes_rx: 20,
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_create_rejects_missing_ids_without_calling_pcf() {
        let (controller, client) = controller(MockPolicyClient::default());

        let mut request = create_request();
        request.common_context = None;
        let err = controller.create_session(&request).await.unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));

        let mut request = create_request();
        request.session_id.clear();
        assert!(controller.create_session(&request).await.is_err());

        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_success_sets_policy_url() {
        let (controller, _) = controller(MockPolicyClient::default());
        let response = controller.create_session(&create_request()).await.unwrap();
        assert_eq!(response.tgpp_ctx.unwrap().gx_dest_host, POLICY_URL);
        assert_eq!(controller.health().snapshot().create_requests, 1);
    }

    #[tokio::test]
    async fn test_create_nr_session_end_to_end() {
        let decision: SmPolicyDecision = serde_json::from_value(serde_json::json!({
            "pccRules": {
                "rule1": {"pccRuleId": "rule1", "refTcData": ["tc1"], "precedence": 10},
                "static_rule1": {"pccRuleId": "static_rule1", "refCondData": "cond1"}
            },
            "traffContDecs": {
                "tc1": {
                    "tcId": "tc1",
                    "redirectInfo": {
                        "redirectEnabled": true,
                        "redirectAddressType": "URL",
                        "redirectServerAddress": "http://portal.example.com"
                    }
                }
            },
            "conds": {
                "cond1": {
                    "condId": "cond1",
                    "activationTime": "2021-10-22T12:42:31Z",
                    "deactivationTime": "2021-10-22T14:42:31Z"
                }
            }
        }))
        .unwrap();
        let (controller, _) = controller(MockPolicyClient {
            create: (
                Duration::ZERO,
                Ok(PcfResponse::new(201, Some(decision)).with_location(POLICY_URL)),
            ),
            ..Default::default()
        });

        let request = CreateSessionRequest {
            session_id: "123456789012345-1234".to_string(),
            common_context: Some(CommonSessionContext {
                sid: Some(SubscriberId {
                    id: "123456789012345".to_string(),
                }),
                rat_type: GatewayRatType::TgppNr,
                ..Default::default()
            }),
            ..Default::default()
        };
        let response = controller.create_session(&request).await.unwrap();

        assert_eq!(response.dynamic_rules.len(), 1);
        let redirect = response.dynamic_rules[0].policy_rule.redirect.as_ref().unwrap();
        assert_eq!(redirect.address_type, RedirectAddressType::Url);
        assert_eq!(redirect.server_address, "http://portal.example.com");

        assert_eq!(response.static_rules.len(), 1);
        let static_rule = &response.static_rules[0];
        assert_eq!(static_rule.rule_id, "static_rule1");
        assert_eq!(static_rule.activation_time.unwrap().seconds, 1634906551);
        assert_eq!(static_rule.deactivation_time.unwrap().seconds, 1634913751);
    }

    #[tokio::test]
    async fn test_create_without_location_fails() {
        let (controller, _) = controller(MockPolicyClient {
            create: (Duration::ZERO, Ok(PcfResponse::new(201, Some(SmPolicyDecision::default())))),
            ..Default::default()
        });
        let err = controller.create_session(&create_request()).await.unwrap_err();
        assert_eq!(err, SessionError::MissingLocation);
        assert_eq!(controller.health().snapshot().create_failures, 1);
    }

    #[tokio::test]
    async fn test_create_rejected_status() {
        let (controller, _) = controller(MockPolicyClient {
            create: (Duration::ZERO, Ok(PcfResponse::new(403, None))),
            ..Default::default()
        });
        let err = controller.create_session(&create_request()).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Upstream {
                operation: PolicyOperation::Create,
                policy_id: None,
                status: 403
            }
        );
    }

    #[tokio::test]
    async fn test_create_timeout_is_reported() {
        let (controller, _) = controller_with(
            MockPolicyClient {
                create: (
                    Duration::from_millis(500),
                    Ok(PcfResponse::new(201, None).with_location(POLICY_URL)),
                ),
                ..Default::default()
            },
            FakePolicyDb::default(),
            false,
            Duration::from_millis(50),
        );
        let err = controller.create_session(&create_request()).await.unwrap_err();
        assert!(err.is_timeout());

        let snapshot = controller.health().snapshot();
        assert_eq!(snapshot.timeouts, 1);
        assert_eq!(controller.health().get_health_status().health, Health::Unhealthy);
    }

    #[tokio::test]
    async fn test_create_with_n7_disabled_skips_pcf() {
        let (controller, client) = controller_with(
            MockPolicyClient::default(),
            FakePolicyDb {
                rule_ids: vec!["omni1".to_string()],
                ..Default::default()
            },
            true,
            Duration::from_secs(2),
        );
        let response = controller.create_session(&create_request()).await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(response.static_rules.len(), 1);
        assert_eq!(response.static_rules[0].rule_id, "omni1");
        assert!(response.dynamic_rules.is_empty());
    }

    #[tokio::test]
    async fn test_terminate_without_policy_reference_fails() {
        let (controller, client) = controller(MockPolicyClient::default());
        let err = controller
            .terminate_session(&terminate_request(None))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_terminate_deletes_policy_with_usage() {
        let (controller, client) = controller(MockPolicyClient::default());
        let response = controller
            .terminate_session(&terminate_request(Some(TgppContext {
                gx_dest_host: POLICY_URL.to_string(),
            })))
            .await
            .unwrap();
        assert_eq!(response.sid, "IMSI001010000000001");

        let bodies = client.delete_bodies.lock().unwrap();
        assert_eq!(bodies[0].0, "12345");
        let reports = bodies[0].1.accu_usage_reports.as_ref().unwrap();
        assert_eq!(reports[0].vol_usage, Some(30));
    }

    #[tokio::test]
    async fn test_terminate_unknown_policy_names_id_and_status() {
        let (controller, _) = controller(MockPolicyClient {
            delete: (Duration::ZERO, Ok(PcfResponse::new(404, None))),
            ..Default::default()
        });
        let err = controller
            .terminate_session(&terminate_request(Some(TgppContext {
                gx_dest_host: POLICY_URL.to_string(),
            })))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::Upstream {
                operation: PolicyOperation::Delete,
                policy_id: Some("12345".to_string()),
                status: 404
            }
        );
        assert_eq!(controller.health().snapshot().delete_failures, 1);
    }

    #[tokio::test]
    async fn test_terminate_with_n7_disabled_is_local() {
        let (controller, client) = controller_with(
            MockPolicyClient::default(),
            FakePolicyDb::default(),
            true,
            Duration::from_secs(2),
        );
        controller
            .terminate_session(&terminate_request(None))
            .await
            .unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }
}
