//! Gateway-side session control messages exchanged with the session manager.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberId {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayRatType {
    #[default]
    TgppLte,
    TgppWlan,
    TgppNr,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayPduSessionType {
    #[default]
    Ipv4,
    Ipv6,
    Ipv4ipv6,
    Unstructured,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonSessionContext {
    pub sid: Option<SubscriberId>,
    pub rat_type: GatewayRatType,
    pub ue_ipv4: String,
    pub ue_ipv6: String,
    pub apn: String,
    pub msisdn: String,
}

impl CommonSessionContext {
    pub fn subscriber_id(&self) -> &str {
        self.sid.as_ref().map(|sid| sid.id.as_str()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct M5gSessionContext {
    pub pdu_session_id: u8,
    pub gpsi: String,
    pub pdu_session_type: GatewayPduSessionType,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timezone {
    pub offset_minutes: i32,
}

/// Seconds/nanos since the Unix epoch, as carried on the gateway side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TgppContext {
    #[serde(default)]
    pub gx_dest_host: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSessionRequest {
    pub session_id: String,
    pub common_context: Option<CommonSessionContext>,
    pub rat_specific_context: Option<M5gSessionContext>,
    pub access_timezone: Option<Timezone>,
}

impl CreateSessionRequest {
    pub fn subscriber_id(&self) -> &str {
        self.common_context
            .as_ref()
            .map(|ctx| ctx.subscriber_id())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub static_rules: Vec<StaticRuleInstall>,
    pub dynamic_rules: Vec<DynamicRuleInstall>,
    pub tgpp_ctx: Option<TgppContext>,
    pub event_triggers: Vec<EventTrigger>,
    pub revalidation_time: Option<Timestamp>,
    pub usage_monitors: Vec<UsageMonitoringUpdateResponse>,
    pub online: bool,
    pub offline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticRuleInstall {
    pub rule_id: String,
    pub activation_time: Option<Timestamp>,
    pub deactivation_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicRuleInstall {
    pub policy_rule: PolicyRule,
    pub activation_time: Option<Timestamp>,
    pub deactivation_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingType {
    #[default]
    OnlyOcs,
    OnlyPcrf,
    OcsAndPcrf,
    NoTracking,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub id: String,
    pub priority: u32,
    pub rating_group: u32,
    pub service_identifier: Option<u32>,
    pub monitoring_key: String,
    pub redirect: Option<RedirectInformation>,
    pub qos: Option<FlowQos>,
    pub flow_list: Vec<FlowDescription>,
    pub tracking_type: TrackingType,
    pub online: bool,
    pub offline: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectSupport {
    #[default]
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectAddressType {
    #[default]
    #[serde(rename = "IPv4")]
    Ipv4,
    #[serde(rename = "IPv6")]
    Ipv6,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "SIP_URI")]
    SipUri,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInformation {
    pub support: RedirectSupport,
    pub address_type: RedirectAddressType,
    pub server_address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowQos {
    pub max_req_bw_ul: u32,
    pub max_req_bw_dl: u32,
    pub gbr_ul: u32,
    pub gbr_dl: u32,
    pub qci: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowAction {
    #[default]
    Permit,
    Deny,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowDirection {
    #[default]
    Uplink,
    Downlink,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMatch {
    pub direction: FlowDirection,
    pub ip_proto: Option<u8>,
    pub ip_src: Option<String>,
    pub ip_dst: Option<String>,
    pub src_port: Option<String>,
    pub dst_port: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDescription {
    pub flow_match: FlowMatch,
    pub action: FlowAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventTrigger {
    RevalidationTimeout,
    UsageReport,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringLevel {
    #[default]
    SessionLevel,
    PccRuleLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoringAction {
    #[default]
    Continue,
    Disable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditUnit {
    pub is_valid: bool,
    pub volume: u64,
}

impl CreditUnit {
    pub fn from_volume(volume: Option<u64>) -> Self {
        match volume {
            Some(volume) => Self { is_valid: true, volume },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantedUnits {
    pub total: CreditUnit,
    pub tx: CreditUnit,
    pub rx: CreditUnit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMonitoringCredit {
    pub monitoring_key: String,
    pub action: MonitoringAction,
    pub level: MonitoringLevel,
    pub granted_units: GrantedUnits,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMonitorUpdate {
    pub monitoring_key: String,
    pub level: MonitoringLevel,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMonitoringUpdateRequest {
    pub update: UsageMonitorUpdate,
    pub session_id: String,
    pub sid: String,
    pub tgpp_ctx: Option<TgppContext>,
    pub event_trigger: Option<EventTrigger>,
    pub rat_type: GatewayRatType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMonitoringUpdateResponse {
    pub credit: Option<UsageMonitoringCredit>,
    pub session_id: String,
    pub sid: String,
    pub tgpp_ctx: Option<TgppContext>,
    pub success: bool,
    pub event_triggers: Vec<EventTrigger>,
    pub revalidation_time: Option<Timestamp>,
    pub static_rules_to_install: Vec<StaticRuleInstall>,
    pub dynamic_rules_to_install: Vec<DynamicRuleInstall>,
    pub rules_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSessionRequest {
    pub usage_monitors: Vec<UsageMonitoringUpdateRequest>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionResponse {
    pub usage_monitor_responses: Vec<UsageMonitoringUpdateResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionTerminateRequest {
    pub session_id: String,
    pub common_context: Option<CommonSessionContext>,
    pub tgpp_ctx: Option<TgppContext>,
    pub monitor_usages: Vec<UsageMonitorUpdate>,
}

impl SessionTerminateRequest {
    pub fn subscriber_id(&self) -> &str {
        self.common_context
            .as_ref()
            .map(|ctx| ctx.subscriber_id())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTerminateResponse {
    pub sid: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReAuthRequest {
    pub session_id: String,
    pub imsi: String,
    pub rules_to_remove: Vec<String>,
    pub rules_to_install: Vec<StaticRuleInstall>,
    pub dynamic_rules_to_install: Vec<DynamicRuleInstall>,
    pub event_triggers: Vec<EventTrigger>,
    pub revalidation_time: Option<Timestamp>,
    pub usage_monitoring_credits: Vec<UsageMonitoringCredit>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReAuthResult {
    #[default]
    UpdateInitiated,
    UpdateNotNeeded,
    SessionNotFound,
    OtherFailure,
}

/// Gx rule failure code as reported by the gateway. Kept numeric because the
/// gateway may report codes this proxy has no name for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleFailureCode(pub u32);

#[cfg(test)]
impl RuleFailureCode {
    pub const UNKNOWN_RULE_NAME: Self = Self(1);
    pub const RATING_GROUP_ERROR: Self = Self(2);
    pub const UNKNOWN_BEARER_ID: Self = Self(7);
    pub const MISSING_FLOW_INFORMATION: Self = Self(10);
    pub const INCORRECT_FLOW_INFORMATION: Self = Self(13);
    pub const AN_GW_FAILED: Self = Self(18);
    pub const CM_RATING_FAILED: Self = Self(24);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyReAuthAnswer {
    pub session_id: String,
    pub result: ReAuthResult,
    pub failed_rules: HashMap<String, RuleFailureCode>,
}

impl PolicyReAuthAnswer {
    pub fn is_success(&self) -> bool {
        matches!(
            self.result,
            ReAuthResult::UpdateInitiated | ReAuthResult::UpdateNotNeeded
        ) || self.failed_rules.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbortCause {
    #[default]
    NetworkInitiated,
    UserInitiated,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortSessionRequest {
    pub session_id: String,
    pub user_name: String,
    pub cause: AbortCause,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbortSessionCode {
    #[default]
    SessionRemoved,
    GatewayNotFound,
    SessionNotFound,
    UserNotFound,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbortSessionResult {
    pub code: AbortSessionCode,
    pub error_message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub health: Health,
    pub health_message: String,
    pub unresolved_references: u64,
}
