use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Snssai;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmPolicyContextData {
    pub supi: String,
    pub pdu_session_id: u8,
    pub dnn: String,
    pub slice_info: Snssai,
    pub notification_uri: String,
    pub pdu_session_type: PduSessionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rat_type: Option<RatType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmPolicyUpdateContextData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep_policy_ctrl_req_triggers: Option<Vec<PolicyControlRequestTrigger>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rat_type: Option<RatType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ue_time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accu_usage_reports: Option<Vec<AccuUsageReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_reports: Option<Vec<RuleReport>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmPolicyDeleteData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accu_usage_reports: Option<Vec<AccuUsageReport>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuUsageReport {
    pub ref_um_ids: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol_usage: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol_usage_uplink: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vol_usage_downlink: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_usage: Option<u32>,
}

/// Policy decision as returned by the PCF. The `*_decs` tables are the
/// targets of the `ref*` ids carried by PCC and session rules.
///
/// A `pcc_rules` value of `None` (JSON `null`) removes the rule named by its key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmPolicyDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sess_rules: Option<HashMap<String, Option<SessionRule>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcc_rules: Option<HashMap<String, Option<PccRule>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qos_decs: Option<HashMap<String, QosData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chg_decs: Option<HashMap<String, ChargingData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traff_cont_decs: Option<HashMap<String, TrafficControlData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub um_decs: Option<HashMap<String, UsageMonitoringData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conds: Option<HashMap<String, ConditionData>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revalidation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_ctrl_req_triggers: Option<Vec<PolicyControlRequestTrigger>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PccRule {
    #[serde(default)]
    pub pcc_rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_infos: Option<Vec<FlowInformation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precedence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_qos_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_tc_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_chg_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_um_data: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_cond_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRule {
    #[serde(default)]
    pub sess_rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_um_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_cond_data: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QosData {
    pub qos_id: String,
    #[serde(rename = "5qi", skip_serializing_if = "Option::is_none")]
    pub qos_identifier_5: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxbr_ul: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxbr_dl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gbr_ul: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gbr_dl: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingData {
    pub chg_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_group: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficControlData {
    pub tc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_status: Option<FlowStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_info: Option<RedirectInformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMonitoringData {
    #[serde(default)]
    pub um_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_threshold_uplink: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_threshold_downlink: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_threshold: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionData {
    pub cond_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivation_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pack_filt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_direction: Option<PcfFlowDirection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_address_type: Option<RedirectAddressType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_server_address: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectAddressType {
    #[serde(rename = "IPV4_ADDR")]
    Ipv4Addr,
    #[serde(rename = "IPV6_ADDR")]
    Ipv6Addr,
    #[serde(rename = "URL")]
    Url,
    #[serde(rename = "SIP_URI")]
    SipUri,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    #[serde(rename = "3GPP_ACCESS")]
    ThreeGppAccess,
    #[serde(rename = "NON_3GPP_ACCESS")]
    NonThreeGppAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatType {
    Nr,
    Eutra,
    Wlan,
    Virtual,
    Nbiot,
    Wireline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PduSessionType {
    #[default]
    #[serde(rename = "IPV4")]
    Ipv4,
    #[serde(rename = "IPV6")]
    Ipv6,
    #[serde(rename = "IPV4V6")]
    Ipv4v6,
    #[serde(rename = "UNSTRUCTURED")]
    Unstructured,
    #[serde(rename = "ETHERNET")]
    Ethernet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyControlRequestTrigger {
    #[serde(rename = "PLMN_CH")]
    PlmnCh,
    #[serde(rename = "RES_MO_RE")]
    ResMoRe,
    #[serde(rename = "AC_TY_CH")]
    AcTyCh,
    #[serde(rename = "UE_IP_CH")]
    UeIpCh,
    #[serde(rename = "RE_TIMEOUT")]
    ReTimeout,
    #[serde(rename = "US_RE")]
    UsRe,
    #[serde(rename = "SUCC_RES_ALLO")]
    SuccResAllo,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    EnabledUplink,
    EnabledDownlink,
    Enabled,
    Disabled,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PcfFlowDirection {
    Downlink,
    Uplink,
    Bidirectional,
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleReport {
    pub pcc_rule_ids: Vec<String>,
    pub rule_status: RuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<FailureCode>,
}

/// N7 rule failure codes (TS 29.512 FailureCode). `Unknown` stands in for
/// gateway codes that have no N7 counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    #[serde(rename = "UNK_RULE_ID")]
    UnknownRuleId,
    #[serde(rename = "RA_GR_ERR")]
    RatingGroupError,
    #[serde(rename = "SER_ID_ERR")]
    ServiceIdError,
    #[serde(rename = "NF_MAL")]
    NfMalfunction,
    #[serde(rename = "RES_LIM")]
    ResourceLimitation,
    #[serde(rename = "MAX_NR_QoS_FLOW")]
    MaxNrQosFlow,
    #[serde(rename = "MISS_FLOW_INFO")]
    MissingFlowInfo,
    #[serde(rename = "RES_ALLO_FAIL")]
    ResourceAllocationFailure,
    #[serde(rename = "UNSUCC_QOS_VAL")]
    UnsuccessfulQosValidation,
    #[serde(rename = "INCOR_FLOW_INFO")]
    IncorrectFlowInfo,
    #[serde(rename = "PS_TO_CS_HAN")]
    PsToCsHandover,
    #[serde(rename = "APP_ID_ERR")]
    AppIdError,
    #[serde(rename = "NO_QOS_FLOW_BOUND")]
    NoQosFlowBound,
    #[serde(rename = "FILTER_RES")]
    FilterRestrictions,
    #[serde(rename = "MISS_REDI_SER_ADDR")]
    MissingRedirectServerAddress,
    #[serde(rename = "CM_END_USER_SER_DENIED")]
    CmEndUserServiceDenied,
    #[serde(rename = "CM_CREDIT_CON_NOT_APP")]
    CmCreditControlNotApplicable,
    #[serde(rename = "CM_AUTH_REJ")]
    CmAuthorizationRejected,
    #[serde(rename = "CM_USER_UNK")]
    CmUserUnknown,
    #[serde(rename = "CM_RAT_FAILED")]
    CmRatingFailed,
    #[serde(rename = "UNKNOWN", other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureCause {
    PccRuleEvent,
    PccQosFlowEvent,
    RuleErrorReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialSuccessReport {
    pub failure_cause: FailureCause,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_reports: Option<Vec<RuleReport>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmPolicyNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sm_policy_decision: Option<SmPolicyDecision>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationNotification {
    pub resource_uri: String,
    pub cause: PolicyTerminationCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyTerminationCause {
    UnspecifiedCause,
    UeSubscriptionChanged,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}
