//! Conversion between the gateway session model and the N7 SBI wire model.
//!
//! Everything here is pure apart from the process-wide count of policy
//! references that pointed at nothing.

use base64::{engine::general_purpose, Engine as _};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::error::SessionError;
use crate::types::pcf::{
    AccessType, AccuUsageReport, FailureCause, FailureCode, PartialSuccessReport, PccRule,
    PduSessionType, PolicyControlRequestTrigger, QosData, RatType, RedirectAddressType,
    RedirectInformation, RuleReport, RuleStatus, SmPolicyContextData, SmPolicyDecision,
    SmPolicyDeleteData, SmPolicyUpdateContextData, UsageMonitoringData,
};
use crate::types::session::{
    self, CreateSessionRequest, CreateSessionResponse, CreditUnit, DynamicRuleInstall,
    EventTrigger, FlowDescription, FlowQos, GatewayPduSessionType, GatewayRatType, GrantedUnits,
    MonitoringAction, MonitoringLevel, PolicyReAuthAnswer, PolicyReAuthRequest, PolicyRule,
    RedirectSupport, RuleFailureCode, SessionTerminateRequest, StaticRuleInstall, TgppContext,
    Timestamp, TrackingType, UsageMonitorUpdate, UsageMonitoringCredit,
    UsageMonitoringUpdateRequest, UsageMonitoringUpdateResponse,
};
use crate::types::Snssai;
use crate::utils::{parse_flow_description, parse_optional_bit_rate, sbi_timezone, to_gateway_timestamp};

static UNRESOLVED_REFERENCES: AtomicU64 = AtomicU64::new(0);

/// Number of `ref*` ids seen since startup that named no entry in the decision.
pub fn unresolved_reference_count() -> u64 {
    UNRESOLVED_REFERENCES.load(Ordering::Relaxed)
}

fn resolve<'a, T>(
    table: Option<&'a HashMap<String, T>>,
    reference: Option<&str>,
    kind: &str,
) -> Option<&'a T> {
    let reference = reference.filter(|r| !r.is_empty())?;
    let found = table.and_then(|t| t.get(reference));
    if found.is_none() {
        UNRESOLVED_REFERENCES.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Unresolved {} reference: {}", kind, reference);
    }
    found
}

// At most one entry is expected in each ref array.
fn first_ref(refs: Option<&Vec<String>>) -> Option<&str> {
    refs.and_then(|r| r.first()).map(|s| s.as_str())
}

// Gateway -> SBI

pub fn strip_imsi_prefix(subscriber_id: &str) -> &str {
    subscriber_id.strip_prefix("IMSI").unwrap_or(subscriber_id)
}

pub fn sbi_rat_type(rat_type: GatewayRatType) -> Option<RatType> {
    match rat_type {
        GatewayRatType::TgppLte => Some(RatType::Eutra),
        GatewayRatType::TgppNr => Some(RatType::Nr),
        GatewayRatType::TgppWlan => Some(RatType::Wlan),
        GatewayRatType::Other => None,
    }
}

pub fn sbi_access_type(rat_type: GatewayRatType) -> Option<AccessType> {
    match rat_type {
        GatewayRatType::TgppLte | GatewayRatType::TgppNr => Some(AccessType::ThreeGppAccess),
        GatewayRatType::TgppWlan => Some(AccessType::NonThreeGppAccess),
        GatewayRatType::Other => None,
    }
}

pub fn sbi_pdu_session_type(pdu_session_type: GatewayPduSessionType) -> PduSessionType {
    match pdu_session_type {
        GatewayPduSessionType::Ipv4 => PduSessionType::Ipv4,
        GatewayPduSessionType::Ipv6 => PduSessionType::Ipv6,
        GatewayPduSessionType::Ipv4ipv6 => PduSessionType::Ipv4v6,
        GatewayPduSessionType::Unstructured => PduSessionType::Unstructured,
        GatewayPduSessionType::Other => PduSessionType::Ipv4,
    }
}

/// `{api_root}/{base64url(session_id)}`. The PCF appends `/update` or
/// `/terminate` when it calls back.
pub fn notify_uri(api_root: &str, session_id: &str) -> String {
    format!(
        "{}/{}",
        api_root,
        general_purpose::URL_SAFE.encode(session_id.as_bytes())
    )
}

pub fn decode_notify_session_id(encoded: &str) -> Result<String, SessionError> {
    let bytes = general_purpose::URL_SAFE
        .decode(encoded.as_bytes())
        .map_err(|e| SessionError::Validation(format!("invalid session id encoding: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|_| SessionError::Validation("session id is not valid UTF-8".to_string()))
}

/// Session ids are `{subscriber}-{suffix}`.
pub fn subscriber_id_from_session_id(session_id: &str) -> &str {
    session_id.split('-').next().unwrap_or(session_id)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn sm_policy_context_data(
    request: &CreateSessionRequest,
    notify_api_root: &str,
) -> SmPolicyContextData {
    let common = request.common_context.clone().unwrap_or_default();

    let mut body = SmPolicyContextData {
        supi: strip_imsi_prefix(common.subscriber_id()).to_string(),
        pdu_session_id: 0,
        dnn: common.apn.clone(),
        slice_info: Snssai::default(),
        notification_uri: notify_uri(notify_api_root, &request.session_id),
        pdu_session_type: PduSessionType::default(),
        gpsi: non_empty(&common.msisdn),
        ipv4_address: non_empty(&common.ue_ipv4),
        ipv6_address_prefix: non_empty(&common.ue_ipv6),
        access_type: sbi_access_type(common.rat_type),
        rat_type: sbi_rat_type(common.rat_type),
        ue_time_zone: sbi_timezone(request.access_timezone.as_ref()),
        online: None,
        offline: None,
    };

    if let Some(m5g) = &request.rat_specific_context {
        body.pdu_session_id = m5g.pdu_session_id;
        body.gpsi = non_empty(&m5g.gpsi);
        body.pdu_session_type = sbi_pdu_session_type(m5g.pdu_session_type);
    }

    body
}

pub fn accu_usage_report(update: &UsageMonitorUpdate) -> AccuUsageReport {
    AccuUsageReport {
        ref_um_ids: update.monitoring_key.clone(),
        vol_usage: Some(update.bytes_tx.saturating_add(update.bytes_rx)),
        vol_usage_uplink: Some(update.bytes_tx),
        vol_usage_downlink: Some(update.bytes_rx),
        time_usage: None,
    }
}

fn accu_usage_reports<'a, I>(updates: I) -> Option<Vec<AccuUsageReport>>
where
    I: IntoIterator<Item = &'a UsageMonitorUpdate>,
{
    let reports: Vec<AccuUsageReport> = updates.into_iter().map(accu_usage_report).collect();
    if reports.is_empty() {
        None
    } else {
        Some(reports)
    }
}

pub fn sm_policy_delete_data(request: &SessionTerminateRequest) -> SmPolicyDeleteData {
    SmPolicyDeleteData {
        accu_usage_reports: accu_usage_reports(&request.monitor_usages),
    }
}

/// Extracts the SmPolicyId from the policy URL the PCF returned in `Location`,
/// i.e. `https://{pcf}/npcf-smpolicycontrol/v1/sm-policies/{smPolicyId}`.
pub fn get_sm_policy_id(tgpp_ctx: Option<&TgppContext>) -> Result<String, SessionError> {
    let tgpp_ctx = tgpp_ctx
        .ok_or_else(|| SessionError::Validation("missing TgppContext".to_string()))?;
    sm_policy_id_from_url(&tgpp_ctx.gx_dest_host)
}

pub fn sm_policy_id_from_url(policy_url: &str) -> Result<String, SessionError> {
    if policy_url.is_empty() {
        return Err(SessionError::Validation(
            "empty policy URL in TgppContext".to_string(),
        ));
    }

    let without_query = policy_url
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(policy_url);
    let path = match without_query.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or(""),
        None => without_query,
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.to_string())
        .ok_or_else(|| {
            SessionError::Validation(format!("no SmPolicyId in policy URL {}", policy_url))
        })
}

/// One SM policy update: every usage report in the batch that targets the
/// same SmPolicyId.
#[derive(Debug, Clone, PartialEq)]
pub struct SmPolicyUpdateCtx {
    pub sm_policy_id: String,
    pub session_id: String,
    pub imsi: String,
    pub tgpp_ctx: TgppContext,
    pub requests: Vec<UsageMonitoringUpdateRequest>,
    pub body: SmPolicyUpdateContextData,
}

/// Partitions a batch by SmPolicyId. Requests whose policy cannot be
/// identified come back as ready-made failure responses.
pub fn sm_policy_update_contexts(
    requests: &[UsageMonitoringUpdateRequest],
) -> (Vec<SmPolicyUpdateCtx>, Vec<UsageMonitoringUpdateResponse>) {
    let mut contexts: Vec<SmPolicyUpdateCtx> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unresolved = Vec::new();

    for request in requests {
        let sm_policy_id = match get_sm_policy_id(request.tgpp_ctx.as_ref()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    "Cannot update session {}: {}",
                    request.session_id,
                    e
                );
                unresolved.push(failed_usage_monitoring_response(request));
                continue;
            }
        };

        match index.get(&sm_policy_id) {
            Some(&idx) => contexts[idx].requests.push(request.clone()),
            None => {
                index.insert(sm_policy_id.clone(), contexts.len());
                contexts.push(SmPolicyUpdateCtx {
                    sm_policy_id,
                    session_id: request.session_id.clone(),
                    imsi: request.sid.clone(),
                    tgpp_ctx: request.tgpp_ctx.clone().unwrap_or_default(),
                    requests: vec![request.clone()],
                    body: SmPolicyUpdateContextData::default(),
                });
            }
        }
    }

    for ctx in contexts.iter_mut() {
        let rat_type = ctx.requests[0].rat_type;
        ctx.body = SmPolicyUpdateContextData {
            rat_type: sbi_rat_type(rat_type),
            access_type: sbi_access_type(rat_type),
            accu_usage_reports: accu_usage_reports(ctx.requests.iter().map(|r| &r.update)),
            ..Default::default()
        };
    }

    (contexts, unresolved)
}

// SBI -> Gateway

/// PCC rules of a decision split the way the gateway installs them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvertedRules {
    pub static_rules: Vec<StaticRuleInstall>,
    pub dynamic_rules: Vec<DynamicRuleInstall>,
    pub rules_to_remove: Vec<String>,
}

fn sorted_keys<T>(map: &HashMap<String, T>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

/// Yields installable rules in ascending rule id order; removal sentinels
/// (`null` or empty `pccRuleId`) are skipped.
fn installable_pcc_rules(decision: &SmPolicyDecision) -> Vec<(&String, &PccRule)> {
    let Some(pcc_rules) = decision.pcc_rules.as_ref() else {
        return Vec::new();
    };
    sorted_keys(pcc_rules)
        .into_iter()
        .filter_map(|id| match pcc_rules.get(id) {
            Some(Some(rule)) if !rule.pcc_rule_id.is_empty() => Some((id, rule)),
            _ => None,
        })
        .collect()
}

pub fn convert_pcc_rules(decision: &SmPolicyDecision) -> ConvertedRules {
    let mut converted = ConvertedRules::default();
    let Some(pcc_rules) = decision.pcc_rules.as_ref() else {
        return converted;
    };

    for rule_id in sorted_keys(pcc_rules) {
        let pcc_rule = match pcc_rules.get(rule_id) {
            Some(Some(rule)) if !rule.pcc_rule_id.is_empty() => rule,
            _ => {
                converted.rules_to_remove.push(rule_id.clone());
                continue;
            }
        };

        let (activation_time, deactivation_time) = activation_window(decision, pcc_rule);
        match policy_rule(decision, pcc_rule) {
            Some(policy_rule) => converted.dynamic_rules.push(DynamicRuleInstall {
                policy_rule,
                activation_time,
                deactivation_time,
            }),
            None => converted.static_rules.push(StaticRuleInstall {
                rule_id: rule_id.clone(),
                activation_time,
                deactivation_time,
            }),
        }
    }

    converted
}

fn activation_window(
    decision: &SmPolicyDecision,
    pcc_rule: &PccRule,
) -> (Option<Timestamp>, Option<Timestamp>) {
    match resolve(
        decision.conds.as_ref(),
        pcc_rule.ref_cond_data.as_deref(),
        "condition",
    ) {
        Some(cond) => (
            to_gateway_timestamp(cond.activation_time.as_ref()),
            to_gateway_timestamp(cond.deactivation_time.as_ref()),
        ),
        None => (None, None),
    }
}

/// Builds the dynamic rule for a PCC rule, or `None` when nothing beyond the
/// rule id and condition resolves, which makes it a static rule.
pub fn policy_rule(decision: &SmPolicyDecision, pcc_rule: &PccRule) -> Option<PolicyRule> {
    let mut rule = PolicyRule {
        id: pcc_rule.pcc_rule_id.clone(),
        priority: pcc_rule.precedence.unwrap_or(0),
        monitoring_key: resolve(
            decision.um_decs.as_ref(),
            first_ref(pcc_rule.ref_um_data.as_ref()),
            "usage monitoring",
        )
        .map(|um| um.um_id.clone())
        .unwrap_or_default(),
        redirect: resolve(
            decision.traff_cont_decs.as_ref(),
            first_ref(pcc_rule.ref_tc_data.as_ref()),
            "traffic control",
        )
        .map(|tc| redirect_information(tc.redirect_info.as_ref())),
        qos: resolve(
            decision.qos_decs.as_ref(),
            first_ref(pcc_rule.ref_qos_data.as_ref()),
            "QoS",
        )
        .map(flow_qos),
        flow_list: flow_list(pcc_rule),
        ..Default::default()
    };

    if let Some(chg) = resolve(
        decision.chg_decs.as_ref(),
        first_ref(pcc_rule.ref_chg_data.as_ref()),
        "charging",
    ) {
        rule.rating_group = chg.rating_group.unwrap_or(0);
        rule.service_identifier = chg.service_id;
        rule.online = chg.online.unwrap_or(false);
        rule.offline = chg.offline.unwrap_or(false);
    }

    rule.tracking_type = tracking_type(!rule.monitoring_key.is_empty(), rule.rating_group != 0);

    if rule.monitoring_key.is_empty()
        && rule.redirect.is_none()
        && rule.qos.is_none()
        && rule.flow_list.is_empty()
        && rule.rating_group == 0
    {
        return None;
    }
    Some(rule)
}

fn flow_list(pcc_rule: &PccRule) -> Vec<FlowDescription> {
    let Some(flow_infos) = pcc_rule.flow_infos.as_ref() else {
        return Vec::new();
    };
    flow_infos
        .iter()
        .filter_map(|info| info.flow_description.as_deref())
        .filter_map(|desc| match parse_flow_description(desc) {
            Ok(flow) => Some(flow),
            Err(e) => {
                tracing::error!("Could not get flow for description {}: {}", desc, e);
                None
            }
        })
        .collect()
}

pub fn tracking_type(monitoring_key_present: bool, rating_group_present: bool) -> TrackingType {
    match (monitoring_key_present, rating_group_present) {
        (true, true) => TrackingType::OcsAndPcrf,
        (true, false) => TrackingType::OnlyPcrf,
        (false, true) => TrackingType::OnlyOcs,
        (false, false) => TrackingType::NoTracking,
    }
}

pub fn redirect_information(info: Option<&RedirectInformation>) -> session::RedirectInformation {
    let Some(info) = info else {
        return session::RedirectInformation::default();
    };
    session::RedirectInformation {
        support: match info.redirect_enabled {
            Some(true) => RedirectSupport::Enabled,
            _ => RedirectSupport::Disabled,
        },
        address_type: redirect_address_type(info.redirect_address_type),
        server_address: info.redirect_server_address.clone().unwrap_or_default(),
    }
}

fn redirect_address_type(address_type: Option<RedirectAddressType>) -> session::RedirectAddressType {
    match address_type {
        Some(RedirectAddressType::Ipv4Addr) | None => session::RedirectAddressType::Ipv4,
        Some(RedirectAddressType::Ipv6Addr) => session::RedirectAddressType::Ipv6,
        Some(RedirectAddressType::Url) => session::RedirectAddressType::Url,
        Some(RedirectAddressType::SipUri) => session::RedirectAddressType::SipUri,
        Some(RedirectAddressType::Unknown) => {
            tracing::error!("Unknown redirect address type, defaulting to IPv4");
            session::RedirectAddressType::Ipv4
        }
    }
}

pub fn flow_qos(qos: &QosData) -> FlowQos {
    FlowQos {
        max_req_bw_ul: parse_optional_bit_rate(qos.maxbr_ul.as_deref()),
        max_req_bw_dl: parse_optional_bit_rate(qos.maxbr_dl.as_deref()),
        gbr_ul: parse_optional_bit_rate(qos.gbr_ul.as_deref()),
        gbr_dl: parse_optional_bit_rate(qos.gbr_dl.as_deref()),
        qci: qos.qos_identifier_5.map(u32::from).unwrap_or(0),
    }
}

pub fn event_triggers(decision: &SmPolicyDecision) -> (Vec<EventTrigger>, Option<Timestamp>) {
    let mut triggers = Vec::new();
    let mut revalidation_time = None;
    for trigger in decision.policy_ctrl_req_triggers.iter().flatten() {
        if *trigger == PolicyControlRequestTrigger::ReTimeout {
            triggers.push(EventTrigger::RevalidationTimeout);
            revalidation_time = to_gateway_timestamp(decision.revalidation_time.as_ref());
        }
    }
    (triggers, revalidation_time)
}

fn credit_unit(volume: Option<u64>) -> CreditUnit {
    CreditUnit::from_volume(volume)
}

pub fn granted_units(um_data: &UsageMonitoringData) -> GrantedUnits {
    GrantedUnits {
        total: credit_unit(um_data.volume_threshold),
        tx: credit_unit(um_data.volume_threshold_uplink),
        rx: credit_unit(um_data.volume_threshold_downlink),
    }
}

fn usage_monitoring_credit(
    monitoring_key: &str,
    um_data: &UsageMonitoringData,
    level: MonitoringLevel,
) -> UsageMonitoringCredit {
    UsageMonitoringCredit {
        monitoring_key: monitoring_key.to_string(),
        // an entry with no umId withdraws the monitor
        action: if um_data.um_id.is_empty() {
            MonitoringAction::Disable
        } else {
            MonitoringAction::Continue
        },
        level,
        granted_units: granted_units(um_data),
    }
}

/// Usage monitoring credits granted by a decision: PCC rule level first, then
/// session level. A monitoring key appears at most once per level.
pub fn usage_monitoring_credits(decision: &SmPolicyDecision) -> Vec<UsageMonitoringCredit> {
    let mut credits = Vec::new();
    let mut seen: HashSet<(String, MonitoringLevel)> = HashSet::new();

    for (_, pcc_rule) in installable_pcc_rules(decision) {
        let Some(um_ref) = first_ref(pcc_rule.ref_um_data.as_ref()) else {
            continue;
        };
        if let Some(um) = resolve(decision.um_decs.as_ref(), Some(um_ref), "usage monitoring") {
            if seen.insert((um_ref.to_string(), MonitoringLevel::PccRuleLevel)) {
                credits.push(usage_monitoring_credit(
                    um_ref,
                    um,
                    MonitoringLevel::PccRuleLevel,
                ));
            }
        }
    }

    if let Some(sess_rules) = decision.sess_rules.as_ref() {
        for id in sorted_keys(sess_rules) {
            let Some(Some(sess_rule)) = sess_rules.get(id) else {
                continue;
            };
            let Some(um_ref) = sess_rule.ref_um_data.as_deref() else {
                continue;
            };
            if let Some(um) = resolve(decision.um_decs.as_ref(), Some(um_ref), "usage monitoring")
            {
                if seen.insert((um_ref.to_string(), MonitoringLevel::SessionLevel)) {
                    credits.push(usage_monitoring_credit(
                        um_ref,
                        um,
                        MonitoringLevel::SessionLevel,
                    ));
                }
            }
        }
    }

    credits
}

pub fn create_session_response(
    request: &CreateSessionRequest,
    decision: &SmPolicyDecision,
    policy_url: &str,
) -> CreateSessionResponse {
    let rules = convert_pcc_rules(decision);
    let (event_triggers, revalidation_time) = event_triggers(decision);
    let tgpp_ctx = TgppContext {
        gx_dest_host: policy_url.to_string(),
    };
    let sid = request.subscriber_id().to_string();

    let usage_monitors = usage_monitoring_credits(decision)
        .into_iter()
        .map(|credit| UsageMonitoringUpdateResponse {
            credit: Some(credit),
            session_id: request.session_id.clone(),
            sid: sid.clone(),
            tgpp_ctx: Some(tgpp_ctx.clone()),
            success: true,
            event_triggers: event_triggers.clone(),
            revalidation_time,
            ..Default::default()
        })
        .collect();

    CreateSessionResponse {
        session_id: request.session_id.clone(),
        static_rules: rules.static_rules,
        dynamic_rules: rules.dynamic_rules,
        tgpp_ctx: Some(tgpp_ctx),
        event_triggers,
        revalidation_time,
        usage_monitors,
        online: decision.online.unwrap_or(false),
        offline: decision.offline.unwrap_or(false),
    }
}

/// Adds omnipresent rules as static installs. A rule the decision already
/// carries (static or dynamic) keeps the PCF's version.
pub fn inject_omnipresent_rules(response: &mut CreateSessionResponse, rule_ids: &[String]) {
    let mut present: HashSet<String> = response
        .static_rules
        .iter()
        .map(|r| r.rule_id.clone())
        .chain(response.dynamic_rules.iter().map(|r| r.policy_rule.id.clone()))
        .collect();

    for rule_id in rule_ids {
        if rule_id.is_empty() || !present.insert(rule_id.clone()) {
            continue;
        }
        response.static_rules.push(StaticRuleInstall {
            rule_id: rule_id.clone(),
            activation_time: None,
            deactivation_time: None,
        });
    }
}

pub fn policy_reauth_request(
    session_id: &str,
    imsi: &str,
    decision: &SmPolicyDecision,
) -> PolicyReAuthRequest {
    let rules = convert_pcc_rules(decision);
    let (event_triggers, revalidation_time) = event_triggers(decision);
    PolicyReAuthRequest {
        session_id: session_id.to_string(),
        imsi: imsi.to_string(),
        rules_to_remove: rules.rules_to_remove,
        rules_to_install: rules.static_rules,
        dynamic_rules_to_install: rules.dynamic_rules,
        event_triggers,
        revalidation_time,
        usage_monitoring_credits: usage_monitoring_credits(decision),
    }
}

/// Responses for a partition the PCF answered: one per submitted monitoring
/// key, then one per granted credit no submitted key claimed. Rule changes
/// ride on the first response only.
pub fn usage_monitoring_responses(
    ctx: &SmPolicyUpdateCtx,
    decision: &SmPolicyDecision,
) -> Vec<UsageMonitoringUpdateResponse> {
    let rules = convert_pcc_rules(decision);
    let (event_triggers, revalidation_time) = event_triggers(decision);
    let mut credits = usage_monitoring_credits(decision);

    let mut responses = Vec::with_capacity(ctx.requests.len());
    for request in &ctx.requests {
        let key = &request.update.monitoring_key;
        let credit = credits
            .iter()
            .position(|c| &c.monitoring_key == key)
            .map(|idx| credits.remove(idx));
        responses.push(UsageMonitoringUpdateResponse {
            credit,
            session_id: request.session_id.clone(),
            sid: request.sid.clone(),
            tgpp_ctx: Some(ctx.tgpp_ctx.clone()),
            success: true,
            event_triggers: event_triggers.clone(),
            revalidation_time,
            ..Default::default()
        });
    }

    for credit in credits {
        responses.push(UsageMonitoringUpdateResponse {
            credit: Some(credit),
            session_id: ctx.session_id.clone(),
            sid: ctx.imsi.clone(),
            tgpp_ctx: Some(ctx.tgpp_ctx.clone()),
            success: true,
            event_triggers: event_triggers.clone(),
            revalidation_time,
            ..Default::default()
        });
    }

    if let Some(first) = responses.first_mut() {
        first.static_rules_to_install = rules.static_rules;
        first.dynamic_rules_to_install = rules.dynamic_rules;
        first.rules_to_remove = rules.rules_to_remove;
    }

    responses
}

/// Failure answer for one submitted usage report; the credit names the key
/// and carries no grant.
pub fn failed_usage_monitoring_response(
    request: &UsageMonitoringUpdateRequest,
) -> UsageMonitoringUpdateResponse {
    UsageMonitoringUpdateResponse {
        credit: Some(UsageMonitoringCredit {
            monitoring_key: request.update.monitoring_key.clone(),
            action: MonitoringAction::Continue,
            level: request.update.level,
            granted_units: GrantedUnits::default(),
        }),
        session_id: request.session_id.clone(),
        sid: request.sid.clone(),
        tgpp_ctx: request.tgpp_ctx.clone(),
        success: false,
        ..Default::default()
    }
}

// Gateway -> N7 rule failure codes, indexed by the gateway code.
const FAILURE_CODES: [Option<FailureCode>; 25] = [
    None,
    Some(FailureCode::UnknownRuleId),
    Some(FailureCode::RatingGroupError),
    Some(FailureCode::ServiceIdError),
    Some(FailureCode::NfMalfunction),
    Some(FailureCode::ResourceLimitation),
    Some(FailureCode::MaxNrQosFlow),
    None,
    None,
    None,
    Some(FailureCode::MissingFlowInfo),
    Some(FailureCode::ResourceAllocationFailure),
    Some(FailureCode::UnsuccessfulQosValidation),
    Some(FailureCode::IncorrectFlowInfo),
    Some(FailureCode::PsToCsHandover),
    Some(FailureCode::AppIdError),
    Some(FailureCode::NoQosFlowBound),
    Some(FailureCode::FilterRestrictions),
    None,
    Some(FailureCode::MissingRedirectServerAddress),
    Some(FailureCode::CmEndUserServiceDenied),
    Some(FailureCode::CmCreditControlNotApplicable),
    Some(FailureCode::CmAuthorizationRejected),
    Some(FailureCode::CmUserUnknown),
    Some(FailureCode::CmRatingFailed),
];

pub fn failure_code_n7(code: RuleFailureCode) -> FailureCode {
    FAILURE_CODES
        .get(code.0 as usize)
        .copied()
        .flatten()
        .unwrap_or(FailureCode::Unknown)
}

pub fn partial_success_report(answer: &PolicyReAuthAnswer) -> PartialSuccessReport {
    let mut failed: Vec<(&String, &RuleFailureCode)> = answer.failed_rules.iter().collect();
    failed.sort_by(|a, b| a.0.cmp(b.0));

    let rule_reports = failed
        .into_iter()
        .map(|(rule_id, code)| RuleReport {
            pcc_rule_ids: vec![rule_id.clone()],
            rule_status: RuleStatus::Inactive,
            failure_code: Some(failure_code_n7(*code)),
        })
        .collect();

    PartialSuccessReport {
        failure_cause: FailureCause::PccRuleEvent,
        rule_reports: Some(rule_reports),
    }
}
