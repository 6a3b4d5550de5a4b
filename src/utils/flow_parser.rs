use crate::types::session::{FlowAction, FlowDescription, FlowDirection, FlowMatch};

#[derive(Debug)]
pub enum ParseError {
    InvalidFormat(String),
    InvalidAction(String),
    InvalidDirection(String),
    InvalidProtocol(String),
    InvalidAddress(String),
    InvalidPort(String),
    MissingField(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            ParseError::InvalidAction(msg) => write!(f, "Invalid action: {}", msg),
            ParseError::InvalidDirection(msg) => write!(f, "Invalid direction: {}", msg),
            ParseError::InvalidProtocol(msg) => write!(f, "Invalid protocol: {}", msg),
            ParseError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            ParseError::InvalidPort(msg) => write!(f, "Invalid port: {}", msg),
            ParseError::MissingField(msg) => write!(f, "Missing field: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses an IPFilterRule flow description
/// (`permit out tcp from any to 10.0.0.1 80`) into a gateway flow.
///
/// Addresses keep their prefix length (`0.0.0.0/0`) as written.
pub fn parse_flow_description(flow_desc: &str) -> Result<FlowDescription, ParseError> {
    let tokens: Vec<&str> = flow_desc.split_whitespace().collect();

    if tokens.len() < 7 {
        return Err(ParseError::InvalidFormat(
            "Flow description too short".to_string(),
        ));
    }

    let action = parse_action(tokens[0])?;
    let direction = parse_direction(tokens[1])?;
    let ip_proto = parse_protocol(tokens[2])?;

    if tokens[3] != "from" {
        return Err(ParseError::InvalidFormat(
            "Expected 'from' keyword".to_string(),
        ));
    }

    let (ip_src, src_port, consumed) = parse_address_port(&tokens[4..])?;
    let to_idx = 4 + consumed;

    if to_idx >= tokens.len() || tokens[to_idx] != "to" {
        return Err(ParseError::InvalidFormat(
            "Expected 'to' keyword".to_string(),
        ));
    }

    let (ip_dst, dst_port, _) = parse_address_port(&tokens[to_idx + 1..])?;

    Ok(FlowDescription {
        flow_match: FlowMatch {
            direction,
            ip_proto,
            ip_src,
            ip_dst,
            src_port,
            dst_port,
        },
        action,
    })
}

fn parse_action(action_str: &str) -> Result<FlowAction, ParseError> {
    match action_str.to_lowercase().as_str() {
        "permit" => Ok(FlowAction::Permit),
        "deny" => Ok(FlowAction::Deny),
        _ => Err(ParseError::InvalidAction(action_str.to_string())),
    }
}

fn parse_direction(dir_str: &str) -> Result<FlowDirection, ParseError> {
    match dir_str.to_lowercase().as_str() {
        "in" => Ok(FlowDirection::Uplink),
        "out" => Ok(FlowDirection::Downlink),
        _ => Err(ParseError::InvalidDirection(dir_str.to_string())),
    }
}

fn parse_protocol(proto_str: &str) -> Result<Option<u8>, ParseError> {
    match proto_str.to_lowercase().as_str() {
        "ip" => Ok(None),
        "tcp" => Ok(Some(6)),
        "udp" => Ok(Some(17)),
        "icmp" => Ok(Some(1)),
        "icmpv6" => Ok(Some(58)),
        "esp" => Ok(Some(50)),
        "ah" => Ok(Some(51)),
        _ => proto_str
            .parse::<u8>()
            .map(Some)
            .map_err(|_| ParseError::InvalidProtocol(proto_str.to_string())),
    }
}

fn parse_address_port(
    tokens: &[&str],
) -> Result<(Option<String>, Option<String>, usize), ParseError> {
    let first = tokens
        .first()
        .ok_or_else(|| ParseError::MissingField("address".to_string()))?;

    let ip = if *first == "any" {
        None
    } else {
        validate_address(first)?;
        Some(first.to_string())
    };
    let mut idx = 1;

    let port = match tokens.get(idx) {
        Some(token) if *token != "to" && *token != "from" => {
            validate_ports(token)?;
            idx += 1;
            Some(token.to_string())
        }
        _ => None,
    };

    Ok((ip, port, idx))
}

fn validate_address(addr: &str) -> Result<(), ParseError> {
    let (ip, prefix) = match addr.split_once('/') {
        Some((ip, prefix)) => (ip, Some(prefix)),
        None => (addr, None),
    };
    ip.parse::<std::net::IpAddr>()
        .map_err(|_| ParseError::InvalidAddress(addr.to_string()))?;
    if let Some(prefix) = prefix {
        prefix
            .parse::<u8>()
            .map_err(|_| ParseError::InvalidAddress(addr.to_string()))?;
    }
    Ok(())
}

fn validate_ports(port_str: &str) -> Result<(), ParseError> {
    for part in port_str.split(',') {
        let mut bounds = part.splitn(2, '-');
        for bound in bounds.by_ref() {
            bound
                .parse::<u16>()
                .map_err(|_| ParseError::InvalidPort(port_str.to_string()))?;
        }
    }
    Ok(())
}
