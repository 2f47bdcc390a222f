//! # Wire Envelopes
//!
//! Requests go out as `{"id": n, "method": "call", "params": [api, method, [args]]}`.
//! Inbound frames are classified by shape alone:
//!
//! - `{"method": "notice", "params": [...]}` is a push notification
//! - anything carrying `id`, `result` or `error` is a response
//! - everything else is unrecognized and dropped

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

macro_rules! wire_names {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $wire:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

wire_names! {
    /// Node-side API a method belongs to.
    pub enum SteemApi {
        DatabaseApi => "database_api",
        LoginApi => "login_api",
        NetworkBroadcastApi => "network_broadcast_api",
        FollowApi => "follow_api",
        MarketHistoryApi => "market_history_api",
    }
}

wire_names! {
    pub enum RequestMethod {
        GetDynamicGlobalProperties => "get_dynamic_global_properties",
        GetConfig => "get_config",
        GetChainProperties => "get_chain_properties",
        GetHardforkVersion => "get_hardfork_version",
        GetBlock => "get_block",
        GetBlockHeader => "get_block_header",
        GetAccounts => "get_accounts",
        GetAccountCount => "get_account_count",
        GetWitnessCount => "get_witness_count",
        GetFeedHistory => "get_feed_history",
        GetCurrentMedianHistoryPrice => "get_current_median_history_price",
        GetActiveVotes => "get_active_votes",
        GetAccountVotes => "get_account_votes",
        GetAccountHistory => "get_account_history",
        GetTransactionHex => "get_transaction_hex",
        VerifyAuthority => "verify_authority",
        GetPotentialSignatures => "get_potential_signatures",
        GetRequiredSignatures => "get_required_signatures",
        SetBlockAppliedCallback => "set_block_applied_callback",
        CancelAllSubscriptions => "cancel_all_subscriptions",
        BroadcastTransaction => "broadcast_transaction",
        BroadcastTransactionSynchronous => "broadcast_transaction_synchronous",
        Login => "login",
        GetApiByName => "get_api_by_name",
    }
}

/// A call before it is given an id.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub api: SteemApi,
    pub method: RequestMethod,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(api: SteemApi, method: RequestMethod, params: Vec<Value>) -> Self {
        Self {
            api,
            method,
            params,
        }
    }

    pub fn database(method: RequestMethod, params: Vec<Value>) -> Self {
        Self::new(SteemApi::DatabaseApi, method, params)
    }

    pub fn broadcast(method: RequestMethod, params: Vec<Value>) -> Self {
        Self::new(SteemApi::NetworkBroadcastApi, method, params)
    }

    /// The envelope actually written to the socket.
    pub fn to_wire(&self, id: u64) -> WireRequest<'_> {
        WireRequest {
            id,
            method: "call",
            params: (self.api, self.method, &self.params),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WireRequest<'a> {
    pub id: u64,
    pub method: &'static str,
    pub params: (SteemApi, RequestMethod, &'a Vec<Value>),
}

/// `{id, result | error}` as read back from a response frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// A decoded push notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subscription_id: u64,
    /// Present when the node wraps the payload as `[event, [payload...]]`.
    pub event: Option<String>,
    pub payload: Vec<Value>,
}

impl Notification {
    fn from_params(params: &[Value]) -> Option<Self> {
        let subscription_id = match params.first()? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };

        let (event, payload) = match params.get(1) {
            None => (None, Vec::new()),
            Some(Value::Array(items)) => match items.as_slice() {
                [Value::String(event), Value::Array(payload)] => {
                    (Some(event.clone()), payload.clone())
                }
                _ => (None, items.clone()),
            },
            Some(single) => (None, vec![single.clone()]),
        };

        Some(Self {
            subscription_id,
            event,
            payload,
        })
    }
}

/// Structural classification of one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Response { id: Option<u64> },
    Notification(Notification),
    Unrecognized(String),
}

impl InboundMessage {
    pub fn classify(text: &str) -> Self {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => return Self::Unrecognized(format!("not json: {e}")),
        };
        let Value::Object(fields) = value else {
            return Self::Unrecognized("not an object".into());
        };

        if fields.get("method").and_then(Value::as_str) == Some("notice") {
            return match fields.get("params") {
                Some(Value::Array(params)) => Notification::from_params(params)
                    .map(Self::Notification)
                    .unwrap_or_else(|| Self::Unrecognized("malformed notice params".into())),
                _ => Self::Unrecognized("notice without params".into()),
            };
        }

        if fields.contains_key("id") || fields.contains_key("result") || fields.contains_key("error")
        {
            let id = fields.get("id").and_then(Value::as_u64);
            return Self::Response { id };
        }

        Self::Unrecognized("neither a response nor a notice".into())
    }
}
