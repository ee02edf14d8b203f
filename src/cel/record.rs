//! Channel event records as handed over by the telephony event source.
//!
//! The source is trusted: values are taken as they come, without validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// +----------------------------------------------------------+
/// | STRUCTS | ENUMS                                          |
/// +----------------------------------------------------------+
/// | Enums:                                                   |
/// |   - CelEventType                                         |
/// |   - AmaFlags                                             |
/// | Structs:                                                 |
/// |   - CallerId                                             |
/// |   - EventRecord                                          |
/// +----------------------------------------------------------+

/// Channel event types
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CelEventType {
    #[serde(rename = "CHAN_START")]
    ChannelStart,
    #[serde(rename = "CHAN_END")]
    ChannelEnd,
    #[serde(rename = "HANGUP")]
    Hangup,
    #[serde(rename = "ANSWER")]
    Answer,
    #[serde(rename = "APP_START")]
    AppStart,
    #[serde(rename = "APP_END")]
    AppEnd,
    #[serde(rename = "PARK_START")]
    ParkStart,
    #[serde(rename = "PARK_END")]
    ParkEnd,
    /// Raised by dialplan; carries its own name in `user_defined_name`
    #[serde(rename = "USER_DEFINED")]
    UserDefined,
    #[serde(rename = "BRIDGE_ENTER")]
    BridgeEnter,
    #[serde(rename = "BRIDGE_EXIT")]
    BridgeExit,
    #[serde(rename = "BLINDTRANSFER")]
    BlindTransfer,
    #[serde(rename = "ATTENDEDTRANSFER")]
    AttendedTransfer,
    #[serde(rename = "PICKUP")]
    Pickup,
    #[serde(rename = "FORWARD")]
    Forward,
    #[serde(rename = "LINKEDID_END")]
    LinkedIdEnd,
    #[serde(rename = "LOCAL_OPTIMIZE")]
    LocalOptimize,
    #[serde(rename = "LOCAL_OPTIMIZE_BEGIN")]
    LocalOptimizeBegin,
}

impl CelEventType {
    /// Generic label of the event type
    pub fn name(self) -> &'static str {
        match self {
            Self::ChannelStart => "CHAN_START",
            Self::ChannelEnd => "CHAN_END",
            Self::Hangup => "HANGUP",
            Self::Answer => "ANSWER",
            Self::AppStart => "APP_START",
            Self::AppEnd => "APP_END",
            Self::ParkStart => "PARK_START",
            Self::ParkEnd => "PARK_END",
            Self::UserDefined => "USER_DEFINED",
            Self::BridgeEnter => "BRIDGE_ENTER",
            Self::BridgeExit => "BRIDGE_EXIT",
            Self::BlindTransfer => "BLINDTRANSFER",
            Self::AttendedTransfer => "ATTENDEDTRANSFER",
            Self::Pickup => "PICKUP",
            Self::Forward => "FORWARD",
            Self::LinkedIdEnd => "LINKEDID_END",
            Self::LocalOptimize => "LOCAL_OPTIMIZE",
            Self::LocalOptimizeBegin => "LOCAL_OPTIMIZE_BEGIN",
        }
    }
}

impl fmt::Display for CelEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// AMA (automated message accounting) flags of a channel
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
#[serde(from = "u32", into = "u32")]
pub enum AmaFlags {
    #[default]
    None,
    Omit,
    Billing,
    Documentation,
}

impl AmaFlags {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "Unknown",
            Self::Omit => "OMIT",
            Self::Billing => "BILLING",
            Self::Documentation => "DOCUMENTATION",
        }
    }
}

impl From<u32> for AmaFlags {
    fn from(value: u32) -> Self {
        match value {
            1 => Self::Omit,
            2 => Self::Billing,
            3 => Self::Documentation,
            _ => Self::None,
        }
    }
}

impl From<AmaFlags> for u32 {
    fn from(flags: AmaFlags) -> Self {
        match flags {
            AmaFlags::None => 0,
            AmaFlags::Omit => 1,
            AmaFlags::Billing => 2,
            AmaFlags::Documentation => 3,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(default)]
pub struct CallerId {
    pub num: String,
    pub name: String,
    pub ani: String,
    pub rdnis: String,
    pub dnid: String,
}

/// One channel event
///
/// Missing string fields deserialize as empty strings. A missing `event_name`
/// takes the label of `event_type`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct EventRecord {
    pub event_type: CelEventType,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub user_defined_name: String,
    #[serde(default)]
    pub account_code: String,
    #[serde(default)]
    pub caller_id: CallerId,
    #[serde(default)]
    pub extension: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub application_name: String,
    #[serde(default)]
    pub application_data: String,
    pub event_time: DateTime<Utc>,
    #[serde(default)]
    pub amaflag: AmaFlags,
    #[serde(default)]
    pub unique_id: String,
    #[serde(default)]
    pub linked_id: String,
    #[serde(default)]
    pub user_field: String,
    #[serde(default)]
    pub peer: String,
    #[serde(default)]
    pub peer_account: String,
    /// Free-form, conventionally JSON
    #[serde(default)]
    pub extra: String,
}

impl EventRecord {
    /// A record with every string field empty
    pub fn new(event_type: CelEventType, event_time: DateTime<Utc>) -> Self {
        Self {
            event_type,
            event_name: event_type.name().to_string(),
            user_defined_name: String::new(),
            account_code: String::new(),
            caller_id: CallerId::default(),
            extension: String::new(),
            context: String::new(),
            channel_name: String::new(),
            application_name: String::new(),
            application_data: String::new(),
            event_time,
            amaflag: AmaFlags::None,
            unique_id: String::new(),
            linked_id: String::new(),
            user_field: String::new(),
            peer: String::new(),
            peer_account: String::new(),
            extra: String::new(),
        }
    }

    /// A user-defined event carrying its own name
    pub fn user_defined(name: &str, event_time: DateTime<Utc>) -> Self {
        let mut record = Self::new(CelEventType::UserDefined, event_time);
        record.user_defined_name = name.to_owned();
        record
    }

    /// Parses one record from JSON text, filling an absent `event_name` from the type
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let mut record: EventRecord = serde_json::from_str(text)?;
        if record.event_name.is_empty() {
            record.event_name = record.event_type.name().to_string();
        }
        Ok(record)
    }
}
