//! Record to canonical JSON document mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::record::{CelEventType, EventRecord};

/// Timestamp layout of `event_time`: UTC, millisecond precision, numeric zone.
const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Serialize, Clone, Debug, Eq, PartialEq)]
pub struct CanonicalCallerId {
    pub num: String,
    pub name: String,
    pub ani: String,
    pub rdnis: String,
    pub dnid: String,
}

/// The document published for each event. Field order is the wire order.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CanonicalMessage {
    pub event_name: String,
    pub account_code: String,
    pub caller_id: CanonicalCallerId,
    pub extension: String,
    pub context: String,
    pub channel: String,
    pub application: String,
    pub app_data: String,
    pub event_time: String,
    pub amaflags: String,
    pub unique_id: String,
    pub linked_id: String,
    pub user_field: String,
    pub peer: String,
    pub peer_account: String,
    pub extra: Value,
}

/// Builds the canonical document for one record. Never fails.
pub fn transform(record: &EventRecord) -> CanonicalMessage {
    CanonicalMessage {
        event_name: event_name(record).to_owned(),
        account_code: record.account_code.clone(),
        caller_id: CanonicalCallerId {
            num: record.caller_id.num.clone(),
            name: record.caller_id.name.clone(),
            ani: record.caller_id.ani.clone(),
            rdnis: record.caller_id.rdnis.clone(),
            dnid: record.caller_id.dnid.clone(),
        },
        extension: record.extension.clone(),
        context: record.context.clone(),
        channel: record.channel_name.clone(),
        application: record.application_name.clone(),
        app_data: record.application_data.clone(),
        event_time: event_time(&record.event_time),
        amaflags: record.amaflag.as_str().to_owned(),
        unique_id: record.unique_id.clone(),
        linked_id: record.linked_id.clone(),
        user_field: record.user_field.clone(),
        peer: record.peer.clone(),
        peer_account: record.peer_account.clone(),
        extra: extra(&record.extra),
    }
}

/// User-defined events are published under their own name.
pub fn event_name(record: &EventRecord) -> &str {
    if record.event_type == CelEventType::UserDefined {
        &record.user_defined_name
    } else {
        &record.event_name
    }
}

pub fn event_time(time: &DateTime<Utc>) -> String {
    time.format(EVENT_TIME_FORMAT).to_string()
}

/// Empty -> null, valid JSON -> parsed value, anything else -> the raw text as a JSON string.
pub fn extra(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            error!("Error parsing extra field: {}", err);
            Value::String(raw.to_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cel::record::{AmaFlags, CallerId};
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 5, 20, 14, 3, 1).unwrap()
            + chrono::Duration::microseconds(123_456)
    }

    fn full_record() -> EventRecord {
        EventRecord {
            event_type: CelEventType::Answer,
            event_name: "ANSWER".to_owned(),
            user_defined_name: String::new(),
            account_code: "acct".to_owned(),
            caller_id: CallerId {
                num: "100".to_owned(),
                name: "Alice".to_owned(),
                ani: "101".to_owned(),
                rdnis: "102".to_owned(),
                dnid: "200".to_owned(),
            },
            extension: "s".to_owned(),
            context: "default".to_owned(),
            channel_name: "PJSIP/alice-00000001".to_owned(),
            application_name: "Dial".to_owned(),
            application_data: "PJSIP/bob".to_owned(),
            event_time: at(),
            amaflag: AmaFlags::Documentation,
            unique_id: "1432130581.1".to_owned(),
            linked_id: "1432130581.0".to_owned(),
            user_field: "uf".to_owned(),
            peer: "PJSIP/bob-00000002".to_owned(),
            peer_account: "bob-acct".to_owned(),
            extra: r#"{"hangupcause":16}"#.to_owned(),
        }
    }

    #[test]
    fn empty_extra_is_null() {
        assert_eq!(extra(""), Value::Null);
    }

    #[test]
    fn json_extra_is_parsed() {
        assert_eq!(
            extra(r#"{"dialstatus":"ANSWER","n":[1,2]}"#),
            json!({"dialstatus": "ANSWER", "n": [1, 2]})
        );
        assert_eq!(extra("42"), json!(42));
    }

    #[test]
    fn malformed_extra_falls_back_to_string() {
        let value = extra("not json{");
        assert_eq!(value, Value::String("not json{".to_owned()));

        let text = serde_json::to_string(&value).unwrap();
        let back: String = serde_json::from_str(&text).unwrap();
        assert_eq!(back, "not json{");
    }

    #[test]
    fn user_defined_name_overrides_generic_label() {
        let record = EventRecord::user_defined("FOO", at());
        assert_eq!(transform(&record).event_name, "FOO");
    }

    #[test]
    fn other_types_keep_record_event_name() {
        let mut record = EventRecord::new(CelEventType::ChannelStart, at());
        record.user_defined_name = "IGNORED".to_owned();
        assert_eq!(transform(&record).event_name, "CHAN_START");
    }

    #[test]
    fn event_time_has_millis_and_zone() {
        assert_eq!(event_time(&at()), "2015-05-20T14:03:01.123+0000");
    }

    #[test]
    fn document_has_exact_key_set_and_order() {
        let value = serde_json::to_value(transform(&full_record())).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        let mut expected = vec![
            "event_name",
            "account_code",
            "caller_id",
            "extension",
            "context",
            "channel",
            "application",
            "app_data",
            "event_time",
            "amaflags",
            "unique_id",
            "linked_id",
            "user_field",
            "peer",
            "peer_account",
            "extra",
        ];
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        expected.sort_unstable();
        assert_eq!(sorted, expected);

        let text = serde_json::to_string(&transform(&full_record())).unwrap();
        assert!(text.starts_with(r#"{"event_name":"ANSWER","account_code":"acct","caller_id":{"num":"100""#));
    }

    #[test]
    fn fields_map_one_to_one() {
        let value = serde_json::to_value(transform(&full_record())).unwrap();
        assert_eq!(
            value,
            json!({
                "event_name": "ANSWER",
                "account_code": "acct",
                "caller_id": {
                    "num": "100",
                    "name": "Alice",
                    "ani": "101",
                    "rdnis": "102",
                    "dnid": "200"
                },
                "extension": "s",
                "context": "default",
                "channel": "PJSIP/alice-00000001",
                "application": "Dial",
                "app_data": "PJSIP/bob",
                "event_time": "2015-05-20T14:03:01.123+0000",
                "amaflags": "DOCUMENTATION",
                "unique_id": "1432130581.1",
                "linked_id": "1432130581.0",
                "user_field": "uf",
                "peer": "PJSIP/bob-00000002",
                "peer_account": "bob-acct",
                "extra": {"hangupcause": 16}
            })
        );
    }

    #[test]
    fn absent_strings_are_empty_not_null() {
        let value = serde_json::to_value(transform(&EventRecord::new(CelEventType::Hangup, at())))
            .unwrap();
        assert_eq!(value["account_code"], json!(""));
        assert_eq!(value["caller_id"]["dnid"], json!(""));
        assert_eq!(value["peer_account"], json!(""));
        assert_eq!(value["amaflags"], json!("Unknown"));
        assert_eq!(value["extra"], Value::Null);
    }
}
