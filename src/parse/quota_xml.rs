//! `AIAssistantQuotaManager2.xml` parser

use super::ParseError;
use crate::domain::{lenient_f64, QuotaRecord, Refill, SourcePath, UNKNOWN};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use std::fs;
use std::path::Path;

const QUOTA_INFO_OPTION: &str = "quotaInfo";
const NEXT_REFILL_OPTION: &str = "nextRefill";

#[derive(Debug, Deserialize)]
struct QuotaInfoPayload {
    #[serde(rename = "type", default = "unknown_label")]
    quota_type: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    current: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    maximum: f64,
    #[serde(default)]
    until: String,
}

#[derive(Debug, Deserialize)]
struct RefillPayload {
    #[serde(rename = "type", default = "unknown_label")]
    refill_type: String,
    #[serde(default)]
    next: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    amount: f64,
    #[serde(default)]
    duration: String,
}

fn unknown_label() -> String {
    UNKNOWN.to_string()
}

/// Raw option payloads found in the document, still JSON text.
#[derive(Debug, Default)]
struct OptionPayloads {
    quota_info: Option<String>,
    next_refill: Option<String>,
}

/// Parse a quota file, never failing.
///
/// An unreadable or malformed document yields a record with default fields and
/// `source_path` set, so an unreadable file and a file without any options
/// look the same here. The two options are independent: a usable `nextRefill`
/// is kept even when `quotaInfo` is absent or undecodable. Use [`try_parse`]
/// to tell the failure kinds apart.
pub fn parse(file_path: &Path) -> QuotaRecord {
    let source = SourcePath::resolve(file_path);
    let payloads = match read_options(file_path) {
        Ok(payloads) => payloads,
        Err(err) => {
            tracing::warn!("Using empty quota record: {}", err);
            return QuotaRecord::new(source);
        }
    };

    let refill = payloads.refill();
    match decode_quota(file_path, &payloads) {
        Ok(quota) => quota.into_record(source).with_refill(refill),
        Err(err) => {
            tracing::warn!("Using empty quota fields: {}", err);
            QuotaRecord::new(source).with_refill(refill)
        }
    }
}

pub fn try_parse(file_path: &Path) -> Result<QuotaRecord, ParseError> {
    let source = SourcePath::resolve(file_path);
    let payloads = read_options(file_path)?;
    let quota = decode_quota(file_path, &payloads)?;
    let refill = payloads.refill();

    tracing::debug!(
        "Parsed quota {} {}/{} from {}",
        quota.quota_type,
        quota.current,
        quota.maximum,
        source
    );
    Ok(quota.into_record(source).with_refill(refill))
}

fn read_options(file_path: &Path) -> Result<OptionPayloads, ParseError> {
    let content = fs::read_to_string(file_path)
        .map_err(|source| ParseError::Unreadable { path: file_path.to_path_buf(), source })?;

    collect_options(&content)
        .map_err(|reason| ParseError::MalformedXml { path: file_path.to_path_buf(), reason })
}

fn decode_quota(file_path: &Path, payloads: &OptionPayloads) -> Result<QuotaInfoPayload, ParseError> {
    let Some(quota_raw) = payloads.quota_info.as_deref() else {
        return Err(ParseError::MissingQuotaInfo(file_path.to_path_buf()));
    };
    serde_json::from_str(&decode_payload(quota_raw))
        .map_err(|source| ParseError::InvalidQuotaInfo { path: file_path.to_path_buf(), source })
}

impl QuotaInfoPayload {
    fn into_record(self, source: SourcePath) -> QuotaRecord {
        QuotaRecord::new(source).with_quota(&self.quota_type, self.current, self.maximum, &self.until)
    }
}

impl OptionPayloads {
    fn refill(&self) -> Refill {
        self.next_refill.as_deref().and_then(parse_refill).unwrap_or_default()
    }
}

/// Best-effort refill decoding: refill data is optional metadata, so a broken
/// payload yields `None` and the record keeps its refill defaults.
fn parse_refill(raw: &str) -> Option<Refill> {
    match serde_json::from_str::<RefillPayload>(&decode_payload(raw)) {
        Ok(payload) => Some(Refill::new(
            &payload.refill_type,
            &payload.next,
            payload.amount,
            &payload.duration,
        )),
        Err(err) => {
            tracing::debug!("Ignoring unparseable nextRefill payload: {}", err);
            None
        }
    }
}

/// Undo the entity escaping that survives attribute unescaping when the IDE
/// double-escapes its JSON.
fn decode_payload(raw: &str) -> String {
    raw.replace("&#10;", "\n").replace("&quot;", "\"")
}

/// Walk the whole document and pick up `<option name=.. value=..>` at any depth.
fn collect_options(content: &str) -> Result<OptionPayloads, String> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut payloads = OptionPayloads::default();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                saw_root = true;
                record_option(&element, &mut payloads)?;
            }
            Ok(Event::Empty(element)) => {
                saw_root = true;
                record_option(&element, &mut payloads)?;
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(format!("at byte {}: {}", reader.buffer_position(), err));
            }
        }
    }

    if !saw_root {
        return Err("no root element".to_string());
    }
    if depth != 0 {
        return Err(format!("{depth} unclosed element(s) at end of input"));
    }
    Ok(payloads)
}

fn record_option(element: &BytesStart<'_>, payloads: &mut OptionPayloads) -> Result<(), String> {
    if element.local_name().as_ref() != b"option" {
        return Ok(());
    }

    let mut name = None;
    let mut value = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        match attr.key.as_ref() {
            b"name" => name = Some(attr.unescape_value().map_err(|e| e.to_string())?.into_owned()),
            b"value" => {
                value = Some(attr.unescape_value().map_err(|e| e.to_string())?.into_owned())
            }
            _ => {}
        }
    }

    match (name.as_deref(), value) {
        (Some(QUOTA_INFO_OPTION), Some(value)) => payloads.quota_info = Some(value),
        (Some(NEXT_REFILL_OPTION), Some(value)) => payloads.next_refill = Some(value),
        _ => {}
    }
    Ok(())
}
