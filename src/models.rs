//! Typed records and enumerations exchanged with Emailnator.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An entry in an inbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Identifier used to fetch the message body.
    #[serde(rename = "messageID")]
    pub message_id: String,
    /// Sender as displayed by the service.
    pub from: String,
    /// Subject line.
    pub subject: String,
    /// Human-readable receive time (e.g. "Just Now").
    pub time: String,
}

/// Address shapes the service can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationOption {
    /// An address on one of the service's own domains.
    #[serde(rename = "domain")]
    Domain,
    /// A Gmail address with a `+suffix`.
    #[serde(rename = "plusGmail")]
    PlusGmail,
    /// A Gmail address with dots inserted.
    #[serde(rename = "dotGmail")]
    DotGmail,
    /// A `googlemail.com` address.
    #[serde(rename = "googleMail")]
    GoogleMail,
}

/// Batch sizes accepted by bulk generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BulkCount {
    /// 100 addresses.
    #[default]
    Hundred,
    /// 200 addresses.
    TwoHundred,
    /// 300 addresses.
    ThreeHundred,
}

impl BulkCount {
    /// The wire representation sent as `emailNo`.
    pub fn as_str(self) -> &'static str {
        match self {
            BulkCount::Hundred => "100",
            BulkCount::TwoHundred => "200",
            BulkCount::ThreeHundred => "300",
        }
    }
}

impl fmt::Display for BulkCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkCount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "100" => Ok(BulkCount::Hundred),
            "200" => Ok(BulkCount::TwoHundred),
            "300" => Ok(BulkCount::ThreeHundred),
            other => Err(Error::InvalidInput(format!(
                "Invalid emails_number '{other}'. Must be one of '100', '200', or '300'."
            ))),
        }
    }
}

impl TryFrom<u32> for BulkCount {
    type Error = Error;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        n.to_string().parse()
    }
}

impl Serialize for BulkCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
